//! Generation command handlers
//!
//! Submitting, inspecting, listing and deleting generations.

use anyhow::{Context, Result};
use colored::*;
use paperforge_client::{JobRecord, JobStatus, PaperforgeClient, PollOptions, SubmitOptions};
use serde_json::{Map, Value};
use std::path::Path;

use crate::id_resolver::resolve_generation_id;
use crate::types::IdOrPrefix;

/// Parse a single key=value pair
pub fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Upload a PDF, optionally waiting for the result
pub async fn submit(
    client: &PaperforgeClient,
    user_id: &str,
    path: &Path,
    output_type: &str,
    params: Vec<(String, String)>,
    wait: Option<PollOptions>,
) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.pdf")
        .to_string();

    let mut options = SubmitOptions::new(file_name, bytes, output_type, user_id);
    if !params.is_empty() {
        options = options.settings(settings_object(params));
    }

    let submitted = client.submit(options).await?;

    println!("{}", "✓ Generation started".green().bold());
    println!("  ID:     {}", submitted.generation_id.to_string().cyan());
    println!("  Status: {}", colorize_status(&submitted.status));

    let Some(poll) = wait else {
        return Ok(());
    };

    println!();
    println!("{}", "Waiting for the generation to finish...".dimmed());
    let record = client
        .wait_for_completion(submitted.generation_id, user_id, poll)
        .await?;
    println!();
    print_generation_details(&record);

    if record.status == JobStatus::Failed {
        anyhow::bail!("Generation {} failed", record.id);
    }
    Ok(())
}

/// Show one generation
pub async fn status(client: &PaperforgeClient, user_id: &str, id: &str) -> Result<()> {
    let id = resolve_generation_id(client, user_id, &IdOrPrefix::parse(id)).await?;
    let record = client.get_generation(id, user_id).await?;
    print_generation_details(&record);
    Ok(())
}

/// List the user's generations
pub async fn list(
    client: &PaperforgeClient,
    user_id: &str,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<()> {
    let records = client.list_generations(user_id, limit, offset).await?;

    if records.is_empty() {
        println!("{}", "No generations found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} generation(s):", records.len()).bold()
        );
        println!();
        for record in &records {
            print_generation_summary(record);
        }
    }

    Ok(())
}

/// Delete a generation
pub async fn delete(client: &PaperforgeClient, user_id: &str, id: &str) -> Result<()> {
    let id = resolve_generation_id(client, user_id, &IdOrPrefix::parse(id)).await?;
    client.delete_generation(id, user_id).await?;
    println!("{} Deleted generation {}", "✓".green(), id.to_string().dimmed());
    Ok(())
}

/// Settings object sent with the upload; numeric values stay strings
fn settings_object(params: Vec<(String, String)>) -> Value {
    Value::Object(
        params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}

fn print_generation_summary(record: &JobRecord) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        record.title.bold(),
        record.id.to_string().dimmed()
    );
    println!("    Type:     {}", record.kind);
    println!("    Status:   {}", colorize_status(&record.status));
    println!(
        "    Created:  {}",
        record
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

fn print_generation_details(record: &JobRecord) {
    println!("{}", "Generation Details:".bold());
    println!("  ID:       {}", record.id.to_string().cyan());
    println!("  Title:    {}", record.title);
    println!("  Type:     {}", record.kind);
    println!("  Status:   {}", colorize_status(&record.status));
    println!("  Source:   {}", record.source_url.dimmed());
    println!(
        "  Created:  {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:  {}",
        record.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if !record.parameters.is_empty() {
        println!("\n{}", "Settings:".bold());
        for (key, value) in &record.parameters {
            println!("  {} = {}", key.cyan(), value);
        }
    }

    if let Some(url) = &record.result_url {
        println!("\n{}", "Result:".bold());
        println!("  URL:      {}", url.green());
        if let Some(size) = record.result_size {
            println!("  Size:     {} bytes", size);
        }
        if let Some(slides) = &record.slides {
            println!("  Slides:   ~{}", slides);
        }
        if let Some(duration) = &record.duration {
            println!("  Duration: ~{}", duration);
        }
    }

    if let Some(diagnostic) = &record.diagnostic {
        println!("\n{}", "Error:".bold());
        println!("{}", diagnostic.red());
    }
}

/// Colorize generation status for display
fn colorize_status(status: &JobStatus) -> ColoredString {
    let text = status.as_str();
    match status {
        JobStatus::Processing => text.yellow(),
        JobStatus::Completed => text.green(),
        JobStatus::Failed => text.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("template=7").unwrap(),
            ("template".to_string(), "7".to_string())
        );
        assert_eq!(
            parse_key_val("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
    }

    #[test]
    fn test_settings_object() {
        let settings = settings_object(vec![
            ("voiceA".to_string(), "Kore".to_string()),
            ("quality".to_string(), "high".to_string()),
        ]);
        assert_eq!(settings["voiceA"], "Kore");
        assert_eq!(settings["quality"], "high");
    }
}
