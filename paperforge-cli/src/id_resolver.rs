//! ID resolver module
//!
//! Resolves generation id prefixes to full UUIDs by listing the user's
//! generations, so commands accept short unambiguous prefixes.

use anyhow::{Context, Result, anyhow};
use paperforge_client::{JobRecord, PaperforgeClient};
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Largest page the server returns; prefixes are matched within it
const RESOLVE_PAGE: u32 = 100;

/// Resolve a generation ID or prefix to a full UUID
///
/// # Errors
/// Returns an error if no generation or more than one matches the prefix,
/// or if listing fails.
pub async fn resolve_generation_id(
    client: &PaperforgeClient,
    user_id: &str,
    id_or_prefix: &IdOrPrefix,
) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let generations = client
        .list_generations(user_id, Some(RESOLVE_PAGE), None)
        .await
        .context("Failed to fetch generations for ID resolution")?;

    pick_unique(&generations, id_or_prefix)
}

fn pick_unique(generations: &[JobRecord], id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    let matches: Vec<Uuid> = generations
        .iter()
        .map(|g| g.id)
        .filter(|id| id_or_prefix.matches(id))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No generation found with ID starting with '{}'",
            id_or_prefix
        )),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple generations: {}",
                id_or_prefix,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperforge_core::domain::job::JobKind;

    fn record(id: &str) -> JobRecord {
        let mut record = JobRecord::new(
            "u1",
            JobKind::Podcast,
            "paper.pdf",
            "u1/1_paper.pdf",
            "http://x/files/u1/1_paper.pdf",
            Default::default(),
        );
        record.id = Uuid::parse_str(id).unwrap();
        record
    }

    #[test]
    fn test_pick_unique() {
        let records = vec![
            record("3fa85f64-5717-4562-b3fc-2c963f66afa6"),
            record("3fb00000-5717-4562-b3fc-2c963f66afa6"),
        ];

        let id = pick_unique(&records, &IdOrPrefix::parse("3fa")).unwrap();
        assert_eq!(id, records[0].id);

        let err = pick_unique(&records, &IdOrPrefix::parse("3f")).unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));

        let err = pick_unique(&records, &IdOrPrefix::parse("ff")).unwrap_err();
        assert!(err.to_string().contains("No generation"));
    }
}
