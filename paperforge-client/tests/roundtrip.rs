//! Drives a real server on a loopback port through the client.

use std::sync::Arc;
use std::time::Duration;

use paperforge_client::{ClientError, JobStatus, PaperforgeClient, PollOptions, SubmitOptions};
use paperforge_server::config::Config;
use paperforge_server::generator::ProcessGenerator;
use paperforge_server::repository::InMemoryJobStore;
use paperforge_server::storage::FilesystemBlobStore;
use paperforge_server::{AppState, create_router};
use tempfile::TempDir;

const OWNER: &str = "123e4567-e89b-12d3-a456-426614174000";

const FAST_POLL: PollOptions = PollOptions {
    interval: Duration::from_millis(50),
    max_attempts: 100,
};

async fn spawn_server(script: &str) -> anyhow::Result<(PaperforgeClient, TempDir)> {
    let dir = tempfile::tempdir()?;
    let script_path = dir.path().join("generate.sh");
    std::fs::write(&script_path, script)?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);

    let mut config = Config::new(dir.path());
    config.public_url = base_url.clone();
    config.generator.interpreter = "sh".to_string();
    config.generator.slide_deck_script = script_path.clone();
    config.generator.podcast_script = script_path;

    let blobs = FilesystemBlobStore::new(config.storage_dir.clone(), config.files_url()).await?;
    let generator = ProcessGenerator::new(config.generator.clone());
    let state = AppState::new(
        config,
        Arc::new(InMemoryJobStore::new()),
        Arc::new(blobs),
        Arc::new(generator),
    );

    tokio::spawn(async move {
        let _ = axum::serve(listener, create_router(state)).await;
    });

    Ok((PaperforgeClient::new(base_url), dir))
}

fn pdf() -> Vec<u8> {
    b"%PDF-1.7\n%client test\n".to_vec()
}

#[tokio::test]
async fn submit_wait_list_delete() -> anyhow::Result<()> {
    let (client, _dir) = spawn_server("printf 'slides' > \"$2\"\n").await?;

    let health = client.health().await?;
    assert_eq!(health.status, "ok");
    assert!(!health.backend_configured);

    let submitted = client
        .submit(
            SubmitOptions::new("paper.pdf", pdf(), "presentation", OWNER)
                .settings(serde_json::json!({"template": 3, "length": "short"})),
        )
        .await?;
    assert_eq!(submitted.status, JobStatus::Processing);

    let record = client
        .wait_for_completion(submitted.generation_id, OWNER, FAST_POLL)
        .await?;
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.slides.as_deref(), Some("5-8"));

    let result_url = record.result_url.clone().unwrap();
    let artifact = reqwest::get(&result_url).await?.bytes().await?;
    assert_eq!(&artifact[..], b"slides");

    let listed = client.list_generations(OWNER, Some(10), None).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);

    client.delete_generation(record.id, OWNER).await?;
    let err = client
        .get_generation(record.id, OWNER)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[tokio::test]
async fn rejected_upload_surfaces_server_message() -> anyhow::Result<()> {
    let (client, _dir) = spawn_server("exit 0\n").await?;

    let err = client
        .submit(SubmitOptions::new("paper.pdf", pdf(), "Poster", OWNER))
        .await
        .unwrap_err();
    match err {
        ClientError::ApiError { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("Poster"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn wait_gives_up_after_max_attempts() -> anyhow::Result<()> {
    let (client, _dir) = spawn_server("sleep 5\n").await?;

    let submitted = client
        .submit(SubmitOptions::new("paper.pdf", pdf(), "podcast", OWNER))
        .await?;
    let err = client
        .wait_for_completion(
            submitted.generation_id,
            OWNER,
            PollOptions {
                interval: Duration::from_millis(20),
                max_attempts: 3,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout { attempts: 3, .. }));

    Ok(())
}
