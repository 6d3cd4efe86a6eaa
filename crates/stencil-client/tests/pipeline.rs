//! Client against a real backend on an ephemeral port.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use stencil_client::{ArtifactSource, ClientConfig, Orchestrator, Phase};
use stencil_server::api::build_router;
use stencil_server::config::ServerConfig;
use stencil_server::convert::ScaffoldConverter;
use stencil_shared::{JobStatus, Target, Upload, UploadId, UploadStatus};
use tempfile::TempDir;

const POLL: Duration = Duration::from_millis(50);

async fn start_server() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        database_path: dir.path().join("stencil.db"),
        media_root: dir.path().join("media"),
        worker_sweep: POLL,
        ..ServerConfig::default()
    };

    let (state, worker) = stencil_server::bootstrap(config, Arc::new(ScaffoldConverter))
        .await
        .unwrap();
    let _worker = worker.spawn();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, build_router(state)).await });

    (dir, format!("http://{addr}"))
}

fn client(base: &str) -> Orchestrator {
    let config = ClientConfig {
        api_url: format!("{base}/api"),
        media_url: base.to_string(),
        poll_interval: POLL,
        max_polls: 200,
        connect_timeout: Some(Duration::from_secs(5)),
    };
    Orchestrator::from_config(&config).unwrap()
}

/// A noisy PNG around 2 MB so compression cannot shrink it much.
fn large_png() -> Vec<u8> {
    let mut seed: u32 = 0x9e37_79b9;
    let img = image::RgbImage::from_fn(1000, 700, |_, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        image::Rgb([r, g, b])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

async fn wait_until_settled(orch: &Orchestrator, id: UploadId) -> Upload {
    for _ in 0..200 {
        orch.refresh().await.unwrap();
        if let Some(upload) = orch.snapshot().upload(id).cloned() {
            if upload.status.is_terminal() {
                return upload;
            }
        }
        tokio::time::sleep(POLL).await;
    }
    panic!("upload {id} never settled");
}

#[tokio::test]
async fn test_homepage_to_library() {
    let (_dir, base) = start_server().await;
    let orch = client(&base);
    orch.initialize().await.unwrap();
    assert_eq!(orch.phase(), Phase::Ready);

    let image = large_png();
    assert!(image.len() > 1024 * 1024);
    let upload = orch
        .upload_screenshot(image, "Homepage v1", "landing page")
        .await
        .unwrap();
    assert_eq!(upload.title, "Homepage v1");

    let upload = wait_until_settled(&orch, upload.id).await;
    assert_eq!(upload.status, UploadStatus::Ready);

    let job = orch.convert(upload.id, Target::Nextjs).await.unwrap();
    assert_eq!(job.status, JobStatus::Queued);

    let job = orch.watch_job(job.id, POLL, 200).await.unwrap();
    assert_eq!(job.status, JobStatus::Success, "log: {}", job.log);
    assert!(job.artifact.is_some());
    assert!(orch.jobs().iter().all(|j| j.artifact_consistent()));

    let item = orch
        .add_to_library(job.id, "Homepage Template")
        .await
        .unwrap();
    assert_eq!(item.name, "Homepage Template");
    assert_eq!(item.target, Target::Nextjs);
    assert!(orch.library().contains(&item));

    let out = tempfile::tempdir().unwrap();
    let from_job = orch
        .download_artifact(ArtifactSource::Job(job.id), out.path())
        .await
        .unwrap();
    let from_library = orch
        .download_artifact(ArtifactSource::LibraryItem(item.id), out.path())
        .await
        .unwrap();

    assert_eq!(
        from_library.file_name().unwrap(),
        "homepage_template_nextjs_template.zip"
    );
    let job_bytes = std::fs::read(from_job).unwrap();
    assert!(job_bytes.starts_with(b"PK"));
    assert_eq!(job_bytes, std::fs::read(from_library).unwrap());
}

#[tokio::test]
async fn test_backend_rules_reach_the_client() {
    let (_dir, base) = start_server().await;
    let orch = client(&base);
    orch.initialize().await.unwrap();

    let err = orch
        .convert(UploadId::new(), Target::Django)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Upload not found.");

    let upload = orch
        .upload_screenshot(large_png(), "Pricing", "")
        .await
        .unwrap();
    wait_until_settled(&orch, upload.id).await;
    let job = orch.convert(upload.id, Target::Django).await.unwrap();
    let job = orch.watch_job(job.id, POLL, 200).await.unwrap();
    assert_eq!(job.status, JobStatus::Success, "log: {}", job.log);

    orch.delete_upload(upload.id).await.unwrap();
    let snapshot = orch.snapshot();
    assert!(snapshot.upload(upload.id).is_none());
    assert!(snapshot.job(job.id).is_some());
    assert!(orch.jobs_for_upload(upload.id).is_empty());

    // promotion still works from an orphaned job
    let item = orch.add_to_library(job.id, "Pricing page").await.unwrap();
    orch.delete_library_item(item.id).await.unwrap();
    assert!(orch.library().is_empty());

    let err = orch.delete_library_item(item.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_unreachable_backend_fails_initial_load() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let orch = client(&format!("http://{addr}"));
    assert!(orch.initialize().await.is_err());
    assert_eq!(
        orch.phase(),
        Phase::Failed("Could not reach the server. Please check your connection.".into())
    );
    assert!(orch.snapshot().uploads.is_empty());
}

#[tokio::test]
async fn test_malformed_listing_is_reported_as_bad_response() {
    use axum::{routing::get, Json, Router};
    use serde_json::{json, Value};

    let app = Router::new()
        .route(
            "/api/templates/uploads/",
            get(|| async { Json(json!([{ "id": "not-a-uuid" }])) }),
        )
        .route("/api/templates/jobs/", get(|| async { Json(Value::Array(vec![])) }))
        .route("/api/templates/library/", get(|| async { Json(Value::Array(vec![])) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });

    let orch = client(&format!("http://{addr}"));
    assert!(orch.initialize().await.is_err());
    assert_eq!(
        orch.phase(),
        Phase::Failed("The server sent an unexpected response.".into())
    );
}
