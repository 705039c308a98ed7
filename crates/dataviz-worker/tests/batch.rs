//! Batch driver against a real queue directory and a stand-in encoder.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dataviz_models::{ChartData, ErrorKind, JobId, RenderJob};
use dataviz_queue::{CompletionPolicy, JobQueue, QueueConfig};
use dataviz_worker::config::audio_path;
use dataviz_worker::{BatchRunner, ExitPolicy, JobRenderer, WorkerConfig};
use tempfile::TempDir;

/// Writes 20 KB to the last argument (the output path).
fn fake_ffmpeg(dir: &Path) -> PathBuf {
    let path = dir.join("ffmpeg");
    std::fs::write(
        &path,
        "#!/bin/sh\nfor last; do :; done\nhead -c 20000 /dev/zero > \"$last\"\n",
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn worker_config(root: &Path) -> WorkerConfig {
    WorkerConfig {
        work_dir: root.join("work"),
        voice_dir: root.join("outputs"),
        output_dir: root.join("output"),
        total_frames: 6,
        width: 108,
        height: 192,
        encode_timeout: Duration::from_secs(10),
        ffmpeg_bin: fake_ffmpeg(root).to_string_lossy().to_string(),
        ..WorkerConfig::default()
    }
}

fn queue(root: &Path) -> JobQueue {
    JobQueue::new(
        QueueConfig::default()
            .with_dir(root.join("render_queue"))
            .with_completion(CompletionPolicy::Archive),
    )
}

fn job(id: &str, data: ChartData) -> RenderJob {
    let mut job = RenderJob::new("US Inflation Rate", data)
        .with_source("Federal Reserve")
        .with_analysis("Inflation eased to 3.0% today.");
    job.id = JobId::from_string(id);
    job
}

fn with_audio(root: &Path, job: &RenderJob) {
    let audio = audio_path(&root.join("outputs"), &job.id);
    std::fs::create_dir_all(audio.parent().unwrap()).unwrap();
    std::fs::write(audio, b"ID3").unwrap();
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let queue = queue(root);

    let good = job("20240115_080000_aaaaaaaa", ChartData::comparison(3.2, 3.0));
    let no_audio = job("20240115_080100_bbbbbbbb", ChartData::comparison(4.0, 4.1));
    queue.enqueue(&good).await.unwrap();
    queue.enqueue(&no_audio).await.unwrap();
    with_audio(root, &good);

    // Written by hand: the queue refuses to enqueue invalid jobs
    let broken = root.join("render_queue").join("video_20240115_080200_cccccccc.json");
    std::fs::write(&broken, "{ not json").unwrap();

    let runner = BatchRunner::new(queue, JobRenderer::new(worker_config(root)));
    let report = runner.run().await;

    assert_eq!(report.total(), 3);
    assert_eq!(
        report.rendered,
        vec![root.join("output").join("final_20240115_080000_aaaaaaaa.mp4")]
    );
    assert!(report.rendered[0].is_file());

    let mut kinds: Vec<_> = report
        .failures
        .iter()
        .map(|f| (f.job_id.as_str(), f.kind))
        .collect();
    kinds.sort_by_key(|(id, _)| *id);
    assert_eq!(
        kinds,
        vec![
            ("20240115_080100_bbbbbbbb", ErrorKind::MissingAsset),
            ("20240115_080200_cccccccc", ErrorKind::Validation),
        ]
    );

    // Rendered job archived, failed ones left for inspection
    let queue_dir = root.join("render_queue");
    assert!(!queue_dir.join("video_20240115_080000_aaaaaaaa.json").exists());
    assert!(queue_dir
        .join("processed")
        .join("video_20240115_080000_aaaaaaaa.json")
        .is_file());
    assert!(queue_dir.join("video_20240115_080100_bbbbbbbb.json").is_file());
    assert!(broken.is_file());

    // No workspace survives the batch
    let leftovers = std::fs::read_dir(root.join("work")).unwrap().count();
    assert_eq!(leftovers, 0);

    assert_eq!(report.exit_code(ExitPolicy::AnyFailed), 1);
    assert_eq!(report.exit_code(ExitPolicy::AllFailed), 0);
}

#[tokio::test]
async fn test_empty_queue_succeeds() {
    let dir = TempDir::new().unwrap();
    let runner = BatchRunner::new(
        queue(dir.path()),
        JobRenderer::new(worker_config(dir.path())),
    );

    let report = runner.run().await;

    assert_eq!(report.total(), 0);
    assert_eq!(report.exit_code(ExitPolicy::AnyFailed), 0);
}

#[tokio::test]
async fn test_second_run_does_not_rerender() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let queue = queue(root);

    let good = job("20240115_090000_dddddddd", ChartData::comparison(42000.0, 43500.0));
    queue.enqueue(&good).await.unwrap();
    with_audio(root, &good);

    let runner = BatchRunner::new(queue, JobRenderer::new(worker_config(root)));
    assert_eq!(runner.run().await.rendered.len(), 1);

    let again = runner.run().await;
    assert_eq!(again.total(), 0);
}
