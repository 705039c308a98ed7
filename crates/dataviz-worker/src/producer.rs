//! Daily producer: fetch topics, narrate, voice and queue render jobs.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use dataviz_models::{DataPoint, JobId, RenderJob};
use dataviz_queue::JobQueue;

use crate::config::audio_path;
use crate::error::WorkerResult;
use crate::market_data::DataSource;
use crate::narration::Narrator;
use crate::topics::Topic;
use crate::voiceover::SpeechSynthesizer;

/// What one producer run queued.
#[derive(Debug, Default, Serialize)]
pub struct ProduceReport {
    pub queued: Vec<JobId>,
    pub fetch_failures: usize,
    pub skipped: usize,
}

pub struct DailyProducer {
    source: Arc<dyn DataSource>,
    narrator: Arc<dyn Narrator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    queue: JobQueue,
    voice_dir: PathBuf,
    videos_per_day: usize,
}

impl DailyProducer {
    pub fn new(
        source: Arc<dyn DataSource>,
        narrator: Arc<dyn Narrator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        queue: JobQueue,
        voice_dir: impl Into<PathBuf>,
        videos_per_day: usize,
    ) -> Self {
        Self {
            source,
            narrator,
            synthesizer,
            queue,
            voice_dir: voice_dir.into(),
            videos_per_day,
        }
    }

    /// Fetch every topic, keeping the ones that succeed.
    pub async fn gather(&self, topics: &[Topic]) -> (Vec<DataPoint>, usize) {
        let mut points = Vec::with_capacity(topics.len());
        let mut failures = 0;
        for topic in topics {
            match self.source.fetch(topic).await {
                Ok(point) => points.push(point),
                Err(e) => {
                    failures += 1;
                    warn!(topic = topic.name(), "Fetch failed: {}", e);
                }
            }
        }
        (points, failures)
    }

    /// Narrate, voice and enqueue a single data point.
    pub async fn produce_one(&self, point: &DataPoint) -> WorkerResult<RenderJob> {
        let analysis = self.narrator.analyze(point).await?;
        let id = JobId::generate();

        let audio = audio_path(&self.voice_dir, &id);
        self.synthesizer.synthesize(&analysis, &audio).await?;

        let job = RenderJob::from_data_point(id, point, analysis);
        let path = self.queue.enqueue(&job).await?;
        info!(job_id = %job.id, title = %job.title, path = %path.display(), "Queued render job");
        Ok(job)
    }

    /// Fetch, pick a random subset and queue a job for each pick.
    pub async fn run(&self, topics: &[Topic]) -> ProduceReport {
        let (points, fetch_failures) = self.gather(topics).await;
        let selected = select_random(points, self.videos_per_day);
        info!(
            topics = topics.len(),
            selected = selected.len(),
            "Selected topics for today"
        );

        let mut report = ProduceReport {
            fetch_failures,
            ..Default::default()
        };
        for point in &selected {
            match self.produce_one(point).await {
                Ok(job) => report.queued.push(job.id),
                Err(e) => {
                    report.skipped += 1;
                    warn!(title = %point.title, "Skipping topic: {}", e);
                }
            }
        }
        report
    }
}

/// Up to `count` points in random order.
pub fn select<R: Rng + ?Sized>(mut points: Vec<DataPoint>, count: usize, rng: &mut R) -> Vec<DataPoint> {
    points.shuffle(rng);
    points.truncate(count);
    points
}

fn select_random(points: Vec<DataPoint>, count: usize) -> Vec<DataPoint> {
    let mut rng = rand::rng();
    select(points, count, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use crate::market_data::economic_point;
    use async_trait::async_trait;
    use dataviz_queue::QueueConfig;
    use futures_util::StreamExt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;
    use tempfile::TempDir;

    struct FixedSource;

    #[async_trait]
    impl DataSource for FixedSource {
        async fn fetch(&self, topic: &Topic) -> WorkerResult<DataPoint> {
            match topic {
                Topic::Economic { id, name } => economic_point(id, name)
                    .ok_or_else(|| WorkerError::data_source("unknown")),
                _ => Err(WorkerError::data_source("offline")),
            }
        }
    }

    struct EchoNarrator;

    #[async_trait]
    impl Narrator for EchoNarrator {
        async fn analyze(&self, point: &DataPoint) -> WorkerResult<String> {
            Ok(format!("{} moved today.", point.title))
        }
    }

    /// Writes a stub file, or fails for narration mentioning "Inflation".
    struct StubSynth;

    #[async_trait]
    impl SpeechSynthesizer for StubSynth {
        async fn synthesize(&self, text: &str, output: &Path) -> WorkerResult<PathBuf> {
            if text.contains("Inflation") {
                return Err(WorkerError::synthesis("voice unavailable"));
            }
            tokio::fs::create_dir_all(output.parent().unwrap()).await?;
            tokio::fs::write(output, b"ID3").await?;
            Ok(output.to_path_buf())
        }
    }

    fn topics() -> Vec<Topic> {
        vec![
            Topic::Crypto {
                symbol: "BTC".into(),
                name: "Bitcoin".into(),
            },
            Topic::Economic {
                id: "unemployment".into(),
                name: "US Unemployment Rate".into(),
            },
            Topic::Economic {
                id: "inflation".into(),
                name: "US Inflation Rate".into(),
            },
        ]
    }

    fn producer(dir: &Path, videos_per_day: usize) -> DailyProducer {
        let queue = JobQueue::new(QueueConfig::default().with_dir(dir.join("queue")));
        DailyProducer::new(
            Arc::new(FixedSource),
            Arc::new(EchoNarrator),
            Arc::new(StubSynth),
            queue,
            dir.join("outputs"),
            videos_per_day,
        )
    }

    #[test]
    fn test_select_is_bounded_and_seeded() {
        let points: Vec<DataPoint> = ["unemployment", "inflation"]
            .iter()
            .filter_map(|id| economic_point(id, id))
            .collect();

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select(points.clone(), 1, &mut rng).len(), 1);

        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            select(points.clone(), 5, &mut a),
            select(points, 5, &mut b)
        );
    }

    #[tokio::test]
    async fn test_run_queues_jobs_with_audio() {
        let dir = TempDir::new().unwrap();
        let producer = producer(dir.path(), 5);

        let report = producer.run(&topics()).await;

        assert_eq!(report.fetch_failures, 1);
        assert_eq!(report.queued.len(), 1);
        assert_eq!(report.skipped, 1);

        let id = &report.queued[0];
        assert!(audio_path(&dir.path().join("outputs"), id).is_file());

        let pending: Vec<_> = producer.queue.list_pending().collect().await;
        assert_eq!(pending.len(), 1);
        let job = &pending[0].as_ref().unwrap().job;
        assert_eq!(&job.id, id);
        assert_eq!(job.title, "US Unemployment Rate");
        assert_eq!(job.source, "Federal Reserve");
        assert_eq!(job.analysis, "US Unemployment Rate moved today.");
    }

    #[tokio::test]
    async fn test_run_respects_videos_per_day() {
        let dir = TempDir::new().unwrap();
        let producer = producer(dir.path(), 0);

        let report = producer.run(&topics()).await;

        assert!(report.queued.is_empty());
        assert_eq!(report.skipped, 0);
    }
}
