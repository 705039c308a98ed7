//! Text-to-speech through the `edge-tts` command line tool.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

pub const DEFAULT_TTS_BIN: &str = "edge-tts";
pub const DEFAULT_VOICE: &str = "en-US-AndrewNeural";

/// Turns a script into an audio file at `output`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, output: &Path) -> WorkerResult<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct EdgeTtsConfig {
    pub binary: PathBuf,
    pub voice: String,
    pub rate: String,
    pub pitch: String,
    pub timeout: Duration,
}

impl Default for EdgeTtsConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_TTS_BIN),
            voice: DEFAULT_VOICE.to_string(),
            rate: "-5%".to_string(),
            pitch: "-2Hz".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl EdgeTtsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            binary: std::env::var("EDGE_TTS_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.binary),
            voice: std::env::var("TTS_VOICE").unwrap_or(defaults.voice),
            ..defaults
        }
    }
}

pub struct EdgeTts {
    config: EdgeTtsConfig,
}

impl EdgeTts {
    pub fn new(config: EdgeTtsConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(EdgeTtsConfig::from_env())
    }

    fn args(&self, text: &str, output: &Path) -> Vec<String> {
        vec![
            "--voice".to_string(),
            self.config.voice.clone(),
            // edge-tts parses "-5%" as a flag unless it is attached with '='
            format!("--rate={}", self.config.rate),
            format!("--pitch={}", self.config.pitch),
            "--text".to_string(),
            text.to_string(),
            "--write-media".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTts {
    async fn synthesize(&self, text: &str, output: &Path) -> WorkerResult<PathBuf> {
        if text.trim().is_empty() {
            return Err(WorkerError::synthesis("empty narration text"));
        }
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let child = Command::new(&self.config.binary)
            .args(self.args(text, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WorkerError::synthesis(format!(
                    "failed to start {}: {}",
                    self.config.binary.display(),
                    e
                ))
            })?;

        let result = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                WorkerError::synthesis(format!(
                    "edge-tts timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            })??;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(WorkerError::synthesis(format!(
                "edge-tts exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        let size = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(WorkerError::synthesis(format!(
                "edge-tts produced no audio at {}",
                output.display()
            )));
        }

        info!(path = %output.display(), size, voice = %self.config.voice, "Voiceover saved");
        Ok(output.to_path_buf())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("edge-tts");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn tts(binary: PathBuf) -> EdgeTts {
        EdgeTts::new(EdgeTtsConfig {
            binary,
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
    }

    #[test]
    fn test_args_attach_signed_values() {
        let tts = EdgeTts::new(EdgeTtsConfig::default());
        let args = tts.args("Hello", Path::new("outputs/voiceover_1.mp3"));
        assert_eq!(
            args,
            vec![
                "--voice",
                "en-US-AndrewNeural",
                "--rate=-5%",
                "--pitch=-2Hz",
                "--text",
                "Hello",
                "--write-media",
                "outputs/voiceover_1.mp3"
            ]
        );
    }

    #[tokio::test]
    async fn test_synthesize_writes_media() {
        let dir = TempDir::new().unwrap();
        let bin = script(
            dir.path(),
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "--write-media" ]; then out="$2"; fi
  shift
done
printf 'ID3fake' > "$out""#,
        );
        let output = dir.path().join("outputs").join("voiceover_1.mp3");

        let path = tts(bin).synthesize("Bitcoin is up.", &output).await.unwrap();

        assert_eq!(path, output);
        assert_eq!(std::fs::read(&output).unwrap(), b"ID3fake");
    }

    #[tokio::test]
    async fn test_synthesize_reports_failure() {
        let dir = TempDir::new().unwrap();
        let bin = script(dir.path(), "echo 'voice not found' >&2; exit 3");
        let output = dir.path().join("voiceover_1.mp3");

        let err = tts(bin).synthesize("Hello", &output).await.unwrap_err();
        match err {
            WorkerError::Synthesis(msg) => assert!(msg.contains("voice not found")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let err = tts(PathBuf::from("/nonexistent/edge-tts"))
            .synthesize("   ", Path::new("voiceover.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Synthesis(_)));
    }
}
