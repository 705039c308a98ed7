//! Narration scripts for data points.
//!
//! An OpenAI chat completion writes a short news-anchor script. Any
//! failure, including a missing API key, falls back to a fixed template
//! so the producer always has something to voice.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use dataviz_models::{ChartData, DataPoint};

use crate::error::{WorkerError, WorkerResult};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str =
    "You are a financial news anchor writing quick market update scripts.";
const MAX_TOKENS: u32 = 120;
const TEMPERATURE: f32 = 0.8;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Writes the voiceover script for a data point.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn analyze(&self, point: &DataPoint) -> WorkerResult<String>;
}

#[derive(Debug, Clone)]
pub struct NarratorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
        }
    }
}

impl NarratorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
        }
    }
}

/// OpenAI chat-completions narrator.
pub struct OpenAiNarrator {
    config: NarratorConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiNarrator {
    pub fn new(config: NarratorConfig) -> WorkerResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    pub fn from_env() -> WorkerResult<Self> {
        Self::new(NarratorConfig::from_env())
    }

    /// Ask the model for a script. Errors are returned, not papered over.
    pub async fn request_script(&self, point: &DataPoint) -> WorkerResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| WorkerError::narration("OPENAI_API_KEY not set"))?;

        let prompt = build_prompt(point);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkerError::narration(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WorkerError::narration(format!(
                "OpenAI returned {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::narration(format!("Failed to parse OpenAI response: {}", e)))?;

        let script = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| clean_script(&text))
            .filter(|text| !text.is_empty())
            .ok_or_else(|| WorkerError::narration("No content in OpenAI response"))?;

        debug!(words = script.split_whitespace().count(), "Generated narration");
        Ok(script)
    }
}

#[async_trait]
impl Narrator for OpenAiNarrator {
    async fn analyze(&self, point: &DataPoint) -> WorkerResult<String> {
        match self.request_script(point).await {
            Ok(script) => Ok(script),
            Err(e) => {
                warn!(title = %point.title, "Narration failed, using template: {}", e);
                Ok(fallback_script(point))
            }
        }
    }
}

/// First and last readings, absolute change and percent change.
fn readings(point: &DataPoint) -> (f64, f64, f64, f64) {
    match &point.data {
        ChartData::Comparison {
            yesterday,
            today,
            change,
            change_percent,
        } => (*yesterday, *today, *change, *change_percent),
        ChartData::Series { values, .. } => {
            let first = values.first().copied().unwrap_or(0.0);
            let last = values.last().copied().unwrap_or(0.0);
            let pct = point.change_percent().unwrap_or(0.0);
            (first, last, last - first, pct)
        }
    }
}

/// User prompt for the chat completion.
pub fn build_prompt(point: &DataPoint) -> String {
    let (yesterday, today, _, change_percent) = readings(point);
    format!(
        r#"You are an economic data analyst. Create a 15-20 second voiceover script for a YouTube Short.

Topic: {title}
Category: {category}
Yesterday: ${yesterday}
Today: ${today}
Change: {change_percent:+.2}%

Style: News anchor delivering quick market update
Tone: Professional but energetic
Format:
- Start with attention grabber
- State the comparison (yesterday vs today)
- Quick insight on what it means

Keep it under 40 words. Sound human and excited.
Do NOT use phrases like "Let's dive in" or "Stay tuned"."#,
        title = point.title,
        category = point.category,
    )
}

/// Template script used when the model is unavailable.
pub fn fallback_script(point: &DataPoint) -> String {
    let (yesterday, today, change, change_percent) = readings(point);
    let pct = change_percent.abs();
    if change > 0.0 {
        format!(
            "{} jumped {:.1}% today, moving from ${} to ${}. Investors are watching closely as momentum builds.",
            point.title, pct, yesterday, today
        )
    } else {
        format!(
            "{} dropped {:.1}% today, falling from ${} to ${}. Markets react to the latest developments.",
            point.title, pct, yesterday, today
        )
    }
}

fn clean_script(text: &str) -> String {
    text.trim().replace(['"', '\''], "")
}
