// src/classify/llm.rs
//! LLM-backed classifier: prompt construction + chat providers (Gemini, OpenAI).

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::parse::parse_classification;
use super::{Classifier, ClassifyResult};
use crate::error::ClassifyError;

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Build the triage prompt for one report.
pub fn triage_prompt(text: &str) -> String {
    // JSON-encode the report so quotes inside it cannot break the prompt frame.
    let quoted = serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""));
    format!(
        r#"You are an 'A.I.D.R.' (Automated Incident Data Responder) triage bot.
Analyze the following report and respond ONLY with a valid JSON object.
Do not add any text before or after the JSON.

Use these exact keys: "urgency_level", "incident_category", "location_extracted", "people_affected", "resources_needed", "summary".
- urgency_level: (CRITICAL, HIGH, MEDIUM, LOW, IGNORE)
- incident_category: (Fire, Flood, Medical, Trapped, Infrastructure, Other)
- If info is missing, use "null".

Report: {quoted}"#
    )
}

/// Low-level chat completion call. Separated so the same classifier logic runs
/// over any provider.
#[async_trait]
pub trait ChatProvider: Send + Sync + 'static {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError>;
    fn name(&self) -> &'static str;
}

fn http_client(timeout: Duration, connect_timeout: Duration) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent("sireneye/0.1")
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .build()?)
}

fn transport_err(e: reqwest::Error) -> ClassifyError {
    if e.is_timeout() {
        ClassifyError::Unavailable("request timed out".into())
    } else {
        ClassifyError::Unavailable(e.without_url().to_string())
    }
}

// ------------------------------------------------------------
// Gemini
// ------------------------------------------------------------

/// Google Gemini `generateContent`. Requires `GEMINI_API_KEY`.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        model_override: Option<&str>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(timeout, connect_timeout)?,
            api_key,
            model: model_override.unwrap_or(GEMINI_DEFAULT_MODEL).to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiReq<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Deserialize)]
struct GeminiResp {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}
#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiRespContent>,
}
#[derive(Deserialize)]
struct GeminiRespContent {
    #[serde(default)]
    parts: Vec<GeminiRespPart>,
}
#[derive(Deserialize)]
struct GeminiRespPart {
    #[serde(default)]
    text: String,
}

/// Concatenated text of the first candidate.
fn gemini_text(resp: GeminiResp) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        if self.api_key.is_empty() {
            return Err(ClassifyError::Unavailable("missing GEMINI_API_KEY".into()));
        }
        let req = GeminiReq {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.2,
                response_mime_type: "application/json",
            },
        };
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(transport_err)?;

        if !resp.status().is_success() {
            return Err(ClassifyError::Unavailable(format!("HTTP {}", resp.status())));
        }
        let body: GeminiResp = resp
            .json()
            .await
            .map_err(|e| ClassifyError::MalformedOutput(e.without_url().to_string()))?;
        gemini_text(body).ok_or_else(|| ClassifyError::MalformedOutput("empty candidate".into()))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// OpenAI
// ------------------------------------------------------------

/// OpenAI provider (uses Chat Completions API). Requires `OPENAI_API_KEY`.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        model_override: Option<&str>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(timeout, connect_timeout)?,
            api_key,
            model: model_override.unwrap_or(OPENAI_DEFAULT_MODEL).to_string(),
            url: OPENAI_CHAT_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}
#[derive(Deserialize)]
struct ChatResp {
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        if self.api_key.is_empty() {
            return Err(ClassifyError::Unavailable("missing OPENAI_API_KEY".into()));
        }
        let req = ChatReq {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
            max_tokens: 400,
        };
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(transport_err)?;

        if !resp.status().is_success() {
            return Err(ClassifyError::Unavailable(format!("HTTP {}", resp.status())));
        }
        let body: ChatResp = resp
            .json()
            .await
            .map_err(|e| ClassifyError::MalformedOutput(e.without_url().to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ClassifyError::MalformedOutput("empty completion".into()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Classifier over a chat provider
// ------------------------------------------------------------

pub struct LlmClassifier<P: ChatProvider> {
    provider: P,
    call_timeout: Duration,
    concurrency: usize,
}

impl<P: ChatProvider> LlmClassifier<P> {
    pub fn new(provider: P, call_timeout: Duration, concurrency: usize) -> Self {
        Self {
            provider,
            call_timeout,
            concurrency,
        }
    }
}

#[async_trait]
impl<P: ChatProvider> Classifier for LlmClassifier<P> {
    async fn classify(&self, text: &str) -> ClassifyResult {
        let prompt = triage_prompt(text);
        let t0 = Instant::now();

        let raw = match tokio::time::timeout(self.call_timeout, self.provider.complete(&prompt)).await {
            Ok(res) => res,
            Err(_) => Err(ClassifyError::Unavailable(format!(
                "no answer within {} ms",
                self.call_timeout.as_millis()
            ))),
        };
        let outcome = raw.and_then(|body| parse_classification(text, &body));

        histogram!("classifier_call_ms", "provider" => self.provider.name())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        let status = match &outcome {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        counter!("classifier_calls_total", "provider" => self.provider.name(), "outcome" => status)
            .increment(1);

        outcome
    }

    fn batch_concurrency(&self) -> usize {
        self.concurrency
    }

    fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}
