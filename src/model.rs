//! Generative backend client and the model failover runner.
//!
//! One chat-completions call per candidate model, tried in configured order:
//! the first success wins, per-candidate failures are logged and skipped, and
//! only total exhaustion is an error. No per-candidate retry or backoff; fast
//! failover across the list is the policy.
//!
//! We only call chat.completions and request plain text, a strict JSON
//! object, or a vision description (image sent as a base64 data URL part).
//! Calls log model names, latencies, and payload sizes.
//!
//! NOTE: we never log the API key and keep payload truncations short.

use std::time::Duration;

use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::util::trunc_for_log;

/// One request through the failover runner.
pub struct ChatRequest<'a> {
  pub system: &'a str,
  pub user: &'a str,
  pub temperature: f32,
  pub json_mode: bool,
  pub image: Option<ImageAttachment>,
}

/// Raw image bytes plus their mime type, for vision requests.
pub struct ImageAttachment {
  pub bytes: Vec<u8>,
  pub mime: String,
}

#[derive(Clone)]
pub struct ModelClient {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  candidates: Vec<String>,
}

fn parse_candidates(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(|m| m.trim().to_string())
    .filter(|m| !m.is_empty())
    .collect()
}

fn image_data_url(mime: &str, bytes: &[u8]) -> String {
  format!("data:{};base64,{}", mime, base64::engine::general_purpose::STANDARD.encode(bytes))
}

impl ModelClient {
  /// Construct the client if we find MODEL_API_KEY; otherwise return None
  /// and the app runs on static fallbacks only.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("MODEL_API_KEY").ok()?;
    let base_url =
      std::env::var("MODEL_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let candidates = std::env::var("MODEL_CANDIDATES")
      .map(|raw| parse_candidates(&raw))
      .ok()
      .filter(|c| !c.is_empty())
      .unwrap_or_else(|| vec!["gpt-4o-mini".into(), "gpt-4o".into()]);

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, candidates })
  }

  pub fn candidates(&self) -> &[String] {
    &self.candidates
  }

  /// Try each candidate model in order; return the first successful raw text.
  /// Errs only when every candidate has failed.
  #[instrument(level = "info", skip(self, req), fields(json_mode = req.json_mode, has_image = req.image.is_some()))]
  pub async fn run_failover(&self, req: &ChatRequest<'_>) -> Result<String, String> {
    for model in &self.candidates {
      info!(
        target: "model",
        %model,
        prompt = %trunc_for_log(req.user, 200),
        "Model attempt"
      );
      let start = std::time::Instant::now();
      match self.chat_once(model, req).await {
        Ok(text) => {
          info!(
            target: "model",
            %model,
            elapsed = ?start.elapsed(),
            response = %trunc_for_log(&text, 200),
            "Model attempt succeeded"
          );
          return Ok(text);
        }
        Err(e) => {
          error!(
            target: "model",
            %model,
            elapsed = ?start.elapsed(),
            error = %e,
            "Model attempt failed; trying next candidate"
          );
        }
      }
    }
    Err(format!("all {} candidate models failed", self.candidates.len()))
  }

  /// Plain-text completion through the failover runner.
  pub async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String, String> {
    self
      .run_failover(&ChatRequest { system, user, temperature, json_mode: false, image: None })
      .await
  }

  /// JSON-object completion through the failover runner. Returns the raw
  /// text; callers strip fences and decode.
  pub async fn complete_json(&self, system: &str, user: &str, temperature: f32) -> Result<String, String> {
    self
      .run_failover(&ChatRequest { system, user, temperature, json_mode: true, image: None })
      .await
  }

  /// Vision completion: the prompt plus one attached image.
  pub async fn describe_image(
    &self,
    system: &str,
    user: &str,
    image: ImageAttachment,
  ) -> Result<String, String> {
    self
      .run_failover(&ChatRequest { system, user, temperature: 0.4, json_mode: false, image: Some(image) })
      .await
  }

  /// One chat.completions call against one model. No retries of its own.
  async fn chat_once(&self, model: &str, req: &ChatRequest<'_>) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);

    let user_content = match &req.image {
      None => MessageContent::Text(req.user.into()),
      Some(img) => MessageContent::Parts(vec![
        ContentPart::Text { text: req.user.into() },
        ContentPart::ImageUrl { image_url: ImageUrl { url: image_data_url(&img.mime, &img.bytes) } },
      ]),
    };

    let body = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: MessageContent::Text(req.system.into()) },
        ChatMessageReq { role: "user".into(), content: user_content },
      ],
      temperature: req.temperature,
      response_format: req.json_mode.then(|| ResponseFormat { r#type: "json_object".into() }),
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "sakwe-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&body)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      return Err(format!("backend HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(
        target: "model",
        prompt_tokens = ?usage.prompt_tokens,
        completion_tokens = ?usage.completion_tokens,
        total_tokens = ?usage.total_tokens,
        "Backend usage"
      );
    }
    let text = body
      .choices
      .first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default()
      .trim()
      .to_string();
    if text.is_empty() {
      return Err("empty completion".into());
    }
    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq {
  role: String,
  content: MessageContent,
}
#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
  Text(String),
  Parts(Vec<ContentPart>),
}
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
  Text { text: String },
  ImageUrl { image_url: ImageUrl },
}
#[derive(Serialize)]
struct ImageUrl {
  url: String,
}
#[derive(Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")]
  r#type: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
  content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
  #[serde(default)]
  prompt_tokens: Option<u32>,
  #[serde(default)]
  completion_tokens: Option<u32>,
  #[serde(default)]
  total_tokens: Option<u32>,
}

/// Try to extract a clean error message from a backend error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
