//! A minimal Chat Completions client.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role:    String,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self {
      role:    "system".into(),
      content: content.into(),
    }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role:    "user".into(),
      content: content.into(),
    }
  }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
  model:       &'a str,
  temperature: f32,
  messages:    &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

/// An OpenAI client bound to one model and temperature.
#[derive(Debug, Clone)]
pub struct ChatClient {
  http:        reqwest::Client,
  base_url:    String,
  api_key:     String,
  model:       String,
  temperature: f32,
}

impl ChatClient {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      http:        reqwest::Client::new(),
      base_url:    OPENAI_BASE_URL.into(),
      api_key:     api_key.into(),
      model:       DEFAULT_MODEL.into(),
      temperature: 0.2,
    }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into().trim_end_matches('/').to_string();
    self
  }

  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model = model.into();
    self
  }

  pub fn with_temperature(mut self, temperature: f32) -> Self {
    self.temperature = temperature;
    self
  }

  pub fn model(&self) -> &str { &self.model }

  /// Send `messages` and return the first choice's content.
  pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
    let resp = self
      .http
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .json(&CompletionRequest {
        model: &self.model,
        temperature: self.temperature,
        messages,
      })
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Api {
        status:  status.as_u16(),
        message: body,
      });
    }

    let body: CompletionResponse = resp.json().await?;
    body
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .filter(|c| !c.trim().is_empty())
      .ok_or(Error::EmptyResponse)
  }
}
