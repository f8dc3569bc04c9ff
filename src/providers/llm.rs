use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::LanguageModel;
use crate::booking::CONFIRMATION_MARKER;
use crate::config::LlmConfig;

pub const EMPTY_INPUT_REPLY: &str = "I didn't catch that. Could you please repeat?";
pub const FAILURE_REPLY: &str = "I'm having trouble processing that right now. Could you try again?";

/// Call script given to the model as the system message
pub fn system_prompt() -> String {
    format!(
        "You are a polite and professional DropTruck AI sales agent on a phone call about a \
customer's truck enquiry.

Follow this call script:
1. Greet briefly: \"Hello, this is DropTruck AI sales agent calling about your enquiry. How can I assist you today?\"
2. Listen to the customer's full request and acknowledge it.
3. Ask for the pickup and drop-off cities.
4. Ask for the truck type and body type (open or container).
5. If the customer is unsure, ask what material they are moving and suggest at most 2-3 vehicles from: \
Tata Ace, Dost, Bolero, Bada Dost, 407, 12-24 feet trucks, 32 feet multi-axle, trailers \
(20/24/40 feet low-bed, semi-bed, high-bed), 6-16 wheel trucks, car-carrier, part-load.
6. Collect any remaining details: material and required date of the trip.
7. Confirm: \"Let me confirm your requirement. Pickup from [pickup], drop to [drop], truck type [truck], \
body type [body], material [material], required on [date]. Is this correct?\"
8. Close. If the customer confirms, say \"Thank you. Our sales person will contact you soon.\" and append \
{marker} at the very end. If the customer is not interested, say \"Thank you for your time. If you need any \
truck service in future, you can contact DropTruck anytime.\"

Rules: keep every reply to 1-3 short, voice-friendly sentences. Never mention APIs, JSON, speech \
providers, language models or any other system internals.",
        marker = CONFIRMATION_MARKER
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// OpenAI-compatible chat completion client with a bounded history
pub struct ChatClient {
    client: Client,
    config: LlmConfig,
    system: ChatMessage,
    history: Vec<ChatMessage>,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        if config.api_key.is_empty() {
            warn!("No LLM API key configured, replies will echo the caller");
        }

        Ok(Self {
            client,
            config,
            system: ChatMessage::new(ChatRole::System, system_prompt()),
            history: Vec::new(),
        })
    }

    pub fn is_echo_mode(&self) -> bool {
        self.config.api_key.is_empty()
    }

    /// System prompt plus the most recent exchanges
    pub fn recent_messages(&self) -> Vec<&ChatMessage> {
        let keep = self.config.history_window * 2;
        let start = self.history.len().saturating_sub(keep);

        std::iter::once(&self.system)
            .chain(self.history[start..].iter())
            .collect()
    }

    async fn complete(&self) -> Result<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: self.recent_messages(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Calling LLM with {} messages", request.messages.len());

        let response = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("LLM request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "LLM API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            ));
        }

        let completion: CompletionResponse =
            response.json().await.context("Invalid LLM response")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| anyhow!("LLM response had no choices"))
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn respond(&mut self, user_text: &str) -> String {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return EMPTY_INPUT_REPLY.to_string();
        }

        if self.is_echo_mode() {
            return format!("[Echo Mode] You said: {}", user_text);
        }

        self.history.push(ChatMessage::new(ChatRole::User, user_text));

        match self.complete().await {
            Ok(reply) => {
                info!("LLM replied ({} chars)", reply.len());
                self.history
                    .push(ChatMessage::new(ChatRole::Assistant, reply.clone()));
                reply
            }
            Err(e) => {
                error!("LLM error: {:#}", e);
                FAILURE_REPLY.to_string()
            }
        }
    }
}
