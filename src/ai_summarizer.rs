use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use backoff::ExponentialBackoffBuilder;
use log::debug;

use crate::config::Config;

const SYSTEM_PROMPT: &str = r#"
    You condense short football match reports.

    Rewrite the report you are given as a single factual sentence.
    Always name both teams and give the final score. Do not invent scorers, minutes,
    or any detail that is not in the report. No emojis, no hashtags.
    "#;

/// Anything that can shorten a paragraph of text.
///
/// `max_length` is an upper bound on the size of the answer, in model tokens.
#[allow(async_fn_in_trait)]
pub trait Summarizer {
    async fn summarize(&self, text: &str, max_length: u32) -> Result<String>;
}

pub struct OpenAiSummarizer {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiSummarizer {
    /// `api_base` points the client at an OpenAI-compatible endpoint.
    ///
    /// One attempt per call: the client's built-in retries on 5xx and 429 are
    /// switched off so a failing model costs at most `timeout` per match.
    pub fn new(api_key: &str, api_base: Option<&str>, model: &str, timeout: Duration) -> Self {
        let mut openai_config = OpenAIConfig::default().with_api_key(api_key);
        if let Some(base) = api_base {
            openai_config = openai_config.with_api_base(base.trim_end_matches('/'));
        }
        let single_attempt = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        OpenAiSummarizer {
            client: Client::with_config(openai_config).with_backoff(single_attempt),
            model: model.to_string(),
            timeout,
        }
    }
}

impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str, max_length: u32) -> Result<String> {
        debug!("Building OpenAI request with model: {}", self.model);
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessage::from(SYSTEM_PROMPT).into(),
                ChatCompletionRequestUserMessage::from(text).into(),
            ])
            .max_tokens(max_length)
            .build()
            .context("Failed to build OpenAI request")?;

        let start_time = Instant::now();
        let response = match tokio::time::timeout(self.timeout, self.client.chat().create(request)).await {
            Ok(Ok(response)) => {
                debug!("OpenAI API call completed in {:?}", start_time.elapsed());
                response
            }
            Ok(Err(api_error)) => {
                return Err(anyhow::anyhow!("OpenAI API error: {}", api_error));
            }
            Err(_) => {
                anyhow::bail!("OpenAI API call timed out after {:?}", self.timeout);
            }
        };

        for choice in response.choices {
            if let Some(content) = choice.message.content {
                let content = content.trim();
                if !content.is_empty() {
                    return Ok(content.to_string());
                }
            }
        }

        anyhow::bail!("No valid content in OpenAI response")
    }
}

/// Used with `--no-ai` or when no API key is configured. Every call fails, so
/// callers take their template path.
pub struct DisabledSummarizer;

impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _text: &str, _max_length: u32) -> Result<String> {
        anyhow::bail!("Summarization is disabled")
    }
}

pub enum Backend {
    OpenAi(OpenAiSummarizer),
    Disabled(DisabledSummarizer),
}

impl Backend {
    pub fn from_config(cfg: &Config, no_ai: bool) -> Self {
        match (&cfg.api_key, no_ai) {
            (Some(key), false) => Backend::OpenAi(OpenAiSummarizer::new(
                key,
                cfg.api_base.as_deref(),
                &cfg.model,
                cfg.summary_timeout,
            )),
            _ => Backend::Disabled(DisabledSummarizer),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Backend::OpenAi(_))
    }
}

impl Summarizer for Backend {
    async fn summarize(&self, text: &str, max_length: u32) -> Result<String> {
        match self {
            Backend::OpenAi(s) => s.summarize(text, max_length).await,
            Backend::Disabled(s) => s.summarize(text, max_length).await,
        }
    }
}
