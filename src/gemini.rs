use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;

pub const CHAT_FALLBACK: &str = "Sorry, I couldn't process your request.";
pub const SUMMARY_FALLBACK: &str = "Failed to summarize.";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(client: Client, config: &GeminiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Free-form chat turn. Failures collapse into a canned apology.
    pub async fn chat(&self, prompt: &str) -> String {
        match self.generate_text(prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!("chat completion failed: {:#}", err);
                CHAT_FALLBACK.to_string()
            }
        }
    }

    pub async fn summarize(&self, transcript: &str) -> String {
        let prompt = format!("Summarize this transcript: {transcript}");
        match self.generate_text(&prompt).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!("transcript summary failed: {:#}", err);
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct GenerateReq<'a> {
            contents: [Content<'a>; 1],
        }

        #[derive(Serialize)]
        struct Content<'a> {
            parts: [Part<'a>; 1],
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct GenerateResp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<CandidatePart>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            #[serde(default)]
            text: String,
        }

        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("GEMINI_API_KEY is not configured");
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&GenerateReq {
                contents: [Content {
                    parts: [Part { text: prompt }],
                }],
            })
            .send()
            .await
            .context("failed to call gemini generateContent endpoint")?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "gemini generateContent returned {status}: {}",
                normalize_err_body(&body)
            );
        }

        let response = response
            .json::<GenerateResp>()
            .await
            .context("failed to decode gemini generateContent response")?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| anyhow::anyhow!("gemini returned no candidates"))?;

        Ok(text.trim().to_string())
    }
}

fn normalize_err_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(err) = json
            .get("error")
            .and_then(|v| v.get("message"))
            .and_then(|v| v.as_str())
        {
            return err.to_string();
        }
    }

    trimmed.to_string()
}
