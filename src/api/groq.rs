use crate::config::Config;
use crate::logw;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;

fn log_error_object(root: &serde_json::Value) {
    let Some(err) = root.get("error") else {
        return;
    };
    if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
        logw(format!("Chat API error message: {}", msg));
    }
    if let Some(typ) = err.get("type").and_then(|v| v.as_str()) {
        logw(format!("Chat API error type: {}", typ));
    }
    if let Some(code) = err.get("code").and_then(|v| v.as_str()) {
        logw(format!("Chat API error code: {}", code));
    }
}

/// Pulls `choices[0].message.content` out of a chat-completion body.
pub fn extract_message_content(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if root.get("error").is_some() {
        log_error_object(&root);
        return None;
    }

    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Sends a single user message and returns the assistant's reply.
pub async fn chat_completion(client: &Client, cfg: &Config, prompt: &str) -> Result<String> {
    let body = json!({
        "model": cfg.model,
        "messages": [
            {"role": "user", "content": prompt},
        ],
        "max_tokens": cfg.max_tokens,
    });

    let resp = client
        .post(&cfg.groq_url)
        .bearer_auth(&cfg.api_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(60))
        .send()
        .await
        .context("Chat completion request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        if let Ok(root) = serde_json::from_str::<serde_json::Value>(&raw) {
            log_error_object(&root);
        }
        anyhow::bail!("Chat completion HTTP {}", status.as_u16());
    }

    extract_message_content(&raw).with_context(|| {
        let snippet = raw.chars().take(200).collect::<String>();
        format!("Chat completion response parse failed (body starts: {})", snippet)
    })
}
