use crate::api::groq;
use crate::config::Config;
use crate::{logi, logw};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use reqwest::Client;

pub const FALLBACK_CONTENT: &str = "Default brain rot content here";

pub const PROMPTS: [&str; 5] = [
    "Write a shocking 'fun fact' about ancient civilizations that sounds crazy but educational. Keep it under 50 words.",
    "Create a mind-blowing conspiracy theory about everyday objects that's obviously fake but entertaining. Under 50 words.",
    "Write a 'sigma grindset' motivational quote that's so over the top it's funny. Under 30 words.",
    "Create a fake 'leaked' conversation between two historical figures about modern technology. Under 60 words.",
    "Write a 'life hack' that's completely absurd but sounds convincing. Under 40 words.",
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Where caption/narration text comes from.
#[async_trait]
pub trait TextSource: Send {
    /// Always yields usable text; failures are absorbed by the implementation.
    async fn generate(&mut self) -> String;
}

pub fn pick_prompt<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    PROMPTS.choose(rng).copied().unwrap_or(PROMPTS[0])
}

/// Collapses whitespace runs and strips quote marks wrapped around the whole reply.
pub fn clean_generated_text(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let mut text = collapsed.as_ref();
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            if !inner.contains(open) && !inner.contains(close) {
                text = inner.trim();
            }
        }
    }
    text.to_string()
}

pub struct ContentGenerator {
    client: Client,
    cfg: Config,
    rng: StdRng,
}

impl ContentGenerator {
    pub fn new(client: Client, cfg: Config, seed: u64) -> Self {
        Self {
            client,
            cfg,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

#[async_trait]
impl TextSource for ContentGenerator {
    async fn generate(&mut self) -> String {
        let prompt = pick_prompt(&mut self.rng);
        logi(format!("Prompt: {}", prompt));

        match groq::chat_completion(&self.client, &self.cfg, prompt).await {
            Ok(reply) => {
                let text = clean_generated_text(&reply);
                if text.is_empty() {
                    logw("Error generating content: empty reply");
                    FALLBACK_CONTENT.to_string()
                } else {
                    text
                }
            }
            Err(err) => {
                logw(format!("Error generating content: {:#}", err));
                FALLBACK_CONTENT.to_string()
            }
        }
    }
}

/// Fixed text, for dry runs and tests.
pub struct StaticText(pub String);

#[async_trait]
impl TextSource for StaticText {
    async fn generate(&mut self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the chat completions URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });
        format!("http://{}/openai/v1/chat/completions", addr)
    }

    async fn generate_against(status: &'static str, body: &'static str) -> String {
        let mut cfg = Config::with_api_key("gsk_test");
        cfg.groq_url = serve_once(status, body).await;
        ContentGenerator::new(Client::new(), cfg, 42).generate().await
    }

    #[test]
    fn prompts_come_from_the_fixed_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let prompt = pick_prompt(&mut rng);
            assert!(PROMPTS.contains(&prompt));
            seen.insert(prompt);
        }
        assert_eq!(seen.len(), PROMPTS.len());
    }

    #[test]
    fn cleaning_strips_wrapping_quotes_and_spaces() {
        assert_eq!(
            clean_generated_text("  \"Grind so hard\n\n your shadow\tclocks in.\"  "),
            "Grind so hard your shadow clocks in."
        );
        assert_eq!(clean_generated_text("\u{201c}Sleep is a myth.\u{201d}"), "Sleep is a myth.");
        assert_eq!(
            clean_generated_text("\"A\" said Caesar to \"B\""),
            "\"A\" said Caesar to \"B\""
        );
        assert_eq!(clean_generated_text("   "), "");
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back() {
        let mut cfg = Config::with_api_key("gsk_test");
        cfg.groq_url = "http://127.0.0.1:9/openai/v1/chat/completions".to_string();
        let mut generator = ContentGenerator::new(Client::new(), cfg, 42);

        let text = generator.generate().await;
        assert_eq!(text, FALLBACK_CONTENT);
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn server_error_falls_back() {
        let body = r#"{"error":{"message":"upstream down","type":"server_error"}}"#;
        assert_eq!(generate_against("500 Internal Server Error", body).await, FALLBACK_CONTENT);
    }

    #[tokio::test]
    async fn server_error_is_reported_with_its_status() {
        let mut cfg = Config::with_api_key("gsk_test");
        cfg.groq_url = serve_once("500 Internal Server Error", "{}").await;
        let err = groq::chat_completion(&Client::new(), &cfg, "hi").await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"), "{err:#}");
    }

    #[tokio::test]
    async fn empty_choices_fall_back() {
        assert_eq!(generate_against("200 OK", r#"{"choices":[]}"#).await, FALLBACK_CONTENT);
    }

    #[tokio::test]
    async fn blank_quoted_reply_falls_back() {
        let body = r#"{"choices":[{"message":{"content":"  \"\" "}}]}"#;
        assert_eq!(generate_against("200 OK", body).await, FALLBACK_CONTENT);
    }

    #[tokio::test]
    async fn good_reply_is_cleaned() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" \"Pyramids  had wifi.\" "}}]}"#;
        assert_eq!(generate_against("200 OK", body).await, "Pyramids had wifi.");
    }

    #[tokio::test]
    async fn static_text_is_returned_verbatim() {
        let mut source = StaticText("Test caption".to_string());
        assert_eq!(source.generate().await, "Test caption");
    }
}
