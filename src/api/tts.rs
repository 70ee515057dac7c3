use crate::config::Config;
use crate::logi;
use crate::text::wrap_words;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tokio::fs;

const TTS_URL: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 100;

/// Turns text into an mp3 file.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn synthesize_to(&self, text: &str, out_mp3_path: &Path) -> Result<()>;
}

/// The Google Translate speech endpoint, the same service gTTS talks to.
pub struct GoogleTts {
    client: Client,
    lang: String,
}

impl GoogleTts {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            lang: cfg.tts_lang.clone(),
        }
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> Result<Vec<u8>> {
        let idx_s = idx.to_string();
        let total_s = total.to_string();
        let len_s = chunk.chars().count().to_string();
        let resp = self
            .client
            .get(TTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.lang.as_str()),
                ("q", chunk),
                ("idx", idx_s.as_str()),
                ("total", total_s.as_str()),
                ("textlen", len_s.as_str()),
            ])
            .header("Referer", "https://translate.google.com/")
            .header(
                "User-Agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
            )
            .timeout(std::time::Duration::from_secs(60))
            .send()
            .await
            .context("TTS request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("TTS HTTP {} for chunk {}/{}", status.as_u16(), idx + 1, total);
        }

        let bytes = resp.bytes().await.context("TTS response read failed")?;
        if bytes.is_empty() {
            anyhow::bail!("TTS returned empty audio for chunk {}/{}", idx + 1, total);
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechEngine for GoogleTts {
    async fn synthesize_to(&self, text: &str, out_mp3_path: &Path) -> Result<()> {
        let chunks = wrap_words(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("nothing to speak");
        }

        logi(format!("TTS: {} chunk(s), lang={}", chunks.len(), self.lang));
        let mut mp3 = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            // mp3 frames are self-delimiting, so chunks concatenate directly
            mp3.extend(self.fetch_chunk(chunk, idx, chunks.len()).await?);
        }

        if let Some(parent) = out_mp3_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }
        fs::write(out_mp3_path, &mp3)
            .await
            .with_context(|| format!("Failed to write {}", out_mp3_path.display()))?;
        Ok(())
    }
}
