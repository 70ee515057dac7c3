use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "groq_api_key")]
    pub api_key: String,
    #[serde(default = "default_groq_url")]
    pub groq_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_background_dir")]
    pub background_videos_dir: PathBuf,
    #[serde(default = "default_effects_dir")]
    pub audio_effects_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_caption_seconds")]
    pub caption_seconds: f64,
    #[serde(default = "default_synthetic_seconds")]
    pub synthetic_background_seconds: f64,
    #[serde(default = "default_videos_per_run")]
    pub videos_per_run: u32,
    #[serde(default = "default_speech_speed")]
    pub speech_speed: f64,
    #[serde(default = "default_tts_lang")]
    pub tts_lang: String,
    #[serde(default)]
    pub font_file: Option<PathBuf>,
    #[serde(default)]
    pub gameplay_urls: Vec<String>,
    #[serde(default)]
    pub announce_uploads: bool,
}

fn default_groq_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_max_tokens() -> u32 {
    100
}

fn default_background_dir() -> PathBuf {
    PathBuf::from("background_videos")
}

fn default_effects_dir() -> PathBuf {
    PathBuf::from("audio_effects")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output_videos")
}

fn default_caption_seconds() -> f64 {
    15.0
}

fn default_synthetic_seconds() -> f64 {
    60.0
}

fn default_videos_per_run() -> u32 {
    3
}

fn default_speech_speed() -> f64 {
    1.1
}

fn default_tts_lang() -> String {
    "en".to_string()
}

impl Config {
    /// Config with every optional field at its default.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            groq_url: default_groq_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            background_videos_dir: default_background_dir(),
            audio_effects_dir: default_effects_dir(),
            output_dir: default_output_dir(),
            caption_seconds: default_caption_seconds(),
            synthetic_background_seconds: default_synthetic_seconds(),
            videos_per_run: default_videos_per_run(),
            speech_speed: default_speech_speed(),
            tts_lang: default_tts_lang(),
            font_file: None,
            gameplay_urls: Vec::new(),
            announce_uploads: false,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text).context("Failed to parse config JSON")?;

        if config.api_key.is_empty() {
            anyhow::bail!("config.json: groq_api_key missing");
        }
        if config.caption_seconds <= 0.0 {
            anyhow::bail!("config.json: caption_seconds must be positive");
        }
        if config.speech_speed <= 0.0 {
            anyhow::bail!("config.json: speech_speed must be positive");
        }
        if config.synthetic_background_seconds <= 0.0 {
            anyhow::bail!("config.json: synthetic_background_seconds must be positive");
        }
        if config.videos_per_run == 0 {
            anyhow::bail!("config.json: videos_per_run must be at least 1");
        }

        Ok(config)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        Self::from_json(&content)
    }

    pub fn asset_dirs(&self) -> [&Path; 3] {
        [
            self.background_videos_dir.as_path(),
            self.audio_effects_dir.as_path(),
            self.output_dir.as_path(),
        ]
    }
}
