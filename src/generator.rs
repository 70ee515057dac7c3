use crate::api::tts::{GoogleTts, SpeechEngine};
use crate::background::BackgroundProvider;
use crate::config::Config;
use crate::content::{ContentGenerator, TextSource};
use crate::download;
use crate::narration::NarrationSynthesizer;
use crate::overlay::OverlayComposer;
use crate::render::{OutputVideo, Renderer};
use crate::upload::SocialMediaPoster;
use crate::{logi, logok};
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    ContentGenerated,
    BackgroundAcquired,
    OverlayComposed,
    NarrationSynthesized,
    Rendered,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::ContentGenerated => "content generated",
            PipelineStage::BackgroundAcquired => "background acquired",
            PipelineStage::OverlayComposed => "overlay composed",
            PipelineStage::NarrationSynthesized => "narration synthesized",
            PipelineStage::Rendered => "rendered",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// One text source, one speech engine and the stage helpers, driven
/// sequentially once per output file.
pub struct BrainrotGenerator {
    cfg: Config,
    source: Box<dyn TextSource>,
    background: BackgroundProvider,
    composer: OverlayComposer,
    narrator: NarrationSynthesizer,
    renderer: Renderer,
    rng: StdRng,
    stage: PipelineStage,
}

impl BrainrotGenerator {
    pub fn new(cfg: Config, source: Box<dyn TextSource>, speech: Box<dyn SpeechEngine>) -> Self {
        Self::with_seed(cfg, source, speech, now_seed())
    }

    pub fn with_seed(
        cfg: Config,
        source: Box<dyn TextSource>,
        speech: Box<dyn SpeechEngine>,
        seed: u64,
    ) -> Self {
        Self {
            background: BackgroundProvider::new(&cfg),
            composer: OverlayComposer::new(cfg.font_file.clone()),
            narrator: NarrationSynthesizer::new(speech, &cfg),
            renderer: Renderer,
            rng: StdRng::seed_from_u64(seed),
            stage: PipelineStage::Idle,
            source,
            cfg,
        }
    }

    /// Wires the remote text and speech services from `cfg`.
    pub fn from_config(cfg: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let source = ContentGenerator::new(client.clone(), cfg.clone(), now_seed());
        let speech = GoogleTts::new(client, &cfg);
        Ok(Self::new(cfg, Box::new(source), Box::new(speech)))
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn advance(&mut self, stage: PipelineStage) {
        self.stage = stage;
        logi(format!("stage: {}", stage));
    }

    pub fn output_path(&self, index: u32) -> PathBuf {
        self.cfg
            .output_dir
            .join(format!("brainrot_video_{}.mp4", index))
    }

    /// Runs the full pipeline once and writes `output`.
    pub async fn create_video(&mut self, output: &Path) -> Result<(String, OutputVideo)> {
        self.stage = PipelineStage::Idle;
        let scratch = tempfile::Builder::new()
            .prefix("brainrot-")
            .tempdir()
            .context("Failed to create scratch directory")?;

        logi("Generating brain rot content...");
        let content = self.source.generate().await;
        logi(format!("Generated content: {}", content));
        self.advance(PipelineStage::ContentGenerated);

        let background = self.background.acquire(&mut self.rng, scratch.path()).await?;
        self.advance(PipelineStage::BackgroundAcquired);

        let overlay = self
            .composer
            .compose(&content, self.cfg.caption_seconds, scratch.path())
            .await?;
        self.advance(PipelineStage::OverlayComposed);

        let narration = self
            .narrator
            .synthesize(&content, &mut self.rng, scratch.path())
            .await?;
        self.advance(PipelineStage::NarrationSynthesized);

        let video = self
            .renderer
            .render(&background, &overlay, Some(&narration), output)
            .await?;
        self.advance(PipelineStage::Rendered);

        drop(scratch);
        self.advance(PipelineStage::Done);
        Ok((content, video))
    }
}

pub async fn run_generation(cfg: Config) -> Result<Vec<OutputVideo>> {
    if !cfg.gameplay_urls.is_empty() {
        download::download_gameplay_footage(&cfg).await;
    }

    let poster = SocialMediaPoster::new();
    let mut generator = BrainrotGenerator::from_config(cfg.clone())?;
    let mut made = Vec::new();

    for i in 1..=cfg.videos_per_run {
        let out = generator.output_path(i);
        logi(format!("=== Video {}/{} ===", i, cfg.videos_per_run));
        let (content, video) = generator.create_video(&out).await?;
        logok(format!("Created: {}", video.path.display()));

        if cfg.announce_uploads {
            poster.upload_to_youtube_shorts(&video.path, &content, "#shorts #brainrot");
            poster.upload_to_instagram_reels(&video.path, &content);
        }
        made.push(video);
    }

    logi(format!("All done. Videos created: {}", made.len()));
    Ok(made)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticText;
    use async_trait::async_trait;

    struct NoSpeech;

    #[async_trait]
    impl SpeechEngine for NoSpeech {
        async fn synthesize_to(&self, _text: &str, _out: &Path) -> Result<()> {
            anyhow::bail!("speech disabled")
        }
    }

    #[test]
    fn outputs_are_numbered_inside_output_dir() {
        let mut cfg = Config::with_api_key("k");
        cfg.output_dir = PathBuf::from("renders");
        let generator = BrainrotGenerator::with_seed(
            cfg,
            Box::new(StaticText("x".to_string())),
            Box::new(NoSpeech),
            1,
        );
        assert_eq!(generator.output_path(1), PathBuf::from("renders/brainrot_video_1.mp4"));
        assert_eq!(generator.output_path(3), PathBuf::from("renders/brainrot_video_3.mp4"));
        assert_eq!(generator.stage(), PipelineStage::Idle);
    }

    #[test]
    fn stages_have_readable_names() {
        assert_eq!(PipelineStage::NarrationSynthesized.to_string(), "narration synthesized");
        assert_eq!(PipelineStage::Done.to_string(), "done");
    }
}
