use crate::background::BackgroundClip;
use crate::ffmpeg::{self, H264_ARGS};
use crate::narration::NarrationTrack;
use crate::overlay::CaptionOverlay;
use crate::{logi, logok};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

pub const TARGET_WIDTH: u32 = 1080;
pub const TARGET_HEIGHT: u32 = 1920;
pub const OUTPUT_FPS: u32 = 24;

#[derive(Debug, Clone)]
pub struct OutputVideo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub audio_codec: Option<&'static str>,
    pub rendered_at: DateTime<Local>,
}

/// Length of the composite: the longest of the three layers.
pub fn output_duration(
    background: &BackgroundClip,
    overlay: &CaptionOverlay,
    narration: Option<&NarrationTrack>,
) -> f64 {
    background
        .duration
        .max(overlay.duration)
        .max(narration.map_or(0.0, |n| n.duration))
}

/// Full ffmpeg argument list (without the quiet/overwrite prefix) for the
/// final composite.
pub fn build_render_args(
    background: &BackgroundClip,
    overlay: &CaptionOverlay,
    narration: Option<&NarrationTrack>,
    out: &Path,
) -> Vec<String> {
    let mut args = vec!["-i".to_string(), background.path.display().to_string()];
    if let Some(track) = narration {
        args.push("-i".to_string());
        args.push(track.path.display().to_string());
    }

    // Footage shorter than the caption holds its last frame.
    let length = output_duration(background, overlay, narration);
    let pad = length - background.duration;
    let hold = if pad > 0.0 {
        format!("tpad=stop_mode=clone:stop_duration={:.3},", pad)
    } else {
        String::new()
    };

    let filter = format!(
        "[0:v]{}{},scale={}:{},setsar=1,fps={}[v]",
        hold,
        overlay.filter_chain(),
        TARGET_WIDTH,
        TARGET_HEIGHT,
        OUTPUT_FPS
    );
    args.extend(
        ["-filter_complex", filter.as_str(), "-map", "[v]"]
            .iter()
            .map(|s| s.to_string()),
    );

    match narration {
        Some(_) => args.extend(
            ["-map", "1:a", "-c:a", "aac", "-b:a", "192k"]
                .iter()
                .map(|s| s.to_string()),
        ),
        None => args.push("-an".to_string()),
    }

    args.extend(H264_ARGS.iter().map(|s| s.to_string()));
    args.extend(
        [
            "-r".to_string(),
            OUTPUT_FPS.to_string(),
            "-t".to_string(),
            format!("{:.3}", length),
            "-movflags".to_string(),
            "+faststart".to_string(),
            out.display().to_string(),
        ]
        .into_iter(),
    );
    args
}

pub struct Renderer;

impl Renderer {
    pub async fn render(
        &self,
        background: &BackgroundClip,
        overlay: &CaptionOverlay,
        narration: Option<&NarrationTrack>,
        out: &Path,
    ) -> Result<OutputVideo> {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }

        logi("Rendering video...");
        let args = build_render_args(background, overlay, narration, out);
        ffmpeg::run_ffmpeg(args, out)
            .await
            .with_context(|| format!("Render failed for {}", out.display()))?;
        logok(format!("Video created: {}", out.display()));

        Ok(OutputVideo {
            path: out.to_path_buf(),
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
            fps: OUTPUT_FPS,
            audio_codec: narration.map(|_| "aac"),
            rendered_at: Local::now(),
        })
    }
}
