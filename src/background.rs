use crate::config::Config;
use crate::ffmpeg::{self, RawVideoEncoder};
use crate::render::{OUTPUT_FPS, TARGET_HEIGHT, TARGET_WIDTH};
use crate::{logi, logok};
use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "webm", "mkv"];

/// Pink, cyan, yellow.
pub const GRADIENT_PALETTE: [[u8; 3]; 3] = [[255, 0, 128], [0, 255, 255], [255, 255, 0]];

/// Rows advanced per second by the synthetic gradient.
const GRADIENT_SPEED: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSource {
    Footage(PathBuf),
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct BackgroundClip {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub fps: f64,
    pub source: BackgroundSource,
}

/// How a source frame is brought to 9:16 before the forced 1080x1920 resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalFit {
    Crop { x: u32, width: u32, height: u32 },
    Resize { width: u32, height: u32 },
}

impl VerticalFit {
    pub fn width(&self) -> u32 {
        match *self {
            VerticalFit::Crop { width, .. } | VerticalFit::Resize { width, .. } => width,
        }
    }

    /// `-vf` chain: the 9:16 step followed by the canvas resize.
    pub fn filter(&self) -> String {
        let first = match *self {
            VerticalFit::Crop { x, width, height } => {
                format!("crop={}:{}:{}:0", width, height, x)
            }
            VerticalFit::Resize { width, height } => format!("scale={}:{}", width, height),
        };
        format!("{},scale={}:{},setsar=1", first, TARGET_WIDTH, TARGET_HEIGHT)
    }
}

pub fn plan_vertical_fit(width: u32, height: u32) -> VerticalFit {
    let target_w = (height as u64 * 9 / 16) as u32;
    if target_w <= width {
        let x = width / 2 - target_w / 2;
        VerticalFit::Crop {
            x,
            width: target_w,
            height,
        }
    } else {
        VerticalFit::Resize {
            width: target_w,
            height,
        }
    }
}

fn gradient_row_index(row: u32, t: f64) -> usize {
    let n = GRADIENT_PALETTE.len();
    (((row as f64 + t * GRADIENT_SPEED) % n as f64) as usize).min(n - 1)
}

pub fn gradient_row_color(row: u32, t: f64) -> [u8; 3] {
    GRADIENT_PALETTE[gradient_row_index(row, t)]
}

/// Fills an `rgb24` frame with one palette colour per row.
pub fn fill_gradient_frame(frame: &mut [u8], width: u32, t: f64, row_templates: &[Vec<u8>; 3]) {
    let stride = width as usize * 3;
    for (row, line) in frame.chunks_exact_mut(stride).enumerate() {
        line.copy_from_slice(&row_templates[gradient_row_index(row as u32, t)]);
    }
}

pub fn list_background_videos(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(OsStr::to_str)
                .map(|ext| {
                    VIDEO_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
                .unwrap_or(false)
        })
        .collect();
    out.sort();
    out
}

pub struct BackgroundProvider {
    dir: PathBuf,
    synthetic_seconds: f64,
}

impl BackgroundProvider {
    pub fn new(cfg: &Config) -> Self {
        Self {
            dir: cfg.background_videos_dir.clone(),
            synthetic_seconds: cfg.synthetic_background_seconds,
        }
    }

    pub fn choose_footage<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PathBuf> {
        list_background_videos(&self.dir).choose(rng).cloned()
    }

    pub async fn acquire<R: Rng + ?Sized>(&self, rng: &mut R, scratch: &Path) -> Result<BackgroundClip> {
        match self.choose_footage(rng) {
            Some(footage) => self.prepare_footage(&footage, scratch).await,
            None => {
                logi("No background videos found. Creating default background...");
                self.synthesize(scratch).await
            }
        }
    }

    async fn prepare_footage(&self, footage: &Path, scratch: &Path) -> Result<BackgroundClip> {
        logi(format!("Background footage: {}", footage.display()));
        let (w, h) = ffmpeg::ffprobe_video_dimensions(footage).await?;
        let fit = plan_vertical_fit(w, h);
        logi(format!("Fitting {}x{} -> {:?}", w, h, fit));

        let out = scratch.join("background.mp4");
        ffmpeg::ffmpeg_filter_video(footage, &fit.filter(), &out)
            .await
            .with_context(|| format!("Failed to reframe {}", footage.display()))?;

        let duration = ffmpeg::ffprobe_duration_seconds(&out).await?;
        let fps = ffmpeg::ffprobe_frame_rate(&out).await?;
        logok(format!("Background ready: {:.2}s @ {:.2} fps", duration, fps));

        Ok(BackgroundClip {
            path: out,
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
            duration,
            fps,
            source: BackgroundSource::Footage(footage.to_path_buf()),
        })
    }

    async fn synthesize(&self, scratch: &Path) -> Result<BackgroundClip> {
        let out = scratch.join("background_synthetic.mp4");
        let frames = (self.synthetic_seconds * OUTPUT_FPS as f64).round() as usize;
        let row_templates: [Vec<u8>; 3] =
            GRADIENT_PALETTE.map(|c| c.repeat(TARGET_WIDTH as usize));

        let mut encoder = RawVideoEncoder::spawn(TARGET_WIDTH, TARGET_HEIGHT, OUTPUT_FPS, &out)?;
        let mut frame = vec![0u8; TARGET_WIDTH as usize * TARGET_HEIGHT as usize * 3];
        for i in 0..frames {
            let t = i as f64 / OUTPUT_FPS as f64;
            fill_gradient_frame(&mut frame, TARGET_WIDTH, t, &row_templates);
            encoder.write_frame(&frame).await?;
        }
        encoder.finish().await?;
        logok(format!("Synthetic background ready: {:.0}s", self.synthetic_seconds));

        Ok(BackgroundClip {
            path: out,
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
            duration: self.synthetic_seconds,
            fps: OUTPUT_FPS as f64,
            source: BackgroundSource::Synthetic,
        })
    }
}
