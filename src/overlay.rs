use crate::text::wrap_words;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const WRAP_WIDTH: usize = 20;
pub const FONT_SIZE: u32 = 50;
pub const SHADOW_OPACITY: f64 = 0.3;
pub const SHADOW_OFFSET: u32 = 3;
pub const BLINK_RATE: f64 = 8.0;
pub const DIM_FACTOR: f64 = 0.7;

/// Brightness multiplier of the caption at `t` seconds: full on even
/// eighth-second windows, dimmed on odd ones.
pub fn blink_factor(t: f64) -> f64 {
    if (t * BLINK_RATE).floor() as i64 % 2 == 0 {
        1.0
    } else {
        DIM_FACTOR
    }
}

fn dimmed_white() -> String {
    let level = (255.0 * DIM_FACTOR).round() as u8;
    format!("0x{0:02X}{0:02X}{0:02X}", level)
}

fn escape_filter_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

#[derive(Debug, Clone)]
pub struct CaptionOverlay {
    pub text: String,
    pub duration: f64,
    pub textfile: PathBuf,
    pub font_file: Option<PathBuf>,
}

impl CaptionOverlay {
    fn drawtext(&self, color: &str, dx: u32, enable: &str) -> String {
        let mut opts = vec![format!("textfile='{}'", escape_filter_path(&self.textfile))];
        if let Some(font) = &self.font_file {
            opts.push(format!("fontfile='{}'", escape_filter_path(font)));
        }
        opts.push("expansion=none".to_string());
        opts.push(format!("fontsize={}", FONT_SIZE));
        opts.push(format!("fontcolor={}", color));
        opts.push("line_spacing=8".to_string());
        opts.push(format!("x=(w-text_w)/2+{}", dx));
        opts.push(format!("y=(h-text_h)/2+{}", dx));
        opts.push(format!("enable='{}'", enable));
        format!("drawtext={}", opts.join(":"))
    }

    /// Comma-joined drawtext chain: shadow first, then the blinking
    /// foreground as an "on" and an "off" layer.
    pub fn filter_chain(&self) -> String {
        let held = format!("lt(t,{:.3})", self.duration);
        let window = format!("mod(floor(t*{}),2)", BLINK_RATE);
        [
            self.drawtext(
                &format!("black@{}", SHADOW_OPACITY),
                SHADOW_OFFSET,
                &held,
            ),
            self.drawtext("white", 0, &format!("{}*eq({},0)", held, window)),
            self.drawtext(&dimmed_white(), 0, &format!("{}*eq({},1)", held, window)),
        ]
        .join(",")
    }
}

pub struct OverlayComposer {
    font_file: Option<PathBuf>,
}

impl OverlayComposer {
    pub fn new(font_file: Option<PathBuf>) -> Self {
        Self { font_file }
    }

    pub async fn compose(&self, text: &str, duration: f64, scratch: &Path) -> Result<CaptionOverlay> {
        let wrapped = wrap_words(text, WRAP_WIDTH).join("\n");
        let textfile = scratch.join("caption.txt");
        fs::write(&textfile, wrapped.as_bytes())
            .await
            .with_context(|| format!("Failed to write caption file {}", textfile.display()))?;

        Ok(CaptionOverlay {
            text: wrapped,
            duration,
            textfile,
            font_file: self.font_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blink_alternates_every_eighth_second() {
        assert_eq!(blink_factor(0.0), 1.0);
        assert_eq!(blink_factor(0.1), 1.0);
        assert_eq!(blink_factor(0.125), 0.7);
        assert_eq!(blink_factor(0.2), 0.7);
        assert_eq!(blink_factor(0.25), 1.0);
        assert_eq!(blink_factor(0.375), 0.7);
        assert_eq!(blink_factor(10.0), 1.0);
    }

    #[test]
    fn dim_colour_is_seventy_percent_white() {
        assert_eq!(dimmed_white(), "0xB3B3B3");
    }

    #[tokio::test]
    async fn compose_wraps_and_writes_textfile() {
        let scratch = tempfile::tempdir().unwrap();
        let composer = OverlayComposer::new(None);
        let overlay = composer
            .compose("Ancient Egyptians invented wifi but forgot the password", 15.0, scratch.path())
            .await
            .unwrap();

        assert!(overlay.text.lines().all(|l| l.chars().count() <= WRAP_WIDTH));
        assert!(overlay.text.lines().count() > 1);
        let on_disk = std::fs::read_to_string(&overlay.textfile).unwrap();
        assert_eq!(on_disk, overlay.text);
    }

    #[test]
    fn filter_chain_layers_shadow_under_blinking_text() {
        let overlay = CaptionOverlay {
            text: "Test caption".to_string(),
            duration: 5.0,
            textfile: PathBuf::from("/tmp/run/caption.txt"),
            font_file: Some(PathBuf::from("/fonts/Bold.ttf")),
        };
        let chain = overlay.filter_chain();
        let layers: Vec<&str> = chain.split(",drawtext=").collect();
        assert_eq!(layers.len(), 3);
        assert!(layers[0].contains("fontcolor=black@0.3"));
        assert!(layers[0].contains("x=(w-text_w)/2+3"));
        assert!(layers[1].contains("fontcolor=white"));
        assert!(layers[1].contains("eq(mod(floor(t*8),2),0)"));
        assert!(layers[2].contains("fontcolor=0xB3B3B3"));
        assert!(layers[2].contains("eq(mod(floor(t*8),2),1)"));
        assert!(chain.contains("lt(t,5.000)"));
        assert!(chain.contains("textfile='/tmp/run/caption.txt'"));
        assert!(chain.contains("fontfile='/fonts/Bold.ttf'"));
        assert!(chain.contains("fontsize=50"));
    }

    #[test]
    fn windows_paths_are_escaped() {
        assert_eq!(
            escape_filter_path(Path::new("C:\\tmp\\caption.txt")),
            "C\\:/tmp/caption.txt"
        );
    }
}
