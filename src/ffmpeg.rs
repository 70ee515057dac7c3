use crate::error::MediaError;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::ffi::OsStr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};

pub(crate) const H264_ARGS: [&str; 8] = [
    "-c:v", "libx264", "-pix_fmt", "yuv420p", "-preset", "veryfast", "-crf", "22",
];

fn base_args() -> Vec<String> {
    ["-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(crate) async fn run_cmd(tool: &'static str, args: &[String]) -> Result<()> {
    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| MediaError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(MediaError::Failed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(())
}

/// Runs `ffmpeg` with the standard quiet/overwrite prefix prepended.
pub(crate) async fn run_ffmpeg(args: Vec<String>, out: &Path) -> Result<()> {
    let mut full = base_args();
    full.extend(args);
    run_cmd("ffmpeg", &full).await?;

    if !out.exists() {
        return Err(MediaError::MissingOutput(out.display().to_string()).into());
    }
    Ok(())
}

async fn ffprobe(args: &[&str], path: &Path) -> Result<String> {
    let output = Command::new("ffprobe")
        .args(["-v", "error"])
        .args(args)
        .arg(path)
        .output()
        .await
        .map_err(|source| MediaError::Spawn {
            tool: "ffprobe",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaError::Failed {
            tool: "ffprobe",
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub async fn ffprobe_video_dimensions(path: &Path) -> Result<(u32, u32)> {
    let text = ffprobe(
        &[
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ],
        path,
    )
    .await
    .with_context(|| format!("probe dimensions of {}", path.display()))?;

    let mut parts = text.split('x');
    let w = parts.next().and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(0);
    let h = parts.next().and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(0);

    if w == 0 || h == 0 {
        return Err(MediaError::Probe {
            what: "dimensions",
            raw: text,
        }
        .into());
    }

    Ok((w, h))
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let text = ffprobe(
        &[
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ],
        path,
    )
    .await
    .with_context(|| format!("probe duration of {}", path.display()))?;

    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.0 {
        return Err(MediaError::Probe {
            what: "duration",
            raw: text,
        }
        .into());
    }
    Ok(duration)
}

pub async fn ffprobe_frame_rate(path: &Path) -> Result<f64> {
    let text = ffprobe(
        &[
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=r_frame_rate",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ],
        path,
    )
    .await
    .with_context(|| format!("probe frame rate of {}", path.display()))?;

    parse_frame_rate(&text).ok_or_else(|| {
        MediaError::Probe {
            what: "frame rate",
            raw: text,
        }
        .into()
    })
}

/// Parses ffprobe rates such as `30000/1001` or `25`.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let rate = match raw.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f64>().ok()?;
            let den = den.parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse::<f64>().ok()?,
    };
    (rate > 0.0).then_some(rate)
}

/// Re-encodes one video stream through a simple `-vf` chain, dropping audio.
/// Video-only re-encode through `-vf`; the source audio track is dropped.
pub fn filter_video_args(input: &Path, filter: &str, out: &Path) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        input.display().to_string(),
        "-vf".to_string(),
        filter.to_string(),
        "-an".to_string(),
    ];
    args.extend(H264_ARGS.iter().map(|s| s.to_string()));
    args.push(out.display().to_string());
    args
}

pub async fn ffmpeg_filter_video(input: &Path, filter: &str, out: &Path) -> Result<()> {
    run_ffmpeg(filter_video_args(input, filter, out), out).await
}

/// Runs an audio-only filter graph whose final pad is labelled `[a]`, encoding AAC.
pub async fn ffmpeg_audio_graph(inputs: &[&Path], filter: &str, out: &Path) -> Result<()> {
    let mut args = Vec::new();
    for input in inputs {
        args.push("-i".to_string());
        args.push(input.display().to_string());
    }
    args.extend(
        [
            "-filter_complex",
            filter,
            "-map",
            "[a]",
            "-c:a",
            "aac",
            "-b:a",
            "192k",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(out.display().to_string());
    run_ffmpeg(args, out).await
}

/// An ffmpeg process fed raw `rgb24` frames over stdin.
pub struct RawVideoEncoder {
    child: Child,
    stdin: ChildStdin,
    frame_len: usize,
    out: std::path::PathBuf,
}

impl RawVideoEncoder {
    pub fn spawn(width: u32, height: u32, fps: u32, out: &Path) -> Result<Self> {
        Self::spawn_program("ffmpeg", width, height, fps, out)
    }

    /// Same as [`RawVideoEncoder::spawn`] with an explicit ffmpeg binary.
    pub fn spawn_program(
        program: impl AsRef<OsStr>,
        width: u32,
        height: u32,
        fps: u32,
        out: &Path,
    ) -> Result<Self> {
        let mut args = base_args();
        args.extend(
            [
                "-f".to_string(),
                "rawvideo".to_string(),
                "-pix_fmt".to_string(),
                "rgb24".to_string(),
                "-s".to_string(),
                format!("{}x{}", width, height),
                "-r".to_string(),
                fps.to_string(),
                "-i".to_string(),
                "-".to_string(),
            ]
            .into_iter(),
        );
        args.extend(H264_ARGS.iter().map(|s| s.to_string()));
        args.push(out.display().to_string());

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MediaError::Spawn {
                tool: "ffmpeg",
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .context("ffmpeg stdin was not captured")?;

        Ok(Self {
            child,
            stdin,
            frame_len: width as usize * height as usize * 3,
            out: out.to_path_buf(),
        })
    }

    pub async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() != self.frame_len {
            anyhow::bail!(
                "raw frame has {} bytes, encoder expects {}",
                frame.len(),
                self.frame_len
            );
        }
        if let Err(err) = self.stdin.write_all(frame).await {
            if let Some(failure) = self.exit_failure().await {
                return Err(failure);
            }
            return Err(anyhow::Error::new(err).context("Failed to pipe frame to ffmpeg"));
        }
        Ok(())
    }

    /// After a broken pipe: ffmpeg's exit status and stderr, if it failed.
    async fn exit_failure(&mut self) -> Option<anyhow::Error> {
        let mut stderr = Vec::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            pipe.read_to_end(&mut stderr).await.ok();
        }
        let status = self.child.wait().await.ok()?;
        if status.success() {
            return None;
        }
        Some(
            MediaError::Failed {
                tool: "ffmpeg",
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            }
            .into(),
        )
    }

    pub async fn finish(self) -> Result<()> {
        let Self {
            child,
            mut stdin,
            out,
            ..
        } = self;
        stdin.flush().await.ok();
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for ffmpeg")?;
        if !output.status.success() {
            return Err(MediaError::Failed {
                tool: "ffmpeg",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        if !out.exists() {
            return Err(MediaError::MissingOutput(out.display().to_string()).into());
        }
        Ok(())
    }
}
