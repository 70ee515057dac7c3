use crate::config::Config;
use crate::ffmpeg::run_cmd;
use crate::{logi, logok, logw};

/// yt-dlp arguments for one gameplay URL, saved into `background_videos_dir`.
pub fn ytdlp_args(cfg: &Config, url: &str) -> Vec<String> {
    let template = cfg.background_videos_dir.join("%(title)s.%(ext)s");
    vec![
        "-f".to_string(),
        "best[height<=720]".to_string(),
        "--no-playlist".to_string(),
        "-o".to_string(),
        template.display().to_string(),
        url.to_string(),
    ]
}

/// Downloads every configured gameplay URL into the background pool. A
/// failing URL is logged and skipped. Returns how many succeeded.
pub async fn download_gameplay_footage(cfg: &Config) -> usize {
    logi("Downloading gameplay footage...");
    let mut ok = 0;
    for url in &cfg.gameplay_urls {
        match run_cmd("yt-dlp", &ytdlp_args(cfg, url)).await {
            Ok(()) => {
                logok(format!("Downloaded: {}", url));
                ok += 1;
            }
            Err(err) => logw(format!("Error downloading {}: {:#}", url, err)),
        }
    }
    ok
}
