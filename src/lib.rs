pub mod api;
pub mod background;
pub mod config;
pub mod content;
pub mod download;
pub mod error;
pub mod ffmpeg;
pub mod generator;
pub mod init;
pub mod narration;
pub mod overlay;
pub mod render;
pub mod text;
pub mod upload;

#[derive(Clone, Copy)]
enum Level {
    Info,
    Warn,
}

pub(crate) fn logv(level: Level, tag: &str, message: &str) {
    match level {
        Level::Info => tracing::info!("[{}] {}", tag, message),
        Level::Warn => tracing::warn!("[{}] {}", tag, message),
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv(Level::Info, "INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv(Level::Info, "OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv(Level::Warn, "WARN", message.as_ref());
}
