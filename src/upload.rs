//! Placeholders for posting finished videos. Nothing is sent anywhere; each
//! call only logs what would have been uploaded.

use crate::logi;
use std::path::Path;

#[derive(Debug, Default)]
pub struct SocialMediaPoster;

impl SocialMediaPoster {
    pub fn new() -> Self {
        Self
    }

    pub fn upload_to_youtube_shorts(&self, video_path: &Path, title: &str, description: &str) -> String {
        let line = format!(
            "Would upload {} to YouTube with title: {} ({})",
            video_path.display(),
            title,
            description
        );
        logi(&line);
        line
    }

    pub fn upload_to_instagram_reels(&self, video_path: &Path, caption: &str) -> String {
        let line = format!(
            "Would upload {} to Instagram with caption: {}",
            video_path.display(),
            caption
        );
        logi(&line);
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stubs_only_describe_the_upload() {
        let poster = SocialMediaPoster::new();
        let path = Path::new("output_videos/brainrot_video_1.mp4");
        assert_eq!(
            poster.upload_to_instagram_reels(path, "sigma"),
            "Would upload output_videos/brainrot_video_1.mp4 to Instagram with caption: sigma"
        );
        assert!(
            poster
                .upload_to_youtube_shorts(path, "title", "desc")
                .starts_with("Would upload output_videos/brainrot_video_1.mp4 to YouTube")
        );
    }
}
