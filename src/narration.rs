use crate::api::tts::SpeechEngine;
use crate::config::Config;
use crate::ffmpeg;
use crate::{logi, logok};
use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

pub const EFFECT_FILES: [&str; 4] = [
    "vine_boom.mp3",
    "fart_sound.mp3",
    "airhorn.mp3",
    "bruh_sound.mp3",
];
pub const EFFECT_CHANCE: f64 = 0.7;
pub const EFFECTS_PER_TRACK: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct EffectCue {
    pub at: f64,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct NarrationTrack {
    pub path: PathBuf,
    pub duration: f64,
    pub speed: f64,
    pub cues: Vec<EffectCue>,
}

/// Decides whether this track gets effects and, if so, where and which.
/// Returns `(timestamp, effect file name)` pairs; empty on the 30% branch.
pub fn roll_effect_slots<R: Rng + ?Sized>(rng: &mut R, duration: f64) -> Vec<(f64, &'static str)> {
    if !rng.gen_bool(EFFECT_CHANCE) {
        return Vec::new();
    }

    let upper = duration - 1.0;
    let times: Vec<f64> = (0..EFFECTS_PER_TRACK)
        .map(|_| if upper > 0.0 { rng.gen_range(0.0..upper) } else { 0.0 })
        .collect();

    times
        .into_iter()
        .map(|at| (at, *EFFECT_FILES.choose(&mut *rng).unwrap_or(&EFFECT_FILES[0])))
        .collect()
}

/// Keeps the slots whose effect file exists in `effects_dir`.
pub fn resolve_effect_cues(slots: &[(f64, &str)], effects_dir: &Path) -> Vec<EffectCue> {
    slots
        .iter()
        .filter_map(|(at, name)| {
            let path = effects_dir.join(name);
            path.is_file().then_some(EffectCue { at: *at, path })
        })
        .collect()
}

/// Audio graph over input 0 (speech) and inputs 1.. (one per cue), ending in `[a]`.
pub fn narration_filter(speed: f64, cues: &[EffectCue]) -> String {
    if cues.is_empty() {
        return format!("[0:a]atempo={:.3}[a]", speed);
    }

    let mut filter = format!("[0:a]atempo={:.3}[base];", speed);
    let mut mix = String::from("[base]");
    for (i, cue) in cues.iter().enumerate() {
        let delay_ms = (cue.at * 1000.0).round() as u64;
        filter.push_str(&format!("[{}:a]adelay=delays={}:all=1[fx{}];", i + 1, delay_ms, i));
        mix.push_str(&format!("[fx{}]", i));
    }
    filter.push_str(&format!(
        "{}amix=inputs={}:duration=longest:normalize=0[a]",
        mix,
        cues.len() + 1
    ));
    filter
}

pub struct NarrationSynthesizer {
    engine: Box<dyn SpeechEngine>,
    effects_dir: PathBuf,
    speed: f64,
}

impl NarrationSynthesizer {
    pub fn new(engine: Box<dyn SpeechEngine>, cfg: &Config) -> Self {
        Self {
            engine,
            effects_dir: cfg.audio_effects_dir.clone(),
            speed: cfg.speech_speed,
        }
    }

    pub async fn synthesize<R: Rng + ?Sized>(
        &self,
        text: &str,
        rng: &mut R,
        scratch: &Path,
    ) -> Result<NarrationTrack> {
        let speech = scratch.join("narration.mp3");
        self.engine
            .synthesize_to(text, &speech)
            .await
            .context("Speech synthesis failed")?;

        let spoken = ffmpeg::ffprobe_duration_seconds(&speech).await?;
        let sped = spoken / self.speed;

        let slots = roll_effect_slots(rng, sped);
        let cues = resolve_effect_cues(&slots, &self.effects_dir);
        if slots.len() > cues.len() {
            logi(format!(
                "{} effect(s) not found in {}; skipped",
                slots.len() - cues.len(),
                self.effects_dir.display()
            ));
        }
        for cue in &cues {
            logi(format!("Effect {} at {:.2}s", cue.path.display(), cue.at));
        }

        let out = scratch.join("narration_mix.m4a");
        let mut inputs: Vec<&Path> = vec![speech.as_path()];
        inputs.extend(cues.iter().map(|c| c.path.as_path()));
        ffmpeg::ffmpeg_audio_graph(&inputs, &narration_filter(self.speed, &cues), &out)
            .await
            .context("Narration mix failed")?;

        let duration = ffmpeg::ffprobe_duration_seconds(&out).await?;
        logok(format!(
            "Narration ready: {:.2}s ({:.2}s spoken at {:.1}x, {} effect(s))",
            duration,
            spoken,
            self.speed,
            cues.len()
        ));

        Ok(NarrationTrack {
            path: out,
            duration,
            speed: self.speed,
            cues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn effects_trigger_about_seventy_percent_of_the_time() {
        let mut rng = StdRng::seed_from_u64(2024);
        let runs = 10_000;
        let hits = (0..runs)
            .filter(|_| !roll_effect_slots(&mut rng, 8.0).is_empty())
            .count();
        let rate = hits as f64 / runs as f64;
        assert!((0.67..0.73).contains(&rate), "rate {rate}");
    }

    #[test]
    fn slots_land_inside_the_track() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1_000 {
            let slots = roll_effect_slots(&mut rng, 6.0);
            assert!(slots.is_empty() || slots.len() == EFFECTS_PER_TRACK);
            for (at, name) in slots {
                assert!((0.0..5.0).contains(&at), "{at}");
                assert!(EFFECT_FILES.contains(&name));
            }
        }
    }

    #[test]
    fn very_short_tracks_cue_at_zero() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            for (at, _) in roll_effect_slots(&mut rng, 0.6) {
                assert_eq!(at, 0.0);
            }
        }
    }

    #[test]
    fn missing_effect_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("airhorn.mp3"), b"id3").unwrap();

        let slots = [(1.0, "vine_boom.mp3"), (2.5, "airhorn.mp3")];
        let cues = resolve_effect_cues(&slots, dir.path());
        assert_eq!(
            cues,
            vec![EffectCue {
                at: 2.5,
                path: dir.path().join("airhorn.mp3")
            }]
        );
    }

    #[test]
    fn filter_without_effects_only_speeds_up() {
        assert_eq!(narration_filter(1.1, &[]), "[0:a]atempo=1.100[a]");
    }

    #[test]
    fn filter_delays_and_mixes_each_effect() {
        let cues = vec![
            EffectCue {
                at: 0.25,
                path: PathBuf::from("fx/vine_boom.mp3"),
            },
            EffectCue {
                at: 3.0,
                path: PathBuf::from("fx/bruh_sound.mp3"),
            },
        ];
        assert_eq!(
            narration_filter(1.1, &cues),
            "[0:a]atempo=1.100[base];\
             [1:a]adelay=delays=250:all=1[fx0];\
             [2:a]adelay=delays=3000:all=1[fx1];\
             [base][fx0][fx1]amix=inputs=3:duration=longest:normalize=0[a]"
        );
    }
}
