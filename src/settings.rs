//! Scene manifest for the demo
//!
//! A manifest is a TOML file with the helper config, the clock config, the
//! sound effect and music batches, and what the demo should play.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chime_audio::{AudioConfig, AudioItem};
use chime_core::ClockConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Manifest used when no path is given on the command line.
const BUILTIN_MANIFEST: &str = r#"
[audio]
sfx_volume = 0.1
music_volume = 1.0
sequence_delay_ms = 200

[demo]
base_path = "assets/audio"
music = "theme"
sequence = ["coin", "coin", "chime"]
random = ["step1", "step2", "step3"]
jitter_key = "coin"
jitter = 0.1

[[sfx]]
key = "coin"
source = "sfx/coin.ogg"
volume = 0.8

[[sfx]]
key = "chime"
source = "sfx/chime.ogg"
volume = 1.0

[[sfx]]
key = "step1"
source = "sfx/step1.ogg"
volume = 0.5

[[sfx]]
key = "step2"
source = "sfx/step2.ogg"
volume = 0.5

[[sfx]]
key = "step3"
source = "sfx/step3.ogg"
volume = 0.5

[[music]]
key = "theme"
source = "music/theme.ogg"
volume = 0.6
"#;

/// Everything the demo scene loads and plays
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneManifest {
    pub audio: AudioConfig,
    pub clock: ClockConfig,
    pub demo: DemoSettings,
    pub sfx: Vec<AudioItem>,
    pub music: Vec<AudioItem>,
}

/// What the demo plays once loading finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Directory relative sources are resolved against
    pub base_path: PathBuf,
    /// Music key to loop for the whole run
    pub music: Option<String>,
    /// Keys played as a timed sequence
    pub sequence: Vec<String>,
    /// Keys to pick one from at random
    pub random: Vec<String>,
    /// Sound effect played with a jittered rate
    pub jitter_key: Option<String>,
    pub jitter: f64,
    /// How long to keep running after the last sequence step, in milliseconds
    pub linger_ms: u64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            music: None,
            sequence: Vec::new(),
            random: Vec::new(),
            jitter_key: None,
            jitter: 0.0,
            linger_ms: 500,
        }
    }
}

impl DemoSettings {
    pub fn linger(&self) -> Duration {
        Duration::from_millis(self.linger_ms)
    }
}

impl SceneManifest {
    /// Load a manifest from disk, or the built-in one when no path is given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            info!("No manifest given, using the built-in scene");
            return Self::parse(BUILTIN_MANIFEST);
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {:?}", path))?;
        let manifest =
            Self::parse(&content).with_context(|| format!("Failed to parse manifest {:?}", path))?;
        info!("Loaded manifest from {:?}", path);
        Ok(manifest)
    }

    fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_manifest_parses() {
        let manifest = SceneManifest::load(None).unwrap();
        assert_eq!(manifest.sfx.len(), 5);
        assert_eq!(manifest.music.len(), 1);
        assert_eq!(manifest.audio.sfx_volume, 0.1);
        assert_eq!(manifest.demo.music.as_deref(), Some("theme"));
        assert_eq!(manifest.demo.linger_ms, 500);
    }

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest = SceneManifest::parse("").unwrap();
        assert!(manifest.sfx.is_empty());
        assert_eq!(manifest.audio, AudioConfig::default());
        assert_eq!(manifest.clock.time_scale, 1.0);
    }

    #[test]
    fn clock_section_reads_seconds() {
        let manifest = SceneManifest::parse("[clock]\nmax_delta = 0.1\n").unwrap();
        assert_eq!(manifest.clock.max_delta, Duration::from_secs_f32(0.1));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = SceneManifest::load(Some(Path::new("/nonexistent/scene.toml")));
        assert!(result.is_err());
    }
}
