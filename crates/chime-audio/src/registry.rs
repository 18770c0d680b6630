use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::backend::{PlayOptions, Sound};

/// An asset to register: a unique key, the source the loader fetches, and the
/// base volume for that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioItem {
    pub key: String,
    pub source: String,
    pub volume: f64,
}

impl AudioItem {
    pub fn new(key: impl Into<String>, source: impl Into<String>, volume: f64) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            volume,
        }
    }
}

/// Per-key configuration stored at registration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundConfig {
    /// Base volume, scaled by the category volume at play time.
    pub volume: f64,
}

/// A loaded sound bound to its config.
#[derive(Debug)]
pub struct SoundData<S> {
    pub source: S,
    pub config: SoundConfig,
}

/// The two kinds of registered audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    SoundEffect,
    Music,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SoundEffect => "sound effect",
            Self::Music => "music",
        }
    }

    /// Sound effects play once, music loops.
    pub fn play_options(&self) -> PlayOptions {
        match self {
            Self::SoundEffect => PlayOptions::once(),
            Self::Music => PlayOptions::looped(),
        }
    }
}

/// Configs and loaded sounds of one category, plus its volume multiplier.
#[derive(Debug)]
pub(crate) struct Registry<S> {
    category: Category,
    volume: f64,
    configs: HashMap<String, SoundConfig>,
    sounds: HashMap<String, SoundData<S>>,
}

impl<S: Sound> Registry<S> {
    pub fn new(category: Category, volume: f64) -> Self {
        Self {
            category,
            volume,
            configs: HashMap::new(),
            sounds: HashMap::new(),
        }
    }

    /// Category volume multiplier.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Store the config for a key, replacing any earlier one.
    pub fn configure(&mut self, key: &str, volume: f64) {
        self.configs.insert(key.to_string(), SoundConfig { volume });
    }

    /// Bind a loaded sound to the key's config, replacing any earlier sound.
    /// A key without a config gets a base volume of 1.0.
    pub fn attach(&mut self, key: &str, source: S) -> Option<SoundData<S>> {
        let config = self
            .configs
            .get(key)
            .copied()
            .unwrap_or(SoundConfig { volume: 1.0 });
        self.configs.entry(key.to_string()).or_insert(config);
        self.sounds
            .insert(key.to_string(), SoundData { source, config })
    }

    /// Stop and drop the loaded sound for a key, keeping its config.
    pub fn detach(&mut self, key: &str) -> Option<SoundData<S>> {
        let mut data = self.sounds.remove(key)?;
        data.source.stop();
        Some(data)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sounds.contains_key(key)
    }

    /// Configured base volume, present even if the sound never loaded.
    pub fn base_volume(&self, key: &str) -> Option<f64> {
        self.configs.get(key).map(|c| c.volume)
    }

    /// Base volume times category volume, for loaded keys.
    pub fn effective_volume(&self, key: &str) -> Option<f64> {
        self.sounds
            .get(key)
            .map(|data| data.config.volume * self.volume)
    }

    /// Change the category volume and push the new effective volume to every sound.
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        for data in self.sounds.values_mut() {
            data.source.set_volume(data.config.volume * volume);
        }
    }

    /// Apply the effective volume and start the sound. Returns false if the key
    /// is not loaded.
    pub fn play(&mut self, key: &str) -> bool {
        let volume = self.volume;
        let options = self.category.play_options();
        match self.sounds.get_mut(key) {
            Some(data) => {
                data.source.set_volume(data.config.volume * volume);
                data.source.play(options);
                true
            }
            None => false,
        }
    }

    /// Like [`Registry::play`], setting the playback rate first.
    pub fn play_at_rate(&mut self, key: &str, rate: f64) -> bool {
        let Some(data) = self.sounds.get_mut(key) else {
            return false;
        };
        data.source.set_rate(rate);
        self.play(key)
    }

    /// Stop the sound for a key. Returns false if the key is not loaded.
    pub fn stop(&mut self, key: &str) -> bool {
        match self.sounds.get_mut(key) {
            Some(data) => {
                data.source.stop();
                true
            }
            None => false,
        }
    }

    /// Stop every sound and forget all configs and sounds.
    pub fn clear(&mut self) {
        for data in self.sounds.values_mut() {
            data.source.stop();
        }
        self.sounds.clear();
        self.configs.clear();
    }
}
