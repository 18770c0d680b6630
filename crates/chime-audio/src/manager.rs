use std::sync::Arc;
use std::time::Duration;

use chime_core::Timer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::backend::AudioBackend;
use crate::config::{AudioConfig, SequenceOptions};
use crate::registry::{AudioItem, Category, Registry};

/// Outcome of a play or stop call. Missing keys are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    Played,
    Stopped,
    /// No loaded sound under the key.
    NotFound,
    /// The key list was empty.
    NoKeys,
}

/// Keys resolved by one load batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// Keys whose asset failed to load. Their config is kept, but they cannot play.
    pub missing: Vec<String>,
}

/// Identifies a sequence started by [`AudioHelper::play_sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceHandle(u64);

struct SequenceStep {
    id: u64,
    keys: Arc<[String]>,
    next: usize,
    options: SequenceOptions,
}

/// Sound effect and music playback for a scene.
///
/// Each key has a base volume from its [`AudioItem`]; playback always uses
/// `base volume * category volume`, computed at call time.
pub struct AudioHelper<B: AudioBackend> {
    backend: B,
    sfx: Registry<B::Sound>,
    music: Registry<B::Sound>,
    sequence_options: SequenceOptions,
    timer: Timer<SequenceStep>,
    next_sequence: u64,
    rng: StdRng,
}

impl<B: AudioBackend> AudioHelper<B> {
    pub fn new(backend: B, config: AudioConfig) -> Self {
        Self::with_rng(backend, config, StdRng::from_entropy())
    }

    /// Create a helper drawing all randomness from `rng`.
    pub fn with_rng(backend: B, config: AudioConfig, rng: StdRng) -> Self {
        info!(
            "Audio helper initialized (sfx volume {}, music volume {})",
            config.sfx_volume, config.music_volume
        );
        Self {
            backend,
            sfx: Registry::new(Category::SoundEffect, config.sfx_volume),
            music: Registry::new(Category::Music, config.music_volume),
            sequence_options: config.sequence_options(),
            timer: Timer::new(),
            next_sequence: 0,
            rng,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ---- Loading ----

    /// Load a batch of sound effects. Resolves once the backend reports the batch complete.
    pub async fn load_sound_effects(&mut self, items: &[AudioItem]) -> LoadReport {
        self.load(Category::SoundEffect, items).await
    }

    /// Load a batch of music tracks. Resolves once the backend reports the batch complete.
    pub async fn load_music(&mut self, items: &[AudioItem]) -> LoadReport {
        self.load(Category::Music, items).await
    }

    async fn load(&mut self, category: Category, items: &[AudioItem]) -> LoadReport {
        let registry = match category {
            Category::SoundEffect => &mut self.sfx,
            Category::Music => &mut self.music,
        };

        for item in items {
            self.backend.register_source(&item.key, &item.source);
            registry.configure(&item.key, item.volume);
        }

        if self.backend.start_loading().await.is_err() {
            warn!(
                "Loader dropped the completion notice for a {} batch",
                category.name()
            );
        }

        let mut report = LoadReport::default();
        for item in items {
            match self.backend.create_sound(&item.key) {
                Some(sound) => {
                    registry.attach(&item.key, sound);
                    report.loaded.push(item.key.clone());
                }
                None => {
                    registry.detach(&item.key);
                    warn!(
                        "Failed to load {} '{}' from {}",
                        category.name(),
                        item.key,
                        item.source
                    );
                    report.missing.push(item.key.clone());
                }
            }
        }

        info!(
            "Loaded {}/{} {} assets",
            report.loaded.len(),
            items.len(),
            category.name()
        );
        report
    }

    // ---- Volume ----

    /// Set the sound effect multiplier and apply it to every loaded effect.
    pub fn set_sound_effect_volume(&mut self, volume: f64) {
        debug!("Sound effect volume set to {}", volume);
        self.sfx.set_volume(volume);
    }

    /// Set the music multiplier and apply it to every loaded track.
    pub fn set_music_volume(&mut self, volume: f64) {
        debug!("Music volume set to {}", volume);
        self.music.set_volume(volume);
    }

    pub fn sound_effect_volume(&self) -> f64 {
        self.sfx.volume()
    }

    pub fn music_volume(&self) -> f64 {
        self.music.volume()
    }

    /// Configured base volume for a key, even if its asset failed to load.
    pub fn base_volume(&self, key: &str) -> Option<f64> {
        self.sfx
            .base_volume(key)
            .or_else(|| self.music.base_volume(key))
    }

    /// The volume `play(key)` would apply right now.
    pub fn effective_volume(&self, key: &str) -> Option<f64> {
        self.sfx
            .effective_volume(key)
            .or_else(|| self.music.effective_volume(key))
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.sfx.contains(key) || self.music.contains(key)
    }

    // ---- Playback ----

    /// Play a key. Sound effects are checked first and play once; music loops.
    pub fn play(&mut self, key: &str) -> PlayStatus {
        if self.sfx.play(key) || self.music.play(key) {
            trace!("Playing '{}'", key);
            PlayStatus::Played
        } else {
            trace!("No sound loaded for '{}'", key);
            PlayStatus::NotFound
        }
    }

    /// Stop a key in both categories.
    pub fn stop(&mut self, key: &str) -> PlayStatus {
        let sfx = self.sfx.stop(key);
        let music = self.music.stop(key);
        if sfx || music {
            PlayStatus::Stopped
        } else {
            trace!("No sound loaded for '{}'", key);
            PlayStatus::NotFound
        }
    }

    /// Play a sound effect at a randomized rate. `jitter = 0` plays at exactly 1.0;
    /// larger values widen the spread. Music keys are not affected.
    pub fn play_with_rate_jitter(&mut self, key: &str, jitter: f64) -> PlayStatus {
        let rate = jitter_rate(jitter, self.rng.gen());
        if self.sfx.play_at_rate(key, rate) {
            trace!("Playing '{}' at rate {:.3}", key, rate);
            PlayStatus::Played
        } else {
            trace!("No sound effect loaded for '{}'", key);
            PlayStatus::NotFound
        }
    }

    /// Play one key picked at random. An empty list plays nothing.
    pub fn play_random_one_of<K: AsRef<str>>(&mut self, keys: &[K]) -> PlayStatus {
        if keys.is_empty() {
            trace!("Random pick from an empty key list");
            return PlayStatus::NoKeys;
        }
        let index = random_index(self.rng.gen(), keys.len());
        self.play(keys[index].as_ref())
    }

    /// Play `keys[0]` now and each following key after a gap, driven by
    /// [`AudioHelper::update`]. Returns `None` for an empty list.
    pub fn play_sequence<K: AsRef<str>>(
        &mut self,
        keys: &[K],
        options: SequenceOptions,
    ) -> Option<SequenceHandle> {
        if keys.is_empty() {
            trace!("Sequence with no keys");
            return None;
        }

        let id = self.next_sequence;
        self.next_sequence += 1;
        let keys: Arc<[String]> = keys.iter().map(|k| k.as_ref().to_string()).collect();

        self.play(&keys[0]);
        if keys.len() > 1 {
            let gap = options.gap(self.rng.gen());
            self.timer.schedule(
                gap,
                SequenceStep {
                    id,
                    keys,
                    next: 1,
                    options,
                },
            );
        }
        Some(SequenceHandle(id))
    }

    /// Sequence timing from the helper's config.
    pub fn sequence_options(&self) -> SequenceOptions {
        self.sequence_options
    }

    /// Drop the remaining steps of a sequence. Returns false if none were pending.
    pub fn cancel_sequence(&mut self, handle: SequenceHandle) -> bool {
        let removed = self.timer.cancel_where(|step| step.id == handle.0);
        if removed > 0 {
            debug!("Cancelled sequence {}", handle.0);
        }
        removed > 0
    }

    /// Whether a sequence still has steps to play.
    pub fn is_sequence_active(&self, handle: SequenceHandle) -> bool {
        self.timer.any_pending(|step| step.id == handle.0)
    }

    /// Number of sequence steps waiting on the timer.
    pub fn pending_steps(&self) -> usize {
        self.timer.len()
    }

    // ---- Per-frame ----

    /// Advance the scene timer and play every sequence step that became due.
    pub fn update(&mut self, delta: Duration) {
        self.timer.advance(delta);
        while let Some(fired) = self.timer.pop_due() {
            let step = fired.payload;
            self.play(&step.keys[step.next]);

            let next = step.next + 1;
            if next < step.keys.len() {
                let gap = step.options.gap(self.rng.gen());
                self.timer
                    .schedule_at(fired.due.saturating_add(gap), SequenceStep { next, ..step });
            }
        }
    }

    /// Stop every sound, forget all registrations and drop pending sequence steps.
    pub fn teardown(&mut self) {
        self.sfx.clear();
        self.music.clear();
        self.timer.clear();
        info!("Audio helper torn down");
    }
}

/// Playback rate for a jitter factor and a uniform draw `u` in `[0, 1)`.
pub(crate) fn jitter_rate(jitter: f64, u: f64) -> f64 {
    (1.0 - jitter) + (2.0 * u - jitter) * jitter
}

/// Index picked for a uniform draw `u` in `[0, 1)`. Draws that land outside the
/// list fall back to the first key.
pub(crate) fn random_index(u: f64, len: usize) -> usize {
    let index = ((u - 0.01) * len as f64).floor();
    if index < 0.0 || index >= len as f64 {
        0
    } else {
        index as usize
    }
}
