//! Host engine boundary: the loader, the sound instance factory and the
//! per-instance controls the helper drives.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::AudioError;

/// One-shot "load complete" notification for a batch started with
/// [`AudioBackend::start_loading`].
pub type LoadComplete = oneshot::Receiver<()>;

/// Options passed to [`Sound::play`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayOptions {
    /// Restart from the beginning when playback reaches the end.
    pub looped: bool,
}

impl PlayOptions {
    pub fn once() -> Self {
        Self { looped: false }
    }

    pub fn looped() -> Self {
        Self { looped: true }
    }
}

/// An engine-owned playable object created for one loaded key.
pub trait Sound {
    /// Set the instance volume. Applies to current playback as well.
    fn set_volume(&mut self, volume: f64);

    /// Set the playback rate factor (1.0 = normal speed).
    fn set_rate(&mut self, rate: f64);

    /// Start playback from the beginning.
    fn play(&mut self, options: PlayOptions);

    /// Stop playback. Does nothing if the sound is not playing.
    fn stop(&mut self);
}

/// The host audio engine: an asset loader plus a sound instance factory.
pub trait AudioBackend {
    type Sound: Sound;

    /// Queue an asset source under `key` for the next load batch.
    fn register_source(&mut self, key: &str, source: &str);

    /// Start loading every queued source. The returned receiver fires once the
    /// whole batch has finished, whether or not each asset loaded.
    fn start_loading(&mut self) -> LoadComplete;

    /// Instantiate a sound for a loaded key. `None` if the key never loaded or
    /// if its most recent load failed.
    fn create_sound(&mut self, key: &str) -> Option<Self::Sound>;
}

/// Resolve an asset source against a base directory. Absolute sources are kept.
#[cfg_attr(not(feature = "kira_backend"), allow(dead_code))]
pub(crate) fn resolve_source(base_path: &Path, source: &str) -> PathBuf {
    let path = Path::new(source);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_path.join(path)
    }
}

/// Store the outcome of loading `key`. A failure evicts data left by an earlier
/// batch so the key cannot be instantiated from stale audio.
#[cfg_attr(not(feature = "kira_backend"), allow(dead_code))]
pub(crate) fn record_load<T>(
    loaded: &mut HashMap<String, T>,
    key: String,
    result: Result<T, AudioError>,
) {
    match result {
        Ok(data) => {
            loaded.insert(key, data);
        }
        Err(e) => {
            loaded.remove(&key);
            warn!("{}", e);
        }
    }
}

/// Headless backend that accepts every source and plays nothing.
///
/// Sound instances keep their last volume, rate and playing flag so the host can
/// inspect them.
#[derive(Debug, Default)]
pub struct NullBackend {
    queued: Vec<(String, String)>,
    loaded: HashSet<String>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key finished loading in an earlier batch.
    pub fn is_loaded(&self, key: &str) -> bool {
        self.loaded.contains(key)
    }
}

impl AudioBackend for NullBackend {
    type Sound = NullSound;

    fn register_source(&mut self, key: &str, source: &str) {
        self.queued.push((key.to_string(), source.to_string()));
    }

    fn start_loading(&mut self) -> LoadComplete {
        let (tx, rx) = oneshot::channel();
        for (key, source) in self.queued.drain(..) {
            debug!("Null backend loaded '{}' from {}", key, source);
            self.loaded.insert(key);
        }
        let _ = tx.send(());
        rx
    }

    fn create_sound(&mut self, key: &str) -> Option<NullSound> {
        self.loaded.contains(key).then(|| NullSound::new(key))
    }
}

/// Sound instance produced by [`NullBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct NullSound {
    pub key: String,
    pub volume: f64,
    pub rate: f64,
    pub playing: bool,
    pub looped: bool,
}

impl NullSound {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            volume: 1.0,
            rate: 1.0,
            playing: false,
            looped: false,
        }
    }
}

impl Sound for NullSound {
    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn play(&mut self, options: PlayOptions) {
        debug!(
            "Playing '{}' (volume {:.3}, rate {:.3}, looped {})",
            self.key, self.volume, self.rate, options.looped
        );
        self.playing = true;
        self.looped = options.looped;
    }

    fn stop(&mut self) {
        if self.playing {
            debug!("Stopped '{}'", self.key);
        }
        self.playing = false;
    }
}
