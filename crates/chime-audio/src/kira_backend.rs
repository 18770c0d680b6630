use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kira::manager::backend::DefaultBackend;
use kira::manager::{AudioManager, AudioManagerSettings};
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings};
use kira::sound::PlaybackRate;
use kira::tween::Tween;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::backend::{record_load, resolve_source, AudioBackend, LoadComplete, PlayOptions, Sound};
use crate::error::AudioError;

type SharedManager = Arc<Mutex<AudioManager<DefaultBackend>>>;

/// Audio backend playing decoded files through kira.
///
/// Sources are file paths, resolved against the backend's base path when relative.
pub struct KiraBackend {
    manager: SharedManager,
    base_path: PathBuf,
    queued: Vec<(String, PathBuf)>,
    loaded: HashMap<String, StaticSoundData>,
}

impl KiraBackend {
    /// Open the default audio device.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::InitFailed(e.to_string()))?;

        let base_path = base_path.into();
        info!("Kira backend initialized with base path: {}", base_path.display());

        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
            base_path,
            queued: Vec::new(),
            loaded: HashMap::new(),
        })
    }
}

fn load_file(path: &Path) -> Result<StaticSoundData, AudioError> {
    StaticSoundData::from_file(path)
        .map_err(|e| AudioError::LoadFailed(path.to_path_buf(), e.to_string()))
}

impl AudioBackend for KiraBackend {
    type Sound = KiraSound;

    fn register_source(&mut self, key: &str, source: &str) {
        let path = resolve_source(&self.base_path, source);
        self.queued.push((key.to_string(), path));
    }

    fn start_loading(&mut self) -> LoadComplete {
        let (tx, rx) = oneshot::channel();
        for (key, path) in std::mem::take(&mut self.queued) {
            record_load(&mut self.loaded, key, load_file(&path));
        }
        let _ = tx.send(());
        rx
    }

    fn create_sound(&mut self, key: &str) -> Option<KiraSound> {
        let data = self.loaded.get(key)?.clone();
        Some(KiraSound {
            key: key.to_string(),
            data,
            manager: Arc::clone(&self.manager),
            handle: None,
            volume: 1.0,
            rate: 1.0,
        })
    }
}

/// A loaded file and the handle of its current playback, if any.
pub struct KiraSound {
    key: String,
    data: StaticSoundData,
    manager: SharedManager,
    handle: Option<StaticSoundHandle>,
    volume: f64,
    rate: f64,
}

impl Sound for KiraSound {
    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        if let Some(ref mut handle) = self.handle {
            handle.set_volume(volume, Tween::default());
        }
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
        if let Some(ref mut handle) = self.handle {
            handle.set_playback_rate(PlaybackRate::Factor(rate), Tween::default());
        }
    }

    fn play(&mut self, options: PlayOptions) {
        self.stop();

        let mut settings = StaticSoundSettings::new()
            .volume(self.volume)
            .playback_rate(PlaybackRate::Factor(self.rate));
        if options.looped {
            settings = settings.loop_region(..);
        }
        let data = self.data.with_settings(settings);

        match self.manager.lock().play(data) {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => warn!("Failed to play '{}': {}", self.key, e),
        }
    }

    fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop(Tween::default());
        }
    }
}
