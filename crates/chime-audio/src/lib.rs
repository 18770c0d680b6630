//! Chime Audio - Sound effect and music playback for a game scene
//!
//! Registers assets with the host audio engine, keeps a per-key base volume apart
//! from the sound effect and music multipliers, and offers one-shot, looping,
//! rate-jittered, random-pick and sequenced playback by key.

mod backend;
mod config;
mod error;
#[cfg(feature = "kira_backend")]
mod kira_backend;
mod manager;
mod registry;
#[cfg(test)]
mod testing;

pub use backend::{AudioBackend, LoadComplete, NullBackend, NullSound, PlayOptions, Sound};
pub use config::{AudioConfig, SequenceOptions};
pub use error::AudioError;
#[cfg(feature = "kira_backend")]
pub use kira_backend::{KiraBackend, KiraSound};
pub use manager::{AudioHelper, LoadReport, PlayStatus, SequenceHandle};
pub use registry::{AudioItem, Category, SoundConfig};
