//! Chime - demo scene for the chime audio helper
//!
//! Loads a scene manifest, plays its music, sequence, random pick and jittered
//! effect, and ticks the scene clock until the sequence has finished.

mod settings;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chime_audio::{AudioBackend, AudioHelper, PlayStatus};
use chime_core::SceneClock;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::settings::SceneManifest;

/// Frame length of the demo loop
const FRAME: Duration = Duration::from_micros(16_667);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting chime demo...");

    let path = std::env::args().nth(1).map(PathBuf::from);
    let manifest = SceneManifest::load(path.as_deref())?;

    #[cfg(feature = "kira_backend")]
    let backend = {
        use anyhow::Context;
        chime_audio::KiraBackend::new(&manifest.demo.base_path)
            .context("Failed to open audio device")?
    };
    #[cfg(not(feature = "kira_backend"))]
    let backend = chime_audio::NullBackend::new();

    let audio = AudioHelper::new(backend, manifest.audio.clone());
    run(audio, &manifest).await;

    info!("Chime demo finished");
    Ok(())
}

async fn run<B: AudioBackend>(mut audio: AudioHelper<B>, manifest: &SceneManifest) {
    let sfx = audio.load_sound_effects(&manifest.sfx).await;
    let music = audio.load_music(&manifest.music).await;
    let missing = sfx.missing.len() + music.missing.len();
    if missing > 0 {
        warn!("{} assets failed to load and will be silent", missing);
    }

    let demo = &manifest.demo;
    if let Some(track) = &demo.music {
        report(track, audio.play(track));
    }
    let sequence = audio.play_sequence(&demo.sequence, audio.sequence_options());
    if let Some(key) = demo.random.first() {
        report(key, audio.play_random_one_of(&demo.random));
    }
    if let Some(key) = &demo.jitter_key {
        report(key, audio.play_with_rate_jitter(key, demo.jitter));
    }

    let mut clock = SceneClock::new(manifest.clock.clone());
    let mut last = Instant::now();
    let mut linger_until = None;
    loop {
        tokio::time::sleep(FRAME).await;
        let now = Instant::now();
        clock.update(now - last);
        last = now;
        audio.update(clock.delta);

        if audio.pending_steps() > 0 {
            continue;
        }
        let until = *linger_until.get_or_insert(clock.total + demo.linger());
        if clock.total >= until {
            break;
        }
    }

    if let Some(handle) = sequence {
        info!(
            "Sequence {:?} done after {} frames",
            handle, clock.frame_count
        );
    }
    audio.teardown();
}

fn report(key: &str, status: PlayStatus) {
    match status {
        PlayStatus::Played => info!("Playing '{}'", key),
        other => warn!("Could not play '{}': {:?}", key, other),
    }
}
