//! Recording backend for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tokio::sync::oneshot;

use crate::backend::{AudioBackend, LoadComplete, PlayOptions, Sound};

/// Everything applied to one sound instance.
#[derive(Debug, Clone, Default)]
pub struct MockState {
    pub volume: Option<f64>,
    pub rates: Vec<f64>,
    pub plays: Vec<PlayOptions>,
    pub stops: usize,
}

pub struct MockSound(Rc<RefCell<MockState>>);

impl Sound for MockSound {
    fn set_volume(&mut self, volume: f64) {
        self.0.borrow_mut().volume = Some(volume);
    }

    fn set_rate(&mut self, rate: f64) {
        self.0.borrow_mut().rates.push(rate);
    }

    fn play(&mut self, options: PlayOptions) {
        self.0.borrow_mut().plays.push(options);
    }

    fn stop(&mut self) {
        self.0.borrow_mut().stops += 1;
    }
}

#[derive(Default)]
pub struct MockBackend {
    failing: HashSet<String>,
    failing_on_reload: HashSet<String>,
    batches: HashMap<String, usize>,
    drop_notification: bool,
    queued: Vec<String>,
    loaded: HashSet<String>,
    sources: HashMap<String, String>,
    instances: HashMap<String, Vec<Rc<RefCell<MockState>>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future load of `key` fail.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Load `key` in its first batch, then fail every later load of it.
    pub fn failing_on_reload(mut self, key: &str) -> Self {
        self.failing_on_reload.insert(key.to_string());
        self
    }

    /// Drop the completion sender instead of firing it.
    pub fn dropping_notification(mut self) -> Self {
        self.drop_notification = true;
        self
    }

    pub fn source(&self, key: &str) -> Option<&str> {
        self.sources.get(key).map(String::as_str)
    }

    /// Snapshot of every instance created for `key`, oldest first.
    pub fn instances(&self, key: &str) -> Vec<MockState> {
        self.instances
            .get(key)
            .map(|all| all.iter().map(|s| s.borrow().clone()).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the newest instance for `key`.
    pub fn latest(&self, key: &str) -> MockState {
        self.instances(key).pop().unwrap_or_default()
    }

    /// Plays across every instance of `key`.
    pub fn play_count(&self, key: &str) -> usize {
        self.instances(key).iter().map(|s| s.plays.len()).sum()
    }
}

impl AudioBackend for MockBackend {
    type Sound = MockSound;

    fn register_source(&mut self, key: &str, source: &str) {
        self.queued.push(key.to_string());
        self.sources.insert(key.to_string(), source.to_string());
    }

    fn start_loading(&mut self) -> LoadComplete {
        let (tx, rx) = oneshot::channel();
        for key in std::mem::take(&mut self.queued) {
            let batch = self.batches.entry(key.clone()).or_default();
            *batch += 1;
            let fails = self.failing.contains(&key)
                || (*batch > 1 && self.failing_on_reload.contains(&key));
            if fails {
                self.loaded.remove(&key);
            } else {
                self.loaded.insert(key);
            }
        }
        if !self.drop_notification {
            let _ = tx.send(());
        }
        rx
    }

    fn create_sound(&mut self, key: &str) -> Option<MockSound> {
        if !self.loaded.contains(key) {
            return None;
        }
        let state = Rc::new(RefCell::new(MockState::default()));
        self.instances
            .entry(key.to_string())
            .or_default()
            .push(Rc::clone(&state));
        Some(MockSound(state))
    }
}
