//! Debounced template change intake.
//!
//! The OS file watcher is an external collaborator; it feeds
//! `ChangeEvent`s through a crossbeam channel. Editors fire several
//! events per save, so events for the same path inside the debounce
//! window collapse into one reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::engine::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Per-path time-window filter.
pub struct Debouncer {
    window: Duration,
    last_admitted: FxHashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_admitted: FxHashMap::default(),
        }
    }

    /// True when the event for `path` should be acted on. The first event
    /// for a path is always admitted; repeats inside the window are not.
    pub fn admit(&mut self, path: &Path) -> bool {
        let now = Instant::now();
        match self.last_admitted.get(path) {
            Some(&at) if now.duration_since(at) < self.window => false,
            _ => {
                self.last_admitted.insert(path.to_path_buf(), now);
                true
            }
        }
    }
}

/// Spawn the reload loop: drain events until the channel closes,
/// debounce, and drive `Engine::reload_template`. Removal events are
/// ignored since templates are only deleted by explicit user action.
pub fn spawn_reload_loop(engine: Arc<Engine>, events: Receiver<ChangeEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut debouncer = Debouncer::new(engine.config().debounce_window());
        for event in events {
            if event.kind == ChangeKind::Removed {
                debug!(path = %event.path.display(), "ignoring removal event");
                continue;
            }
            if !debouncer.admit(&event.path) {
                continue;
            }
            if let Err(e) = engine.reload_template(&event.path) {
                warn!(path = %event.path.display(), error = %e, "template reload failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_event_admitted_repeats_suppressed() {
        let mut debouncer = Debouncer::new(Duration::from_secs(60));
        let path = Path::new("/tmp/t.yaml");
        assert!(debouncer.admit(path));
        assert!(!debouncer.admit(path));
        assert!(!debouncer.admit(path));
    }

    #[test]
    fn test_paths_debounce_independently() {
        let mut debouncer = Debouncer::new(Duration::from_secs(60));
        assert!(debouncer.admit(Path::new("/a.yaml")));
        assert!(debouncer.admit(Path::new("/b.yaml")));
        assert!(!debouncer.admit(Path::new("/a.yaml")));
    }

    #[test]
    fn test_window_expiry_readmits() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let path = Path::new("/c.yaml");
        assert!(debouncer.admit(path));
        std::thread::sleep(Duration::from_millis(20));
        assert!(debouncer.admit(path));
    }
}
