//! Filesystem watchers driving the live-reload events.
//!
//! Three watch targets, each mapped to one event: the viewer's own assets
//! (`reload`), the parser program's directory (`programMod`), and the
//! language root (`fileMod` with the root-relative path). Watch failures are
//! logged and leave that one watch inactive; the server keeps running.

use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::events::{EventChannel, ViewerEvent};
use crate::files::to_slash_path;

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Start every watcher the configuration names.
pub fn spawn_watchers(config: &Config, events: Arc<EventChannel>) {
    {
        let events = events.clone();
        watch(&config.assets, move |path| {
            log::info!("viewer asset modified: {}", path.display());
            events.broadcast(&ViewerEvent::Reload);
        });
    }

    if let Some(program_dir) = config.main.parent().filter(|p| !p.as_os_str().is_empty()) {
        let events = events.clone();
        watch(program_dir, move |path| {
            log::info!("parser program modified in file: {}", path.display());
            events.broadcast(&ViewerEvent::ProgramMod);
        });
    }

    let root = config
        .root
        .canonicalize()
        .unwrap_or_else(|_| config.root.clone());
    watch(&config.root, move |path| {
        let rel = path
            .strip_prefix(&root)
            .map(to_slash_path)
            .unwrap_or_else(|_| path.to_string_lossy().into_owned());
        log::info!("language file modified: {rel}");
        events.broadcast(&ViewerEvent::FileMod(rel));
    });
}

/// Watch one path recursively, invoking `handler` with the changed path.
/// Events are debounced; the watcher lives on its own thread for the life of
/// the process.
fn watch(path: &Path, handler: impl Fn(PathBuf) + Send + 'static) {
    if !path.exists() {
        log::warn!("not watching {}: path does not exist", path.display());
        return;
    }

    let (tx, rx) = channel();
    let mut watcher = match RecommendedWatcher::new(tx, NotifyConfig::default()) {
        Ok(watcher) => watcher,
        Err(e) => {
            log::warn!("failed to create watcher for {}: {e}", path.display());
            return;
        }
    };
    if let Err(e) = watcher.watch(path, RecursiveMode::Recursive) {
        log::warn!("failed to watch {}: {e}", path.display());
        return;
    }

    std::thread::spawn(move || {
        // Moved in so it is not dropped while the thread runs.
        let _watcher = watcher;
        let mut last_event = Instant::now() - DEBOUNCE;

        for result in rx {
            let Ok(event) = result else { continue };
            if !is_change(&event) {
                continue;
            }
            if last_event.elapsed() < DEBOUNCE {
                continue;
            }
            last_event = Instant::now();

            if let Some(changed) = event.paths.first() {
                handler(changed.clone());
            }
        }
    });
}

fn is_change(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
