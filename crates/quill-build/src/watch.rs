//! Rebuild on change.
//!
//! A [`Watcher`] thread turns filesystem events into signals on a
//! capacity-one channel. [`watch_loop`] drains that channel, waits for a
//! quiet period and then runs a full build. The watcher never builds, so
//! only one build ever runs at a time.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::Duration;

use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind};
use notify::{EventKind, RecursiveMode};
use quill_config::{ConfigError, WatchConfig};

use crate::error::{BuildError, WatchError};
use crate::pipeline::Builder;

/// Watch and debounce settings.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period before a rebuild.
    pub debounce: Duration,
    /// Registration attempts before giving up.
    pub max_retries: u32,
    /// Pause between registration attempts.
    pub retry_delay: Duration,
    /// File name patterns whose events are dropped.
    pub ignore: Vec<glob::Pattern>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            max_retries: 10,
            retry_delay: Duration::from_millis(100),
            ignore: Vec::new(),
        }
    }
}

impl WatchOptions {
    /// Options from the `[watch]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an invalid ignore pattern.
    pub fn from_config(config: &WatchConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            debounce: config.debounce(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            ignore: config.ignore_patterns()?,
        })
    }
}

/// Background thread watching a source tree.
pub struct Watcher {
    handle: JoinHandle<Result<(), WatchError>>,
}

impl Watcher {
    /// Start watching `root`. Every relevant change sends `()` on `signal`
    /// unless a signal is already pending.
    ///
    /// The thread exits when the receiving side of `signal` is dropped,
    /// when watches cannot be registered, or on the first error reported by
    /// the watch backend.
    #[must_use]
    pub fn spawn(root: PathBuf, signal: SyncSender<()>, options: WatchOptions) -> Self {
        let handle = std::thread::spawn(move || run(&root, &signal, &options));
        Self { handle }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the thread and return how it ended. A panic reads as
    /// [`WatchError::Disconnected`].
    pub fn join(self) -> Result<(), WatchError> {
        self.handle.join().unwrap_or(Err(WatchError::Disconnected))
    }
}

fn run(root: &Path, signal: &SyncSender<()>, options: &WatchOptions) -> Result<(), WatchError> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = tx.send(res);
    })
    .map_err(|source| WatchError::Registration {
        path: root.to_path_buf(),
        source,
    })?;

    let watched = register(&mut watcher, root, options)?;
    tracing::info!(path = %root.display(), dirs = watched.len(), "Watching for changes");
    forward(&mut watcher, &rx, root, signal, options, watched)
}

/// Turn watch events into rebuild signals until `signal` disconnects or the
/// backend reports an error.
fn forward(
    watcher: &mut impl notify::Watcher,
    events: &Receiver<notify::Result<notify::Event>>,
    root: &Path,
    signal: &SyncSender<()>,
    options: &WatchOptions,
    mut watched: Vec<PathBuf>,
) -> Result<(), WatchError> {
    for res in events {
        let event = res.map_err(WatchError::Backend)?;
        if !is_relevant(&event, &options.ignore) {
            continue;
        }
        tracing::debug!(kind = ?event.kind, paths = ?event.paths, "Change detected");

        if is_structural(&event) {
            unregister(watcher, &watched);
            watched = register(watcher, root, options)?;
            tracing::debug!(dirs = watched.len(), "Directory watches rebuilt");
        }

        match signal.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => return Ok(()),
        }
    }
    Ok(())
}

/// Whether an event should trigger a rebuild: a create, modify or remove
/// touching at least one path whose file name no ignore pattern matches.
fn is_relevant(event: &notify::Event, ignore: &[glob::Pattern]) -> bool {
    match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => {}
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => return false,
        EventKind::Modify(_) => {}
        _ => return false,
    }
    event.paths.iter().any(|path| {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        !ignore.iter().any(|pattern| pattern.matches(&name))
    })
}

/// Whether an event changes the directory structure.
fn is_structural(event: &notify::Event) -> bool {
    match event.kind {
        EventKind::Create(CreateKind::Folder)
        | EventKind::Remove(RemoveKind::Folder)
        | EventKind::Modify(ModifyKind::Name(_)) => true,
        EventKind::Create(_) => event.paths.iter().any(|path| path.is_dir()),
        _ => false,
    }
}

/// Watch `root` and every directory beneath it, retrying failed passes.
fn register(
    watcher: &mut impl notify::Watcher,
    root: &Path,
    options: &WatchOptions,
) -> Result<Vec<PathBuf>, WatchError> {
    let mut attempt = 0;
    loop {
        match register_tree(watcher, root) {
            Ok(dirs) => return Ok(dirs),
            Err((path, source)) if attempt < options.max_retries => {
                attempt += 1;
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    attempt,
                    "Could not watch directory, retrying"
                );
                std::thread::sleep(options.retry_delay);
            }
            Err((path, source)) => return Err(WatchError::Registration { path, source }),
        }
    }
}

/// One breadth-first registration pass. On failure the watches added so
/// far are removed again.
fn register_tree(
    watcher: &mut impl notify::Watcher,
    root: &Path,
) -> Result<Vec<PathBuf>, (PathBuf, notify::Error)> {
    let mut watched = Vec::new();
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        if let Err(source) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
            unregister(watcher, &watched);
            return Err((dir, source));
        }

        // A directory may vanish between listing and watching.
        let mut children: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_ok_and(|ty| ty.is_dir()))
                .map(|entry| entry.path())
                .collect(),
            Err(error) => {
                tracing::debug!(path = %dir.display(), %error, "Could not list directory");
                Vec::new()
            }
        };
        children.sort();
        queue.extend(children);
        watched.push(dir);
    }
    Ok(watched)
}

fn unregister(watcher: &mut impl notify::Watcher, watched: &[PathBuf]) {
    for dir in watched {
        let _ = watcher.unwatch(dir);
    }
}

/// Run `rebuild` once per burst of signals.
///
/// Each signal restarts the quiet period; `rebuild` runs only after
/// `quiet` passes without one. Returns when the channel disconnects or
/// `rebuild` fails.
pub(crate) fn debounce<E>(
    signals: &Receiver<()>,
    quiet: Duration,
    mut rebuild: impl FnMut() -> Result<(), E>,
) -> Result<(), E> {
    while signals.recv().is_ok() {
        loop {
            match signals.recv_timeout(quiet) {
                Ok(()) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
        rebuild()?;
    }
    Ok(())
}

/// Build once, then rebuild after every burst of changes below the source
/// directory.
///
/// Runs until a build fails or the watcher stops; both are returned.
pub fn watch_loop(builder: &Builder, options: WatchOptions) -> Result<(), WatchError> {
    let (tx, rx) = mpsc::sync_channel(1);
    // The initial build goes through the same debounce as every change.
    let _ = tx.try_send(());

    let quiet = options.debounce;
    let watcher = Watcher::spawn(builder.config().source_dir.clone(), tx, options);

    debounce(&rx, quiet, || -> Result<(), BuildError> {
        tracing::info!("Rebuilding");
        builder.process().map(drop)
    })?;

    // The channel only disconnects once the watcher thread is gone.
    watcher.join()?;
    Err(WatchError::Disconnected)
}
