use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Editors write in bursts (truncate, write, rename); collapse them.
const SETTLE: Duration = Duration::from_millis(200);

/// Spawn a filesystem watcher for the config file at `path`.  The receiver
/// gets one notification per burst of changes.  The watcher runs until
/// `cancel` fires or the receiver is dropped.
///
/// The parent directory is watched rather than the file itself so that
/// atomic-rename saves keep being observed.  If that directory does not
/// exist yet, its nearest existing ancestor is watched until it appears.
pub fn spawn_watcher(path: impl AsRef<Path>, cancel: CancellationToken) -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(watch_loop(path.as_ref().to_path_buf(), tx, cancel));
    rx
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<()>, cancel: CancellationToken) {
    let dir = config_dir(&path);
    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = event_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    let Some(mut watched) = rewatch(&mut watcher, None, &dir) else {
        warn!("Config changes will not be picked up until restart");
        return;
    };

    info!("Watching config file: {}", path.display());

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = event_rx.recv() => event,
        };

        let changed = match event {
            // Still waiting for the config directory; anything below the
            // watched ancestor may be it being created.
            Some(Ok(_)) if watched != dir => {
                match rewatch(&mut watcher, Some(&watched), &dir) {
                    Some(root) => watched = root,
                    None => {
                        warn!("Config changes will not be picked up until restart");
                        break;
                    }
                }
                // `mkdir -p && cp` can land the file before the move above.
                watched == dir && path.is_file()
            }
            Some(Ok(e)) => touches(&e, &path),
            Some(Err(e)) => {
                warn!("Watcher error: {e}");
                false
            }
            None => break,
        };

        if changed {
            // Swallow the rest of the burst before notifying.
            tokio::time::sleep(SETTLE).await;
            while event_rx.try_recv().is_ok() {}

            if tx.send(()).await.is_err() {
                break; // receiver dropped
            }
        }
    }
}

/// Directory holding the config file.  A bare file name lives in `.`.
fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Nearest directory at or above `dir` that exists right now.
fn nearest_existing(dir: &Path) -> Option<&Path> {
    dir.ancestors().find(|p| p.is_dir())
}

/// Point `watcher` at the nearest existing directory at or above `dir`,
/// leaving `current` if that moved.  Returns the directory now watched.
fn rewatch(
    watcher: &mut RecommendedWatcher,
    current: Option<&Path>,
    dir: &Path,
) -> Option<PathBuf> {
    let Some(root) = nearest_existing(dir) else {
        warn!("No directory above '{}' exists", dir.display());
        return None;
    };
    if current == Some(root) {
        return Some(root.to_path_buf());
    }

    if let Some(old) = current {
        let _ = watcher.unwatch(old);
    }
    if let Err(e) = watcher.watch(root, RecursiveMode::NonRecursive) {
        warn!("Not watching '{}' for config changes: {e}", root.display());
        return None;
    }

    if root != dir {
        info!(
            "'{}' does not exist yet; watching '{}' until it does",
            dir.display(),
            root.display()
        );
    }
    Some(root.to_path_buf())
}

fn touches(event: &Event, path: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p.file_name() == path.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn reacts_to_writes_of_the_config_file() {
        let cfg = Path::new("/home/u/.config/tempgraph/tempgraph.toml");
        assert!(touches(&event(EventKind::Modify(ModifyKind::Any), "/home/u/.config/tempgraph/tempgraph.toml"), cfg));
        assert!(touches(&event(EventKind::Create(CreateKind::File), "/home/u/.config/tempgraph/tempgraph.toml"), cfg));
    }

    #[test]
    fn ignores_siblings_and_removals() {
        let cfg = Path::new("/home/u/.config/tempgraph/tempgraph.toml");
        assert!(!touches(&event(EventKind::Modify(ModifyKind::Any), "/home/u/.config/tempgraph/notes.txt"), cfg));
        assert!(!touches(&event(EventKind::Remove(RemoveKind::File), "/home/u/.config/tempgraph/tempgraph.toml"), cfg));
    }

    #[test]
    fn bare_file_name_lives_in_the_working_directory() {
        assert_eq!(config_dir(Path::new("tempgraph.toml")), PathBuf::from("."));
        assert_eq!(config_dir(Path::new("/etc/tempgraph.toml")), PathBuf::from("/etc"));
    }

    #[test]
    fn missing_config_dir_falls_back_to_nearest_ancestor() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("xdg").join("tempgraph");

        assert_eq!(nearest_existing(&dir), Some(root.path()));

        std::fs::create_dir(root.path().join("xdg")).unwrap();
        assert_eq!(nearest_existing(&dir), Some(root.path().join("xdg").as_path()));

        std::fs::create_dir(&dir).unwrap();
        assert_eq!(nearest_existing(&dir), Some(dir.as_path()));
    }

    #[tokio::test]
    async fn notices_a_config_file_created_with_its_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("tempgraph");
        let path = dir.join("tempgraph.toml");
        let cancel = CancellationToken::new();
        let mut rx = spawn_watcher(&path, cancel.clone());

        // Let the watcher arm on `root` before the directory appears.
        tokio::time::sleep(Duration::from_millis(300)).await;
        std::fs::create_dir(&dir).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        std::fs::write(&path, "[chart]\nauto_scale = true\n").unwrap();

        let notified = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        cancel.cancel();
        assert_eq!(notified.ok().flatten(), Some(()));
    }
}
