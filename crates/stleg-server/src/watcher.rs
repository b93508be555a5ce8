//! Generalizes the teacher's `auth.toml` hot-reload watcher to the two
//! files this server hot-reloads without a restart: the Key Directory
//! source and the revocation seed file (spec's "Ambient stack" section).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Something a `ConfigWatcher` can re-run when its file changes. Owns
/// whatever state it needs to apply the new contents; the watcher itself
/// only knows about the file path and the debounce timing.
#[async_trait]
pub trait Reloadable: Send + Sync {
    async fn reload(&self) -> Result<(), crate::error::ServerError>;
}

/// Watches a single file (by watching its parent directory, since editors
/// commonly replace files atomically rather than writing in place) and
/// calls `target.reload()` once events have settled.
pub struct ConfigWatcher {
    path: PathBuf,
    target: Arc<dyn Reloadable>,
    debounce: Duration,
}

impl ConfigWatcher {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, target: Arc<dyn Reloadable>) -> Self {
        Self {
            path: path.into(),
            target,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!(error = %e, path = %self.path.display(), "config watcher exited with error");
            }
        })
    }

    async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(16);

        let watch_dir = self.path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let filename = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();

        let _watcher = {
            let tx = tx.clone();
            let filename = filename.clone();
            let mut watcher = RecommendedWatcher::new(
                move |res: Result<notify::Event, notify::Error>| match res {
                    Ok(event) => {
                        if is_relevant_event(event.kind) {
                            let is_our_file = event
                                .paths
                                .iter()
                                .any(|p| p.file_name().is_some_and(|name| name == filename.as_os_str()));
                            if is_our_file {
                                let _ = tx.try_send(());
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "filesystem watcher error"),
                },
                notify::Config::default(),
            )?;
            watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
            info!(path = %self.path.display(), "config watcher started");
            watcher
        };

        loop {
            if rx.recv().await.is_none() {
                debug!("config watcher channel closed, shutting down");
                break;
            }

            tokio::time::sleep(self.debounce).await;
            while rx.try_recv().is_ok() {}

            info!(path = %self.path.display(), "reloading");
            if let Err(e) = self.target.reload().await {
                error!(error = %e, path = %self.path.display(), "reload failed, keeping previous state");
            }
        }

        Ok(())
    }
}

fn is_relevant_event(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
