use std::path::PathBuf;

use tracing::{debug, error};
use uuid::Uuid;

/// A single named local slot holding the guest cart as JSON.
///
/// Local writes have no failure path for callers; implementations log and
/// move on.
pub trait GuestSlot: Send + Sync {
    fn read(&self) -> Option<String>;
    fn write(&self, payload: &str);
    fn remove(&self);
}

/// Builds the guest slot for a client session.
pub type GuestSlotFactory = dyn Fn(Uuid) -> Box<dyn GuestSlot> + Send + Sync;

/// Guest slot backed by one file per client session.
#[derive(Debug, Clone)]
pub struct FileGuestSlot {
    path: PathBuf,
}

impl FileGuestSlot {
    pub fn new(dir: impl Into<PathBuf>, client_id: Uuid) -> Self {
        Self {
            path: dir.into().join(format!("guestCart-{client_id}.json")),
        }
    }
}

impl GuestSlot for FileGuestSlot {
    fn read(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "guest slot read failed");
                None
            }
        }
    }

    fn write(&self, payload: &str) {
        if let Some(dir) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                error!(error = %e, dir = %dir.display(), "guest slot dir create failed");
                return;
            }
        }
        // Write-then-rename so a crash never leaves half a cart behind.
        let tmp = self.path.with_extension("json.tmp");
        let res = std::fs::write(&tmp, payload).and_then(|_| std::fs::rename(&tmp, &self.path));
        match res {
            Ok(()) => debug!(path = %self.path.display(), bytes = payload.len(), "guest slot written"),
            Err(e) => error!(error = %e, path = %self.path.display(), "guest slot write failed"),
        }
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "guest slot removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!(error = %e, path = %self.path.display(), "guest slot remove failed"),
        }
    }
}
