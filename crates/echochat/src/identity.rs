use tracing::{error, info};
use uuid::Uuid;

use crate::storage::{delete_file, write_file, DataPath, DataPathType, Directory};

/// Supplies the stable anonymous id that tags every request.
pub trait IdentityProvider {
    fn id(&self) -> String;
}

/// A fixed id, for embedding hosts that manage identity themselves.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

impl IdentityProvider for StaticIdentity {
    fn id(&self) -> String {
        self.0.clone()
    }
}

const ANON_ID_FILE: &str = "anon_id";

/// Persists the anonymous id under the data directory, minting a new
/// UUIDv4 the first time it is asked for.
pub struct FileIdentity {
    directory: Directory,
}

impl FileIdentity {
    pub fn new(path: &DataPath) -> Self {
        let directory = Directory::new(path.path(DataPathType::Identity));
        Self { directory }
    }

    /// Forget the stored id; the next call to `id` mints a fresh one.
    pub fn reset(&self) {
        match delete_file(&self.directory.file_path, ANON_ID_FILE) {
            Ok(_) => info!("cleared anonymous id"),
            Err(e) => error!("could not clear anonymous id: {e}"),
        }
    }

    fn load(&self) -> Option<String> {
        let contents = self.directory.get_file(ANON_ID_FILE).ok()?;
        let id = contents.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_owned())
        }
    }
}

impl IdentityProvider for FileIdentity {
    fn id(&self) -> String {
        if let Some(id) = self.load() {
            return id;
        }

        let id = Uuid::new_v4().to_string();
        match write_file(&self.directory.file_path, ANON_ID_FILE, &id) {
            Ok(_) => info!("minted anonymous id {id}"),
            // still usable for this process, it just won't survive a restart
            Err(e) => error!("could not persist anonymous id: {e}"),
        }
        id
    }
}
