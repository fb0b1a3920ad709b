use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crowdwork_core::{GuardEntries, GuardStore, GuardStoreError};

/// Persists the vote guard as a JSON object of request ids to expiry timestamps.
/// Plays the role a browser cookie plays for the web client.
pub struct FileGuardStore {
    path: PathBuf,
}

impl FileGuardStore {
    pub fn new<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GuardStore for FileGuardStore {
    fn load(&self) -> Result<GuardEntries, GuardStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(GuardEntries::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(GuardEntries::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &GuardEntries) -> Result<(), GuardStoreError> {
        let contents = serde_json::to_string_pretty(entries)?;

        // Write next to the file first, so a crash never leaves half a guard behind
        let temporary = self.path.with_extension("tmp");
        fs::write(&temporary, contents)?;
        fs::rename(&temporary, &self.path)?;

        Ok(())
    }
}
