use std::fs;
use std::path::{Path, PathBuf};

use crate::models::TrackerData;
use crate::vault;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("vault error: {0}")]
    Vault(#[from] vault::VaultError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data file is encrypted; a passphrase is required")]
    PassphraseRequired,
    #[error("data directory not found")]
    NoDataDir,
}

/// Default location of the tracker data file.
pub fn default_data_path() -> Result<PathBuf, StorageError> {
    let dir = dirs::data_local_dir()
        .ok_or(StorageError::NoDataDir)?
        .join("cykel");
    Ok(dir.join("data.cykel"))
}

/// Load tracker data from `path`, opening the vault when the file is sealed.
/// Malformed cycle records are dropped with a warning and reminder settings
/// are clamped to their supported ranges.
pub fn load(path: &Path, passphrase: Option<&str>) -> Result<TrackerData, StorageError> {
    let bytes = fs::read(path)?;
    let mut data: TrackerData = if vault::is_sealed(&bytes) {
        let passphrase = passphrase.ok_or(StorageError::PassphraseRequired)?;
        let plaintext = vault::open(passphrase, &bytes)?;
        serde_json::from_slice(&plaintext)?
    } else {
        serde_json::from_slice(&bytes)?
    };

    data.cycles.retain(|cycle| match cycle.validate() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(id = %cycle.id, %err, "dropping malformed cycle record");
            false
        }
    });
    data.settings.reminders = std::mem::take(&mut data.settings.reminders).clamped();

    tracing::debug!(
        path = %path.display(),
        cycles = data.cycles.len(),
        "tracker data loaded"
    );
    Ok(data)
}

/// Save tracker data to `path`, sealed when a passphrase is given.
pub fn save(path: &Path, data: &TrackerData, passphrase: Option<&str>) -> Result<(), StorageError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_vec_pretty(data)?;
    let bytes = match passphrase {
        Some(p) => vault::seal(p, &json)?,
        None => json,
    };
    fs::write(path, bytes)?;
    Ok(())
}
