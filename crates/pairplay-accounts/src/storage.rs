//! Durable storage backends for accounts.
//!
//! The [`AccountStore`](crate::AccountStore) doesn't do file I/O itself.
//! It talks to an [`AccountStorage`]: a trait with two operations:
//! load everything, and save everything. This lets us:
//! - keep accounts in a plain text file in production ([`FileStorage`])
//! - keep them in memory in tests ([`MemoryStorage`])
//!
//! The contract is "load all at startup, rewrite all on every change".
//! There is no incremental append.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{Account, StorageError};

/// Where accounts are persisted.
///
/// # Trait bounds
///
/// `Send + 'static` because the store lives inside the server's shared
/// state for the whole process and is touched from whichever Tokio task
/// is handling the current message.
pub trait AccountStorage: Send + 'static {
    /// Reads every persisted account.
    ///
    /// A backend with nothing persisted yet returns an empty list.
    fn load(&mut self) -> Result<Vec<Account>, StorageError>;

    /// Replaces the persisted collection with `accounts`.
    fn save(&mut self, accounts: &[Account]) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Stores accounts in a text file, one `name,password` record per line.
///
/// Saves write a sibling `.tmp` file first and rename it over the real
/// one, so a crash mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_err(&self, source: io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl AccountStorage for FileStorage {
    fn load(&mut self) -> Result<Vec<Account>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            // No file yet means no accounts yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no account file, starting empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut accounts = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let account = Account::from_line(line).ok_or_else(|| StorageError::MalformedLine {
                path: self.path.clone(),
                line: index + 1,
            })?;
            accounts.push(account);
        }

        tracing::info!(
            path = %self.path.display(),
            count = accounts.len(),
            "loaded accounts"
        );
        Ok(accounts)
    }

    fn save(&mut self, accounts: &[Account]) -> Result<(), StorageError> {
        let temp = self.temp_path();

        let mut file = fs::File::create(&temp).map_err(|e| self.write_err(e))?;
        for account in accounts {
            writeln!(file, "{}", account.to_line()).map_err(|e| self.write_err(e))?;
        }
        file.sync_all().map_err(|e| self.write_err(e))?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(|e| self.write_err(e))?;

        tracing::debug!(
            path = %self.path.display(),
            count = accounts.len(),
            "saved accounts"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Keeps the "persisted" accounts in memory.
///
/// Useful in tests: it records every save, and can be told to fail
/// saves to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    accounts: Vec<Account>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage that will load the given accounts.
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            ..Self::default()
        }
    }

    /// Makes every subsequent `save` fail (or succeed again).
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    /// The accounts as of the last successful save (or initial load).
    pub fn persisted(&self) -> &[Account] {
        &self.accounts
    }

    /// How many saves succeeded.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl AccountStorage for MemoryStorage {
    fn load(&mut self) -> Result<Vec<Account>, StorageError> {
        Ok(self.accounts.clone())
    }

    fn save(&mut self, accounts: &[Account]) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Unavailable("memory storage set to fail".into()));
        }
        self.accounts = accounts.to_vec();
        self.saves += 1;
        Ok(())
    }
}
