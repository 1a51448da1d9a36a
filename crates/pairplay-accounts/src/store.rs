//! The account store: unique names, credential checks, persistence.
//!
//! # Concurrency note
//!
//! `AccountStore` is NOT thread-safe by itself. The server keeps it
//! behind the same mutex as the match queue and session table, so one
//! inbound message sees (and mutates) all three consistently.

use std::collections::BTreeMap;

use crate::{Account, AccountError, AccountStorage};

/// All registered accounts, loaded from and written back to an
/// [`AccountStorage`].
///
/// Accounts are keyed by name in a `BTreeMap`: lookups are logarithmic,
/// and saves write the file in a stable (name) order.
pub struct AccountStore<S: AccountStorage> {
    accounts: BTreeMap<String, Account>,
    storage: S,
}

impl<S: AccountStorage> AccountStore<S> {
    /// Loads every account from `storage`.
    ///
    /// If the storage holds the same name twice, the first record wins
    /// and the duplicate is dropped with a warning.
    ///
    /// # Errors
    /// Returns [`AccountError::Storage`] if the backend can't be read.
    /// The server treats this as fatal at startup.
    pub fn open(mut storage: S) -> Result<Self, AccountError> {
        let mut accounts = BTreeMap::new();
        for account in storage.load()? {
            if accounts.contains_key(account.name()) {
                tracing::warn!(name = %account.name(), "duplicate account record ignored");
                continue;
            }
            accounts.insert(account.name().to_string(), account);
        }
        Ok(Self { accounts, storage })
    }

    /// Creates a new account and persists the full collection.
    ///
    /// The new account is only kept if the save succeeds; on a storage
    /// failure the in-memory collection is left exactly as it was.
    ///
    /// # Errors
    /// - [`AccountError::NameInUse`]: an account with `name` exists
    /// - [`AccountError::InvalidCredential`]: unstorable name/password
    /// - [`AccountError::Storage`]: the save failed
    pub fn try_create(&mut self, name: &str, password: &str) -> Result<(), AccountError> {
        if self.accounts.contains_key(name) {
            return Err(AccountError::NameInUse(name.to_string()));
        }
        let account = Account::new(name, password)?;
        self.accounts.insert(name.to_string(), account);

        if let Err(e) = self.persist() {
            self.accounts.remove(name);
            return Err(e.into());
        }

        tracing::info!(%name, total = self.accounts.len(), "account created");
        Ok(())
    }

    /// Checks a name/password pair.
    ///
    /// # Errors
    /// - [`AccountError::NameNotFound`]: no such account
    /// - [`AccountError::IncorrectPassword`]: wrong password
    pub fn authenticate(&self, name: &str, password: &str) -> Result<(), AccountError> {
        let account = self
            .accounts
            .get(name)
            .ok_or_else(|| AccountError::NameNotFound(name.to_string()))?;

        if !account.password_matches(password) {
            return Err(AccountError::IncorrectPassword(name.to_string()));
        }
        Ok(())
    }

    /// Returns `true` if an account with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.accounts.contains_key(name)
    }

    /// Returns the number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if there are no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// The backend this store persists to.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the backend (e.g. to inject failures in tests).
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn persist(&mut self) -> Result<(), crate::StorageError> {
        let snapshot: Vec<Account> = self.accounts.values().cloned().collect();
        self.storage.save(&snapshot)
    }
}

// =========================================================================
// Tests
// =========================================================================
