//! Player accounts for Pairplay.
//!
//! This crate owns the durable mapping of account name → password:
//!
//! 1. **Creation**: [`AccountStore::try_create`] enforces unique names
//!    and persists the whole collection before returning.
//! 2. **Authentication**: [`AccountStore::authenticate`] checks a
//!    name/password pair.
//! 3. **Storage**: the [`AccountStorage`] trait decides where accounts
//!    live. [`FileStorage`] keeps them in a `name,password` text file;
//!    [`MemoryStorage`] keeps them in memory for tests.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)  ← maps outcomes to LoginResponse codes
//!     ↕
//! Accounts (this crate)  ← uniqueness, credential checks, persistence
//!     ↕
//! Storage backend  ← text file on disk (or memory)
//! ```

mod account;
mod error;
mod storage;
mod store;

pub use account::Account;
pub use error::{AccountError, StorageError};
pub use storage::{AccountStorage, FileStorage, MemoryStorage};
pub use store::AccountStore;
