//! The account record and its one-line persisted form.

use std::fmt;

use crate::AccountError;

/// Separator between name and password in the persisted form.
pub(crate) const DELIMITER: char = ',';

/// A registered player: a unique, case-sensitive name and its password.
///
/// Accounts are immutable once created. Passwords are stored as given;
/// hashing is out of scope for this server.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    name: String,
    password: String,
}

impl Account {
    /// Creates an account, rejecting names or passwords that would break
    /// the one-record-per-line file format.
    ///
    /// # Errors
    /// Returns [`AccountError::InvalidCredential`] if either value is
    /// empty or contains `,`, `\r` or `\n`.
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Result<Self, AccountError> {
        let name = name.into();
        let password = password.into();
        check("name", &name)?;
        check("password", &password)?;
        Ok(Self { name, password })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The persisted form: `name,password` (no trailing newline).
    pub fn to_line(&self) -> String {
        format!("{}{DELIMITER}{}", self.name, self.password)
    }

    /// Parses one persisted line. Returns `None` if it isn't a
    /// `name,password` record.
    ///
    /// Empty fields are kept: older data files hold records such as
    /// `ann,` and they must still load. Only new accounts go through the
    /// emptiness check in [`Account::new`].
    pub fn from_line(line: &str) -> Option<Self> {
        let (name, password) = line.split_once(DELIMITER)?;
        if has_separator(name) || has_separator(password) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            password: password.to_string(),
        })
    }

    pub(crate) fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn check(what: &str, value: &str) -> Result<(), AccountError> {
    if value.is_empty() {
        return Err(AccountError::InvalidCredential(format!("{what} is empty")));
    }
    if has_separator(value) {
        return Err(AccountError::InvalidCredential(format!(
            "{what} contains a delimiter or line break"
        )));
    }
    Ok(())
}

fn has_separator(value: &str) -> bool {
    value.contains([DELIMITER, '\r', '\n'])
}
