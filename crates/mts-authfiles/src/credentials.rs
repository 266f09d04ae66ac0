use serde::{Deserialize, Serialize};

use crate::{validate_login, validate_password, AuthFileError};

/// One `login:password` record from `USERS.aut`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub login: String,
    pub password: String,
}

impl CredentialEntry {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Both fields must be representable on a single `login:password` line.
    pub fn validate(&self) -> Result<(), AuthFileError> {
        validate_login(&self.login)?;
        validate_password(&self.password)
    }
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("login", &self.login)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Ordered credential table parsed from `USERS.aut`.
///
/// Lines read from the file are written back exactly as read; only appended
/// entries are rendered from their fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialStore {
    entries: Vec<CredentialEntry>,
    /// Source text of `entries[..source_lines.len()]`, without its line ending.
    source_lines: Vec<String>,
}

impl CredentialStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Split on newlines, drop blank lines, split each line on the first `:`.
    /// A line with no `:` becomes a login with an empty password.
    pub fn parse(text: &str) -> Self {
        let mut store = Self::default();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            store.entries.push(match line.split_once(':') {
                Some((login, password)) => CredentialEntry::new(login, password),
                None => CredentialEntry::new(line, ""),
            });
            store.source_lines.push(line.to_string());
        }
        store
    }

    pub fn entries(&self) -> &[CredentialEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_login(&self, login: &str) -> bool {
        self.entries.iter().any(|e| e.login == login)
    }

    /// Append a credential. A login that is already present is a contract
    /// violation and leaves the store untouched.
    pub fn append(&mut self, entry: CredentialEntry) -> Result<(), AuthFileError> {
        entry.validate()?;
        if self.contains_login(&entry.login) {
            return Err(AuthFileError::DuplicateLogin { login: entry.login });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// One line per entry, newline terminated. Parsed lines come back
    /// unchanged; appended ones render as `login:password`. An empty store
    /// renders as empty text.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for raw in &self.source_lines {
            out.push_str(raw);
            out.push('\n');
        }
        for e in &self.entries[self.source_lines.len()..] {
            out.push_str(&e.login);
            out.push(':');
            out.push_str(&e.password);
            out.push('\n');
        }
        out
    }

    /// Remove every line of `text` that starts with `"<login>:"`, keeping all
    /// other lines byte for byte.
    ///
    /// Fails with [`AuthFileError::LoginNotFound`] before touching anything if
    /// no such line exists.
    pub fn remove(text: &str, login: &str) -> Result<String, AuthFileError> {
        let prefix = format!("{login}:");
        if !text.lines().any(|l| l.starts_with(&prefix)) {
            return Err(AuthFileError::LoginNotFound {
                login: login.to_string(),
            });
        }
        Ok(text
            .split_inclusive('\n')
            .filter(|l| !l.starts_with(&prefix))
            .collect())
    }
}
