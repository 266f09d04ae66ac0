use thiserror::Error;

/// Failures raised by the authorization-file codecs and models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFileError {
    /// A credential with this login is already present in `USERS.aut`.
    #[error("login {login} already exists")]
    DuplicateLogin { login: String },

    /// No `USERS.aut` line starts with `"<login>:"`.
    #[error("login {login} not found")]
    LoginNotFound { login: String },

    /// An identifier would corrupt the flat line grammar if written.
    #[error("invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl AuthFileError {
    pub(crate) fn invalid(kind: &'static str, value: &str, reason: &'static str) -> Self {
        AuthFileError::InvalidIdentifier {
            kind,
            value: value.to_string(),
            reason,
        }
    }
}
