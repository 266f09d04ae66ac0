//! Identifier checks for values that end up inside the flat auth files.
//!
//! Every file is line oriented and `:`/`,` delimited, so a value carrying one
//! of those characters would silently change the meaning of the line it is
//! written into.

use crate::AuthFileError;

fn has_line_break(s: &str) -> bool {
    s.contains('\n') || s.contains('\r')
}

/// A login is the first `:`-delimited field of both `USERS.aut` and
/// `GROUPS.aut` lines.
pub fn validate_login(login: &str) -> Result<(), AuthFileError> {
    if login.trim().is_empty() {
        return Err(AuthFileError::invalid("login", login, "must not be empty"));
    }
    if has_line_break(login) {
        return Err(AuthFileError::invalid("login", login, "must not contain a line break"));
    }
    if login.contains(':') {
        return Err(AuthFileError::invalid("login", login, "must not contain ':'"));
    }
    if login.chars().any(char::is_whitespace) {
        return Err(AuthFileError::invalid("login", login, "must not contain whitespace"));
    }
    Ok(())
}

/// Passwords are the tail of a `USERS.aut` line, so `:` is allowed.
pub fn validate_password(password: &str) -> Result<(), AuthFileError> {
    if password.is_empty() {
        return Err(AuthFileError::invalid("password", "<REDACTED>", "must not be empty"));
    }
    if has_line_break(password) {
        return Err(AuthFileError::invalid(
            "password",
            "<REDACTED>",
            "must not contain a line break",
        ));
    }
    Ok(())
}

/// Groups appear both as a `GROUPS.aut` key and inside comma-separated
/// mount-point lists.
pub fn validate_group(group: &str) -> Result<(), AuthFileError> {
    if group.is_empty() {
        return Err(AuthFileError::invalid("group", group, "must not be empty"));
    }
    if has_line_break(group) {
        return Err(AuthFileError::invalid("group", group, "must not contain a line break"));
    }
    if group.contains(':') || group.contains(',') {
        return Err(AuthFileError::invalid("group", group, "must not contain ':' or ','"));
    }
    if group.chars().any(char::is_whitespace) {
        return Err(AuthFileError::invalid("group", group, "must not contain whitespace"));
    }
    Ok(())
}

/// Station names follow `#` on their own line; anything but a line break is
/// representable.
pub fn validate_station_name(name: &str) -> Result<(), AuthFileError> {
    if name.trim().is_empty() {
        return Err(AuthFileError::invalid("station", name, "must not be empty"));
    }
    if has_line_break(name) {
        return Err(AuthFileError::invalid("station", name, "must not contain a line break"));
    }
    Ok(())
}
