use serde::{Deserialize, Serialize};

use crate::AuthFileError;

/// Canonical correction-stream identifier.
///
/// The canonical form is **bare**: no leading `/`, no trailing `:`. Both
/// `"/CMRP"` and `"CMRP:"` normalize to `"CMRP"`, on parse and on write alike.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormatKey(String);

impl FormatKey {
    /// Normalize a raw mount-point name into its canonical key.
    pub fn normalize(raw: &str) -> Result<Self, AuthFileError> {
        let bare = raw
            .trim()
            .trim_end_matches(':')
            .trim_start_matches('/')
            .trim();
        if bare.is_empty() {
            return Err(AuthFileError::invalid("format", raw, "must not be empty"));
        }
        if bare.starts_with('#') {
            return Err(AuthFileError::invalid(
                "format",
                raw,
                "must not start with '#' (reads back as a station header)",
            ));
        }
        if bare.contains(':') || bare.contains(',') {
            return Err(AuthFileError::invalid("format", raw, "must not contain ':' or ','"));
        }
        if bare.chars().any(char::is_whitespace) {
            return Err(AuthFileError::invalid("format", raw, "must not contain whitespace"));
        }
        Ok(Self(bare.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FormatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FormatKey {
    type Error = AuthFileError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::normalize(&raw)
    }
}

impl From<FormatKey> for String {
    fn from(k: FormatKey) -> Self {
        k.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_prefixed_and_colon_suffixed_collapse_to_bare() {
        for raw in ["CMRP", "/CMRP", "CMRP:", "/CMRP:", "//CMRP::", " /CMRP "] {
            assert_eq!(FormatKey::normalize(raw).unwrap().as_str(), "CMRP", "{raw}");
        }
    }

    #[test]
    fn empty_after_normalization_is_rejected() {
        assert!(FormatKey::normalize("/").is_err());
        assert!(FormatKey::normalize(":").is_err());
        assert!(FormatKey::normalize("").is_err());
    }

    #[test]
    fn header_marker_is_rejected() {
        for raw in ["#RTCM3", "#", "/#RTCM3", " #CMRP: "] {
            assert!(
                matches!(
                    FormatKey::normalize(raw),
                    Err(AuthFileError::InvalidIdentifier { kind: "format", .. })
                ),
                "{raw}"
            );
        }
        assert_eq!(FormatKey::normalize("RTCM#3").unwrap().as_str(), "RTCM#3");
    }
}
