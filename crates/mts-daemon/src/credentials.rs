//! Subscriber credential generation.

use mts_authfiles::CredentialEntry;
use uuid::Uuid;

/// Supplies a fresh login/password pair when the caller provides none.
///
/// Implementations should avoid collisions, but the activate workflow still
/// re-checks the credential store and fails on a duplicate login.
pub trait CredentialGenerator: Send + Sync {
    fn generate(&self) -> CredentialEntry;
}

/// 8-char lowercase login and 8-char uppercase password, each cut from a
/// random v4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCredentialGenerator;

impl CredentialGenerator for UuidCredentialGenerator {
    fn generate(&self) -> CredentialEntry {
        let login = Uuid::new_v4().as_simple().to_string()[..8].to_string();
        let password = Uuid::new_v4().as_simple().to_string()[..8].to_ascii_uppercase();
        CredentialEntry::new(login, password)
    }
}

/// Group assigned to a subscriber when the caller names none.
pub fn default_group_for(login: &str) -> String {
    format!("g{login}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_credentials_are_valid_and_distinct() {
        let g = UuidCredentialGenerator;
        let a = g.generate();
        let b = g.generate();
        a.validate().unwrap();
        assert_eq!(a.login.len(), 8);
        assert_eq!(a.password, a.password.to_ascii_uppercase());
        assert_ne!(a.login, b.login);
    }

    #[test]
    fn default_group_prefixes_g() {
        assert_eq!(default_group_for("abc12345"), "gabc12345");
    }
}
