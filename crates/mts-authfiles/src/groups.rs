use serde::{Deserialize, Serialize};

use crate::{validate_group, validate_login, AuthFileError};

/// Flag value written for every membership this system creates.
pub const MEMBERSHIP_FLAG: &str = "1";

/// One `group:login:flag` record from `GROUPS.aut`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group: String,
    pub login: String,
    pub flag: String,
}

impl GroupMembership {
    /// Membership with the standard `1` flag.
    pub fn new(group: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            login: login.into(),
            flag: MEMBERSHIP_FLAG.to_string(),
        }
    }
}

/// Ordered membership table parsed from `GROUPS.aut`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupStore {
    entries: Vec<GroupMembership>,
    /// Source text of `entries[..source_lines.len()]`, re-emitted verbatim.
    source_lines: Vec<String>,
}

impl GroupStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Missing trailing fields parse as empty strings; the line itself is
    /// kept as read.
    pub fn parse(text: &str) -> Self {
        let mut store = Self::default();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let mut parts = line.splitn(3, ':');
            store.entries.push(GroupMembership {
                group: parts.next().unwrap_or_default().to_string(),
                login: parts.next().unwrap_or_default().to_string(),
                flag: parts.next().unwrap_or_default().to_string(),
            });
            store.source_lines.push(line.to_string());
        }
        store
    }

    pub fn entries(&self) -> &[GroupMembership] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a membership. Returns `false` when the same group/login pair is
    /// already recorded.
    pub fn append(&mut self, membership: GroupMembership) -> Result<bool, AuthFileError> {
        validate_group(&membership.group)?;
        validate_login(&membership.login)?;
        if self
            .entries
            .iter()
            .any(|m| m.group == membership.group && m.login == membership.login)
        {
            return Ok(false);
        }
        self.entries.push(membership);
        Ok(true)
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for raw in &self.source_lines {
            out.push_str(raw);
            out.push('\n');
        }
        for m in &self.entries[self.source_lines.len()..] {
            out.push_str(&format!("{}:{}:{}\n", m.group, m.login, m.flag));
        }
        out
    }

    /// Remove every line of `text` starting with `"<group>:"`. An absent group
    /// leaves the text unchanged; the count of removed lines is returned.
    pub fn remove_group(text: &str, group: &str) -> (String, usize) {
        let prefix = format!("{group}:");
        let mut removed = 0usize;
        let kept = text
            .split_inclusive('\n')
            .filter(|l| {
                let hit = l.starts_with(&prefix);
                if hit {
                    removed += 1;
                }
                !hit
            })
            .collect();
        (kept, removed)
    }
}
