//! In-memory model of `clientmounts.aut`.
//!
//! Grammar, one item per line (surrounding whitespace ignored):
//!
//! ```text
//! #<station>                  opens (or reopens) a station block
//! <format>[:<g1>,<g2>,...]    format line for the currently open block
//! <blank>                     ignored
//! ```
//!
//! Parsing is a two-state scanner (outside a block / inside a block). Format
//! lines seen outside a block are discarded, as are lines whose format key is
//! empty after normalization. A bare `#` closes the open block.

use serde::{Deserialize, Serialize};

use crate::{validate_group, validate_station_name, AuthFileError, FormatKey};

// ---------------------------------------------------------------------------
// GroupList
// ---------------------------------------------------------------------------

/// Ordered set of group identifiers; file order is kept, duplicates never are.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupList(Vec<String>);

impl GroupList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (and leaves the list alone) if `group` is already listed.
    pub fn insert(&mut self, group: &str) -> bool {
        if self.contains(group) {
            return false;
        }
        self.0.push(group.to_string());
        true
    }

    pub fn remove(&mut self, group: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|g| g != group);
        self.0.len() != before
    }

    pub fn contains(&self, group: &str) -> bool {
        self.0.iter().any(|g| g == group)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for GroupList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = GroupList::new();
        for g in iter {
            list.insert(g.as_ref());
        }
        list
    }
}

// ---------------------------------------------------------------------------
// StationBlock
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEntry {
    pub key: FormatKey,
    pub groups: GroupList,
}

/// One `#<station>` block: its formats in file order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationBlock {
    name: String,
    formats: Vec<FormatEntry>,
}

impl StationBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formats: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formats(&self) -> &[FormatEntry] {
        &self.formats
    }

    pub fn groups(&self, key: &FormatKey) -> Option<&GroupList> {
        self.formats.iter().find(|f| &f.key == key).map(|f| &f.groups)
    }

    /// Group list for `key`, created empty if the format is new.
    /// The flag reports whether the format entry was created.
    fn groups_mut_or_insert(&mut self, key: FormatKey) -> (&mut GroupList, bool) {
        match self.formats.iter().position(|f| f.key == key) {
            Some(i) => (&mut self.formats[i].groups, false),
            None => {
                self.formats.push(FormatEntry {
                    key,
                    groups: GroupList::new(),
                });
                let last = self.formats.len() - 1;
                (&mut self.formats[last].groups, true)
            }
        }
    }

    /// True if any format still lists at least one group.
    pub fn has_members(&self) -> bool {
        self.formats.iter().any(|f| !f.groups.is_empty())
    }

    pub fn lists_group(&self, group: &str) -> bool {
        self.formats.iter().any(|f| f.groups.contains(group))
    }

    /// Strip `group` from every format, then drop formats left empty.
    fn remove_group(&mut self, group: &str) -> (Vec<FormatKey>, Vec<FormatKey>) {
        let mut removed_from = Vec::new();
        for f in &mut self.formats {
            if f.groups.remove(group) {
                removed_from.push(f.key.clone());
            }
        }
        let mut dropped = Vec::new();
        self.formats.retain(|f| {
            if f.groups.is_empty() {
                dropped.push(f.key.clone());
                false
            } else {
                true
            }
        });
        (removed_from, dropped)
    }
}

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

/// What a single `upsert_format_group` call changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub key: FormatKey,
    pub station_created: bool,
    pub format_created: bool,
    pub group_added: bool,
}

/// What removing one group from one station changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationPrune {
    pub station: String,
    /// Formats whose group list contained the removed group.
    pub removed_from: Vec<FormatKey>,
    /// Formats dropped because their group list ended up empty.
    pub dropped_formats: Vec<FormatKey>,
    /// The block had no formats left and was removed from the table.
    pub station_dropped: bool,
}

impl StationPrune {
    pub fn is_noop(&self) -> bool {
        self.removed_from.is_empty() && self.dropped_formats.is_empty() && !self.station_dropped
    }
}

/// Counters from the load-time format-key upgrade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MigrationStats {
    /// Format keys that were not already in bare canonical form.
    pub rewritten_keys: usize,
    /// Format lines folded into an earlier line with the same canonical key.
    pub merged_lines: usize,
    /// Lines dropped: format lines outside any block or with an unusable key.
    pub discarded_lines: usize,
}

impl MigrationStats {
    pub fn is_clean(&self) -> bool {
        *self == MigrationStats::default()
    }
}

// ---------------------------------------------------------------------------
// MountTable
// ---------------------------------------------------------------------------

/// Ordered collection of station blocks. Block order is file order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountTable {
    stations: Vec<StationBlock>,
}

#[derive(Clone, Copy)]
enum ScanState {
    Outside,
    Inside(usize),
}

impl MountTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        Self::parse_with_migration(text).0
    }

    /// Parse and report how far the text was from canonical form.
    pub fn parse_with_migration(text: &str) -> (Self, MigrationStats) {
        let mut table = MountTable::empty();
        let mut stats = MigrationStats::default();
        let mut state = ScanState::Outside;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(name) = line.strip_prefix('#') {
                let name = name.trim();
                state = if name.is_empty() {
                    ScanState::Outside
                } else {
                    ScanState::Inside(table.ensure_station(name).0)
                };
                continue;
            }

            let ScanState::Inside(idx) = state else {
                stats.discarded_lines += 1;
                continue;
            };

            // `FMT::g1` is a slash/colon-era key written verbatim; fold the
            // extra colon into the key rather than into the first group.
            let (raw_key, rest) = line.split_once(':').unwrap_or((line, ""));
            let raw_groups = rest.trim_start_matches(':');
            let key = match FormatKey::normalize(raw_key) {
                Ok(k) => k,
                Err(_) => {
                    stats.discarded_lines += 1;
                    continue;
                }
            };
            if key.as_str() != raw_key || raw_groups.len() != rest.len() {
                stats.rewritten_keys += 1;
            }

            let (groups, created) = table.stations[idx].groups_mut_or_insert(key);
            if !created {
                stats.merged_lines += 1;
            }
            for g in raw_groups.split(',').map(str::trim).filter(|g| !g.is_empty()) {
                groups.insert(g);
            }
        }

        (table, stats)
    }

    pub fn stations(&self) -> &[StationBlock] {
        &self.stations
    }

    pub fn station(&self, name: &str) -> Option<&StationBlock> {
        self.stations.iter().find(|s| s.name == name)
    }

    pub fn contains_station(&self, name: &str) -> bool {
        self.station(name).is_some()
    }

    pub fn station_names(&self) -> impl Iterator<Item = &str> {
        self.stations.iter().map(|s| s.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Index of the block named `name`, appended if absent.
    fn ensure_station(&mut self, name: &str) -> (usize, bool) {
        match self.stations.iter().position(|s| s.name == name) {
            Some(i) => (i, false),
            None => {
                self.stations.push(StationBlock::new(name));
                (self.stations.len() - 1, true)
            }
        }
    }

    /// Attach `group` to `station`/`format_raw`, creating either as needed.
    /// Idempotent: an already-listed group is left where it is.
    pub fn upsert_format_group(
        &mut self,
        station: &str,
        format_raw: &str,
        group: &str,
    ) -> Result<UpsertOutcome, AuthFileError> {
        validate_station_name(station)?;
        validate_group(group)?;
        let key = FormatKey::normalize(format_raw)?;

        let (idx, station_created) = self.ensure_station(station.trim());
        let (groups, format_created) = self.stations[idx].groups_mut_or_insert(key.clone());
        let group_added = groups.insert(group);

        Ok(UpsertOutcome {
            key,
            station_created,
            format_created,
            group_added,
        })
    }

    /// Remove `group` from one station, pruning empty formats and, if nothing
    /// is left, the station itself. Other groups are never touched.
    pub fn remove_group_from_station(&mut self, station: &str, group: &str) -> Option<StationPrune> {
        let idx = self.stations.iter().position(|s| s.name == station)?;
        if !self.stations[idx].lists_group(group) {
            return Some(StationPrune {
                station: station.to_string(),
                removed_from: Vec::new(),
                dropped_formats: Vec::new(),
                station_dropped: false,
            });
        }
        let (removed_from, dropped_formats) = self.stations[idx].remove_group(group);
        let station_dropped = self.stations[idx].formats.is_empty();
        if station_dropped {
            self.stations.remove(idx);
        }
        Some(StationPrune {
            station: station.to_string(),
            removed_from,
            dropped_formats,
            station_dropped,
        })
    }

    /// Remove `group` from every format of every station. Only stations that
    /// actually changed are reported, in table order.
    pub fn remove_group_everywhere(&mut self, group: &str) -> Vec<StationPrune> {
        let names: Vec<String> = self.stations.iter().map(|s| s.name.clone()).collect();
        names
            .iter()
            .filter_map(|name| self.remove_group_from_station(name, group))
            .filter(|p| !p.is_noop())
            .collect()
    }

    /// Render the table back into file text.
    ///
    /// Formats with no groups are skipped, as are stations left with no
    /// qualifying formats. A non-empty result ends with exactly one newline;
    /// a table with nothing to emit renders as empty text.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for s in &self.stations {
            if !s.has_members() {
                continue;
            }
            out.push('#');
            out.push_str(&s.name);
            out.push('\n');
            for f in s.formats.iter().filter(|f| !f.groups.is_empty()) {
                out.push_str(f.key.as_str());
                out.push(':');
                out.push_str(&f.groups.as_slice().join(","));
                out.push('\n');
            }
        }
        out
    }
}
