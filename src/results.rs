//! Match collection, ordering and paging

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{MatchRecord, PAGE_SIZE};

/// Stable identity of a record: a hash of file, line, target and kind
///
/// The path is hashed as raw bytes so names that are not valid UTF-8 keep
/// distinct identities. NUL never occurs in a path or a normalised target,
/// which makes it an unambiguous field separator.
#[must_use]
pub fn identity_key(record: &MatchRecord) -> String {
    let digest = Sha256::new()
        .chain_update(record.file.as_os_str().as_encoded_bytes())
        .chain_update([0u8])
        .chain_update(record.line.to_le_bytes())
        .chain_update(record.target.as_bytes())
        .chain_update([0u8])
        .chain_update(record.kind.as_str())
        .finalize();
    format!("{digest:x}")
}

/// Matches of one search, at most one per identity key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: BTreeMap<String, MatchRecord>,
}

impl ResultSet {
    /// Create an empty set
    #[must_use]
    pub const fn new() -> Self {
        Self { records: BTreeMap::new() }
    }

    /// Add a record, returning `false` if its identity was already present
    pub fn insert(&mut self, record: MatchRecord) -> bool {
        match self.records.entry(identity_key(&record)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            },
            Entry::Occupied(_) => false,
        }
    }

    /// Number of distinct records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look a record up by identity key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MatchRecord> {
        self.records.get(key)
    }

    /// Records with their identity keys, in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatchRecord)> {
        self.records.iter().map(|(key, record)| (key.as_str(), record))
    }

    /// Records alone, in key order
    pub fn records(&self) -> impl Iterator<Item = &MatchRecord> {
        self.records.values()
    }
}

impl Extend<MatchRecord> for ResultSet {
    fn extend<T: IntoIterator<Item = MatchRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<MatchRecord> for ResultSet {
    fn from_iter<T: IntoIterator<Item = MatchRecord>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Merge per-file matcher output into one keyed set
pub fn aggregate<I>(per_file: I) -> ResultSet
where
    I: IntoIterator<Item = Vec<MatchRecord>>,
{
    per_file.into_iter().flatten().collect()
}

/// Column a listing is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// File path, lexically
    #[default]
    File,
    /// Line number, numerically
    Line,
    /// Call kind name, lexically
    Kind,
}

impl SortKey {
    /// Parse a column name, falling back to `File` for anything unknown
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "line" => Self::Line,
            "kind" | "type" => Self::Kind,
            _ => Self::File,
        }
    }

    /// Three-way comparison of two records on this column
    #[must_use]
    pub fn compare(self, a: &MatchRecord, b: &MatchRecord) -> Ordering {
        match self {
            Self::File => a.file.as_os_str().cmp(b.file.as_os_str()),
            Self::Line => a.line.cmp(&b.line),
            Self::Kind => a.kind.as_str().cmp(b.kind.as_str()),
        }
    }
}

/// Listing direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

impl SortDir {
    /// Parse a direction; only `desc` selects descending
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("desc") { Self::Desc } else { Self::Asc }
    }
}

/// One sorted page of a result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultPage {
    /// Records on this page
    pub items:       Vec<MatchRecord>,
    /// 1-based page number
    pub page:        usize,
    /// Records per page
    pub per_page:    usize,
    /// Records across all pages
    pub total_items: usize,
    /// Number of pages, zero when nothing matched
    pub total_pages: usize,
    /// Column the records were ordered by
    pub sort_key:    SortKey,
    /// Direction the records were ordered in
    pub sort_dir:    SortDir,
}

/// Sort `records` and cut out page `page` of `PAGE_SIZE` records
///
/// Page 0 is read as page 1. Pages past the end come back empty.
#[must_use]
pub fn sort_and_page(
    records: &ResultSet,
    sort_key: SortKey,
    sort_dir: SortDir,
    page: usize,
) -> ResultPage {
    let page = page.max(1);
    let mut sorted: Vec<&MatchRecord> = records.records().collect();
    sorted.sort_by(|a, b| {
        let ord = sort_key.compare(a, b);
        match sort_dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });

    let total_items = sorted.len();
    let items = sorted
        .into_iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    ResultPage {
        items,
        page,
        per_page: PAGE_SIZE,
        total_items,
        total_pages: total_items.div_ceil(PAGE_SIZE),
        sort_key,
        sort_dir,
    }
}

/// Shorten a snippet for a listing row, marking the cut with `...`
#[must_use]
pub fn truncate_snippet(code: &str, max_len: usize) -> Cow<'_, str> {
    if code.len() <= max_len {
        return Cow::Borrowed(code);
    }
    let mut end = max_len;
    while !code.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}...", &code[..end]))
}
