//! Common types and constants for `HookScan`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

/// Maximum number of files to process per search
pub const MAX_FILES: usize = 1_000;

/// Maximum file size in bytes (1MB)
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Source extension scanned when none is configured
pub const DEFAULT_EXTENSION: &str = "php";

/// Number of records per result page
pub const PAGE_SIZE: usize = 25;

/// Nominal number of context lines around a detail target
pub const CONTEXT_LINES: usize = 15;

/// Offset subtracted from `CONTEXT_LINES` on both sides of the target
pub const CONTEXT_ADJUST: usize = 10;

/// Lines shown on each side of a detail target
pub const CONTEXT_RADIUS: usize = CONTEXT_LINES - CONTEXT_ADJUST;

/// Longest snippet shown in a listing row before it is cut
pub const MAX_SNIPPET_LENGTH: usize = 80;

/// Description shown for constructs without one of their own
pub const UNKNOWN_DESCRIPTION: &str = "Unknown hook usage pattern.";

/// Key prefix for plugin-like roots
pub const PLUGIN_PREFIX: &str = "plugin";

/// Key prefix for theme-like roots
pub const THEME_PREFIX: &str = "theme";

/// A recognised hook invocation form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// `add_action`
    AddAction,
    /// `add_filter`
    AddFilter,
    /// `do_action`
    DoAction,
    /// `apply_filters`
    ApplyFilters,
    /// `remove_action`
    RemoveAction,
    /// `remove_filter`
    RemoveFilter,
    /// `has_action`
    HasAction,
    /// `has_filter`
    HasFilter,
    /// `do_action_ref_array`
    DoActionRefArray,
    /// `apply_filters_ref_array`
    ApplyFiltersRefArray,
}

impl HookKind {
    /// Every kind, in matching order
    pub const ALL: [Self; 10] = [
        Self::AddAction,
        Self::AddFilter,
        Self::DoAction,
        Self::ApplyFilters,
        Self::RemoveAction,
        Self::RemoveFilter,
        Self::HasAction,
        Self::HasFilter,
        Self::DoActionRefArray,
        Self::ApplyFiltersRefArray,
    ];

    /// The function name that introduces this kind of call
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddAction => "add_action",
            Self::AddFilter => "add_filter",
            Self::DoAction => "do_action",
            Self::ApplyFilters => "apply_filters",
            Self::RemoveAction => "remove_action",
            Self::RemoveFilter => "remove_filter",
            Self::HasAction => "has_action",
            Self::HasFilter => "has_filter",
            Self::DoActionRefArray => "do_action_ref_array",
            Self::ApplyFiltersRefArray => "apply_filters_ref_array",
        }
    }

    /// Display label; every kind is labelled with its call name
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.as_str()
    }

    /// What a call of this kind does, if described
    ///
    /// The two `_ref_array` forms have no entry of their own.
    #[must_use]
    pub const fn description(self) -> Option<&'static str> {
        match self {
            Self::AddAction => {
                Some("Registers a function to run when this action hook is triggered.")
            },
            Self::AddFilter => {
                Some("Registers a function to modify data when this filter hook is applied.")
            },
            Self::DoAction => Some("Triggers all functions attached to this action hook."),
            Self::ApplyFilters => {
                Some("Applies all functions attached to this filter hook to modify the data.")
            },
            Self::RemoveAction => Some("Removes a previously registered action hook function."),
            Self::RemoveFilter => Some("Removes a previously registered filter hook function."),
            Self::HasAction => Some("Checks if any functions are attached to this action hook."),
            Self::HasFilter => Some("Checks if any functions are attached to this filter hook."),
            Self::DoActionRefArray | Self::ApplyFiltersRefArray => None,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or(())
    }
}

/// One call-site naming the searched hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// File containing the call
    pub file:    PathBuf,
    /// 1-based line number
    pub line:    usize,
    /// Which call form matched
    pub kind:    HookKind,
    /// Trimmed source line
    pub snippet: String,
    /// Hook name that was searched for
    pub target:  String,
}

/// Which container a root was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootCategory {
    /// Immediate child of the plugin container
    Plugin,
    /// Immediate child of the theme container
    Theme,
}

impl RootCategory {
    /// Prefix used in root keys
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Plugin => PLUGIN_PREFIX,
            Self::Theme => THEME_PREFIX,
        }
    }
}

/// A directory tree eligible for scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRoot {
    /// Stable key such as `plugin:akismet`
    pub key:      String,
    /// Container the directory was found in
    pub category: RootCategory,
    /// Directory name inside its container
    pub name:     String,
    /// Absolute directory path
    pub path:     PathBuf,
}

impl ScanRoot {
    /// Create a root, deriving its key from category and name
    #[must_use]
    pub fn new(category: RootCategory, name: &str, path: PathBuf) -> Self {
        Self {
            key: format!("{}:{name}", category.prefix()),
            category,
            name: name.to_owned(),
            path,
        }
    }
}

const _: () = {
    assert!(MAX_FILES > 0);
    assert!(MAX_FILE_SIZE > 0);
    assert!(PAGE_SIZE > 0);
    assert!(CONTEXT_LINES >= CONTEXT_ADJUST);
    assert!(MAX_SNIPPET_LENGTH > 0);
};
