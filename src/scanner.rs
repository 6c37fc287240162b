//! Host-facing entry points
//!
//! A [`Scanner`] holds only configuration. Every call enumerates roots and
//! walks the filesystem afresh with its own [`ScanBudget`], so concurrent
//! callers never share state and results are never stale.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::crawler::{Crawler, ScanBudget, ScanIssue};
use crate::detail::{self, DetailView};
use crate::error::Result;
use crate::matcher::{LineMatcher, normalize_target};
use crate::reference;
use crate::results::{ResultPage, ResultSet, SortDir, SortKey, aggregate, sort_and_page};
use crate::roots::{self, RootListing};
use crate::types::{HookKind, MatchRecord, ScanRoot, UNKNOWN_DESCRIPTION};

/// Name of the scope that covers every root
pub const SCOPE_ALL: &str = "all";

/// Which roots a search covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every plugin and theme root
    All,
    /// The single root with this key
    Root(String),
}

impl From<&str> for Scope {
    fn from(key: &str) -> Self {
        if key == SCOPE_ALL { Self::All } else { Self::Root(key.to_owned()) }
    }
}

/// Result of one search
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Normalised hook name, `None` if the input was empty
    pub target:           Option<String>,
    /// Distinct matches
    pub records:          ResultSet,
    /// Files charged to the budget
    pub files_scanned:    usize,
    /// Whether the file budget cut the walk short
    pub budget_exhausted: bool,
    /// Directories and files that could not be read
    pub issues:           Vec<ScanIssue>,
}

impl SearchOutcome {
    /// Whether some of the tree could not be searched
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.budget_exhausted || !self.issues.is_empty()
    }

    /// Sort and cut one page of the records
    #[must_use]
    pub fn page(&self, sort_key: SortKey, sort_dir: SortDir, page: usize) -> ResultPage {
        sort_and_page(&self.records, sort_key, sort_dir, page)
    }
}

/// Hook call-site scanner over one plugin and one theme container
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner after validating `config`
    ///
    /// # Errors
    /// Returns `Error::Config` if the configuration is rejected
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Roots available for scoping a search
    #[must_use]
    pub fn list_roots(&self) -> RootListing {
        roots::list_roots(&self.config)
    }

    /// Find every call-site passing `target` as a literal first argument
    ///
    /// An empty or blank `target`, one too large to compile into patterns, or
    /// an unknown scope key yields an empty outcome. Unreadable directories
    /// and files are skipped and reported in [`SearchOutcome::issues`].
    ///
    /// # Errors
    /// Returns error if the extension filter fails to compile
    pub fn search(&self, target: &str, scope: &Scope) -> Result<SearchOutcome> {
        let Some(target) = normalize_target(target) else {
            debug!("empty hook name, nothing to search");
            return Ok(SearchOutcome::default());
        };

        let listing = self.list_roots();
        let selected: Vec<&ScanRoot> = match scope {
            Scope::All => listing.iter().collect(),
            Scope::Root(key) => listing.get(key).into_iter().collect(),
        };
        if selected.is_empty() {
            debug!(?scope, "no roots in scope");
            return Ok(SearchOutcome { target: Some(target), ..SearchOutcome::default() });
        }

        let matcher = match LineMatcher::new(&target) {
            Ok(matcher) => matcher,
            Err(e) => {
                warn!(hook = %target, error = %e, "hook name cannot be matched");
                return Ok(SearchOutcome { target: Some(target), ..SearchOutcome::default() });
            },
        };
        let mut budget = ScanBudget::from_config(&self.config);
        let mut crawler =
            Crawler::new(selected.iter().map(|root| &root.path), &self.config.extension, &mut budget)?;

        let mut per_file = Vec::new();
        let mut read_issues = Vec::new();
        for file in crawler.by_ref() {
            scan_file(&matcher, &file, &mut per_file, &mut read_issues);
        }
        let budget_exhausted = crawler.budget_exhausted();
        let mut issues = crawler.into_issues();
        issues.extend(read_issues);

        let records = aggregate(per_file);
        info!(
            hook = %target,
            roots = selected.len(),
            files = budget.files_scanned(),
            matches = records.len(),
            budget_exhausted,
            issues = issues.len(),
            "search finished"
        );

        Ok(SearchOutcome {
            target: Some(target),
            records,
            files_scanned: budget.files_scanned(),
            budget_exhausted,
            issues,
        })
    }

    /// Resolve a reference into its detail view
    ///
    /// # Errors
    /// Returns `InvalidReference`, `FileNotFound` or `InvalidLine` as
    /// described on [`detail::resolve`]
    pub fn resolve(&self, reference: &str) -> Result<DetailView> {
        detail::resolve(reference, &self.config)
    }
}

/// Match one file, recording a read failure instead of aborting the search
fn scan_file(
    matcher: &LineMatcher,
    file: &Path,
    per_file: &mut Vec<Vec<MatchRecord>>,
    issues: &mut Vec<ScanIssue>,
) {
    match matcher.find_matches(file) {
        Ok(records) => per_file.push(records),
        Err(e) => {
            warn!(file = %file.display(), error = %e, "skipping unreadable file");
            issues.push(ScanIssue::file(file, &e));
        },
    }
}

/// Encode a match location for the detail view
#[must_use]
pub fn build_reference(file: &Path, line: usize) -> String {
    reference::build_reference(file, line)
}

/// Display label for a kind name; unknown names are shown as given
#[must_use]
pub fn label_for(kind: &str) -> &str {
    kind.parse::<HookKind>().map_or(kind, |kind| kind.label())
}

/// Description for a kind name
#[must_use]
pub fn describe(kind: &str) -> &'static str {
    kind.parse::<HookKind>().ok().and_then(HookKind::description).unwrap_or(UNKNOWN_DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::error::Error;

    struct Site {
        _temp_dir: TempDir,
        config:    ScanConfig,
    }

    impl Site {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let config = ScanConfig::new(
                temp_dir.path().join("plugins"),
                temp_dir.path().join("themes"),
            );
            fs::create_dir_all(&config.plugins_dir).unwrap();
            fs::create_dir_all(&config.themes_dir).unwrap();
            Self { _temp_dir: temp_dir, config }
        }

        fn write(&self, rel: &str, content: &str) -> PathBuf {
            let (container, rest) = rel.split_once('/').unwrap();
            let base = if container == "plugins" {
                &self.config.plugins_dir
            } else {
                &self.config.themes_dir
            };
            let path = base.join(rest);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn scanner(&self) -> Scanner {
            Scanner::new(self.config.clone()).unwrap()
        }
    }

    fn hits(outcome: &SearchOutcome) -> Vec<(PathBuf, usize, HookKind)> {
        outcome
            .page(SortKey::File, SortDir::Asc, 1)
            .items
            .into_iter()
            .map(|r| (r.file, r.line, r.kind))
            .collect()
    }

    #[test]
    fn test_finds_calls_across_roots() {
        let site = Site::new();
        let a = site.write("plugins/alpha/alpha.php", "<?php\nadd_action('init', 'cb');\n");
        let t = site.write("themes/basic/functions.php", "<?php\n\n\ndo_action(\"init\");\n");
        site.write("plugins/alpha/readme.txt", "add_action('init', 'cb');\n");

        let outcome = site.scanner().search("init", &Scope::All).unwrap();

        assert_eq!(hits(&outcome), vec![(a, 2, HookKind::AddAction), (t, 4, HookKind::DoAction)]);
        assert_eq!(outcome.files_scanned, 2);
        assert!(!outcome.is_partial());
    }

    #[test]
    fn test_substring_names_do_not_match() {
        let site = Site::new();
        site.write("plugins/alpha/alpha.php", "add_action( 'my_init_hook', 'cb' );\n");

        let outcome = site.scanner().search("init", &Scope::All).unwrap();
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_scope_limits_roots() {
        let site = Site::new();
        site.write("plugins/alpha/a.php", "do_action('init');\n");
        let b = site.write("plugins/beta/b.php", "do_action('init');\n");

        let scanner = site.scanner();
        let outcome = scanner.search("init", &Scope::from("plugin:beta")).unwrap();
        assert_eq!(hits(&outcome), vec![(b, 1, HookKind::DoAction)]);

        let outcome = scanner.search("init", &Scope::from("plugin:nope")).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.files_scanned, 0);
    }

    #[test]
    fn test_budget_caps_files_read() {
        let mut site = Site::new();
        site.config = site.config.clone().with_max_files(3);
        for name in ["a", "b", "c"] {
            site.write(&format!("plugins/first/{name}.php"), "do_action('init');\n");
        }
        for name in ["d", "e"] {
            site.write(&format!("themes/second/{name}.php"), "do_action('init');\n");
        }

        let outcome = site.scanner().search("init", &Scope::All).unwrap();

        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.files_scanned, 3);
        assert!(outcome.budget_exhausted);
        assert!(outcome.is_partial());
    }

    #[test]
    fn test_oversized_file_contributes_nothing() {
        let mut site = Site::new();
        site.config = site.config.clone().with_max_file_bytes(64);
        let mut big = "do_action('init');\n".to_owned();
        big.push_str(&"// padding\n".repeat(20));
        site.write("plugins/alpha/big.php", &big);
        let small = site.write("plugins/alpha/small.php", "do_action('init');\n");

        let outcome = site.scanner().search("init", &Scope::All).unwrap();

        assert_eq!(hits(&outcome), vec![(small, 1, HookKind::DoAction)]);
        assert_eq!(outcome.files_scanned, 2);
    }

    #[test]
    fn test_own_install_dir_is_never_scanned() {
        let mut site = Site::new();
        let own = site.write("plugins/hookscan/hookscan.php", "do_action('init');\n");
        let other = site.write("plugins/other/other.php", "do_action('init');\n");
        site.config = site.config.clone().with_self_dir(own.parent().unwrap());

        let scanner = site.scanner();
        let outcome = scanner.search("init", &Scope::All).unwrap();
        assert_eq!(hits(&outcome), vec![(other, 1, HookKind::DoAction)]);

        let outcome = scanner.search("init", &Scope::from("plugin:hookscan")).unwrap();
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_blank_target_is_empty_not_error() {
        let site = Site::new();
        site.write("plugins/alpha/a.php", "do_action('');\n");

        let outcome = site.scanner().search("   ", &Scope::All).unwrap();
        assert!(outcome.target.is_none());
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_repeated_search_is_fresh() {
        let site = Site::new();
        let path = site.write("plugins/alpha/a.php", "do_action('init');\n");
        let scanner = site.scanner();

        assert_eq!(scanner.search("init", &Scope::All).unwrap().records.len(), 1);
        fs::write(&path, "do_action('init');\napply_filters('init', $x);\n").unwrap();
        assert_eq!(scanner.search("init", &Scope::All).unwrap().records.len(), 2);
    }

    #[test]
    fn test_reference_from_listing_resolves() {
        let site = Site::new();
        let file = site.write("themes/basic/functions.php", "<?php\nadd_filter('the_title', 'x');\n");
        let scanner = site.scanner();

        let outcome = scanner.search("the_title", &Scope::All).unwrap();
        let record = outcome.records.records().next().unwrap();
        let view = scanner.resolve(&build_reference(&record.file, record.line)).unwrap();

        assert_eq!((view.file.as_path(), view.line), (file.as_path(), 2));
        assert_eq!(view.kind, Some(HookKind::AddFilter));
    }

    #[test]
    fn test_resolve_after_delete_is_file_not_found() {
        let site = Site::new();
        let file = site.write("plugins/alpha/a.php", "do_action('init');\n");
        let reference = build_reference(&file, 1);
        fs::remove_file(&file).unwrap();

        assert!(matches!(site.scanner().resolve(&reference), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_unreadable_file_is_recorded_and_skipped() {
        let site = Site::new();
        let kept = site.write("plugins/alpha/a.php", "do_action('init');\n");
        let gone = site.write("plugins/alpha/b.php", "do_action('init');\n");
        fs::remove_file(&gone).unwrap();

        let matcher = LineMatcher::new("init").unwrap();
        let mut per_file = Vec::new();
        let mut issues = Vec::new();
        for file in [&gone, &kept] {
            scan_file(&matcher, file, &mut per_file, &mut issues);
        }

        let records = aggregate(per_file);
        assert_eq!(records.records().map(|r| r.file.clone()).collect::<Vec<_>>(), vec![kept]);
        assert!(matches!(issues.as_slice(), [ScanIssue::FileRead { path, .. }] if *path == gone));
    }

    #[test]
    fn test_oversized_hook_name_is_empty_not_error() {
        let site = Site::new();
        site.write("plugins/alpha/a.php", "do_action('init');\n");
        let huge = "h".repeat(2_000_000);

        let outcome = site.scanner().search(&huge, &Scope::All).unwrap();
        assert_eq!(outcome.target.as_deref(), Some(huge.as_str()));
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.files_scanned, 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_file_name_resolves() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let site = Site::new();
        let root = site.config.plugins_dir.join("alpha");
        fs::create_dir_all(&root).unwrap();
        let file = root.join(OsStr::from_bytes(b"caf\xe9.php"));
        fs::write(&file, "<?php\ndo_action('init');\n").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"caf\xe8.php")), "<?php\ndo_action('init');\n")
            .unwrap();

        let scanner = site.scanner();
        let outcome = scanner.search("init", &Scope::All).unwrap();
        assert_eq!(outcome.records.len(), 2);

        let view = scanner.resolve(&build_reference(&file, 2)).unwrap();
        assert_eq!((view.file, view.kind), (file, Some(HookKind::DoAction)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ScanConfig::new("/p", "/t").with_extension(".php");
        assert!(matches!(Scanner::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_label_and_describe_tables() {
        assert_eq!(label_for("do_action_ref_array"), "do_action_ref_array");
        assert_eq!(label_for("mystery"), "mystery");
        assert_eq!(describe("has_filter"), "Checks if any functions are attached to this filter hook.");
        assert_eq!(describe("apply_filters_ref_array"), UNKNOWN_DESCRIPTION);
        assert_eq!(describe("unknown"), UNKNOWN_DESCRIPTION);

        let labelled = HookKind::ALL.iter().filter(|k| label_for(k.as_str()) == k.as_str()).count();
        assert_eq!(labelled, 10);
    }
}
