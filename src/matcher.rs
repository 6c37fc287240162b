//! Per-line hook call matching
//!
//! This is a line-oriented text search, not a parser. A line whose trimmed
//! text starts with `//`, `/*` or `*` is ignored outright; trailing comments
//! and the interior of block comments that do not start with `*` are still
//! searched. Only literal quoted first arguments are recognised.

use std::fs;
use std::path::Path;

use regex::RegexSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{HookKind, MatchRecord};

/// Prefixes that mark a trimmed line as a comment
const COMMENT_PREFIXES: [&str; 3] = ["//", "/*", "*"];

/// Kinds recognised by the loose detail classifier, in priority order
const CLASSIFY_KINDS: [HookKind; 8] = [
    HookKind::AddAction,
    HookKind::AddFilter,
    HookKind::DoAction,
    HookKind::ApplyFilters,
    HookKind::RemoveAction,
    HookKind::RemoveFilter,
    HookKind::HasAction,
    HookKind::HasFilter,
];

/// Clean a raw hook name, returning `None` when nothing searchable is left
#[must_use]
pub fn normalize_target(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_owned())
}

/// Whether a trimmed line is skipped before matching
#[must_use]
pub fn is_skipped(trimmed: &str) -> bool {
    trimmed.is_empty() || COMMENT_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix))
}

/// Loosely label the construct on a line for display
///
/// Takes the first of the eight core call names that appears anywhere in the
/// line, with no argument check, so `do_action_ref_array(` reads as
/// `do_action`. Never use this for search results.
#[must_use]
pub fn classify_line(code: &str) -> Option<HookKind> {
    CLASSIFY_KINDS.into_iter().find(|kind| code.contains(kind.as_str()))
}

/// Compiled patterns for one hook name
#[derive(Debug)]
pub struct LineMatcher {
    /// Hook name being searched for
    target: String,
    /// One pattern per kind, indexed like `HookKind::ALL`
    set:    RegexSet,
}

impl LineMatcher {
    /// Compile the patterns for `target`
    ///
    /// Each pattern requires the call name as a whole word, an opening
    /// parenthesis, then `target` in matching single or double quotes,
    /// followed by a comma or closing parenthesis.
    ///
    /// # Errors
    /// Returns `Error::Pattern` if the patterns exceed the regex size limit
    pub fn new(target: &str) -> Result<Self> {
        let name = regex::escape(target);
        let patterns = HookKind::ALL.iter().map(|kind| {
            format!(
                r#"\b{call}\s*\(\s*(?:'{name}'|"{name}")\s*[,)]"#,
                call = regex::escape(kind.as_str()),
            )
        });
        let set = RegexSet::new(patterns)
            .map_err(|e| Error::pattern(&format!("Failed to compile hook patterns: {e}")))?;

        Ok(Self { target: target.to_owned(), set })
    }

    /// Hook name this matcher searches for
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Every kind whose call pattern matches `line`
    pub fn kinds_in_line(&self, line: &str) -> impl Iterator<Item = HookKind> {
        self.set.matches(line).into_iter().map(|idx| HookKind::ALL[idx])
    }

    /// Match every line of `text`, attributing records to `file`
    #[must_use]
    pub fn find_in_text(&self, file: &Path, text: &str) -> Vec<MatchRecord> {
        let mut records = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if is_skipped(line) {
                continue;
            }
            for kind in self.kinds_in_line(line) {
                records.push(MatchRecord {
                    file: file.to_path_buf(),
                    line: idx + 1,
                    kind,
                    snippet: line.to_owned(),
                    target: self.target.clone(),
                });
            }
        }

        records
    }

    /// Read `path` and match every line
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    ///
    /// # Errors
    /// Returns error if the file cannot be read
    pub fn find_matches(&self, path: &Path) -> std::io::Result<Vec<MatchRecord>> {
        let bytes = fs::read(path)?;
        let records = self.find_in_text(path, &String::from_utf8_lossy(&bytes));
        debug!(file = %path.display(), matches = records.len(), "scanned file");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn kinds(matcher: &LineMatcher, text: &str) -> Vec<(usize, HookKind)> {
        matcher
            .find_in_text(Path::new("/x.php"), text)
            .into_iter()
            .map(|record| (record.line, record.kind))
            .collect()
    }

    #[test]
    fn test_rejects_substring_of_longer_name() {
        let matcher = LineMatcher::new("init").unwrap();
        assert!(kinds(&matcher, "add_action( 'my_init_hook', 'cb' );").is_empty());
        assert!(kinds(&matcher, "add_action( 'init_late', 'cb' );").is_empty());
    }

    #[test]
    fn test_matches_single_and_double_quotes() {
        let matcher = LineMatcher::new("init").unwrap();
        let text = "<?php\nadd_action('init', 'cb');\n\ndo_action(\"init\");\n";

        assert_eq!(kinds(&matcher, text), vec![(2, HookKind::AddAction), (4, HookKind::DoAction)]);
    }

    #[test]
    fn test_mismatched_quotes_do_not_match() {
        let matcher = LineMatcher::new("init").unwrap();
        assert!(kinds(&matcher, "do_action('init\");").is_empty());
    }

    #[test]
    fn test_whitespace_and_terminators() {
        let matcher = LineMatcher::new("save_post").unwrap();
        let text = "\
            add_filter  (  'save_post'  , 'cb' );\n\
            has_action('save_post');\n\
            $x = apply_filters( 'save_post' . $suffix, $v );\n";

        assert_eq!(kinds(&matcher, text), vec![(1, HookKind::AddFilter), (2, HookKind::HasAction)]);
    }

    #[test]
    fn test_ref_array_kinds_are_distinct() {
        let matcher = LineMatcher::new("wp_loaded").unwrap();
        let text = "do_action_ref_array( 'wp_loaded', array( &$this ) );\n\
                    apply_filters_ref_array('wp_loaded', $args);";

        assert_eq!(
            kinds(&matcher, text),
            vec![(1, HookKind::DoActionRefArray), (2, HookKind::ApplyFiltersRefArray)]
        );
    }

    #[test]
    fn test_call_name_must_be_whole_word() {
        let matcher = LineMatcher::new("init").unwrap();
        assert!(kinds(&matcher, "my_add_action('init', 'cb');").is_empty());
        assert_eq!(kinds(&matcher, "$this->add_action('init', 'cb');"), vec![(
            1,
            HookKind::AddAction
        )]);
    }

    #[test]
    fn test_comment_prefixes_are_skipped() {
        let matcher = LineMatcher::new("init").unwrap();
        let text = "// add_action('init', 'cb');\n\
                    /* do_action('init'); */\n\
                    * has_action('init');\n\
                    \t  // remove_action('init', 'cb');";

        assert!(kinds(&matcher, text).is_empty());
    }

    #[test]
    fn test_trailing_comment_is_not_filtered() {
        let matcher = LineMatcher::new("init").unwrap();
        let text = "$x = 1; // add_action('init', 'cb');";

        assert_eq!(kinds(&matcher, text), vec![(1, HookKind::AddAction)]);
    }

    #[test]
    fn test_every_qualifying_call_on_a_line() {
        let matcher = LineMatcher::new("init").unwrap();
        let text = "remove_action('init', 'a'); add_action('init', 'b');";

        assert_eq!(kinds(&matcher, text), vec![(1, HookKind::AddAction), (
            1,
            HookKind::RemoveAction
        )]);
    }

    #[test]
    fn test_regex_metacharacters_in_target_are_literal() {
        let matcher = LineMatcher::new("a.b").unwrap();
        assert!(kinds(&matcher, "do_action('axb');").is_empty());
        assert_eq!(kinds(&matcher, "do_action('a.b');"), vec![(1, HookKind::DoAction)]);
    }

    #[test]
    fn test_crlf_lines_and_snippet() {
        let matcher = LineMatcher::new("init").unwrap();
        let records = matcher.find_in_text(Path::new("/x.php"), "<?php\r\n    do_action( 'init' );\r\n");

        assert_eq!(records, vec![MatchRecord {
            file:    PathBuf::from("/x.php"),
            line:    2,
            kind:    HookKind::DoAction,
            snippet: "do_action( 'init' );".to_owned(),
            target:  "init".to_owned(),
        }]);
    }

    #[test]
    fn test_find_matches_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plugin.php");
        let mut content = b"<?php\nadd_filter('the_title', 'cb');\n".to_vec();
        content.extend_from_slice(b"\xff\xfe\n");
        fs::write(&path, content).unwrap();

        let matcher = LineMatcher::new("the_title").unwrap();
        let records = matcher.find_matches(&path).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file, path);
        assert_eq!(records[0].line, 2);
        assert!(matcher.find_matches(&temp_dir.path().join("gone.php")).is_err());
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("  init \n"), Some("init".to_owned()));
        assert_eq!(normalize_target("in\0it"), Some("init".to_owned()));
        assert_eq!(normalize_target("   "), None);
        assert_eq!(normalize_target(""), None);
    }

    #[test]
    fn test_classify_line_is_loose() {
        assert_eq!(classify_line("do_action_ref_array('x', $a);"), Some(HookKind::DoAction));
        assert_eq!(classify_line("$v = apply_filters( $name, $v );"), Some(HookKind::ApplyFilters));
        assert_eq!(classify_line("echo 'my_has_filter';"), Some(HookKind::HasFilter));
        assert_eq!(classify_line("return $value;"), None);
    }
}
