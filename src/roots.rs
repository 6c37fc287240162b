//! Scan root enumeration

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::types::{RootCategory, ScanRoot};

/// Roots grouped by container, each group ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RootListing {
    /// Plugin-like roots
    pub plugins: Vec<ScanRoot>,
    /// Theme-like roots
    pub themes:  Vec<ScanRoot>,
}

impl RootListing {
    /// All roots as one flat sequence, plugins first
    pub fn iter(&self) -> impl Iterator<Item = &ScanRoot> {
        self.plugins.iter().chain(&self.themes)
    }

    /// Look a root up by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ScanRoot> {
        self.iter().find(|root| root.key == key)
    }

    /// Total number of roots
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len() + self.themes.len()
    }

    /// Whether no roots were found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// List every root under the configured containers
///
/// Missing or unreadable containers count as empty. The scanner's own
/// install directory is left out of the plugin roots.
#[must_use]
pub fn list_roots(config: &ScanConfig) -> RootListing {
    let plugins = children(&config.plugins_dir, RootCategory::Plugin)
        .into_iter()
        .filter(|root| !config.is_self(&root.path))
        .collect();
    let themes = children(&config.themes_dir, RootCategory::Theme);

    RootListing { plugins, themes }
}

/// Immediate subdirectories of `container`, sorted by key
fn children(container: &Path, category: RootCategory) -> Vec<ScanRoot> {
    let entries = match fs::read_dir(container) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(container = %container.display(), error = %e, "container not readable");
            return Vec::new();
        },
    };

    let mut roots = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(container = %container.display(), error = %e, "skipping unreadable entry");
                continue;
            },
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        roots.push(ScanRoot::new(category, &name, path));
    }

    roots.sort_by(|a, b| a.key.cmp(&b.key));
    roots
}
