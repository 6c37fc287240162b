#![deny(
    warnings,
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
//! `HookScan` - Locate hook call-sites across plugin and theme source trees.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_cargo::style::CLAP_STYLING;
use hookscan::results::{SortDir, SortKey, truncate_snippet};
use hookscan::types::{DEFAULT_EXTENSION, MAX_FILE_SIZE, MAX_FILES, MAX_SNIPPET_LENGTH};
use hookscan::{Result, ScanConfig, Scanner, Scope, build_reference};
use tracing_subscriber::EnvFilter;

/// CLI arguments for `HookScan`
#[derive(Parser, Debug)]
#[command(author, version, about, styles = CLAP_STYLING)]
struct Cli {
    /// Directory whose subdirectories are plugins
    #[arg(long, env = "HOOKSCAN_PLUGINS_DIR")]
    plugins_dir:    PathBuf,
    /// Directory whose subdirectories are themes
    #[arg(long, env = "HOOKSCAN_THEMES_DIR")]
    themes_dir:     PathBuf,
    /// This tool's own install directory, excluded from plugins
    #[arg(long, env = "HOOKSCAN_SELF_DIR")]
    self_dir:       Option<PathBuf>,
    /// Source file extension to scan
    #[arg(long, env = "HOOKSCAN_EXTENSION", default_value = DEFAULT_EXTENSION)]
    extension:      String,
    /// Files to inspect before a search stops
    #[arg(long, env = "HOOKSCAN_MAX_FILES", default_value_t = MAX_FILES)]
    max_files:      usize,
    /// Larger files are skipped
    #[arg(long, env = "HOOKSCAN_MAX_FILE_BYTES", default_value_t = MAX_FILE_SIZE)]
    max_file_bytes: u64,
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose:        u8,
    #[command(subcommand)]
    command:        Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Command {
    /// List plugin and theme roots that can be searched
    Roots,
    /// Search for call-sites of a hook
    Search {
        /// Hook name passed as the first argument
        hook:  String,
        /// `all` or a root key such as `plugin:akismet`
        #[arg(long, default_value = "all")]
        scope: String,
        /// Sort column: file, line or type
        #[arg(long, default_value = "file")]
        sort:  String,
        /// Sort direction: asc or desc
        #[arg(long, default_value = "asc")]
        order: String,
        /// Page to show, starting at 1
        #[arg(long, default_value_t = 1)]
        page:  usize,
        /// Print the page as JSON
        #[arg(long)]
        json:  bool,
    },
    /// Show the code around one search result
    Detail {
        /// Reference printed next to a search result
        reference: String,
        /// Print the detail as JSON
        #[arg(long)]
        json:      bool,
    },
}

impl Cli {
    /// Build the scanner configuration from flags and environment
    fn config(&self) -> ScanConfig {
        let mut config = ScanConfig::new(&self.plugins_dir, &self.themes_dir)
            .with_extension(&self.extension)
            .with_max_files(self.max_files)
            .with_max_file_bytes(self.max_file_bytes);
        if let Some(own) = &self.self_dir {
            config = config.with_self_dir(own);
        }
        config
    }
}

/// Print roots grouped by category
fn list_roots(scanner: &Scanner) {
    let listing = scanner.list_roots();
    if listing.is_empty() {
        println!("No plugin or theme directories found.");
        return;
    }

    for (title, roots) in [("Plugins", &listing.plugins), ("Themes", &listing.themes)] {
        println!("{title}:");
        if roots.is_empty() {
            println!("  (none)");
        }
        for root in roots {
            println!("  {:<32} {}", root.key, root.path.display());
        }
    }
}

/// Search and print one page of results
fn search_hooks(
    scanner: &Scanner,
    hook: &str,
    scope: &str,
    sort: &str,
    order: &str,
    page: usize,
    json: bool,
) -> Result<()> {
    let outcome = scanner.search(hook, &Scope::from(scope))?;
    let page = outcome.page(SortKey::parse(sort), SortDir::parse(order), page);

    if outcome.budget_exhausted {
        eprintln!(
            "Note: stopped after {} files; narrow the scope to search the rest",
            outcome.files_scanned
        );
    }
    if !outcome.issues.is_empty() {
        eprintln!("Note: {} directories or files could not be read (see -v)", outcome.issues.len());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&page).map_err(std::io::Error::from)?);
        return Ok(());
    }

    let Some(target) = outcome.target.as_deref() else {
        println!("Enter a hook name to search for.");
        return Ok(());
    };
    if page.total_items == 0 {
        println!("\nNo results found for {target}");
        println!("Tips:");
        println!("  - Double-check the hook name spelling");
        println!("  - Search in all plugins and themes (--scope all)");
        println!("  - Try a different hook name");
        return Ok(());
    }

    println!(
        "\nFound {} results for {target} (page {}/{}):",
        page.total_items, page.page, page.total_pages
    );
    for record in &page.items {
        println!(
            "{:<24} {}:{}\n    {}\n    ref: {}",
            hookscan::label_for(record.kind.as_str()),
            record.file.display(),
            record.line,
            truncate_snippet(&record.snippet, MAX_SNIPPET_LENGTH),
            build_reference(&record.file, record.line)
        );
    }

    Ok(())
}

/// Print the context window of one result
fn show_detail(scanner: &Scanner, reference: &str, json: bool) -> Result<()> {
    let view = scanner.resolve(reference)?;

    if json {
        let doc = serde_json::json!({
            "detail": &view,
            "label": view.label(),
            "description": view.description(),
        });
        println!("{}", serde_json::to_string_pretty(&doc).map_err(std::io::Error::from)?);
        return Ok(());
    }

    let shown = view.relative_path.as_ref().unwrap_or(&view.file);
    println!("File:  {} ({:?}, {} bytes)", shown.display(), view.origin, view.file_size);
    println!("Line:  {}", view.line);
    println!("Lines {}-{} of {}", view.start, view.end, view.total_lines);
    println!();
    for line in &view.lines {
        let marker = if line.is_target { '>' } else { ' ' };
        println!("{marker}{:>5} | {}", line.number, line.text);
    }
    println!();
    println!("Hook type: {}", view.label());
    println!("{}", view.description());

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let result = Scanner::new(cli.config()).and_then(|scanner| match &cli.command {
        Command::Roots => {
            list_roots(&scanner);
            Ok(())
        },
        Command::Search { hook, scope, sort, order, page, json } => {
            search_hooks(&scanner, hook, scope, sort, order, *page, *json)
        },
        Command::Detail { reference, json } => show_detail(&scanner, reference, *json),
    });

    if let Err(e) = result {
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}
