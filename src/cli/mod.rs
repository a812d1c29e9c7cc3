//! Command-line interface for cartridge.
//!
//! Provides commands for creating a package, adding and editing modules and
//! content, and inspecting the graph and the scanned component index. Modules
//! and content are addressed by title.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::config::{self, ENV_PACKAGE};
use crate::core::{
    Cartridge, ItemUpdate, ModuleUpdate, PositionChange, RecordDetails, UpdateReport,
};
use crate::domain::{ContentDraft, ContentHandle, ContentKind, Identifier, WorkflowState};
use crate::package::{ComponentIndex, ComponentKind};

/// cartridge - Course cartridge graph engine
#[derive(Parser, Debug)]
#[command(name = "cartridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Package directory (defaults to the configured package)
    #[arg(short, long, global = true, env = "CARTRIDGE_PACKAGE")]
    pub package: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty package (replaces the directory's contents)
    Init {
        /// Course title (defaults to the configured title)
        #[arg(long)]
        title: Option<String>,

        /// Course code (defaults to the configured code)
        #[arg(long)]
        code: Option<String>,
    },

    /// Add a module
    AddModule {
        title: String,

        /// 1-based position (appends if omitted)
        #[arg(long)]
        position: Option<usize>,

        #[arg(long)]
        unpublished: bool,
    },

    /// Add content, attached to a module or standalone
    Add {
        #[arg(value_enum)]
        kind: KindArg,

        /// Title (file name for files)
        title: String,

        /// Module title to attach to (standalone if omitted)
        #[arg(short, long)]
        module: Option<String>,

        /// Body HTML (description for quizzes)
        #[arg(short, long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Points possible (assignments and quizzes)
        #[arg(long)]
        points: Option<f64>,

        /// 1-based position within the module
        #[arg(long)]
        position: Option<usize>,

        #[arg(long)]
        unpublished: bool,

        /// Source file for file content
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Edit content in place
    Update {
        /// Current title (file name for files)
        title: String,

        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// New title (new file name for files)
        #[arg(long)]
        rename: Option<String>,

        #[arg(short, long)]
        body: Option<String>,

        #[arg(long)]
        points: Option<f64>,

        /// Publish (true) or unpublish (false)
        #[arg(long, action = ArgAction::Set)]
        published: Option<bool>,

        #[arg(long)]
        position: Option<usize>,

        /// Replacement file content
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Rename, publish or move a module
    UpdateModule {
        title: String,

        #[arg(long)]
        rename: Option<String>,

        #[arg(long, action = ArgAction::Set)]
        published: Option<bool>,

        #[arg(long)]
        position: Option<usize>,
    },

    /// Delete content and every module item that references it
    Delete {
        title: String,

        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Delete a module and all content it holds
    DeleteModule { title: String },

    /// Copy content under fresh identifiers
    Clone {
        title: String,

        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Module title to append the copy to (standalone if omitted)
        #[arg(long)]
        into: Option<String>,
    },

    /// List modules, items and standalone content
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every field of one record and where modules place it
    Show {
        title: String,

        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the scanned component index
    Index {
        /// Only rows of this kind (e.g. wiki_page, module_item)
        #[arg(short, long)]
        kind: Option<String>,

        /// Search rows by title
        #[arg(short, long)]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the graph's consistency rules
    Validate,

    /// Show resolved configuration (debug)
    Config,
}

/// Content kind for CLI (maps to ContentKind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Page,
    Assignment,
    Quiz,
    Discussion,
    File,
}

impl From<KindArg> for ContentKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Page => ContentKind::WikiPage,
            KindArg::Assignment => ContentKind::Assignment,
            KindArg::Quiz => ContentKind::Quiz,
            KindArg::Discussion => ContentKind::Discussion,
            KindArg::File => ContentKind::File,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let package = self.package;

        match self.command {
            Commands::Init { title, code } => init(package, title, code),
            Commands::AddModule {
                title,
                position,
                unpublished,
            } => {
                let mut cartridge = open(package)?;
                let id = cartridge.add_module(&title, position, !unpublished)?;
                eprintln!("Added module \"{}\" ({})", title, id);
                Ok(())
            }
            Commands::Add {
                kind,
                title,
                module,
                body,
                body_file,
                points,
                position,
                unpublished,
                source,
            } => {
                let body = match body_file {
                    Some(path) => Some(
                        std::fs::read_to_string(&path)
                            .with_context(|| format!("Failed to read body file: {}", path.display()))?,
                    ),
                    None => body,
                };
                let draft = build_draft(kind, title, body, points, unpublished, source)?;
                add_content(package, draft, module, position)
            }
            Commands::Update {
                title,
                kind,
                rename,
                body,
                points,
                published,
                position,
                source,
            } => {
                let mut cartridge = open(package)?;
                let handle = find_content(&cartridge, &title, kind)?;
                let content = source
                    .map(|path| {
                        std::fs::read(&path)
                            .with_context(|| format!("Failed to read source file: {}", path.display()))
                    })
                    .transpose()?;

                let update = ItemUpdate {
                    title: rename,
                    body,
                    points,
                    published,
                    content,
                    position,
                };
                let report = cartridge.update_item(handle.content_id.as_str(), update)?;
                print_report(&title, &report);
                Ok(())
            }
            Commands::UpdateModule {
                title,
                rename,
                published,
                position,
            } => {
                let mut cartridge = open(package)?;
                let module_id = find_module(cartridge.index(), &title)?;
                let update = ModuleUpdate {
                    title: rename,
                    published,
                    position,
                };
                let report = cartridge.update_module(&module_id, update)?;
                print_report(&title, &report);
                Ok(())
            }
            Commands::Delete { title, kind } => {
                let mut cartridge = open(package)?;
                let handle = find_content(&cartridge, &title, kind)?;
                let deleted = cartridge.delete_item(handle.content_id.as_str())?;
                eprintln!(
                    "Deleted {} \"{}\" ({} item(s), {} file(s))",
                    deleted.kind,
                    title,
                    deleted.items.len(),
                    deleted.artifacts.len()
                );
                Ok(())
            }
            Commands::DeleteModule { title } => {
                let mut cartridge = open(package)?;
                let module_id = find_module(cartridge.index(), &title)?;
                let deleted = cartridge.delete_module(&module_id)?;
                eprintln!("Deleted module \"{}\" and {} record(s)", title, deleted.len());
                Ok(())
            }
            Commands::Clone { title, kind, into } => {
                let mut cartridge = open(package)?;
                let handle = find_content(&cartridge, &title, kind)?;
                let target = into
                    .map(|module| find_module(cartridge.index(), &module))
                    .transpose()?;
                let copy = cartridge.clone_item(handle.content_id.as_str(), target.as_ref())?;
                eprintln!("Cloned \"{}\" as {}", title, copy);
                Ok(())
            }
            Commands::List { json } => list(package, json),
            Commands::Show { title, kind, json } => {
                let cartridge = open(package)?;
                let handle = find_content(&cartridge, &title, kind)?;
                let details = cartridge.details(handle.content_id.as_str())?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&details)?);
                } else {
                    print!("{}", render_details(&details));
                }
                Ok(())
            }
            Commands::Index { kind, search, json } => show_index(package, kind, search, json),
            Commands::Validate => validate(package),
            Commands::Config => show_config(),
        }
    }
}

/// Package directory from the flag/environment, else the config file
fn package_dir(package: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = package {
        return Ok(dir);
    }

    config::config()?.package_dir.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "No package given. Use --package <dir>, set {} or add `package:` to .cartridge/config.yaml",
            ENV_PACKAGE
        )
    })
}

fn open(package: Option<PathBuf>) -> Result<Cartridge> {
    let dir = package_dir(package)?;
    Cartridge::open(&dir).with_context(|| format!("Failed to open package: {}", dir.display()))
}

fn init(package: Option<PathBuf>, title: Option<String>, code: Option<String>) -> Result<()> {
    let cfg = config::config()?;
    let dir = package_dir(package)?;
    let title = title.unwrap_or_else(|| cfg.course_title.clone());
    let code = code.unwrap_or_else(|| cfg.course_code.clone());

    Cartridge::create(&dir, &title, &code)
        .with_context(|| format!("Failed to create package: {}", dir.display()))?;

    eprintln!("Created package \"{}\" ({}) at {}", title, code, dir.display());
    Ok(())
}

/// Build a draft, filling gaps from configured defaults
fn build_draft(
    kind: KindArg,
    title: String,
    body: Option<String>,
    points: Option<f64>,
    unpublished: bool,
    source: Option<PathBuf>,
) -> Result<ContentDraft> {
    let defaults = &config::config()?.defaults;
    let body = body.unwrap_or_default();

    let draft = match kind {
        KindArg::Page => ContentDraft::wiki_page(title, body),
        KindArg::Assignment => {
            ContentDraft::assignment(title, body, points.unwrap_or(defaults.assignment_points))
        }
        KindArg::Quiz => ContentDraft::quiz(title, body, points.unwrap_or(defaults.quiz_points)),
        KindArg::Discussion => ContentDraft::discussion(title, body),
        KindArg::File => {
            let path = source.context("File content needs --source <path>")?;
            let content = std::fs::read(&path)
                .with_context(|| format!("Failed to read source file: {}", path.display()))?;
            return Ok(ContentDraft::file(title, content));
        }
    };

    Ok(if unpublished || !defaults.published {
        draft.unpublished()
    } else {
        draft
    })
}

fn add_content(
    package: Option<PathBuf>,
    draft: ContentDraft,
    module: Option<String>,
    position: Option<usize>,
) -> Result<()> {
    let mut cartridge = open(package)?;
    let kind = draft.kind();
    let title = draft.title().to_string();

    match module {
        Some(module_title) => {
            let module_id = find_module(cartridge.index(), &module_title)?;
            let attached = cartridge.attach_item(&module_id, draft, position)?;
            eprintln!(
                "Added {} \"{}\" to \"{}\" at position {} ({})",
                kind, title, module_title, attached.position, attached.content_id
            );
        }
        None => {
            let id = cartridge.add_standalone(draft)?;
            eprintln!("Added standalone {} \"{}\" ({})", kind, title, id);
        }
    }
    Ok(())
}

// ============================================================================
// Lookups
// ============================================================================

/// Module id for a title, listing valid titles on failure
fn find_module(index: &ComponentIndex, title: &str) -> Result<Identifier> {
    if let Some(id) = index
        .find_by_title(ComponentKind::Module, title)
        .and_then(|row| row.identifier.clone())
    {
        return Ok(Identifier::new(id));
    }

    anyhow::bail!(
        "Module not found: \"{}\"\n{}",
        title,
        alternatives("modules", index.titles(ComponentKind::Module))
    )
}

/// Record with a title, optionally restricted to one kind
fn find_content(cartridge: &Cartridge, title: &str, kind: Option<KindArg>) -> Result<ContentHandle> {
    let kind = kind.map(ContentKind::from);
    let graph = cartridge.graph();

    let candidates: Vec<(ContentHandle, &str)> = graph
        .ownership()
        .into_iter()
        .filter_map(|(k, id, _)| graph.locate(id.as_str()).filter(|h| h.kind == k))
        .filter(|h| kind.map_or(true, |k| h.kind == k))
        .filter_map(|h| graph.title_of(&h).map(|t| (h.clone(), t)))
        .collect();

    if let Some((handle, _)) = candidates.iter().find(|(_, t)| *t == title) {
        return Ok(handle.clone());
    }

    let label = kind.map_or_else(|| "content".to_string(), |k| k.to_string());
    anyhow::bail!(
        "{} not found: \"{}\"\n{}",
        capitalize(&label),
        title,
        alternatives(&label, candidates.iter().map(|(_, t)| *t).collect())
    )
}

fn alternatives(what: &str, titles: Vec<&str>) -> String {
    if titles.is_empty() {
        return format!("No {} exist yet.", what);
    }

    let mut out = format!("Valid {}:", what);
    for title in titles {
        out.push_str(&format!("\n  - {}", title));
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn print_report(title: &str, report: &UpdateReport) {
    eprintln!("Updated \"{}\": {}", title, report.applied.join(", "));
    if !report.skipped.is_empty() {
        eprintln!("   Not applicable: {}", report.skipped.join(", "));
    }
    match report.position {
        PositionChange::Moved { from, to } => eprintln!("   Moved from {} to {}", from, to),
        PositionChange::IgnoredUnattached => {
            eprintln!("   Not in any module, position ignored")
        }
        PositionChange::Unchanged => {}
    }
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Debug, Serialize)]
struct Listing<'a> {
    course: &'a str,
    modules: Vec<ModuleView<'a>>,
    standalone: Vec<RecordView<'a>>,
}

#[derive(Debug, Serialize)]
struct ModuleView<'a> {
    id: &'a Identifier,
    title: &'a str,
    position: usize,
    state: WorkflowState,
    items: Vec<ItemView<'a>>,
}

#[derive(Debug, Serialize)]
struct ItemView<'a> {
    id: &'a Identifier,
    title: &'a str,
    kind: ContentKind,
    state: WorkflowState,
    position: usize,
    resource: &'a Identifier,
}

#[derive(Debug, Serialize)]
struct RecordView<'a> {
    id: Identifier,
    title: &'a str,
    kind: ContentKind,
}

fn list(package: Option<PathBuf>, json: bool) -> Result<()> {
    let cartridge = open(package)?;
    let graph = cartridge.graph();

    let listing = Listing {
        course: &graph.course.title,
        modules: graph
            .modules
            .iter()
            .map(|m| ModuleView {
                id: &m.id,
                title: &m.title,
                position: m.position,
                state: m.state,
                items: m
                    .items
                    .iter()
                    .map(|i| ItemView {
                        id: &i.id,
                        title: &i.title,
                        kind: i.kind,
                        state: i.state,
                        position: i.position,
                        resource: &i.resource_ref,
                    })
                    .collect(),
            })
            .collect(),
        standalone: graph
            .ownership()
            .into_iter()
            .filter_map(|(kind, id, resources)| {
                let primary = resources.first()?;
                if graph.is_attached(primary) {
                    return None;
                }
                let handle = graph.locate(id.as_str())?;
                Some(RecordView {
                    title: graph.title_of(&handle)?,
                    id,
                    kind,
                })
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Course: {}", listing.course);
    if listing.modules.is_empty() {
        println!("\nNo modules. Use 'cartridge add-module <title>' to add one.");
    }
    for module in &listing.modules {
        println!("\n{}. {} [{}]", module.position, module.title, module.state.as_str());
        for item in &module.items {
            println!(
                "   {:>2}. {:<12} {:<45} {}",
                item.position,
                item.kind.to_string(),
                truncate(item.title, 45),
                item.state.as_str()
            );
        }
    }
    if !listing.standalone.is_empty() {
        println!("\nStandalone:");
        for record in &listing.standalone {
            println!("   {:<12} {:<45} {}", record.kind.to_string(), truncate(record.title, 45), record.id);
        }
    }

    Ok(())
}

fn render_details(details: &RecordDetails) -> String {
    let mut out = format!("{}: {}\n", capitalize(&details.kind.to_string()), details.title);
    out.push_str(&format!("  ID:       {}\n", details.id));
    if details.resource_id != details.id {
        out.push_str(&format!("  Resource: {}\n", details.resource_id));
    }
    if let Some(state) = details.state {
        out.push_str(&format!("  State:    {}\n", state.as_str()));
    }
    if let Some(points) = details.points {
        out.push_str(&format!("  Points:   {}\n", points));
    }
    if let Some(filename) = &details.filename {
        out.push_str(&format!("  Filename: {}\n", filename));
    }
    if let Some(path) = &details.path {
        out.push_str(&format!("  Path:     {}\n", path));
    }
    if let Some(size) = details.size {
        out.push_str(&format!("  Size:     {} bytes\n", size));
    }

    if details.placements.is_empty() {
        out.push_str("  Module:   (standalone)\n");
    }
    for placement in &details.placements {
        out.push_str(&format!(
            "  Module:   {} (position {})\n",
            placement.module, placement.position
        ));
    }

    if let Some(body) = details.body.as_deref().filter(|b| !b.trim().is_empty()) {
        out.push('\n');
        out.push_str(body.trim_end());
        out.push('\n');
    }
    out
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn show_index(package: Option<PathBuf>, kind: Option<String>, search: Option<String>, json: bool) -> Result<()> {
    let dir = package_dir(package)?;
    let index = crate::package::scan(&dir)
        .with_context(|| format!("Failed to scan package: {}", dir.display()))?;

    let kind = kind
        .map(|k| {
            serde_json::from_value::<ComponentKind>(serde_json::Value::String(k.clone()))
                .with_context(|| format!("Unknown component kind: {}", k))
        })
        .transpose()?;

    let rows: Vec<_> = match (&kind, &search) {
        (_, Some(query)) => index
            .search(query)
            .into_iter()
            .filter(|c| kind.map_or(true, |k| c.kind == k))
            .collect(),
        (Some(k), None) => index.filter_by_kind(*k),
        (None, None) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&index.counts())?);
            } else {
                print_counts(&dir, &index);
            }
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<22} {:<34} {:<40}", "KIND", "IDENTIFIER", "TITLE");
    println!("{}", "-".repeat(96));
    for row in &rows {
        println!(
            "{:<22} {:<34} {:<40}",
            row.kind.to_string(),
            row.identifier.as_deref().unwrap_or("-"),
            truncate(row.label(), 40)
        );
    }
    println!("\nTotal: {} rows", rows.len());
    Ok(())
}

fn print_counts(dir: &Path, index: &ComponentIndex) {
    println!("Package: {}", dir.display());
    println!("Files:   {}", index.files().len());
    println!();
    for (kind, count) in index.counts() {
        println!("  {:<24} {}", kind.to_string(), count);
    }
}

fn validate(package: Option<PathBuf>) -> Result<()> {
    let cartridge = open(package)?;
    let violations = cartridge.graph().validate();

    if violations.is_empty() {
        println!("Package is consistent");
        return Ok(());
    }

    for violation in &violations {
        println!("  - {}", violation);
    }
    anyhow::bail!("{} consistency violation(s)", violations.len())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Cartridge configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!(
        "Package:     {}",
        cfg.package_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!();
    println!("Course:");
    println!("  Title: {}", cfg.course_title);
    println!("  Code:  {}", cfg.course_code);
    println!();
    println!("Defaults:");
    println!("  Assignment points: {}", cfg.defaults.assignment_points);
    println!("  Quiz points:       {}", cfg.defaults.quiz_points);
    println!("  Published:         {}", cfg.defaults.published);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_add() {
        let cli = Cli::try_parse_from([
            "cartridge",
            "--package",
            "/tmp/pkg",
            "add",
            "quiz",
            "Check",
            "--module",
            "Unit 1",
            "--points",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.package, Some(PathBuf::from("/tmp/pkg")));
        match cli.command {
            Commands::Add {
                kind,
                title,
                module,
                points,
                ..
            } => {
                assert_eq!(kind, KindArg::Quiz);
                assert_eq!(title, "Check");
                assert_eq!(module.as_deref(), Some("Unit 1"));
                assert_eq!(points, Some(5.0));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_published_flag() {
        let cli =
            Cli::try_parse_from(["cartridge", "update", "Intro", "--published", "false"]).unwrap();
        match cli.command {
            Commands::Update { published, .. } => assert_eq!(published, Some(false)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_show() {
        let cli = Cli::try_parse_from(["cartridge", "show", "Essay", "-k", "assignment", "--json"])
            .unwrap();
        match cli.command {
            Commands::Show { title, kind, json } => {
                assert_eq!(title, "Essay");
                assert_eq!(kind, Some(KindArg::Assignment));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_render_details() {
        let details = RecordDetails {
            kind: ContentKind::Quiz,
            id: Identifier::new("gquiz"),
            resource_id: Identifier::new("gquiz"),
            title: "Check".to_string(),
            body: Some("<p>one try</p>\n".to_string()),
            points: Some(5.0),
            state: Some(WorkflowState::Published),
            filename: None,
            path: None,
            size: None,
            placements: vec![crate::core::Placement {
                module_id: Identifier::new("gmod"),
                module: "Unit 1".to_string(),
                position: 2,
            }],
        };

        let text = render_details(&details);

        assert!(text.starts_with("Quiz: Check\n"));
        assert!(text.contains("  Points:   5\n"));
        assert!(text.contains("  Module:   Unit 1 (position 2)\n"));
        assert!(!text.contains("Resource:"));
        assert!(text.ends_with("\n<p>one try</p>\n"));
    }

    #[test]
    fn test_alternatives_listing() {
        assert_eq!(alternatives("modules", vec![]), "No modules exist yet.");
        assert_eq!(
            alternatives("modules", vec!["Unit 1", "Unit 2"]),
            "Valid modules:\n  - Unit 1\n  - Unit 2"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title indeed", 10), "a very ...");
    }
}
