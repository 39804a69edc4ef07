use clap::{Parser, Subcommand};
use erpdeck::assets::{self, AuditReport};
use erpdeck::manifest::{Manifest, PlotKind, MANIFEST_FILENAME};
use erpdeck::viewer::DEFAULT_GROUP;
use erpdeck::{report, serve};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "erpdeck")]
#[command(author, version, about = "Browse pre-generated EEG/ERP analysis plots in your browser")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Manifest file or results directory to check
    path: Option<PathBuf>,

    /// Output inventory file (.json, .csv, or .html viewer site with its
    /// comparison.html companion)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the orphaned-asset scan
    #[arg(long)]
    no_orphans: bool,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive web viewer
    Serve {
        /// Manifest file or results directory
        path: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3311")]
        port: u16,

        /// Don't open the browser automatically
        #[arg(long)]
        no_open: bool,
    },

    /// Write the static site (viewer.html + comparison.html)
    Export {
        /// Manifest file or results directory
        path: PathBuf,

        /// Directory to write the pages into (default: the results
        /// directory itself, so relative asset paths keep working)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Don't offer to open the exported viewer
        #[arg(long)]
        no_open: bool,
    },
}

fn main() {
    let args = Args::parse();

    if let Some(cmd) = args.command {
        match cmd {
            Command::Serve { path, port, no_open } => {
                if let Err(e) = serve::start(path, port, !no_open) {
                    eprintln!("Server error: {}", e);
                    std::process::exit(2);
                }
                return;
            }
            Command::Export { path, out_dir, no_open } => {
                run_export(&path, out_dir, no_open);
                return;
            }
        }
    }

    let Some(path) = args.path else {
        eprintln!("Usage: erpdeck <PATH>");
        eprintln!("Run 'erpdeck --help' for more options.");
        std::process::exit(2);
    };

    run_check(&path, args.output.as_deref(), args.no_orphans, args.quiet);
}

/// Resolve a bare path into (manifest file, asset root)
fn locate(path: &Path) -> (PathBuf, PathBuf) {
    if path.is_file() {
        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        (path.to_path_buf(), root)
    } else {
        (path.join(MANIFEST_FILENAME), path.to_path_buf())
    }
}

fn load_or_exit(manifest_path: &Path) -> Manifest {
    match Manifest::from_path(manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("\x1b[31mManifest error:\x1b[0m {}", e);
            std::process::exit(2);
        }
    }
}

fn run_check(path: &Path, output: Option<&Path>, no_orphans: bool, quiet: bool) {
    let (manifest_path, root) = locate(path);
    let manifest = load_or_exit(&manifest_path);

    let audit = assets::audit(&manifest, &root);
    let missing_ids: Vec<&str> = audit.missing.iter().map(|m| m.plot_id.as_str()).collect();

    if !quiet {
        eprintln!("\x1b[1merpdeck - Results Inventory\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Manifest: {}\n", manifest_path.display());

        for category in manifest.categories() {
            eprintln!("\x1b[1m{}\x1b[0m", category);
            for plot in manifest.in_category(category) {
                let kind = match plot.kind {
                    PlotKind::Image => "\x1b[36m[image]\x1b[0m",
                    PlotKind::Text => "\x1b[35m[text] \x1b[0m",
                };
                let group = plot.subcategory.as_deref().unwrap_or(DEFAULT_GROUP);
                let flag = if missing_ids.contains(&plot.id.as_str()) {
                    "  \x1b[31mMISSING\x1b[0m"
                } else {
                    ""
                };
                eprintln!(
                    "  {} {:<28} {:<14} {} - {}{}",
                    kind, plot.id, group, plot.dataset, plot.name, flag
                );
            }
        }
    }

    print_audit(&audit, no_orphans, quiet);

    let summary = report::Summary::from_manifest(&manifest);
    if !quiet {
        eprintln!("\n{}", "─".repeat(70));
    }
    eprintln!("\x1b[1mSummary:\x1b[0m");
    eprintln!("  Categories: {}", summary.categories);
    eprintln!("  Images:     {}", summary.images);
    eprintln!("  Texts:      {}", summary.texts);
    eprintln!("  Total:      {}", summary.total);

    if let Some(output_path) = output {
        if let Err(e) = report::generate(output_path, &manifest) {
            eprintln!("Failed to write inventory: {}", e);
            std::process::exit(2);
        }
        eprintln!("\n\x1b[32mInventory saved: {}\x1b[0m", output_path.display());
    }

    if !audit.missing.is_empty() {
        std::process::exit(1);
    }
}

fn print_audit(audit: &AuditReport, no_orphans: bool, quiet: bool) {
    if !audit.missing.is_empty() {
        eprintln!("\n\x1b[31m✗ {} missing asset(s):\x1b[0m", audit.missing.len());
        for m in &audit.missing {
            eprintln!("  {} -> {}", m.plot_id, m.asset);
        }
    } else if !quiet {
        eprintln!("\n\x1b[32m✓ All referenced assets exist\x1b[0m");
    }

    if !no_orphans && !audit.orphans.is_empty() {
        eprintln!(
            "\n\x1b[33m? {} asset file(s) not referenced by any plot:\x1b[0m",
            audit.orphans.len()
        );
        for orphan in &audit.orphans {
            eprintln!("  \x1b[90m{}\x1b[0m", orphan.display());
        }
    }
}

fn run_export(path: &Path, out_dir: Option<PathBuf>, no_open: bool) {
    let (manifest_path, root) = locate(path);
    let manifest = load_or_exit(&manifest_path);

    let out_dir = out_dir.unwrap_or_else(|| root.clone());
    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        eprintln!("Failed to create {}: {}", out_dir.display(), e);
        std::process::exit(2);
    }

    let viewer_path = out_dir.join("viewer.html");
    let comparison_path = out_dir.join("comparison.html");

    let result = std::fs::File::create(&viewer_path)
        .and_then(|mut f| report::html::write_viewer(&mut f, &manifest))
        .and_then(|_| std::fs::File::create(&comparison_path))
        .and_then(|mut f| report::html::write_comparison(&mut f, &manifest));

    if let Err(e) = result {
        eprintln!("Failed to write site: {}", e);
        std::process::exit(2);
    }

    eprintln!("\x1b[32mSite exported:\x1b[0m");
    eprintln!("  {}", viewer_path.display());
    eprintln!("  {}", comparison_path.display());

    if out_dir != root {
        eprintln!(
            "\x1b[33mNote:\x1b[0m asset paths are relative; copy images/ and results/ next to the pages"
        );
    }

    if !no_open {
        if let Err(e) = open::that(&viewer_path) {
            eprintln!("Failed to open viewer: {}", e);
        }
    }
}
