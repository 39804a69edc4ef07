//! Export formatters for the plot manifest
//!
//! This module turns a validated manifest into shippable artifacts:
//!
//! - **HTML**: the static viewer site: `viewer.html` with every category
//!   pre-rendered, plus `comparison.html` for the `plots=` deep link
//! - **JSON**: machine-readable inventory (summary + descriptors)
//! - **CSV**: one row per plot for spreadsheet triage
//!
//! # Usage
//!
//! ```ignore
//! use erpdeck::report;
//!
//! // Picks the format from the extension
//! report::generate("site/viewer.html", &manifest)?;  // HTML viewer + comparison.html
//! report::generate("inventory.json", &manifest)?;    // JSON
//! report::generate("inventory.csv", &manifest)?;     // CSV
//! ```
//!
//! An `.html` output also writes `comparison.html` next to it, since the
//! viewer page's compare buttons open that companion.

pub mod csv;
pub mod html;
pub mod json;

use crate::manifest::{Manifest, PlotKind};
use std::io;
use std::path::Path;

/// Generate an export in the format implied by the file extension
pub fn generate<P: AsRef<Path>>(path: P, manifest: &Manifest) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "html" | "htm" => {
            html::write_viewer(&mut file, manifest)?;
            // The viewer's compare bar opens comparison.html next to it, so
            // the companion page ships alongside.
            let companion = path.with_file_name("comparison.html");
            if companion != path {
                let mut file = std::fs::File::create(&companion)?;
                html::write_comparison(&mut file, manifest)?;
            }
            Ok(())
        }
        "json" => json::write(&mut file, manifest),
        _ => csv::write(&mut file, manifest),
    }
}

/// Inventory counts for a manifest
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Summary {
    pub total: usize,
    pub images: usize,
    pub texts: usize,
    pub categories: usize,
}

impl Summary {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut summary = Self::default();
        summary.total = manifest.len();
        summary.categories = manifest.categories().len();

        for plot in manifest.plots() {
            match plot.kind {
                PlotKind::Image => summary.images += 1,
                PlotKind::Text => summary.texts += 1,
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, PlotDescriptor};

    // ==========================================================================
    // SUMMARY STATISTICS TESTS
    // ==========================================================================
    //
    // The Summary struct counts plots by kind for the console report and the
    // JSON export header.
    // ==========================================================================

    fn plot(id: &str, category: &str, kind: PlotKind) -> PlotDescriptor {
        PlotDescriptor {
            id: id.to_string(),
            category: category.to_string(),
            subcategory: None,
            dataset: "ALL".to_string(),
            name: id.to_string(),
            kind,
            image: matches!(kind, PlotKind::Image).then(|| format!("images/{}.png", id)),
            path: matches!(kind, PlotKind::Text).then(|| format!("results/{}.txt", id)),
            script_url: None,
        }
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_manifest(&Manifest::default());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.images, 0);
        assert_eq!(summary.texts, 0);
        assert_eq!(summary.categories, 0);
    }

    #[test]
    fn test_summary_mixed() {
        let manifest = Manifest::new(vec![
            plot("p1", "A", PlotKind::Image),
            plot("p2", "A", PlotKind::Text),
            plot("p3", "B", PlotKind::Image),
        ])
        .unwrap();
        let summary = Summary::from_manifest(&manifest);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.images, 2);
        assert_eq!(summary.texts, 1);
        assert_eq!(summary.categories, 2);
    }

    // ==========================================================================
    // FORMAT DISPATCH TESTS
    // ==========================================================================

    #[test]
    fn test_generate_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::new(vec![plot("p1", "A", PlotKind::Image)]).unwrap();

        let html_path = dir.path().join("out.html");
        generate(&html_path, &manifest).unwrap();
        let html = std::fs::read_to_string(&html_path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));

        let json_path = dir.path().join("out.json");
        generate(&json_path, &manifest).unwrap();
        let json = std::fs::read_to_string(&json_path).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());

        let csv_path = dir.path().join("out.csv");
        generate(&csv_path, &manifest).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with("id,"));
    }

    #[test]
    fn test_html_output_ships_comparison_companion() {
        // The viewer's compare bar opens comparison.html, so an .html export
        // must produce both pages.
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::new(vec![plot("p1", "A", PlotKind::Image)]).unwrap();

        generate(dir.path().join("out.html"), &manifest).unwrap();

        let viewer = std::fs::read_to_string(dir.path().join("out.html")).unwrap();
        assert!(viewer.contains("comparison.html?plots="));

        let companion = std::fs::read_to_string(dir.path().join("comparison.html")).unwrap();
        assert!(companion.contains("Side-by-Side Comparison"));
        assert!(companion.contains(r#"id="p1""#));
    }

    #[test]
    fn test_comparison_named_output_is_not_clobbered() {
        // Asking for comparison.html itself must not overwrite it with a
        // second write.
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::new(vec![plot("p1", "A", PlotKind::Image)]).unwrap();

        let path = dir.path().join("comparison.html");
        generate(&path, &manifest).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("EEG/ERP Analysis Results"));
    }
}
