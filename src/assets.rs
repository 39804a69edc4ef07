//! Asset resolution and audit for the results directory
//!
//! Plot assets live next to the manifest (`images/*.png`, `results/*.txt`)
//! and are referenced by relative path. The audit cross-checks the manifest
//! against the files actually on disk: every referenced asset must exist,
//! and plot-looking files nothing references are reported as orphans so
//! stale exports from earlier pipeline runs get noticed.

use crate::manifest::Manifest;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// File extensions the orphan scan considers plot assets
const ASSET_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "gif", "txt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingAsset {
    pub plot_id: String,
    pub asset: String,
}

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    /// Manifest entries whose asset file does not exist
    pub missing: Vec<MissingAsset>,
    /// On-disk asset files no manifest entry references
    pub orphans: Vec<PathBuf>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.orphans.is_empty()
    }
}

/// Cross-check the manifest's asset references against `root`
pub fn audit(manifest: &Manifest, root: &Path) -> AuditReport {
    let mut referenced: HashSet<PathBuf> = HashSet::new();
    let mut missing = Vec::new();

    for plot in manifest.plots() {
        let Some(asset) = plot.asset() else { continue };
        match resolve(root, asset) {
            Some(full) if full.is_file() => {
                referenced.insert(full);
            }
            _ => missing.push(MissingAsset {
                plot_id: plot.id.clone(),
                asset: asset.to_string(),
            }),
        }
    }

    let mut orphans: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .filter(|e| !referenced.contains(e.path()))
        .map(|e| e.path().strip_prefix(root).unwrap_or(e.path()).to_path_buf())
        .collect();
    orphans.sort();

    AuditReport { missing, orphans }
}

/// Join a manifest-relative asset path onto `root`, refusing absolute paths
/// and `..` components so the server can't be walked out of the results
/// directory.
pub fn resolve(root: &Path, rel: &str) -> Option<PathBuf> {
    let rel_path = Path::new(rel);
    for component in rel_path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return None,
        }
    }
    Some(root.join(rel_path))
}

/// Content type for a served asset path
pub fn content_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "txt" => "text/plain; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "json" => "application/json",
        "css" => "text/css",
        "js" => "text/javascript",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use std::fs;

    // ==========================================================================
    // ASSET AUDIT TESTS
    // ==========================================================================

    fn manifest_json(entries: &[(&str, &str)]) -> String {
        let plots: Vec<String> = entries
            .iter()
            .map(|(id, image)| {
                format!(
                    r#"{{"category":"A","dataset":"d","name":"{}","id":"{}","image":"{}"}}"#,
                    id, id, image
                )
            })
            .collect();
        format!("[{}]", plots.join(","))
    }

    #[test]
    fn test_audit_clean_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/p1.png"), b"png").unwrap();

        let json = manifest_json(&[("p1", "images/p1.png")]);
        let manifest = Manifest::from_reader(json.as_bytes()).unwrap();

        let report = audit(&manifest, dir.path());
        assert!(report.is_clean(), "unexpected problems: {:?}", report);
    }

    #[test]
    fn test_audit_reports_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let json = manifest_json(&[("p1", "images/p1.png")]);
        let manifest = Manifest::from_reader(json.as_bytes()).unwrap();

        let report = audit(&manifest, dir.path());
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].plot_id, "p1");
        assert_eq!(report.missing[0].asset, "images/p1.png");
    }

    #[test]
    fn test_audit_reports_orphans() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/p1.png"), b"png").unwrap();
        fs::write(dir.path().join("images/stale.png"), b"png").unwrap();
        // Non-asset files are not orphans
        fs::write(dir.path().join("index.html"), b"<html>").unwrap();

        let json = manifest_json(&[("p1", "images/p1.png")]);
        let manifest = Manifest::from_reader(json.as_bytes()).unwrap();

        let report = audit(&manifest, dir.path());
        assert!(report.missing.is_empty());
        assert_eq!(report.orphans, vec![PathBuf::from("images/stale.png")]);
    }

    #[test]
    fn test_audit_traversal_reference_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let json = manifest_json(&[("p1", "../outside.png")]);
        let manifest = Manifest::from_reader(json.as_bytes()).unwrap();

        let report = audit(&manifest, dir.path());
        assert_eq!(report.missing.len(), 1);
    }

    // ==========================================================================
    // PATH RESOLUTION TESTS
    // ==========================================================================

    #[test]
    fn test_resolve_plain_relative_path() {
        let root = Path::new("/results");
        assert_eq!(
            resolve(root, "images/p1.png"),
            Some(PathBuf::from("/results/images/p1.png"))
        );
    }

    #[test]
    fn test_resolve_rejects_escape_attempts() {
        let root = Path::new("/results");
        assert_eq!(resolve(root, "../etc/passwd"), None);
        assert_eq!(resolve(root, "images/../../etc/passwd"), None);
        assert_eq!(resolve(root, "/etc/passwd"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type("images/p1.png"), "image/png");
        assert_eq!(content_type("results/summary.txt"), "text/plain; charset=utf-8");
        assert_eq!(content_type("images/p1.PNG"), "image/png");
        assert_eq!(content_type("mystery.bin"), "application/octet-stream");
        assert_eq!(content_type("noextension"), "application/octet-stream");
    }
}
