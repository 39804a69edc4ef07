//! Plot manifest: the static table describing every renderable result
//!
//! The manifest is a JSON array of plot descriptors, one per pre-generated
//! plot image or text summary. It is produced by the analysis pipeline (or
//! maintained by hand next to the assets) and is read-only at runtime:
//!
//! ```json
//! [
//!   {
//!     "category": "Topomaps (ACC=1)",
//!     "dataset": "ACC=1",
//!     "name": "N1 (Landing on Small, Descending)",
//!     "id": "acc1_n1_small_desc",
//!     "image": "images/group_n1_plot_landing_on_small_descending_acc=1.png"
//!   },
//!   {
//!     "category": "P1 vs. N1 Analysis",
//!     "dataset": "ACC=1",
//!     "name": "ANCOVA Summary: N1 vs. P1",
//!     "id": "n1_ancova_summary",
//!     "type": "text",
//!     "path": "results/group_n1_ancova_summary.txt"
//!   }
//! ]
//! ```
//!
//! Field names follow the historical table convention: `type` discriminates
//! image vs text plots (absent means image), `scriptUrl` optionally links to
//! the script that produced the plot, `subcategory` optionally clusters
//! related plots under a shared heading within a tab.
//!
//! Validation happens at load: ids must be unique and URL-safe (they double
//! as element anchors and as entries in the `plots=` comparison parameter),
//! and every descriptor must carry exactly the asset reference its kind
//! requires.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Default manifest filename looked up inside a results directory
pub const MANIFEST_FILENAME: &str = "plots.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plot id '{0}' appears more than once")]
    DuplicateId(String),

    #[error("plot id '{0}' is not URL-safe (allowed: letters, digits, '_', '-', '.')")]
    UnsafeId(String),

    #[error("image plot '{0}' has no 'image' field")]
    MissingImage(String),

    #[error("text plot '{0}' has no 'path' field")]
    MissingPath(String),

    #[error("plot '{0}' references both an image and a text asset")]
    ConflictingAssets(String),
}

/// Discriminates how a plot renders: an `<img>` or a fetched text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    #[default]
    Image,
    Text,
}

/// One static record describing a single renderable result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotDescriptor {
    /// Unique, URL-safe key; doubles as the rendered container's anchor
    pub id: String,
    /// Top-level tab grouping
    pub category: String,
    /// Secondary grouping within the category; absent plots render without
    /// a group heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Experimental condition the plot belongs to (display label)
    pub dataset: String,
    /// Human-readable title
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: PlotKind,
    /// Relative path to the plot image (kind = image)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Relative path to the text summary (kind = text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Link to the script that generated this plot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_url: Option<String>,
}

impl PlotDescriptor {
    /// The relative asset path this descriptor renders from
    pub fn asset(&self) -> Option<&str> {
        match self.kind {
            PlotKind::Image => self.image.as_deref(),
            PlotKind::Text => self.path.as_deref(),
        }
    }
}

/// The validated, ordered plot table
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    plots: Vec<PlotDescriptor>,
    categories: Vec<String>,
}

impl Manifest {
    /// Build a manifest from an already-parsed descriptor list
    pub fn new(plots: Vec<PlotDescriptor>) -> Result<Self, ManifestError> {
        validate(&plots)?;

        let mut categories: Vec<String> = Vec::new();
        for plot in &plots {
            if !categories.iter().any(|c| c == &plot.category) {
                categories.push(plot.category.clone());
            }
        }

        Ok(Self { plots, categories })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ManifestError> {
        let plots: Vec<PlotDescriptor> = serde_json::from_reader(reader)?;
        Self::new(plots)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    pub fn plots(&self) -> &[PlotDescriptor] {
        &self.plots
    }

    /// Distinct categories in first-seen order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&PlotDescriptor> {
        self.plots.iter().find(|p| p.id == id)
    }

    /// Descriptors belonging to `category`, in manifest order
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a PlotDescriptor> {
        self.plots.iter().filter(move |p| p.category == category)
    }
}

fn validate(plots: &[PlotDescriptor]) -> Result<(), ManifestError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for plot in plots {
        if plot.id.is_empty() || !plot.id.chars().all(is_url_safe) {
            return Err(ManifestError::UnsafeId(plot.id.clone()));
        }
        if !seen.insert(&plot.id) {
            return Err(ManifestError::DuplicateId(plot.id.clone()));
        }

        match plot.kind {
            PlotKind::Image => {
                if plot.image.is_none() {
                    return Err(ManifestError::MissingImage(plot.id.clone()));
                }
                if plot.path.is_some() {
                    return Err(ManifestError::ConflictingAssets(plot.id.clone()));
                }
            }
            PlotKind::Text => {
                if plot.path.is_none() {
                    return Err(ManifestError::MissingPath(plot.id.clone()));
                }
                if plot.image.is_some() {
                    return Err(ManifestError::ConflictingAssets(plot.id.clone()));
                }
            }
        }
    }

    Ok(())
}

fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}
