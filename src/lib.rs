//! erpdeck - Browse pre-generated EEG/ERP analysis results
//!
//! An ERP analysis pipeline leaves behind a pile of plot images and text
//! summaries. erpdeck turns the manifest describing that pile into a
//! browsable results site: plots grouped into category tabs and subcategory
//! sections, a sidebar for multi-selecting plots, and a side-by-side
//! comparison page addressed by a `plots=` deep link.
//!
//! # Overview
//!
//! The crate is built around three pieces:
//!
//! 1. **Manifest** ([`manifest`]): the read-only table of
//!    [`PlotDescriptor`] records, loaded from `plots.json` and validated
//!    up front (unique URL-safe ids, asset references matching each plot's
//!    kind).
//!
//! 2. **Viewer** ([`viewer`]): the [`ViewerController`] state machine -
//!    active tab plus selection set - and the pure render-plan computation
//!    that partitions a category into subcategory groups. No I/O lives
//!    here; the presentation surfaces apply the plans.
//!
//! 3. **Surfaces**: the local server ([`serve`], embedded UI over
//!    `tiny_http`), the static-site and inventory exporters ([`report`]),
//!    and the asset audit ([`assets`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use erpdeck::{Manifest, ViewerController};
//!
//! let manifest = Manifest::from_path("docs/plots.json")?;
//! let mut viewer = ViewerController::new(manifest);
//!
//! // The first category starts active
//! let plan = viewer.render_active();
//! for group in &plan.groups {
//!     println!("{:?}: {} plots", group.heading, group.plots.len());
//! }
//!
//! // Select two plots and build the comparison deep link
//! viewer.toggle_selection("acc1_n1_desc", true);
//! viewer.toggle_selection("all_n1_desc", true);
//! let url = viewer.comparison_url()?;
//! assert!(url.starts_with("comparison.html?plots="));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assets;
pub mod manifest;
pub mod report;
pub mod serve;
pub mod viewer;

pub use manifest::{Manifest, ManifestError, PlotDescriptor, PlotKind};
pub use viewer::{CompareError, PlotBody, RenderPlan, ViewerController};
