//! Viewer state machine and render-plan computation
//!
//! [`ViewerController`] owns everything the results page tracks: the active
//! tab, the comparison selection, and the grouping of plots into
//! category/subcategory sections. It is deliberately free of I/O: every
//! operation either mutates the small state pair (active tab × selection
//! set) or computes a [`RenderPlan`], an ordered list of grouped plot
//! view-models that a presentation surface (the embedded web UI, the static
//! exporter) applies as a side effect. That split keeps the grouping and
//! navigation logic testable without a browser.
//!
//! State machine: states are `{category} × {selection ⊆ plot ids}`.
//! [`ViewerController::select_tab`] changes only the category component,
//! [`ViewerController::toggle_selection`] only the selection component, and
//! [`ViewerController::comparison_url`] is a pure read. There is no
//! terminal state.

use crate::manifest::{Manifest, PlotDescriptor, PlotKind};
use serde::Serialize;
use thiserror::Error;

/// Companion page consuming the `plots=` deep link
pub const COMPARISON_PAGE: &str = "comparison.html";

/// Group label used for plots without a subcategory. The heading itself is
/// suppressed when rendering; the label only exists for display surfaces
/// that need to name the group (CSV export, console inventory).
pub const DEFAULT_GROUP: &str = "General";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    /// Recoverable: the user asked to compare with nothing selected
    #[error("select at least one plot to compare")]
    EmptySelection,
}

/// Everything a presentation surface needs to render one category tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub category: String,
    pub groups: Vec<PlotGroup>,
}

impl RenderPlan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total plots across all groups
    pub fn plot_count(&self) -> usize {
        self.groups.iter().map(|g| g.plots.len()).sum()
    }
}

/// One subcategory section within a rendered category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotGroup {
    /// `None` for the default group: plots render without a heading
    pub heading: Option<String>,
    pub plots: Vec<PlotView>,
}

/// View-model for a single plot container
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotView {
    /// Element anchor for jump links and deep-link scrolling
    pub id: String,
    pub name: String,
    pub dataset: String,
    #[serde(flatten)]
    pub body: PlotBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_url: Option<String>,
}

/// How the plot body renders. Text content is fetched by the presentation
/// layer after the container exists (fire-and-forget), with an in-place
/// error message if the fetch fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "src", rename_all = "lowercase")]
pub enum PlotBody {
    Image(String),
    Text(String),
}

impl PlotView {
    fn from_descriptor(plot: &PlotDescriptor) -> Self {
        // Manifest validation guarantees the asset reference is present
        let src = plot.asset().unwrap_or_default().to_string();
        Self {
            id: plot.id.clone(),
            name: plot.name.clone(),
            dataset: plot.dataset.clone(),
            body: match plot.kind {
                PlotKind::Image => PlotBody::Image(src),
                PlotKind::Text => PlotBody::Text(src),
            },
            script_url: plot.script_url.clone(),
        }
    }
}

/// One category's block in the selection sidebar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarSection {
    pub category: String,
    pub groups: Vec<SidebarGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarGroup {
    pub heading: Option<String>,
    pub entries: Vec<SidebarEntry>,
}

/// Checkbox + jump link for one plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarEntry {
    pub id: String,
    /// `"{dataset} - {name}"`, the historical sidebar label
    pub label: String,
}

/// Selection count and compare-bar visibility after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionStatus {
    pub count: usize,
    pub bar_visible: bool,
}

/// Result of a jump-link activation. When the target lives in another
/// category, `plan` carries the render for that category; the caller must
/// apply it *before* scrolling to `anchor`; the target node does not exist
/// until the render runs.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpTarget {
    pub anchor: String,
    pub plan: Option<RenderPlan>,
}

/// Owns all page state and behavior for the results viewer
#[derive(Debug, Clone)]
pub struct ViewerController {
    manifest: Manifest,
    active: Option<String>,
    selection: Vec<String>,
}

impl ViewerController {
    /// The first category (first-seen order) starts active
    pub fn new(manifest: Manifest) -> Self {
        let active = manifest.categories().first().cloned();
        Self { manifest, active, selection: Vec::new() }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn categories(&self) -> &[String] {
        self.manifest.categories()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Render plan for the currently active tab (empty for an empty manifest)
    pub fn render_active(&self) -> RenderPlan {
        match &self.active {
            Some(category) => self.render_category(category),
            None => RenderPlan { category: String::new(), groups: Vec::new() },
        }
    }

    /// Partition `category`'s plots by subcategory, preserving first-seen
    /// group order and manifest order within each group. An unknown category
    /// yields an empty plan, not an error.
    pub fn render_category(&self, category: &str) -> RenderPlan {
        let groups = group_by_subcategory(self.manifest.in_category(category))
            .into_iter()
            .map(|(heading, plots)| PlotGroup {
                heading: heading.map(str::to_string),
                plots: plots.iter().map(|p| PlotView::from_descriptor(p)).collect(),
            })
            .collect();

        RenderPlan { category: category.to_string(), groups }
    }

    /// Switch the active tab and re-render. Re-selecting the active tab is
    /// an allowed no-op that still re-renders. An unknown category leaves
    /// the active pointer untouched and renders nothing.
    pub fn select_tab(&mut self, category: &str) -> RenderPlan {
        if self.manifest.categories().iter().any(|c| c == category) {
            self.active = Some(category.to_string());
        }
        self.render_category(category)
    }

    /// Add or remove `id` from the selection set. Selection order is
    /// insertion order; toggling the same state twice is a no-op.
    pub fn toggle_selection(&mut self, id: &str, checked: bool) -> SelectionStatus {
        if checked {
            if self.manifest.get(id).is_some() && !self.selection.iter().any(|s| s == id) {
                self.selection.push(id.to_string());
            }
        } else {
            self.selection.retain(|s| s != id);
        }
        self.selection_status()
    }

    pub fn selected(&self) -> &[String] {
        &self.selection
    }

    pub fn selection_status(&self) -> SelectionStatus {
        SelectionStatus {
            count: self.selection.len(),
            bar_visible: !self.selection.is_empty(),
        }
    }

    /// Resolve a jump link. Switches the active tab first when the target
    /// lives in another category; `None` for an unknown id (a no-op, per
    /// the closed data set).
    pub fn jump_to(&mut self, id: &str) -> Option<JumpTarget> {
        let category = self.manifest.get(id)?.category.clone();
        let plan = if self.active.as_deref() != Some(category.as_str()) {
            Some(self.select_tab(&category))
        } else {
            None
        };
        Some(JumpTarget { anchor: id.to_string(), plan })
    }

    /// Deep link for the current selection, in selection order
    pub fn comparison_url(&self) -> Result<String, CompareError> {
        comparison_url_for(&self.selection)
    }

    /// Comparison-page view: the requested plots only, grouped by the same
    /// category → subcategory rules. One plan per category containing at
    /// least one requested plot, in manifest category order; unknown ids
    /// are skipped.
    pub fn comparison_plans<S: AsRef<str>>(&self, ids: &[S]) -> Vec<RenderPlan> {
        let wanted: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();

        self.manifest
            .categories()
            .iter()
            .filter_map(|category| {
                let picked: Vec<&PlotDescriptor> = self
                    .manifest
                    .in_category(category)
                    .filter(|p| wanted.contains(&p.id.as_str()))
                    .collect();
                if picked.is_empty() {
                    return None;
                }

                let groups = group_by_subcategory(picked.into_iter())
                    .into_iter()
                    .map(|(heading, plots)| PlotGroup {
                        heading: heading.map(str::to_string),
                        plots: plots.iter().map(|p| PlotView::from_descriptor(p)).collect(),
                    })
                    .collect();

                Some(RenderPlan { category: category.clone(), groups })
            })
            .collect()
    }

    /// The full sidebar model: every category, every group, every checkbox.
    /// Built once up front; the sidebar never re-renders, which is what
    /// lets the selection survive tab switches.
    pub fn sidebar(&self) -> Vec<SidebarSection> {
        self.manifest
            .categories()
            .iter()
            .map(|category| SidebarSection {
                category: category.clone(),
                groups: group_by_subcategory(self.manifest.in_category(category))
                    .into_iter()
                    .map(|(heading, plots)| SidebarGroup {
                        heading: heading.map(str::to_string),
                        entries: plots
                            .iter()
                            .map(|p| SidebarEntry {
                                id: p.id.clone(),
                                label: format!("{} - {}", p.dataset, p.name),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Build the `comparison.html?plots=a,b` deep link. Ids are URL-safe by
/// manifest validation, so the comma-joined list is already its own
/// encoding.
pub fn comparison_url_for<S: AsRef<str>>(ids: &[S]) -> Result<String, CompareError> {
    if ids.is_empty() {
        return Err(CompareError::EmptySelection);
    }
    let joined: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
    Ok(format!("{}?plots={}", COMPARISON_PAGE, joined.join(",")))
}

/// Parse the `plots=` parameter value back into an id list
pub fn parse_plots_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Partition plots by subcategory: first-seen group order, input order
/// within each group, `None` key for the default group.
fn group_by_subcategory<'a, I>(plots: I) -> Vec<(Option<&'a str>, Vec<&'a PlotDescriptor>)>
where
    I: Iterator<Item = &'a PlotDescriptor>,
{
    let mut groups: Vec<(Option<&str>, Vec<&PlotDescriptor>)> = Vec::new();

    for plot in plots {
        let key = plot.subcategory.as_deref();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(plot),
            None => groups.push((key, vec![plot])),
        }
    }

    groups
}
