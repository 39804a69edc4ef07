//! Static site generation: the tabbed viewer page and the comparison page
//!
//! Both pages are self-contained HTML documents in the dark report style.
//! All grouping decisions are made here, server-side, from the viewer's
//! render plans: `viewer.html` pre-renders every category panel (hidden
//! except the active one) so the page script only toggles visibility, and
//! `comparison.html` pre-renders the full grouped structure so its script
//! only hides the containers the `plots=` parameter did not ask for. The
//! scripts never regroup anything.

use crate::manifest::Manifest;
use crate::viewer::{PlotBody, PlotView, RenderPlan, ViewerController};
use std::io::{self, Write};

/// Write the tabbed viewer page
pub fn write_viewer<W: Write>(writer: &mut W, manifest: &Manifest) -> io::Result<()> {
    let viewer = ViewerController::new(manifest.clone());

    let mut tabs = String::new();
    let mut panels = String::new();
    for (index, category) in viewer.categories().iter().enumerate() {
        let active = if index == 0 { " active" } else { "" };
        tabs.push_str(&format!(
            "<button class=\"tab-link{}\" data-category=\"{}\">{}</button>\n",
            active,
            attr_escape(category),
            html_escape(category)
        ));

        let plan = viewer.render_category(category);
        panels.push_str(&format!(
            "<div class=\"category-panel{}\" data-category=\"{}\">\n{}</div>\n",
            if index == 0 { "" } else { " hidden" },
            attr_escape(category),
            plan_sections(&plan)
        ));
    }

    let mut sidebar = String::new();
    for section in viewer.sidebar() {
        sidebar.push_str(&format!(
            "<div class=\"sidebar-category\"><strong>{}</strong></div>\n",
            html_escape(&section.category)
        ));
        for group in &section.groups {
            if let Some(heading) = &group.heading {
                sidebar.push_str(&format!(
                    "<div class=\"sidebar-subcategory\">{}</div>\n",
                    html_escape(heading)
                ));
            }
            for entry in &group.entries {
                sidebar.push_str(&format!(
                    "<div class=\"checkbox-row\">\
                     <input type=\"checkbox\" id=\"cb-{id}\" data-plot-id=\"{id}\">\
                     <a href=\"#{id}\" class=\"jump-link\" data-plot-id=\"{id}\">{label}</a>\
                     </div>\n",
                    id = attr_escape(&entry.id),
                    label = html_escape(&entry.label)
                ));
            }
        }
    }

    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>erpdeck — Analysis Results</title>
    <style>
{style}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <div>
                <div class="logo">erpdeck</div>
                <div class="subtitle">EEG/ERP Analysis Results</div>
            </div>
        </div>

        <div class="results-tabs">
{tabs}
        </div>

        <div class="layout">
            <div class="sidebar">
                <div class="sidebar-title">Compare Plots</div>
                <div id="comparison-controls">
{sidebar}
                </div>
                <button id="compare-btn">Compare Selected</button>
                <div id="compare-bar" class="compare-bar hidden">
                    <span id="compare-count">0 selected</span>
                    <button id="floating-compare-btn">Compare Selected</button>
                </div>
            </div>
            <div id="plots-container">
{panels}
            </div>
        </div>

        <div class="footer">Generated by erpdeck on {generated}</div>
    </div>

    <script>
    // Selection order, not DOM order: the comparison URL lists ids in the
    // order they were checked.
    const selection = [];

    function updateCompareBar() {{
        const bar = document.getElementById('compare-bar');
        document.getElementById('compare-count').textContent = selection.length + ' selected';
        bar.classList.toggle('hidden', selection.length === 0);
    }}

    function openComparison() {{
        if (selection.length === 0) {{
            alert('Please select at least one plot to compare.');
            return;
        }}
        window.open('comparison.html?plots=' + selection.join(','), '_blank');
    }}

    function showCategory(category) {{
        document.querySelectorAll('.tab-link').forEach(tab => {{
            tab.classList.toggle('active', tab.dataset.category === category);
        }});
        document.querySelectorAll('.category-panel').forEach(panel => {{
            panel.classList.toggle('hidden', panel.dataset.category !== category);
        }});
    }}

    document.querySelectorAll('.tab-link').forEach(tab => {{
        tab.addEventListener('click', () => showCategory(tab.dataset.category));
    }});

    document.getElementById('comparison-controls').addEventListener('change', e => {{
        if (!e.target.matches('input[type="checkbox"]')) return;
        const id = e.target.dataset.plotId;
        if (e.target.checked) {{
            if (!selection.includes(id)) selection.push(id);
        }} else {{
            const at = selection.indexOf(id);
            if (at !== -1) selection.splice(at, 1);
        }}
        updateCompareBar();
    }});

    document.getElementById('comparison-controls').addEventListener('click', e => {{
        if (!e.target.classList.contains('jump-link')) return;
        e.preventDefault();
        const id = e.target.dataset.plotId;
        const target = document.getElementById(id);
        if (!target) return;
        // Switch to the target's tab first; the panel toggle is synchronous,
        // so the element is visible before we scroll.
        const panel = target.closest('.category-panel');
        if (panel && panel.classList.contains('hidden')) {{
            showCategory(panel.dataset.category);
        }}
        target.scrollIntoView({{ behavior: 'smooth' }});
    }});

    document.getElementById('compare-btn').addEventListener('click', openComparison);
    document.getElementById('floating-compare-btn').addEventListener('click', openComparison);

    // Fire-and-forget text loads; each failure stays inside its own <pre>.
    document.querySelectorAll('pre[data-src]').forEach(pre => {{
        fetch(pre.dataset.src)
            .then(r => r.ok ? r.text() : Promise.reject(new Error('HTTP ' + r.status)))
            .then(text => pre.textContent = text)
            .catch(err => pre.textContent = 'Error loading content: ' + err);
    }});
    </script>
</body>
</html>
"#,
        style = PAGE_STYLE,
        tabs = tabs,
        sidebar = sidebar,
        panels = panels,
        generated = generated,
    )?;

    Ok(())
}

/// Write the comparison page consumed by `comparison.html?plots=<id1>,<id2>`
pub fn write_comparison<W: Write>(writer: &mut W, manifest: &Manifest) -> io::Result<()> {
    let viewer = ViewerController::new(manifest.clone());

    // Pre-render everything with the normal grouping; the page script hides
    // whatever the query did not request, then collapses emptied groups.
    let all_ids: Vec<&str> = manifest.plots().iter().map(|p| p.id.as_str()).collect();
    let mut blocks = String::new();
    for plan in viewer.comparison_plans(&all_ids) {
        blocks.push_str(&format!(
            "<div class=\"category-block\"><h2>{}</h2>\n{}</div>\n",
            html_escape(&plan.category),
            plan_sections(&plan)
        ));
    }

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>erpdeck — Plot Comparison</title>
    <style>
{style}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <div>
                <div class="logo">erpdeck</div>
                <div class="subtitle">Side-by-Side Comparison</div>
            </div>
        </div>

        <div id="empty-note" class="empty-note hidden">
            No plots selected. Open this page from the viewer's compare bar.
        </div>

        <div id="comparison-container">
{blocks}
        </div>

        <div class="footer"><a href="viewer.html">&larr; Back to all results</a></div>
    </div>

    <script>
    const requested = (new URLSearchParams(location.search).get('plots') || '')
        .split(',').map(s => s.trim()).filter(s => s.length > 0);

    let shown = 0;
    document.querySelectorAll('.plot-container').forEach(div => {{
        if (requested.includes(div.id)) {{
            shown += 1;
        }} else {{
            div.classList.add('hidden');
        }}
    }});

    // Collapse groups and category blocks that lost all their plots
    document.querySelectorAll('section').forEach(section => {{
        if (!section.querySelector('.plot-container:not(.hidden)')) section.classList.add('hidden');
    }});
    document.querySelectorAll('.category-block').forEach(block => {{
        if (!block.querySelector('.plot-container:not(.hidden)')) block.classList.add('hidden');
    }});

    if (shown === 0) {{
        document.getElementById('empty-note').classList.remove('hidden');
    }}

    document.querySelectorAll('pre[data-src]').forEach(pre => {{
        if (pre.closest('.plot-container').classList.contains('hidden')) return;
        fetch(pre.dataset.src)
            .then(r => r.ok ? r.text() : Promise.reject(new Error('HTTP ' + r.status)))
            .then(text => pre.textContent = text)
            .catch(err => pre.textContent = 'Error loading content: ' + err);
    }});
    </script>
</body>
</html>
"#,
        style = PAGE_STYLE,
        blocks = blocks,
    )?;

    Ok(())
}

/// Render a plan's groups as `<section>` blocks. The default group gets no
/// heading; every plot container is anchored by its descriptor id.
fn plan_sections(plan: &RenderPlan) -> String {
    let mut out = String::new();
    for group in &plan.groups {
        out.push_str("<section>\n");
        if let Some(heading) = &group.heading {
            out.push_str(&format!("<h3>{}</h3>\n", html_escape(heading)));
        }
        for plot in &group.plots {
            out.push_str(&plot_container(plot));
        }
        out.push_str("</section>\n");
    }
    out
}

fn plot_container(plot: &PlotView) -> String {
    let mut out = format!(
        "<div class=\"plot-container\" id=\"{}\">\n<h4>{}</h4>\n",
        attr_escape(&plot.id),
        html_escape(&plot.name)
    );

    match &plot.body {
        PlotBody::Image(src) => out.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\">\n",
            attr_escape(src),
            attr_escape(&plot.name)
        )),
        PlotBody::Text(src) => out.push_str(&format!(
            "<pre class=\"text-content\" data-src=\"{}\">Loading&hellip;</pre>\n",
            attr_escape(src)
        )),
    }

    if let Some(url) = &plot.script_url {
        out.push_str(&format!(
            "<a href=\"{}\" class=\"source-script-link\" target=\"_blank\" rel=\"noopener\">View Source Script</a>\n",
            attr_escape(url)
        ));
    }

    out.push_str("</div>\n");
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn attr_escape(s: &str) -> String {
    html_escape(s).replace('"', "&quot;")
}

const PAGE_STYLE: &str = r#"        :root {
            --bg: #0d1117;
            --card: #161b22;
            --border: #30363d;
            --text: #e6edf3;
            --dim: #7d8590;
            --accent: #58a6ff;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }
        .container { max-width: 1400px; margin: 0 auto; padding: 2rem; }
        .hidden { display: none; }

        .header {
            display: flex;
            align-items: center;
            gap: 1rem;
            margin-bottom: 1.5rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border);
        }
        .logo {
            font-size: 2.5rem;
            font-weight: 800;
            background: linear-gradient(135deg, var(--accent), #a371f7);
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
        }
        .subtitle { color: var(--dim); font-size: 1rem; }

        .results-tabs { display: flex; flex-wrap: wrap; gap: 0.5rem; margin-bottom: 1.5rem; }
        .tab-link {
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 8px;
            color: var(--text);
            padding: 0.5rem 1rem;
            cursor: pointer;
            font-size: 0.9rem;
        }
        .tab-link.active { border-color: var(--accent); color: var(--accent); }

        .layout { display: grid; grid-template-columns: 320px 1fr; gap: 1.5rem; align-items: start; }
        .sidebar {
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1rem;
            position: sticky;
            top: 1rem;
            max-height: calc(100vh - 2rem);
            overflow-y: auto;
        }
        .sidebar-title { font-weight: 600; margin-bottom: 0.75rem; }
        .sidebar-category { margin: 0.75rem 0 0.25rem; }
        .sidebar-subcategory { color: var(--dim); font-size: 0.85rem; margin: 0.4rem 0 0.2rem 0.5rem; }
        .checkbox-row { display: flex; align-items: baseline; gap: 0.5rem; margin-left: 1rem; font-size: 0.85rem; }
        .jump-link { color: var(--text); text-decoration: none; }
        .jump-link:hover { color: var(--accent); }
        #compare-btn, #floating-compare-btn {
            background: var(--accent);
            border: none;
            border-radius: 8px;
            color: #0d1117;
            padding: 0.5rem 1rem;
            margin-top: 1rem;
            cursor: pointer;
            font-weight: 600;
        }
        .compare-bar {
            position: sticky;
            bottom: 0;
            background: var(--card);
            border-top: 1px solid var(--border);
            padding: 0.75rem 0 0.25rem;
            margin-top: 1rem;
            display: flex;
            align-items: center;
            gap: 0.75rem;
        }
        .compare-bar.hidden { display: none; }
        #compare-count { color: var(--dim); font-size: 0.85rem; }

        section { margin-bottom: 2rem; }
        section h3 { color: var(--dim); margin-bottom: 0.75rem; }
        .category-block h2 { margin: 1.5rem 0 0.75rem; }
        .plot-container {
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1.25rem;
            margin-bottom: 1.25rem;
        }
        .plot-container h4 { margin-bottom: 0.75rem; }
        .plot-container img { max-width: 100%; border-radius: 8px; background: #fff; }
        .text-content {
            background: rgba(255,255,255,0.03);
            border: 1px solid var(--border);
            border-radius: 8px;
            padding: 1rem;
            overflow-x: auto;
            font-family: 'SF Mono', 'Fira Code', monospace;
            font-size: 0.8rem;
            white-space: pre-wrap;
        }
        .source-script-link {
            display: inline-block;
            margin-top: 0.75rem;
            color: var(--accent);
            font-size: 0.85rem;
            text-decoration: none;
        }
        .source-script-link:hover { text-decoration: underline; }

        .empty-note {
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1.5rem;
            color: var(--dim);
        }

        .footer {
            margin-top: 2rem;
            padding-top: 1rem;
            border-top: 1px solid var(--border);
            color: var(--dim);
            font-size: 0.875rem;
            text-align: center;
        }
        .footer a { color: var(--accent); text-decoration: none; }
        .footer a:hover { text-decoration: underline; }"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, PlotDescriptor, PlotKind};

    // ==========================================================================
    // STATIC VIEWER PAGE TESTS
    // ==========================================================================
    //
    // These verify the generated HTML contains the structure the page script
    // depends on: anchored containers, hidden panels, data-src text blocks.
    // ==========================================================================

    fn plot(id: &str, category: &str, subcategory: Option<&str>) -> PlotDescriptor {
        PlotDescriptor {
            id: id.to_string(),
            category: category.to_string(),
            subcategory: subcategory.map(str::to_string),
            dataset: "ALL".to_string(),
            name: format!("Plot {}", id),
            kind: PlotKind::Image,
            image: Some(format!("images/{}.png", id)),
            path: None,
            script_url: None,
        }
    }

    fn render_viewer(plots: Vec<PlotDescriptor>) -> String {
        let manifest = Manifest::new(plots).unwrap();
        let mut out = Vec::new();
        write_viewer(&mut out, &manifest).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_viewer_renders_tab_per_category() {
        let html = render_viewer(vec![plot("a1", "Topomaps", None), plot("b1", "LORETA", None)]);
        assert!(html.contains(r#"data-category="Topomaps""#));
        assert!(html.contains(r#"data-category="LORETA""#));
        // First category starts active, later panels start hidden
        assert!(html.contains(r#"class="tab-link active" data-category="Topomaps""#));
        assert!(html.contains(r#"class="category-panel hidden" data-category="LORETA""#));
    }

    #[test]
    fn test_viewer_anchors_every_plot() {
        let html = render_viewer(vec![plot("a1", "A", None), plot("b1", "B", None)]);
        assert!(html.contains(r#"<div class="plot-container" id="a1">"#));
        assert!(html.contains(r#"<div class="plot-container" id="b1">"#));
    }

    #[test]
    fn test_viewer_subcategory_headings() {
        let html = render_viewer(vec![
            plot("a1", "A", Some("Ascending")),
            plot("a2", "A", None),
        ]);
        assert!(html.contains("<h3>Ascending</h3>"));
        // The default group renders without a heading; only one h3 total
        assert_eq!(html.matches("<h3>").count(), 1);
    }

    #[test]
    fn test_viewer_text_plot_markup() {
        let manifest = Manifest::new(vec![PlotDescriptor {
            id: "summary".to_string(),
            category: "A".to_string(),
            subcategory: None,
            dataset: "ALL".to_string(),
            name: "ANCOVA Summary".to_string(),
            kind: PlotKind::Text,
            image: None,
            path: Some("results/summary.txt".to_string()),
            script_url: None,
        }])
        .unwrap();
        let mut out = Vec::new();
        write_viewer(&mut out, &manifest).unwrap();
        let html = String::from_utf8(out).unwrap();

        assert!(html.contains(r#"<pre class="text-content" data-src="results/summary.txt">"#));
        // The loader script and its in-place error path are present
        assert!(html.contains("pre[data-src]"));
        assert!(html.contains("Error loading content"));
    }

    #[test]
    fn test_viewer_script_link_only_when_present() {
        let mut with_link = plot("a1", "A", None);
        with_link.script_url = Some("https://example.org/gen.py".to_string());
        let html = render_viewer(vec![with_link, plot("a2", "A", None)]);
        assert_eq!(html.matches("View Source Script").count(), 1);
    }

    #[test]
    fn test_viewer_escapes_markup_in_names() {
        let mut tricky = plot("a1", "A", None);
        tricky.name = "N1 <script> & \"quotes\"".to_string();
        let html = render_viewer(vec![tricky]);
        assert!(html.contains("N1 &lt;script&gt; &amp; \"quotes\""));
        assert!(!html.contains("N1 <script>"));
    }

    #[test]
    fn test_viewer_sidebar_labels_and_checkboxes() {
        let html = render_viewer(vec![plot("a1", "A", None)]);
        assert!(html.contains(r#"id="cb-a1""#));
        assert!(html.contains("ALL - Plot a1"));
        assert!(html.contains(r##"href="#a1""##));
    }

    #[test]
    fn test_viewer_empty_manifest_still_renders() {
        let html = render_viewer(vec![]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("plot-container"));
    }

    // ==========================================================================
    // COMPARISON PAGE TESTS
    // ==========================================================================

    #[test]
    fn test_comparison_prerenders_all_plots_grouped() {
        let manifest = Manifest::new(vec![
            plot("a1", "A", Some("S1")),
            plot("b1", "B", None),
        ])
        .unwrap();
        let mut out = Vec::new();
        write_comparison(&mut out, &manifest).unwrap();
        let html = String::from_utf8(out).unwrap();

        assert!(html.contains("<h2>A</h2>"));
        assert!(html.contains("<h2>B</h2>"));
        assert!(html.contains("<h3>S1</h3>"));
        assert!(html.contains(r#"id="a1""#));
        assert!(html.contains(r#"id="b1""#));
        // The filter script keys off the plots parameter
        assert!(html.contains("URLSearchParams"));
        assert!(html.contains("'plots'"));
        assert!(html.contains("empty-note"));
    }
}
