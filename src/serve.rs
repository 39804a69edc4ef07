//! HTTP server for interactive viewing
//!
//! `erpdeck serve ./docs` → starts server, opens browser, shows the viewer
//!
//! The server is stateless: tab and selection state live in the page, and
//! every grouping decision comes back out of the Rust render plans via the
//! `/api/*` endpoints. The manifest is re-read per request so edits show up
//! on refresh.

use crate::assets;
use crate::manifest::{Manifest, ManifestError, MANIFEST_FILENAME};
use crate::viewer::{parse_plots_list, RenderPlan, SidebarSection, ViewerController};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, Server};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("ui.html");
const COMPARE_UI_HTML: &str = include_str!("compare_ui.html");

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    fn failure(error: String) -> Self {
        Self { ok: false, data: None, error: Some(error) }
    }
}

#[derive(Deserialize)]
struct RenderQuery {
    category: String,
}

#[derive(Deserialize)]
struct CompareQuery {
    #[serde(default)]
    plots: String,
}

/// Everything the viewer page needs to build its chrome once, up front:
/// tab order, the full sidebar, and the id → category map jump links use to
/// decide whether a tab switch must happen before scrolling.
#[derive(Serialize)]
struct Bootstrap {
    categories: Vec<String>,
    sidebar: Vec<SidebarSection>,
    category_of: HashMap<String, String>,
}

/// Where the manifest and its assets live
struct Site {
    manifest_path: PathBuf,
    asset_root: PathBuf,
}

impl Site {
    /// Accepts either the manifest file itself or the directory holding it
    fn locate(path: &Path) -> Site {
        if path.is_file() {
            Site {
                manifest_path: path.to_path_buf(),
                asset_root: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            }
        } else {
            Site {
                manifest_path: path.join(MANIFEST_FILENAME),
                asset_root: path.to_path_buf(),
            }
        }
    }

    fn load(&self) -> Result<Manifest, ManifestError> {
        Manifest::from_path(&self.manifest_path)
    }
}

/// Start the server, open the browser, serve the viewer
pub fn start(path: PathBuf, port: u16, open_browser: bool) -> io::Result<()> {
    let site = Site::locate(&path);

    // Fail fast on an unreadable manifest; later requests re-read it
    let manifest = site
        .load()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);
    eprintln!("\n\x1b[1;32m🧠 erpdeck\x1b[0m");
    eprintln!("   {}", url);
    eprintln!(
        "   Serving {} plots in {} categories from {}\n",
        manifest.len(),
        manifest.categories().len(),
        site.asset_root.display()
    );

    if open_browser {
        let _ = open::that(&url);
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &site) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

fn handle_request(request: Request, site: &Site) -> io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let query = url.split('?').nth(1).unwrap_or("");
    let method = request.method().clone();

    match (&method, path) {
        // Embedded pages
        (&Method::Get, "/") | (&Method::Get, "/viewer.html") => {
            respond_html(request, UI_HTML.to_string())
        }
        (&Method::Get, "/comparison.html") => respond_html(request, COMPARE_UI_HTML.to_string()),

        // API: viewer chrome
        (&Method::Get, "/api/bootstrap") => match site.load() {
            Ok(manifest) => respond_json(request, &ApiResponse::success(bootstrap(&manifest))),
            Err(e) => respond_json(request, &ApiResponse::<Bootstrap>::failure(e.to_string())),
        },

        // API: render plan for one category (unknown category → empty plan)
        (&Method::Get, "/api/render") => match site.load() {
            Ok(manifest) => {
                let category = serde_urlencoded::from_str::<RenderQuery>(query)
                    .map(|q| q.category)
                    .unwrap_or_default();
                let plan = ViewerController::new(manifest).render_category(&category);
                respond_json(request, &ApiResponse::success(plan))
            }
            Err(e) => respond_json(request, &ApiResponse::<RenderPlan>::failure(e.to_string())),
        },

        // API: comparison plans for a plots= id list
        (&Method::Get, "/api/compare") => match site.load() {
            Ok(manifest) => {
                let ids = serde_urlencoded::from_str::<CompareQuery>(query)
                    .map(|q| parse_plots_list(&q.plots))
                    .unwrap_or_default();
                let plans: Vec<RenderPlan> = ViewerController::new(manifest).comparison_plans(&ids);
                respond_json(request, &ApiResponse::success(plans))
            }
            Err(e) => {
                respond_json(request, &ApiResponse::<Vec<RenderPlan>>::failure(e.to_string()))
            }
        },

        // Everything else is an asset under the results root
        (&Method::Get, asset_path) => serve_asset(request, site, asset_path),

        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

fn bootstrap(manifest: &Manifest) -> Bootstrap {
    let viewer = ViewerController::new(manifest.clone());
    let category_of = viewer
        .manifest()
        .plots()
        .iter()
        .map(|p| (p.id.clone(), p.category.clone()))
        .collect();

    Bootstrap {
        categories: viewer.categories().to_vec(),
        sidebar: viewer.sidebar(),
        category_of,
    }
}

fn serve_asset(request: Request, site: &Site, asset_path: &str) -> io::Result<()> {
    let rel = asset_path.trim_start_matches('/');

    let Some(full) = assets::resolve(&site.asset_root, rel) else {
        let response = Response::from_string("Not found").with_status_code(404);
        return request.respond(response);
    };

    match std::fs::read(&full) {
        Ok(bytes) => {
            let response = Response::from_data(bytes).with_header(
                Header::from_bytes(&b"Content-Type"[..], assets::content_type(rel).as_bytes())
                    .unwrap(),
            );
            request.respond(response)
        }
        Err(e) => {
            // The viewer surfaces this message inside the plot container
            let response = Response::from_string(format!("Not found: {} ({})", rel, e.kind()))
                .with_status_code(404);
            request.respond(response)
        }
    }
}

fn respond_html(request: Request, html: String) -> io::Result<()> {
    let response = Response::from_string(html)
        .with_header(Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]).unwrap());
    request.respond(response)
}

fn respond_json<T: Serialize>(request: Request, body: &ApiResponse<T>) -> io::Result<()> {
    let json = serde_json::to_string(body)?;
    let response = Response::from_string(json)
        .with_header(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap());
    request.respond(response)
}
