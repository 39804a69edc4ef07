//! JSON inventory export: summary, category order, and the full descriptor
//! table, for downstream tooling

use crate::manifest::Manifest;
use crate::report::Summary;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct Inventory<'a> {
    generated: String,
    summary: Summary,
    categories: &'a [String],
    plots: &'a [crate::manifest::PlotDescriptor],
}

pub fn write<W: Write>(writer: &mut W, manifest: &Manifest) -> io::Result<()> {
    let inventory = Inventory {
        generated: chrono::Local::now().to_rfc3339(),
        summary: Summary::from_manifest(manifest),
        categories: manifest.categories(),
        plots: manifest.plots(),
    };

    serde_json::to_writer_pretty(&mut *writer, &inventory)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, PlotDescriptor, PlotKind};

    #[test]
    fn test_json_round_trips_descriptors() {
        let manifest = Manifest::new(vec![PlotDescriptor {
            id: "p1".to_string(),
            category: "Topomaps".to_string(),
            subcategory: Some("Ascending".to_string()),
            dataset: "ALL".to_string(),
            name: "N1 Map".to_string(),
            kind: PlotKind::Image,
            image: Some("images/p1.png".to_string()),
            path: None,
            script_url: Some("https://example.org/03_generate_topomaps.py".to_string()),
        }])
        .unwrap();

        let mut out = Vec::new();
        write(&mut out, &manifest).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["categories"][0], "Topomaps");
        assert_eq!(value["plots"][0]["id"], "p1");
        // Historical key names survive the export
        assert_eq!(value["plots"][0]["scriptUrl"], "https://example.org/03_generate_topomaps.py");
        assert_eq!(value["plots"][0]["type"], "image");
    }
}
