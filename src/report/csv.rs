//! CSV inventory export: one row per plot descriptor

use crate::manifest::{Manifest, PlotKind};
use crate::viewer::DEFAULT_GROUP;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, manifest: &Manifest) -> io::Result<()> {
    writeln!(writer, "id,category,subcategory,dataset,name,kind,asset,script_url")?;

    for plot in manifest.plots() {
        let kind = match plot.kind {
            PlotKind::Image => "image",
            PlotKind::Text => "text",
        };
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            escape(&plot.id),
            escape(&plot.category),
            escape(plot.subcategory.as_deref().unwrap_or(DEFAULT_GROUP)),
            escape(&plot.dataset),
            escape(&plot.name),
            kind,
            escape(plot.asset().unwrap_or_default()),
            escape(plot.script_url.as_deref().unwrap_or_default()),
        )?;
    }

    Ok(())
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
