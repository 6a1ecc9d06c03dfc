//! Textfile collector rendering. One gauge line per OUI, no HELP/TYPE header.

use std::io::{self, Write};

use super::OuiMap;

/// Escape a label value. Only double quotes are escaped.
pub fn escape_label_value(value: &str) -> String {
    value.replace('"', "\\\"")
}

pub fn render_line(metric_name: &str, oui: &str, organization: &str) -> String {
    format!(
        "{}{{oui=\"{}\",organization_name=\"{}\"}} 1",
        metric_name,
        escape_label_value(oui),
        escape_label_value(organization)
    )
}

/// Write every map entry as a metric line, in map iteration order.
pub fn write_metrics<W: Write>(map: &OuiMap, metric_name: &str, out: &mut W) -> io::Result<()> {
    for (oui, organization) in map.iter() {
        writeln!(out, "{}", render_line(metric_name, oui, organization))?;
    }
    Ok(())
}
