//! `points`: the offline catalog of control points and commands.

use serde::Serialize;
use tabled::Tabled;

use axectl_core::Registry;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct PointView {
    key: &'static str,
    name: &'static str,
    kind: String,
    access: String,
    unit: Option<&'static str>,
    /// Legal values for the reference model; selects may differ per device.
    values: String,
}

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Access")]
    access: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Values")]
    values: String,
}

fn point_row(p: &PointView) -> PointRow {
    PointRow {
        key: p.key.into(),
        name: p.name.into(),
        kind: p.kind.clone(),
        access: p.access.clone(),
        unit: p.unit.unwrap_or("").into(),
        values: p.values.clone(),
    }
}

fn catalog(registry: &Registry) -> Vec<PointView> {
    let points = registry.iter().map(|d| PointView {
        key: d.key,
        name: d.name,
        kind: d.platform.to_string(),
        access: d.access.to_string(),
        unit: d.unit,
        values: if d.is_writable() {
            util::describe_domain(&d.resolve_domain(None))
        } else {
            String::new()
        },
    });

    let commands = registry.commands().map(|c| PointView {
        key: c.key,
        name: c.name,
        kind: "command".into(),
        access: "write_only".into(),
        unit: None,
        values: c.endpoint.into(),
    });

    points.chain(commands).collect()
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let views = catalog(&Registry::new());

    let out = output::render_list(global.output, &views, point_row, |p| p.key.to_owned())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
