//! Read-side handlers: `status`, `get`, `options`.

use serde::Serialize;

use axectl_core::asic::{self, DEFAULT_MODEL};
use axectl_core::{ControlPointDescriptor, Device, DomainSpec, Platform, ValueDomain};

use crate::cli::{GetArgs, GlobalOpts, OptionsArgs, PointKind, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::util::{self, ReadingRow, ReadingView};

fn matches_kind(kind: PointKind, platform: Platform) -> bool {
    matches!(
        (kind, platform),
        (PointKind::Sensor, Platform::Sensor)
            | (PointKind::Number, Platform::Number)
            | (PointKind::Select, Platform::Select)
            | (PointKind::Switch, Platform::Switch)
            | (PointKind::Text, Platform::Text)
    )
}

pub async fn status(device: &Device, args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    device.connect().await?;
    let color = output::should_color(global.color);

    let views: Vec<ReadingView> = device
        .readings()
        .iter()
        .filter(|r| args.kind.is_none_or(|k| matches_kind(k, r.descriptor.platform)))
        .map(ReadingView::from)
        .collect();

    let out = output::render_list(
        global.output,
        &views,
        |v| ReadingRow::new(v, color),
        ReadingView::plain,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn get(device: &Device, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Unknown keys fail without touching the network.
    device.registry().describe(&args.key)?;
    device.connect().await?;

    let color = output::should_color(global.color);
    let view = ReadingView::from(&device.read(&args.key)?);

    let out = output::render_single(
        global.output,
        &view,
        |v| util::reading_detail(v, color),
        |v| v.value.as_ref().map(ToString::to_string).unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Debug, Serialize)]
struct OptionsView {
    key: String,
    model: Option<String>,
    /// Set when the reported model has no preset table of its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    presets_from: Option<&'static str>,
    values: ValueDomain,
}

impl OptionsView {
    fn header(&self) -> String {
        let model = self.model.as_deref().unwrap_or("unknown model");
        match self.presets_from {
            Some(fallback) => format!("{} ({model}, showing {fallback} presets)", self.key),
            None => format!("{} ({model})", self.key),
        }
    }
}

/// The model whose presets stand in for an unrecognized one.
fn presets_fallback(
    descriptor: &ControlPointDescriptor,
    model: Option<&str>,
) -> Option<&'static str> {
    let model_dependent = matches!(descriptor.domain, DomainSpec::Asic { .. });
    (model_dependent && !model.is_some_and(asic::is_known_model)).then_some(DEFAULT_MODEL)
}

pub async fn options(device: &Device, args: OptionsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let descriptor = device.registry().describe(&args.key)?;
    let snapshot = device.connect().await?;

    let view = OptionsView {
        values: device.options(&args.key)?,
        model: snapshot.asic_model().map(str::to_owned),
        presets_from: presets_fallback(descriptor, snapshot.asic_model()),
        key: args.key,
    };

    let out = output::render_single(
        global.output,
        &view,
        |v| {
            let mut lines = vec![v.header()];
            lines.extend(util::domain_lines(&v.values).into_iter().map(|l| format!("  {l}")));
            lines.join("\n")
        },
        |v| util::domain_lines(&v.values).join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
