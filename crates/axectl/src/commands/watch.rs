//! `watch`: poll the device and print a line per new snapshot.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use axectl_core::config::DEFAULT_POLL_INTERVAL;
use axectl_core::{Device, DeviceConfig, DisplayValue};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Printed when no keys are given.
const SUMMARY_KEYS: &[&str] = &["hash_rate", "power", "temp", "fan_speed", "best_session_diff"];

#[derive(Debug, Serialize)]
struct Update<'a> {
    time: String,
    version: u64,
    values: BTreeMap<&'a str, Option<DisplayValue>>,
}

pub async fn handle(
    device_config: DeviceConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let interval = args
        .interval
        .map(Duration::from_secs)
        .filter(|d| !d.is_zero())
        .unwrap_or(if device_config.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            device_config.poll_interval
        });

    let device = Device::new(device_config.with_poll_interval(interval))?;

    let keys: Vec<String> = if args.keys.is_empty() {
        SUMMARY_KEYS.iter().map(|k| (*k).to_owned()).collect()
    } else {
        args.keys
    };
    for key in &keys {
        device.registry().describe(key)?;
    }

    let mut versions = device.subscribe();
    device.connect().await?;
    debug!(interval_secs = interval.as_secs(), "watching device");

    let color = output::should_color(global.color);
    print_update(&device, &keys, global, color)?;
    versions.borrow_and_update();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = versions.changed() => {
                if changed.is_err() {
                    break;
                }
                versions.borrow_and_update();
                print_update(&device, &keys, global, color)?;
            }
        }
    }

    device.disconnect().await;
    Ok(())
}

fn print_update(
    device: &Device,
    keys: &[String],
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let Some(snapshot) = device.snapshot() else {
        return Ok(());
    };

    let readings: Vec<_> = keys
        .iter()
        .filter_map(|key| device.read(key).ok())
        .collect();
    let time = snapshot
        .captured_at()
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string();

    let line = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let fields: Vec<String> = readings
                .iter()
                .map(|r| {
                    let value = if global.output == OutputFormat::Plain {
                        r.value.as_ref().map(ToString::to_string).unwrap_or_default()
                    } else {
                        output::format_value(r.value.as_ref(), r.descriptor.unit, color)
                    };
                    format!("{}={value}", r.descriptor.key)
                })
                .collect();
            format!("{time}  {}", fields.join("  "))
        }
        // One compact document per line, so the stream stays parseable.
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            let update = Update {
                time: snapshot.captured_at().to_rfc3339(),
                version: snapshot.version(),
                values: readings
                    .iter()
                    .map(|r| (r.descriptor.key, r.value.clone()))
                    .collect(),
            };
            output::render_json(&update, true)?
        }
    };

    output::print_output(&line, global.quiet);
    Ok(())
}
