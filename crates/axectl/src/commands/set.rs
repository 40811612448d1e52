//! Write-side handlers: `set`, `press`.

use serde::Serialize;
use tracing::warn;

use axectl_core::{CoreError, Device, DispatchError, WriteError};

use crate::cli::{GlobalOpts, PressArgs, SetArgs};
use crate::error::CliError;
use crate::output;

use super::util::ReadingView;

pub async fn set(device: &Device, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    device.registry().describe(&args.key)?;
    // Model-dependent options are validated against the live model.
    device.connect().await?;

    match device.set(&args.key, args.value.as_str()).await {
        Ok(_) => {}
        Err(CoreError::Dispatch(DispatchError::Write(WriteError::Refresh(e)))) => {
            return Err(CliError::Unconfirmed {
                key: args.key,
                reason: e.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    }

    let color = output::should_color(global.color);
    let view = ReadingView::from(&device.read(&args.key)?);

    let out = output::render_single(
        global.output,
        &view,
        |v| format!("{} = {}", v.key, v.display(color)),
        ReadingView::plain,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Debug, Serialize)]
struct PressView {
    command: &'static str,
    endpoint: &'static str,
    /// Whether the device answered the follow-up refresh.
    confirmed: bool,
}

pub async fn press(device: &Device, args: PressArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let command = device.registry().command(&args.command)?;

    let confirmed = match device.press(command.key).await {
        Ok(_) => true,
        // Expected after a restart: the device drops off while rebooting.
        Err(CoreError::Dispatch(DispatchError::Write(WriteError::Refresh(e)))) => {
            if command.key != "restart" {
                warn!(error = %e, "command sent but device did not answer the refresh");
            }
            false
        }
        Err(e) => return Err(e.into()),
    };

    let view = PressView {
        command: command.key,
        endpoint: command.endpoint,
        confirmed,
    };
    let out = output::render_single(
        global.output,
        &view,
        |v| {
            if v.command == "restart" {
                "Restart sent; the device is rebooting".to_owned()
            } else {
                format!("Sent {}", v.command)
            }
        },
        |v| v.command.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
