//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod points;
pub mod set;
pub mod status;
pub mod util;
pub mod watch;

use std::time::Duration;

use axectl_core::{Device, DeviceConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    device_config: DeviceConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(device_config, args, global).await,
        cmd => {
            // One-shot commands never need the background poller.
            let device = Device::new(device_config.with_poll_interval(Duration::ZERO))?;
            one_shot(cmd, &device, global).await
        }
    }
}

async fn one_shot(cmd: Command, device: &Device, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::status(device, args, global).await,
        Command::Get(args) => status::get(device, args, global).await,
        Command::Options(args) => status::options(device, args, global).await,
        Command::Set(args) => set::set(device, args, global).await,
        Command::Press(args) => set::press(device, args, global).await,
        // Offline and long-running commands are routed before this point
        Command::Watch(_) | Command::Points | Command::Config(_) | Command::Completions(_) => {
            Ok(())
        }
    }
}
