// Built-in Bitaxe/AxeOS catalog.

use axectl_api::endpoints;

use super::{Access, Codec, CommandDescriptor, ControlPointDescriptor, DomainSpec, Platform};
use crate::asic::Capability;

/// Display sleep labels over `displayTimeout` seconds.
pub const DISPLAY_SLEEP_LABELS: &[(&str, i64)] = &[
    ("Always on", -1),
    ("Always off", 0),
    ("30 seconds", 30),
    ("1 minute", 60),
    ("5 minutes", 300),
    ("15 minutes", 900),
    ("30 minutes", 1800),
    ("1 hour", 3600),
];

const ROTATIONS: &[&str] = &["0", "90", "180", "270"];

const fn sensor(
    key: &'static str,
    name: &'static str,
    api_key: &'static str,
    unit: Option<&'static str>,
    codec: Codec,
) -> ControlPointDescriptor {
    ControlPointDescriptor {
        key,
        name,
        api_key,
        platform: Platform::Sensor,
        access: Access::ReadOnly,
        unit,
        domain: DomainSpec::FreeForm,
        codec,
    }
}

const fn number(
    key: &'static str,
    name: &'static str,
    api_key: &'static str,
    unit: Option<&'static str>,
    (min, max, step): (i64, i64, i64),
) -> ControlPointDescriptor {
    ControlPointDescriptor {
        key,
        name,
        api_key,
        platform: Platform::Number,
        access: Access::ReadWrite,
        unit,
        domain: DomainSpec::Range { min, max, step },
        codec: Codec::Integer,
    }
}

const fn select(
    key: &'static str,
    name: &'static str,
    api_key: &'static str,
    unit: Option<&'static str>,
    domain: DomainSpec,
    codec: Codec,
) -> ControlPointDescriptor {
    ControlPointDescriptor {
        key,
        name,
        api_key,
        platform: Platform::Select,
        access: Access::ReadWrite,
        unit,
        domain,
        codec,
    }
}

const fn switch(key: &'static str, name: &'static str, api_key: &'static str) -> ControlPointDescriptor {
    ControlPointDescriptor {
        key,
        name,
        api_key,
        platform: Platform::Switch,
        access: Access::ReadWrite,
        unit: None,
        domain: DomainSpec::Toggle,
        codec: Codec::Toggle,
    }
}

const fn text(key: &'static str, name: &'static str, api_key: &'static str) -> ControlPointDescriptor {
    ControlPointDescriptor {
        key,
        name,
        api_key,
        platform: Platform::Text,
        access: Access::ReadWrite,
        unit: None,
        domain: DomainSpec::FreeForm,
        codec: Codec::Text,
    }
}

pub const CONTROL_POINTS: &[ControlPointDescriptor] = &[
    // Telemetry
    sensor("power", "Power Consumption", "power", Some("W"), Codec::Number),
    sensor("temp", "Temperature ASIC", "temp", Some("°C"), Codec::Number),
    sensor("vr_temp", "Temperature VR", "vrTemp", Some("°C"), Codec::Number),
    sensor("hash_rate", "Hash Rate", "hashRate", Some("GH/s"), Codec::Number),
    sensor("best_diff", "All-Time Best Difficulty", "bestDiff", None, Codec::Difficulty),
    sensor(
        "best_session_diff",
        "Best Difficulty Since System Boot",
        "bestSessionDiff",
        None,
        Codec::Difficulty,
    ),
    sensor("shares_accepted", "Shares Accepted", "sharesAccepted", None, Codec::Number),
    sensor("shares_rejected", "Shares Rejected", "sharesRejected", None, Codec::Number),
    sensor("fan_speed", "Fan Speed", "fanspeed", Some("%"), Codec::Number),
    sensor("fan_rpm", "Fan RPM", "fanrpm", Some("RPM"), Codec::Number),
    sensor("uptime", "Uptime", "uptimeSeconds", None, Codec::Uptime),
    sensor("asic_model", "ASIC Model", "ASICModel", None, Codec::Text),
    // Numeric settings
    number("stratum_port", "Stratum Port", "stratumPort", None, (1, 65535, 1)),
    number(
        "fallback_stratum_port",
        "Fallback Stratum Port",
        "fallbackStratumPort",
        None,
        (1, 65535, 1),
    ),
    number("fan_speed_setting", "Fan Speed Setting", "fanspeed", Some("%"), (0, 100, 1)),
    number("temp_target", "Target Temperature", "temptarget", Some("°C"), (30, 90, 1)),
    number("display_timeout", "Display Timeout", "displayTimeout", Some("s"), (-1, 3600, 1)),
    number("stats_frequency", "Stats Logging Interval", "statsFrequency", Some("s"), (1, 3600, 1)),
    // Option settings
    select(
        "frequency",
        "ASIC Frequency",
        "frequency",
        Some("MHz"),
        DomainSpec::Asic {
            capability: Capability::Frequency,
        },
        Codec::Choice,
    ),
    select(
        "core_voltage",
        "Core Voltage",
        "coreVoltage",
        Some("mV"),
        DomainSpec::Asic {
            capability: Capability::CoreVoltage,
        },
        Codec::Choice,
    ),
    select(
        "display_rotation",
        "Display Rotation",
        "rotation",
        Some("°"),
        DomainSpec::Options { options: ROTATIONS },
        Codec::Choice,
    ),
    select(
        "display_sleep",
        "Display Sleep",
        "displayTimeout",
        None,
        DomainSpec::Labels {
            labels: DISPLAY_SLEEP_LABELS,
        },
        Codec::Label,
    ),
    // Switches
    switch("use_fallback_stratum", "Use Fallback Stratum", "useFallbackStratum"),
    switch("overclock_enabled", "Overclock Enabled", "overclockEnabled"),
    switch("auto_fan_speed", "Auto Fan Speed", "autofanspeed"),
    switch("invert_screen", "Invert Display", "invertscreen"),
    switch("overheat_mode", "Overheat Mode", "overheat_mode"),
    // Free text
    text("stratum_url", "Stratum URL", "stratumURL"),
    text("stratum_user", "Stratum User", "stratumUser"),
    text("fallback_stratum_url", "Fallback Stratum URL", "fallbackStratumURL"),
    text("fallback_stratum_user", "Fallback Stratum User", "fallbackStratumUser"),
    text("hostname", "Hostname", "hostname"),
];

pub const COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        key: "restart",
        name: "Restart",
        endpoint: endpoints::RESTART,
    },
    CommandDescriptor {
        key: "identify",
        name: "Identify",
        endpoint: endpoints::IDENTIFY,
    },
];
