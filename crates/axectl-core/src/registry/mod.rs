// ── Control-point registry ──
//
// Static catalog of the settings and metrics a device exposes. Each
// descriptor maps a logical key to a device API key, a value domain,
// and a codec that converts raw device values to display form and back.
// Model-dependent domains are resolved against the latest snapshot on
// every call, never cached.

mod catalog;

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::asic::{self, Capability};
use crate::convert::{as_integer, format_difficulty, format_uptime_value, raw_to_string};
use crate::error::RegistryError;
use crate::store::DeviceSnapshot;

pub use catalog::{COMMANDS, CONTROL_POINTS, DISPLAY_SLEEP_LABELS};

// ── Descriptor types ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Presentation family, mirroring how a UI would render the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Sensor,
    Number,
    Select,
    Switch,
    Text,
}

/// Static description of a descriptor's legal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainSpec {
    FreeForm,
    /// Fixed option strings.
    Options { options: &'static [&'static str] },
    /// Human labels over signed integer raw values.
    Labels {
        labels: &'static [(&'static str, i64)],
    },
    /// Inclusive integer range with step.
    Range { min: i64, max: i64, step: i64 },
    /// On/off, written as 1/0.
    Toggle,
    /// Presets that depend on the reported ASIC model.
    Asic { capability: Capability },
}

/// Transform strategy used for both decode and encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Codec {
    /// Numeric telemetry, shown as reported.
    Number,
    /// Share difficulty, human-scaled.
    Difficulty,
    /// Seconds, decomposed into days/hours/minutes/seconds.
    Uptime,
    /// Integer setting.
    Integer,
    /// Integer-valued option, displayed as its string form.
    Choice,
    /// Label table lookup (see [`DomainSpec::Labels`]).
    Label,
    Toggle,
    Text,
}

/// One logical device setting or metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlPointDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub api_key: &'static str,
    pub platform: Platform,
    pub access: Access,
    pub unit: Option<&'static str>,
    pub domain: DomainSpec,
    pub codec: Codec,
}

/// A bodiless device command (button).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub endpoint: &'static str,
}

// ── Values ───────────────────────────────────────────────────────

/// Resolved domain of a control point for the current device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueDomain {
    Options { options: Vec<String> },
    Range { min: i64, max: i64, step: i64 },
    FreeForm,
}

/// What a reader observes for a control point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for DisplayValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DisplayValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for DisplayValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DisplayValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

// ── Descriptor behaviour ─────────────────────────────────────────

impl ControlPointDescriptor {
    pub fn is_writable(&self) -> bool {
        self.access == Access::ReadWrite
    }

    /// The domain for the device described by `snapshot`.
    ///
    /// Model-dependent domains read `ASICModel`; an absent snapshot or an
    /// unknown model resolves to the default model's presets.
    pub fn resolve_domain(&self, snapshot: Option<&DeviceSnapshot>) -> ValueDomain {
        match self.domain {
            DomainSpec::FreeForm => ValueDomain::FreeForm,
            DomainSpec::Options { options } => ValueDomain::Options {
                options: options.iter().map(ToString::to_string).collect(),
            },
            DomainSpec::Labels { labels } => ValueDomain::Options {
                options: labels.iter().map(|(label, _)| (*label).to_owned()).collect(),
            },
            DomainSpec::Range { min, max, step } => ValueDomain::Range { min, max, step },
            DomainSpec::Toggle => ValueDomain::Options {
                options: vec!["off".into(), "on".into()],
            },
            DomainSpec::Asic { capability } => ValueDomain::Options {
                options: asic::options(capability, snapshot.and_then(DeviceSnapshot::asic_model)),
            },
        }
    }

    /// Convert a raw, non-null device value into its display form.
    pub fn decode_raw(&self, raw: &Value) -> Result<DisplayValue, RegistryError> {
        let value = match self.codec {
            Codec::Number => match raw {
                Value::Number(n) => n
                    .as_i64()
                    .map(DisplayValue::Integer)
                    .or_else(|| n.as_f64().map(DisplayValue::Float))
                    .unwrap_or_else(|| DisplayValue::Text(n.to_string())),
                Value::Bool(b) => DisplayValue::Bool(*b),
                other => DisplayValue::Text(raw_to_string(other)),
            },
            Codec::Difficulty => DisplayValue::Text(format_difficulty(raw).unwrap_or_default()),
            Codec::Uptime => DisplayValue::Text(format_uptime_value(raw).unwrap_or_default()),
            Codec::Integer => match (as_integer(raw), raw.as_f64()) {
                (Some(v), _) => DisplayValue::Integer(v),
                (None, Some(f)) => DisplayValue::Float(f),
                (None, None) => DisplayValue::Text(raw_to_string(raw)),
            },
            Codec::Choice | Codec::Text => DisplayValue::Text(raw_to_string(raw)),
            Codec::Label => {
                let label = as_integer(raw).and_then(|v| {
                    self.labels()
                        .iter()
                        .find(|(_, raw_value)| *raw_value == v)
                        .map(|(label, _)| *label)
                });
                match label {
                    Some(label) => DisplayValue::Text(label.to_owned()),
                    None => {
                        return Err(RegistryError::UnknownRawValue {
                            key: self.key.to_owned(),
                            raw: raw.clone(),
                        });
                    }
                }
            }
            Codec::Toggle => DisplayValue::Bool(truthy(raw)),
        };
        Ok(value)
    }

    /// Read this control point out of a snapshot.
    pub fn decode(&self, snapshot: &DeviceSnapshot) -> Result<DisplayValue, RegistryError> {
        let raw = snapshot
            .get(self.api_key)
            .ok_or_else(|| RegistryError::MissingValue {
                key: self.key.to_owned(),
            })?;
        self.decode_raw(raw)
    }

    /// Convert user input into the raw value to send, checking `domain`.
    pub fn encode(
        &self,
        input: &DisplayValue,
        domain: &ValueDomain,
    ) -> Result<Value, RegistryError> {
        if !self.is_writable() {
            return Err(RegistryError::ReadOnlyKey {
                key: self.key.to_owned(),
            });
        }

        match self.codec {
            Codec::Integer | Codec::Choice => {
                let value = input_integer(input)
                    .ok_or_else(|| self.out_of_domain(input, "expected a whole number"))?;
                check_integer(domain, value).map_err(|reason| self.out_of_domain(input, &reason))?;
                Ok(Value::from(value))
            }
            Codec::Label => {
                let wanted = input.to_string();
                self.labels()
                    .iter()
                    .find(|(label, _)| *label == wanted)
                    .map(|(_, raw)| Value::from(*raw))
                    .ok_or_else(|| self.out_of_domain(input, &describe_options(domain)))
            }
            Codec::Toggle => input_bool(input)
                .map(|on| Value::from(i64::from(on)))
                .ok_or_else(|| self.out_of_domain(input, "expected on/off")),
            Codec::Text => Ok(Value::String(input.to_string())),
            Codec::Number | Codec::Difficulty | Codec::Uptime => {
                Err(self.out_of_domain(input, "value cannot be written"))
            }
        }
    }

    fn labels(&self) -> &'static [(&'static str, i64)] {
        match self.domain {
            DomainSpec::Labels { labels } => labels,
            _ => &[],
        }
    }

    fn out_of_domain(&self, input: &DisplayValue, reason: &str) -> RegistryError {
        RegistryError::OutOfDomain {
            key: self.key.to_owned(),
            value: input.to_string(),
            reason: reason.to_owned(),
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────

/// Lookup table over the static catalog.
///
/// Owns no mutable state; descriptors live for the whole process.
#[derive(Debug, Clone)]
pub struct Registry {
    points: IndexMap<&'static str, &'static ControlPointDescriptor>,
    commands: IndexMap<&'static str, &'static CommandDescriptor>,
}

impl Registry {
    /// Registry over the built-in device catalog.
    pub fn new() -> Self {
        Self::from_catalog(CONTROL_POINTS, COMMANDS)
    }

    /// Registry over a custom catalog. Later duplicates of a key are ignored.
    pub fn from_catalog(
        points: &'static [ControlPointDescriptor],
        commands: &'static [CommandDescriptor],
    ) -> Self {
        let mut by_key = IndexMap::with_capacity(points.len());
        for point in points {
            by_key.entry(point.key).or_insert(point);
        }

        let mut command_by_key = IndexMap::with_capacity(commands.len());
        for command in commands {
            command_by_key.entry(command.key).or_insert(command);
        }

        Self {
            points: by_key,
            commands: command_by_key,
        }
    }

    /// All control points in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &'static ControlPointDescriptor> + '_ {
        self.points.values().copied()
    }

    /// All commands in catalog order.
    pub fn commands(&self) -> impl Iterator<Item = &'static CommandDescriptor> + '_ {
        self.commands.values().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn describe(&self, key: &str) -> Result<&'static ControlPointDescriptor, RegistryError> {
        self.points
            .get(key)
            .copied()
            .ok_or_else(|| RegistryError::UnknownKey { key: key.to_owned() })
    }

    pub fn command(&self, key: &str) -> Result<&'static CommandDescriptor, RegistryError> {
        self.commands
            .get(key)
            .copied()
            .ok_or_else(|| RegistryError::UnknownKey { key: key.to_owned() })
    }

    pub fn resolve_domain(
        &self,
        key: &str,
        snapshot: Option<&DeviceSnapshot>,
    ) -> Result<ValueDomain, RegistryError> {
        Ok(self.describe(key)?.resolve_domain(snapshot))
    }

    /// Read a control point from a snapshot.
    ///
    /// `MissingValue` means the value is currently unknown, not that
    /// anything went wrong.
    pub fn decode(
        &self,
        key: &str,
        snapshot: &DeviceSnapshot,
    ) -> Result<DisplayValue, RegistryError> {
        self.describe(key)?.decode(snapshot)
    }

    /// Serialize `input` for the device, validating it against the domain
    /// resolved from `snapshot`.
    pub fn encode(
        &self,
        key: &str,
        input: &DisplayValue,
        snapshot: Option<&DeviceSnapshot>,
    ) -> Result<Value, RegistryError> {
        let descriptor = self.describe(key)?;
        let domain = descriptor.resolve_domain(snapshot);
        descriptor.encode(input, &domain)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn check_integer(domain: &ValueDomain, value: i64) -> Result<(), String> {
    match domain {
        ValueDomain::Range { min, max, step } => {
            if value < *min || value > *max {
                Err(format!("must be between {min} and {max}"))
            } else if *step > 1 && (value - min) % step != 0 {
                Err(format!("must be {min} plus a multiple of {step}"))
            } else {
                Ok(())
            }
        }
        ValueDomain::Options { options } => {
            let rendered = value.to_string();
            if options.iter().any(|o| *o == rendered) {
                Ok(())
            } else {
                Err(describe_options(domain))
            }
        }
        ValueDomain::FreeForm => Ok(()),
    }
}

fn describe_options(domain: &ValueDomain) -> String {
    match domain {
        ValueDomain::Options { options } => format!("expected one of: {}", options.join(", ")),
        ValueDomain::Range { min, max, .. } => format!("expected {min}..={max}"),
        ValueDomain::FreeForm => "expected text".to_owned(),
    }
}

fn input_integer(input: &DisplayValue) -> Option<i64> {
    match input {
        DisplayValue::Integer(v) => Some(*v),
        DisplayValue::Float(f) => as_integer(&Value::from(*f)),
        DisplayValue::Text(s) => as_integer(&Value::String(s.clone())),
        DisplayValue::Bool(_) => None,
    }
}

fn input_bool(input: &DisplayValue) -> Option<bool> {
    match input {
        DisplayValue::Bool(b) => Some(*b),
        DisplayValue::Integer(0) => Some(false),
        DisplayValue::Integer(1) => Some(true),
        DisplayValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "on" | "true" | "1" | "yes" => Some(true),
            "off" | "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.trim(), "" | "0" | "false" | "off"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    use super::*;

    fn snapshot(value: Value) -> DeviceSnapshot {
        let Value::Object(map) = value else {
            panic!("fixture must be an object");
        };
        DeviceSnapshot::new(map, 1)
    }

    /// Simulate a device that echoes a written raw value back unchanged.
    fn apply_write(snapshot: &DeviceSnapshot, api_key: &str, raw: Value) -> DeviceSnapshot {
        let mut values: Map<String, Value> = snapshot.values().clone();
        values.insert(api_key.to_owned(), raw);
        DeviceSnapshot::new(values, snapshot.version() + 1)
    }

    fn sample_input(descriptor: &ControlPointDescriptor, domain: &ValueDomain) -> DisplayValue {
        match (descriptor.codec, domain) {
            (Codec::Integer, ValueDomain::Range { min, step, .. }) => {
                DisplayValue::Integer(min + step)
            }
            (Codec::Toggle, _) => DisplayValue::Bool(true),
            (Codec::Text, _) => DisplayValue::from("stratum+tcp://pool.example:3333"),
            (_, ValueDomain::Options { options }) => {
                DisplayValue::Text(options.last().cloned().unwrap_or_default())
            }
            other => panic!("no sample for {}: {other:?}", descriptor.key),
        }
    }

    #[test]
    fn keys_are_unique() {
        let registry = Registry::new();
        assert_eq!(registry.len(), CONTROL_POINTS.len());
        assert_eq!(registry.commands().count(), COMMANDS.len());
    }

    #[test]
    fn describe_unknown_key() {
        let registry = Registry::new();
        assert_eq!(
            registry.describe("warp_drive"),
            Err(RegistryError::UnknownKey {
                key: "warp_drive".into()
            })
        );
    }

    #[test]
    fn label_codecs_have_label_domains() {
        for point in CONTROL_POINTS {
            if point.codec == Codec::Label {
                assert!(
                    matches!(point.domain, DomainSpec::Labels { .. }),
                    "{} decodes labels without a label table",
                    point.key
                );
            }
            if point.platform == Platform::Sensor {
                assert_eq!(point.access, Access::ReadOnly, "{} sensor is writable", point.key);
            }
        }
    }

    #[test]
    fn writable_points_round_trip_through_an_echoing_device() {
        let registry = Registry::new();
        let base = snapshot(json!({ "ASICModel": "BM1368" }));

        for point in registry.iter().filter(|p| p.is_writable()) {
            let domain = point.resolve_domain(Some(&base));
            let input = sample_input(point, &domain);
            let raw = registry
                .encode(point.key, &input, Some(&base))
                .unwrap_or_else(|e| panic!("{}: {e}", point.key));
            let echoed = apply_write(&base, point.api_key, raw);

            assert_eq!(
                registry.decode(point.key, &echoed),
                Ok(input),
                "round trip of {}",
                point.key
            );
        }
    }

    #[test]
    fn display_sleep_labels() {
        let registry = Registry::new();

        assert_eq!(
            registry.encode("display_sleep", &"Always on".into(), None),
            Ok(json!(-1))
        );
        assert_eq!(
            registry.encode("display_sleep", &"Always off".into(), None),
            Ok(json!(0))
        );
        assert_eq!(
            registry.decode("display_sleep", &snapshot(json!({ "displayTimeout": -1 }))),
            Ok(DisplayValue::from("Always on"))
        );
        assert_eq!(
            registry.decode("display_sleep", &snapshot(json!({ "displayTimeout": 999_999 }))),
            Err(RegistryError::UnknownRawValue {
                key: "display_sleep".into(),
                raw: json!(999_999),
            })
        );
        assert!(matches!(
            registry.encode("display_sleep", &"Sometimes".into(), None),
            Err(RegistryError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn model_dependent_domains() {
        let registry = Registry::new();
        let bm1366 = snapshot(json!({ "ASICModel": "BM1366" }));
        let unknown = snapshot(json!({ "ASICModel": "BM9999" }));
        let reference = snapshot(json!({ "ASICModel": asic::DEFAULT_MODEL }));

        let domain = registry.resolve_domain("frequency", Some(&bm1366)).unwrap();
        assert_eq!(
            domain,
            ValueDomain::Options {
                options: asic::options(Capability::Frequency, Some("BM1366"))
            }
        );

        for key in ["frequency", "core_voltage"] {
            let fallback = registry.resolve_domain(key, Some(&unknown)).unwrap();
            let expected = registry.resolve_domain(key, Some(&reference)).unwrap();
            assert_eq!(fallback, expected);
            assert_eq!(registry.resolve_domain(key, None).unwrap(), expected);
            assert!(matches!(fallback, ValueDomain::Options { ref options } if !options.is_empty()));
        }
    }

    #[test]
    fn frequency_encode_checks_model_presets() {
        let registry = Registry::new();
        let bm1366 = snapshot(json!({ "ASICModel": "BM1366" }));

        // 485 MHz is a BM1366 preset but not a BM1370 one.
        assert_eq!(
            registry.encode("frequency", &"485".into(), Some(&bm1366)),
            Ok(json!(485))
        );
        assert!(matches!(
            registry.encode("frequency", &"485".into(), None),
            Err(RegistryError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn range_encode_checks_bounds_and_type() {
        let registry = Registry::new();

        assert_eq!(
            registry.encode("fan_speed_setting", &DisplayValue::Integer(75), None),
            Ok(json!(75))
        );
        assert_eq!(
            registry.encode("fan_speed_setting", &"40".into(), None),
            Ok(json!(40))
        );
        assert_eq!(
            registry.encode("display_timeout", &DisplayValue::Integer(-1), None),
            Ok(json!(-1))
        );
        for bad in [
            DisplayValue::Integer(101),
            DisplayValue::Float(50.5),
            DisplayValue::from("fast"),
            DisplayValue::Bool(true),
        ] {
            assert!(
                matches!(
                    registry.encode("fan_speed_setting", &bad, None),
                    Err(RegistryError::OutOfDomain { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn toggle_encoding() {
        let registry = Registry::new();

        assert_eq!(registry.encode("overclock_enabled", &"on".into(), None), Ok(json!(1)));
        assert_eq!(registry.encode("overclock_enabled", &false.into(), None), Ok(json!(0)));
        assert_eq!(
            registry.decode("invert_screen", &snapshot(json!({ "invertscreen": 0 }))),
            Ok(DisplayValue::Bool(false))
        );
        assert_eq!(
            registry.decode("invert_screen", &snapshot(json!({ "invertscreen": true }))),
            Ok(DisplayValue::Bool(true))
        );
    }

    #[test]
    fn read_only_points_reject_encode() {
        let registry = Registry::new();
        assert_eq!(
            registry.encode("hash_rate", &DisplayValue::Float(1.0), None),
            Err(RegistryError::ReadOnlyKey {
                key: "hash_rate".into()
            })
        );
    }

    #[test]
    fn missing_and_null_values() {
        let registry = Registry::new();
        let snap = snapshot(json!({ "temp": null }));

        assert_eq!(
            registry.decode("temp", &snap),
            Err(RegistryError::MissingValue { key: "temp".into() })
        );
        assert!(registry.decode("power", &snap).unwrap_err().is_missing());
    }

    #[test]
    fn sensor_transforms() {
        let registry = Registry::new();
        let snap = snapshot(json!({
            "bestDiff": 2_500_000_000_u64,
            "bestSessionDiff": "12.3M",
            "uptimeSeconds": 90_061,
            "power": 14.2,
            "sharesAccepted": 1024,
            "frequency": 525.0
        }));

        assert_eq!(registry.decode("best_diff", &snap), Ok("2.50 G".into()));
        assert_eq!(registry.decode("best_session_diff", &snap), Ok("12.3M".into()));
        assert_eq!(registry.decode("uptime", &snap), Ok("1d 1h 1m 1s".into()));
        assert_eq!(registry.decode("power", &snap), Ok(DisplayValue::Float(14.2)));
        assert_eq!(registry.decode("shares_accepted", &snap), Ok(DisplayValue::Integer(1024)));
        assert_eq!(registry.decode("frequency", &snap), Ok("525".into()));
    }
}
