// ── ASIC model capability tables ──
//
// Valid frequency (MHz) and core voltage (mV) presets differ per ASIC
// family. The device reports its family in the `ASICModel` field; models
// missing from these tables resolve to the reference model so a control
// is never offered with an empty option list.

/// Model used when the device reports nothing or an unknown family.
pub const DEFAULT_MODEL: &str = "BM1370";

/// Frequency presets in MHz, per ASIC model.
const FREQUENCY_BY_MODEL: &[(&str, &[u32])] = &[
    ("BM1366", &[400, 425, 450, 475, 485, 500, 525, 550, 575]),
    ("BM1368", &[400, 425, 450, 475, 490, 500, 525, 550, 575]),
    ("BM1370", &[400, 490, 525, 550, 600, 625]),
    ("BM1397", &[400, 425, 450, 475, 485, 500, 525, 550, 575, 600]),
];

/// Core voltage presets in mV, per ASIC model.
const VOLTAGE_BY_MODEL: &[(&str, &[u32])] = &[
    ("BM1366", &[1100, 1150, 1200, 1250, 1300]),
    ("BM1368", &[1100, 1150, 1166, 1200, 1250, 1300]),
    ("BM1370", &[1000, 1060, 1100, 1150, 1200, 1250]),
    ("BM1397", &[1100, 1150, 1200, 1250, 1300, 1350, 1400, 1450, 1500]),
];

/// Which preset table to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    Frequency,
    CoreVoltage,
}

/// `true` if the model has its own preset tables.
pub fn is_known_model(model: &str) -> bool {
    FREQUENCY_BY_MODEL.iter().any(|(m, _)| *m == model)
}

/// Preset values for `capability` on `model`, falling back to [`DEFAULT_MODEL`].
pub fn presets(capability: Capability, model: Option<&str>) -> &'static [u32] {
    let table = match capability {
        Capability::Frequency => FREQUENCY_BY_MODEL,
        Capability::CoreVoltage => VOLTAGE_BY_MODEL,
    };

    let lookup = |name: &str| {
        table
            .iter()
            .find(|(m, _)| *m == name)
            .map(|(_, values)| *values)
    };

    model
        .and_then(lookup)
        .or_else(|| lookup(DEFAULT_MODEL))
        .unwrap_or(&[])
}

/// Presets rendered as option strings, e.g. `["400", "490", ...]`.
pub fn options(capability: Capability, model: Option<&str>) -> Vec<String> {
    presets(capability, model)
        .iter()
        .map(ToString::to_string)
        .collect()
}
