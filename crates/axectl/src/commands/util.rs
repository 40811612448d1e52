//! Shared views and helpers for command handlers.

use serde::Serialize;
use tabled::Tabled;

use axectl_core::{Access, DisplayValue, Platform, Reading, ValueDomain};

use crate::output;

// ── Reading view ────────────────────────────────────────────────────

/// Flattened reading for structured output.
#[derive(Debug, Serialize)]
pub struct ReadingView {
    pub key: &'static str,
    pub name: &'static str,
    pub kind: Platform,
    pub access: Access,
    pub unit: Option<&'static str>,
    pub value: Option<DisplayValue>,
    pub values: ValueDomain,
}

impl From<&Reading> for ReadingView {
    fn from(r: &Reading) -> Self {
        Self {
            key: r.descriptor.key,
            name: r.descriptor.name,
            kind: r.descriptor.platform,
            access: r.descriptor.access,
            unit: r.descriptor.unit,
            value: r.value.clone(),
            values: r.domain.clone(),
        }
    }
}

impl ReadingView {
    pub fn display(&self, color: bool) -> String {
        output::format_value(self.value.as_ref(), self.unit, color)
    }

    /// `key=value` with no unit, for scripting.
    pub fn plain(&self) -> String {
        format!(
            "{}={}",
            self.key,
            self.value.as_ref().map(ToString::to_string).unwrap_or_default()
        )
    }
}

#[derive(Tabled)]
pub struct ReadingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Access")]
    access: String,
}

impl ReadingRow {
    pub fn new(view: &ReadingView, color: bool) -> Self {
        Self {
            key: view.key.into(),
            name: view.name.into(),
            value: view.display(color),
            access: match view.access {
                Access::ReadOnly => "ro".into(),
                Access::ReadWrite => "rw".into(),
            },
        }
    }
}

/// Multi-line detail block for a single reading.
pub fn reading_detail(view: &ReadingView, color: bool) -> String {
    [
        format!("Key:    {}", view.key),
        format!("Name:   {}", view.name),
        format!("Value:  {}", view.display(color)),
        format!("Kind:   {}", view.kind),
        format!("Access: {}", view.access),
        format!("Values: {}", describe_domain(&view.values)),
    ]
    .join("\n")
}

// ── Domains ─────────────────────────────────────────────────────────

/// One-line summary of a value domain.
pub fn describe_domain(domain: &ValueDomain) -> String {
    match domain {
        ValueDomain::Options { options } => options.join(" | "),
        ValueDomain::Range { min, max, step } if *step > 1 => {
            format!("{min}..={max} (step {step})")
        }
        ValueDomain::Range { min, max, .. } => format!("{min}..={max}"),
        ValueDomain::FreeForm => "any".into(),
    }
}

/// One legal value per line, or the range bounds.
pub fn domain_lines(domain: &ValueDomain) -> Vec<String> {
    match domain {
        ValueDomain::Options { options } => options.clone(),
        other => vec![describe_domain(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_summaries() {
        let options = ValueDomain::Options {
            options: vec!["0".into(), "90".into()],
        };
        assert_eq!(describe_domain(&options), "0 | 90");
        assert_eq!(
            describe_domain(&ValueDomain::Range {
                min: -1,
                max: 3600,
                step: 1
            }),
            "-1..=3600"
        );
        assert_eq!(domain_lines(&ValueDomain::FreeForm), vec!["any".to_owned()]);
    }
}
