//! Settings form plumbing: the panel state and the field registry that
//! maps form-control names onto typed `WheelConfig` fields.
//!
//! Edits are coerced by control kind, never range-checked — an inverted
//! min/max pair or an out-of-range value is the engine's to repair or
//! reject at save time.

use thiserror::Error;

use wheel_proto::config::WheelConfig;

/// What kind of form control a field is edited through, which in turn
/// decides how its raw string value is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Checkbox; yields a boolean.
    Toggle,
    /// Slider with integer steps.
    IntRange,
    /// Slider with fractional steps.
    FloatRange,
    /// Free-form numeric input; yields a float.
    Number,
    /// Anything else passes through as the raw string.
    Text,
}

/// Every editable field, by its wire/form name.  Unknown names are
/// rejected rather than dynamically assigned.
pub const FIELDS: &[(&str, FieldKind)] = &[
    ("audioDevice", FieldKind::Text),
    ("music", FieldKind::Toggle),
    ("reverseChance", FieldKind::FloatRange),
    ("speedReduceMax", FieldKind::Number),
    ("speedReduceMin", FieldKind::Number),
    ("speedSlowLimit", FieldKind::Number),
    ("speedSlowReduceMax", FieldKind::Number),
    ("speedSlowReduceMin", FieldKind::Number),
    ("speedStartMax", FieldKind::Number),
    ("speedStartMin", FieldKind::Number),
    ("speedStopMax", FieldKind::Number),
    ("speedStopMin", FieldKind::Number),
    ("startFullscreen", FieldKind::Toggle),
    ("volume", FieldKind::IntRange),
];

pub fn field_kind(name: &str) -> Option<FieldKind> {
    FIELDS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, kind)| *kind)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("unknown settings field '{0}'")]
    UnknownField(String),
    #[error("invalid value '{value}' for settings field '{field}'")]
    BadValue { field: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Toggle(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    fn coerce(kind: FieldKind, name: &str, raw: &str) -> Result<Self, SettingsError> {
        let bad = || SettingsError::BadValue {
            field: name.to_string(),
            value: raw.to_string(),
        };
        Ok(match kind {
            FieldKind::Toggle => Self::Toggle(raw.parse::<bool>().map_err(|_| bad())?),
            FieldKind::IntRange => Self::Int(raw.parse::<i64>().map_err(|_| bad())?),
            FieldKind::FloatRange | FieldKind::Number => {
                Self::Float(raw.parse::<f64>().map_err(|_| bad())?)
            }
            FieldKind::Text => Self::Text(raw.to_string()),
        })
    }
}

/// Coerce `raw` per the field's registered kind and write it into exactly
/// one `config` field.  The config is untouched on any error.
pub fn apply_field(config: &mut WheelConfig, name: &str, raw: &str) -> Result<(), SettingsError> {
    let kind = field_kind(name).ok_or_else(|| SettingsError::UnknownField(name.to_string()))?;
    let value = FieldValue::coerce(kind, name, raw)?;
    match (name, value) {
        ("audioDevice", FieldValue::Text(v)) => config.audio_device = v,
        ("music", FieldValue::Toggle(v)) => config.music = v,
        ("reverseChance", FieldValue::Float(v)) => config.reverse_chance = v,
        ("speedReduceMax", FieldValue::Float(v)) => config.speed_reduce_max = v,
        ("speedReduceMin", FieldValue::Float(v)) => config.speed_reduce_min = v,
        ("speedSlowLimit", FieldValue::Float(v)) => config.speed_slow_limit = v,
        ("speedSlowReduceMax", FieldValue::Float(v)) => config.speed_slow_reduce_max = v,
        ("speedSlowReduceMin", FieldValue::Float(v)) => config.speed_slow_reduce_min = v,
        ("speedStartMax", FieldValue::Float(v)) => config.speed_start_max = v,
        ("speedStartMin", FieldValue::Float(v)) => config.speed_start_min = v,
        ("speedStopMax", FieldValue::Float(v)) => config.speed_stop_max = v,
        ("speedStopMin", FieldValue::Float(v)) => config.speed_stop_min = v,
        ("startFullscreen", FieldValue::Toggle(v)) => config.start_fullscreen = v,
        ("volume", FieldValue::Int(v)) => {
            config.volume = u32::try_from(v).map_err(|_| SettingsError::BadValue {
                field: name.to_string(),
                value: raw.to_string(),
            })?
        }
        _ => return Err(SettingsError::UnknownField(name.to_string())),
    }
    Ok(())
}

/// Settings panel state.  `draft` holds in-progress edits; the session's
/// baseline config is only replaced from it on a successful save.
#[derive(Debug, Clone, Default)]
pub struct SettingsPanel {
    pub active: bool,
    /// True while the open-panel fetches are in flight.
    pub loading: bool,
    pub draft: WheelConfig,
}
