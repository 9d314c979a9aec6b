//! Core data types for the ca-session layer
//!
//! All types use camelCase JSON serialization for wire compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A process-variable value
///
/// Covers the scalar and array shapes channel access carries. `Display`
/// gives the plain rendering used when no formatted value is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum PvValue {
    /// Double-precision scalar (DBR_DOUBLE)
    Double(f64),
    /// Integer scalar (DBR_LONG)
    Int(i64),
    /// Enumerated state index (DBR_ENUM)
    Enum(u16),
    /// String scalar (DBR_STRING)
    Str(String),
    /// Double waveform
    DoubleArray(Vec<f64>),
    /// Integer waveform
    IntArray(Vec<i64>),
}

impl std::fmt::Display for PvValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PvValue::Double(v) => write!(f, "{}", v),
            PvValue::Int(v) => write!(f, "{}", v),
            PvValue::Enum(v) => write!(f, "{}", v),
            PvValue::Str(v) => write!(f, "{}", v),
            PvValue::DoubleArray(vs) => {
                let parts: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            PvValue::IntArray(vs) => {
                let parts: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Control-variable metadata for a PV
///
/// Fetched via `get_ctrlvars` — needed to render enum states and
/// precision-formatted doubles as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlInfo {
    /// Engineering units (e.g., "mm", "mA")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,

    /// Display precision for floating-point rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,

    /// State strings for enum PVs, indexed by state number
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_strings: Vec<String>,

    /// Lower control limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_ctrl_limit: Option<f64>,

    /// Upper control limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_ctrl_limit: Option<f64>,
}

impl ControlInfo {
    /// Render a value as a string using this metadata
    ///
    /// Enum indices map through `enum_strings`, doubles honor `precision`,
    /// everything else falls back to the plain `Display` rendering.
    pub fn render(&self, value: &PvValue) -> String {
        match value {
            PvValue::Enum(i) => self
                .enum_strings
                .get(*i as usize)
                .cloned()
                .unwrap_or_else(|| i.to_string()),
            PvValue::Double(v) => match self.precision {
                Some(p) if p >= 0 => format!("{:.*}", p as usize, v),
                _ => v.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// A change notification delivered to a monitor callback
///
/// Fixed structured record passed by value — callbacks must not assume
/// exclusive access to any caller-owned state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Name of the PV that changed
    pub pv_name: String,

    /// The new value
    pub value: PvValue,

    /// String rendering of the value, when the transport supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_value: Option<String>,

    /// Wall-clock time the change was observed
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Create a notification stamped with the current time
    pub fn new(
        pv_name: impl Into<String>,
        value: PvValue,
        formatted_value: Option<String>,
    ) -> Self {
        Self {
            pv_name: pv_name.into(),
            value,
            formatted_value,
            timestamp: Utc::now(),
        }
    }

    /// The formatted value, falling back to the plain rendering
    pub fn rendered(&self) -> String {
        self.formatted_value
            .clone()
            .unwrap_or_else(|| self.value.to_string())
    }
}

/// Outcome of a put operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PutResult {
    /// Device-side processing finished (waited put)
    Completed,
    /// Write was issued without waiting for processing
    Initiated,
}
