use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const METRIC_CARD: &str = "metric_card";
pub const PROGRESS_BAR: &str = "progress_bar";
pub const ACTION_BUTTON: &str = "action_button";

/// Schema violation inside a single widget
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WidgetSchemaError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("status must be one of success, warning, error")]
    InvalidStatus,
}

/// A typed, renderable unit of data within a section. The data mapping is
/// specific to the type tag; unrecognized tags are carried opaquely so new
/// widget kinds do not break older engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Map<String, Value>,
    #[serde(rename = "gridWidth", default = "default_grid_width")]
    pub grid_width: u32,
}

fn default_grid_width() -> u32 {
    1
}

impl Widget {
    /// Field-check the data mapping for known type tags. Unknown tags
    /// always pass.
    pub fn validate(&self) -> Result<(), WidgetSchemaError> {
        match self.kind.as_str() {
            METRIC_CARD => {
                self.require_str("label")?;
                self.require_str("value")?;
                match self.data.get("status") {
                    Some(Value::String(s)) if matches!(s.as_str(), "success" | "warning" | "error") => {
                        Ok(())
                    }
                    Some(_) => Err(WidgetSchemaError::InvalidStatus),
                    None => Err(WidgetSchemaError::MissingField("status")),
                }
            }
            PROGRESS_BAR => {
                self.require_str("label")?;
                self.require_number("value")?;
                self.require_number("max")
            }
            ACTION_BUTTON => {
                self.require_str("label")?;
                self.require_str("command")?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The command offered by an action button, if this widget is one
    pub fn command(&self) -> Option<&str> {
        if self.kind != ACTION_BUTTON {
            return None;
        }
        self.data.get("command").and_then(|v| v.as_str())
    }

    fn require_str(&self, field: &'static str) -> Result<&str, WidgetSchemaError> {
        match self.data.get(field) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(WidgetSchemaError::WrongType {
                field,
                expected: "a string",
            }),
            None => Err(WidgetSchemaError::MissingField(field)),
        }
    }

    fn require_number(&self, field: &'static str) -> Result<(), WidgetSchemaError> {
        match self.data.get(field) {
            Some(Value::Number(_)) => Ok(()),
            Some(_) => Err(WidgetSchemaError::WrongType {
                field,
                expected: "a number",
            }),
            None => Err(WidgetSchemaError::MissingField(field)),
        }
    }
}
