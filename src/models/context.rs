//! Client context captured at `/sdk-init` time.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{AuthResponse, CommonInput, SdkInitInput};
use crate::error::{Error, Result};

/// Context merged into every outgoing request.
///
/// Holds the `/sdk-init` response overlaid with the init input, so the
/// caller's credentials win over anything the service echoed back.
#[derive(Debug, Clone, Default)]
pub struct SdkContext {
    data: Map<String, Value>,
}

impl SdkContext {
    /// Build the context from the init response and the init input.
    pub fn new(init_response: AuthResponse, input: &SdkInitInput) -> Result<Self> {
        let mut data = match init_response {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Value::Object(overlay) = serde_json::to_value(input)? {
            data.extend(overlay);
        }
        Ok(Self { data })
    }

    /// Raw context values.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Look up a single context value as a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Serialize `input` and fill the credential fields it left empty.
    pub fn apply<T: Serialize>(&self, input: &T) -> Result<Value> {
        let mut body = match serde_json::to_value(input)? {
            Value::Object(map) => map,
            other => {
                return Err(Error::Config(format!(
                    "request body must be a JSON object, got {other}"
                )));
            }
        };
        for field in CommonInput::FIELDS {
            let missing = match body.get(field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            };
            if missing {
                if let Some(value) = self.data.get(field) {
                    body.insert(field.to_string(), value.clone());
                }
            }
        }
        Ok(Value::Object(body))
    }
}
