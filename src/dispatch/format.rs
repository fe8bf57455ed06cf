use serde_json::Value;

use crate::error::BoxError;

/// Parses persisted configuration into a structured object and back.
pub trait ConfigFormat: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Value, BoxError>;

    fn serialize(&self, object: &Value) -> Result<Vec<u8>, BoxError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl JsonFormat {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ConfigFormat for JsonFormat {
    fn parse(&self, bytes: &[u8]) -> Result<Value, BoxError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn serialize(&self, object: &Value) -> Result<Vec<u8>, BoxError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(object)?
        } else {
            serde_json::to_vec(object)?
        };
        Ok(bytes)
    }
}
