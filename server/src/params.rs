//! Request field extraction.
//!
//! Bodies and query strings are read as loose JSON objects first, so that
//! every missing field can be reported at once, then each field is parsed
//! into its real type. A field is missing when it is absent, `null` or an
//! empty string. Numbers may arrive as JSON integers, integral floats or
//! decimal strings.

use serde_json::{Map, Value};

use microloan_protocol::service::ServiceError;
use microloan_protocol::types::{ObjectId, SuiAddress};

/// Parsed request fields.
#[derive(Debug)]
pub struct Params {
    fields: Map<String, Value>,
}

impl Params {
    /// Parses a JSON request body. An empty body has no fields; a body that
    /// is valid JSON but not an object has none either.
    pub fn from_body(body: &[u8]) -> Result<Self, ServiceError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::from_value(Value::Null));
        }
        serde_json::from_slice(body)
            .map(Self::from_value)
            .map_err(|e| ServiceError::InvalidParam(format!("invalid JSON body: {e}")))
    }

    pub fn from_query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self { fields: Map::new() },
        }
    }

    fn present(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        }
    }

    /// Fails with every absent field named, in the order given.
    pub fn require(&self, names: &[&'static str]) -> Result<(), ServiceError> {
        let missing: Vec<&'static str> = names
            .iter()
            .copied()
            .filter(|n| self.present(n).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::MissingFields(missing))
        }
    }

    fn get(&self, name: &'static str) -> Result<&Value, ServiceError> {
        self.present(name)
            .ok_or_else(|| ServiceError::MissingFields(vec![name]))
    }

    pub fn u64(&self, name: &'static str) -> Result<u64, ServiceError> {
        let value = self.get(name)?;
        let parsed = match value {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            ServiceError::InvalidParam(format!("{name} must be an unsigned integer, got {value}"))
        })
    }

    pub fn address(&self, name: &'static str) -> Result<SuiAddress, ServiceError> {
        self.string(name)?
            .parse()
            .map_err(|e| ServiceError::InvalidParam(format!("{name}: {e}")))
    }

    pub fn object_id(&self, name: &'static str) -> Result<ObjectId, ServiceError> {
        self.string(name)?
            .parse()
            .map_err(|e| ServiceError::InvalidParam(format!("{name}: {e}")))
    }

    fn string(&self, name: &'static str) -> Result<&str, ServiceError> {
        match self.get(name)? {
            Value::String(s) => Ok(s),
            other => Err(ServiceError::InvalidParam(format!(
                "{name} must be a string, got {other}"
            ))),
        }
    }
}
