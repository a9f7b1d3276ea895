//! Explicit per-route parameter binding.
//!
//! Each route that reads inputs outside the request body declares a static
//! table of [`FieldSpec`] entries naming where every handler input comes from
//! (path segment, query string, or header). [`bind`] evaluates a table
//! against the request pieces and produces typed [`BoundParams`]. Fields have
//! exactly one declared source; there is no cross-source fallback.

use std::collections::HashMap;

use axum::http::HeaderMap;
use platform_api::ApiError;
use thiserror::Error;

/// Where a bound field is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Route,
    Query,
    Header,
}

impl Source {
    fn label(self) -> &'static str {
        match self {
            Source::Route => "path segment",
            Source::Query => "query parameter",
            Source::Header => "header",
        }
    }
}

/// How a bound field's raw text is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parse {
    Text,
    Integer,
}

/// One handler input and the request source it binds from.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub field: &'static str,
    pub source: Source,
    pub key: &'static str,
    pub required: bool,
    pub parse: Parse,
}

#[derive(Clone, Debug, PartialEq)]
enum Value {
    Text(String),
    Integer(i64),
}

/// Typed values produced by evaluating a binding table.
#[derive(Debug, Default)]
pub struct BoundParams {
    values: HashMap<&'static str, Value>,
}

impl BoundParams {
    /// Bound text, or the empty string for optional fields that were absent.
    pub fn text(&self, field: &str) -> &str {
        match self.values.get(field) {
            Some(Value::Text(text)) => text,
            _ => "",
        }
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.values.get(field) {
            Some(Value::Integer(value)) => Some(*value),
            _ => None,
        }
    }
}

// The `r#source` fields are spelled as raw identifiers so thiserror does not
// treat them as the error-source chain; `Source` is request provenance, not an
// underlying error.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("missing required {} `{key}`", .source.label())]
    Missing { r#source: Source, key: &'static str },
    #[error("{} `{key}` is not a valid integer: `{value}`", .source.label())]
    NotAnInteger {
        r#source: Source,
        key: &'static str,
        value: String,
    },
}

impl From<BindError> for ApiError {
    fn from(err: BindError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

/// Evaluate a binding table against the request pieces.
///
/// A required field that is absent fails the whole bind, as does any present
/// integer field that does not parse. Optional text fields default to the
/// empty string; optional integer fields stay unbound. Header values that are
/// not valid UTF-8 are treated as absent.
pub fn bind(
    specs: &[FieldSpec],
    path: &HashMap<String, String>,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<BoundParams, BindError> {
    let mut bound = BoundParams::default();
    for spec in specs {
        let raw = match spec.source {
            Source::Route => path.get(spec.key).map(String::as_str),
            Source::Query => query.get(spec.key).map(String::as_str),
            Source::Header => headers.get(spec.key).and_then(|value| value.to_str().ok()),
        };
        let value = match (raw, spec.parse) {
            (Some(raw), Parse::Integer) => {
                let parsed = raw.trim().parse::<i64>().map_err(|_| BindError::NotAnInteger {
                    source: spec.source,
                    key: spec.key,
                    value: raw.to_string(),
                })?;
                Some(Value::Integer(parsed))
            }
            (Some(raw), Parse::Text) => Some(Value::Text(raw.to_string())),
            (None, _) if spec.required => {
                return Err(BindError::Missing {
                    source: spec.source,
                    key: spec.key,
                });
            }
            (None, Parse::Text) => Some(Value::Text(String::new())),
            (None, Parse::Integer) => None,
        };
        if let Some(value) = value {
            bound.values.insert(spec.field, value);
        }
    }
    Ok(bound)
}
