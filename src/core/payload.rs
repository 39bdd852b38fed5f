//! core::payload
//!
//! Nested request bodies and the pure merge operations used to assemble them.
//!
//! # Design
//!
//! A [`Payload`] is a JSON object tree. Values are `serde_json::Value`, which
//! already is the closed `String | Number | Bool | List | Map` variant the
//! request bodies need (plus `Null`, used to clear fields on update).
//!
//! # Merge precedence
//!
//! [`deep_merge`] combines two trees without mutating either:
//! - object vs object at the same key: merged recursively
//! - any other collision: the overlay value wins
//! - keys present on only one side are kept
//!
//! [`fill_missing`] is the inverse policy: the base wins every collision and
//! the filler only contributes keys the base does not have.
//!
//! # Example
//!
//! ```
//! use morpheus_cli::core::payload::{parse_options, Payload};
//!
//! let file = Payload::new().with("network.name", "from-file").with("network.mtu", 1500);
//! let overrides = parse_options(&["network.name=override".to_string()]).unwrap();
//!
//! let merged = file.merged(&overrides);
//! assert_eq!(merged.get("network.name").unwrap(), "override");
//! assert_eq!(merged.get("network.mtu").unwrap(), 1500);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from building payloads out of user input.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid option '{0}', expected KEY=VALUE")]
    InvalidOption(String),

    #[error("failed to read payload file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse payload file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("payload must be an object, found {0}")]
    NotAnObject(&'static str),
}

/// A nested request body (or a fragment of one).
///
/// Keys are unique; insertion order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(PayloadError::NotAnObject(kind_name(&other))),
        }
    }

    /// Builder form of [`Payload::set`].
    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.set(path, value.into());
        self
    }

    /// Set the value at a dot-separated path, creating intermediate objects.
    ///
    /// A non-object value sitting on the path is replaced by an object.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just made an object"),
            };
        }
        current.insert(last.to_string(), value);
    }

    /// Get the value at a dot-separated path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether a path holds a value (an explicit `null` counts as present).
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Return `self` deep-merged with `overlay`; the overlay wins collisions.
    pub fn merged(&self, overlay: &Payload) -> Payload {
        Payload(merge_maps(&self.0, &overlay.0))
    }

    /// Return `self` with keys from `filler` added only where `self` has none.
    pub fn filled_from(&self, filler: &Payload) -> Payload {
        match fill_missing(&Value::Object(self.0.clone()), &Value::Object(filler.0.clone())) {
            Value::Object(map) => Payload(map),
            _ => unreachable!("filling an object yields an object"),
        }
    }

    /// Return a copy with every empty nested object removed.
    ///
    /// `null` values survive: they are how an update clears a field.
    pub fn pruned(&self) -> Payload {
        match prune_empty(&Value::Object(self.0.clone())) {
            Some(Value::Object(map)) => Payload(map),
            _ => Payload::new(),
        }
    }

    /// Place top-level keys under `root_key`, except `root_key` itself and
    /// the listed root-level fields which stay at the top.
    ///
    /// Values already nested under `root_key` win over moved loose keys.
    pub fn placed(&self, root_key: &str, root_level: &[&str]) -> Payload {
        let mut kept = Map::new();
        let mut moved = Map::new();
        for (key, value) in &self.0 {
            if key == root_key || root_level.contains(&key.as_str()) {
                kept.insert(key.clone(), value.clone());
            } else {
                moved.insert(key.clone(), value.clone());
            }
        }

        let mut nested = Map::new();
        if !moved.is_empty() {
            nested.insert(root_key.to_string(), Value::Object(moved));
        }
        Payload(nested).merged(&Payload(kept))
    }

    /// Flatten scalar leaves into `(dot.path, value)` pairs.
    ///
    /// Arrays and nulls are skipped.
    pub fn leaves(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        collect_leaves(&self.0, "", &mut out);
        out
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Deep-merge two values; `overlay` wins on collisions that are not object/object.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => Value::Object(merge_maps(b, o)),
        (_, o) => o.clone(),
    }
}

fn merge_maps(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, value) in overlay {
        let merged = match out.get(key) {
            Some(existing) => deep_merge(existing, value),
            None => value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// Deep-merge where `base` wins every collision.
pub fn fill_missing(base: &Value, filler: &Value) -> Value {
    match (base, filler) {
        (Value::Object(b), Value::Object(f)) => {
            let mut out = b.clone();
            for (key, value) in f {
                let filled = match b.get(key) {
                    Some(existing) => fill_missing(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), filled);
            }
            Value::Object(out)
        }
        (b, _) => b.clone(),
    }
}

/// Remove empty objects recursively. Returns `None` when `value` itself
/// reduces to an empty object.
pub fn prune_empty(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .iter()
                .filter_map(|(k, v)| prune_empty(v).map(|v| (k.clone(), v)))
                .collect();
            if pruned.is_empty() {
                None
            } else {
                Some(Value::Object(pruned))
            }
        }
        other => Some(other.clone()),
    }
}

/// Look up a dot-separated path inside an arbitrary JSON value.
pub fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// Render a scalar JSON value the way a user would type it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse `-O key=value` pairs into a payload.
///
/// Keys are dot-paths. Values are strings, unless they look like a JSON
/// object or array and parse as one.
pub fn parse_options(pairs: &[String]) -> Result<Payload, PayloadError> {
    let mut payload = Payload::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| PayloadError::InvalidOption(pair.clone()))?;
        let key = key.trim();
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(PayloadError::InvalidOption(pair.clone()));
        }
        payload.set(key, parse_option_value(raw));
    }
    Ok(payload)
}

fn parse_option_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

/// Load a full payload override from a JSON or YAML file.
pub fn load_payload_file(path: &Path) -> Result<Payload, PayloadError> {
    let content = fs::read_to_string(path).map_err(|source| PayloadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    let value: Value = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| PayloadError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(json_err) => serde_yaml::from_str(&content).map_err(|_| PayloadError::ParseError {
                path: path.to_path_buf(),
                message: json_err.to_string(),
            })?,
        }
    };

    Payload::from_value(value)
}

fn collect_leaves(map: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => collect_leaves(inner, &path, out),
            Value::Array(_) | Value::Null => {}
            scalar => out.push((path, display_value(scalar))),
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
