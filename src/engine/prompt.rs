//! engine::prompt
//!
//! Interprets field descriptors into an answer map.
//!
//! # Walk
//!
//! Descriptors are visited strictly in display order. For each one:
//!
//! 1. already supplied (flags, `-O`): skipped, never re-asked
//! 2. gated by `dependsOn` on a checkbox that is false: set to `null` so an
//!    update clears it
//! 3. default: the descriptor's `defaultValue`, else the same field of the
//!    existing record (update and clone flows)
//! 4. select choices: static options, or `GET /api/options/{source}` with
//!    every non-password answer known so far (plus caller parameters) as query
//! 5. the answer is normalized by field type
//!
//! With prompting disabled the walk still runs: defaults are applied and a
//! required field with no value is a validation error.

use serde_json::{Number, Value};
use tracing::debug;

use super::assembler::Placement;
use super::outcome::EngineError;
use super::Session;
use crate::api::endpoints;
use crate::core::payload::{display_value, value_at, Payload};
use crate::core::types::{FieldDescriptor, FieldType, SelectOption};
use crate::ui::prompts::PromptIo;

/// Normalize a checkbox token. Case-insensitive; the empty string counts
/// as present and therefore true.
pub fn normalize_checkbox(token: &str) -> Option<bool> {
    match token.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" | "" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_number(token: &str) -> Option<Value> {
    let token = token.trim();
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::from(i));
    }
    token
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Coerce a value to the shape its field type expects.
pub fn normalize_value(descriptor: &FieldDescriptor, value: &Value) -> Result<Value, EngineError> {
    let invalid = |expected: &str| {
        EngineError::Validation(format!(
            "invalid value '{}' for {}, expected {}",
            display_value(value),
            descriptor.display_label(),
            expected
        ))
    };
    match (descriptor.field_type, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldType::Checkbox, Value::Bool(_)) => Ok(value.clone()),
        (FieldType::Checkbox, Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err(invalid("on/off")),
        },
        (FieldType::Checkbox, Value::String(s)) => normalize_checkbox(s)
            .map(Value::Bool)
            .ok_or_else(|| invalid("on/off")),
        (FieldType::Number, Value::Number(_)) => Ok(value.clone()),
        (FieldType::Number, Value::String(s)) if s.trim().is_empty() => Ok(Value::Null),
        (FieldType::Number, Value::String(s)) => parse_number(s).ok_or_else(|| invalid("a number")),
        _ => Ok(value.clone()),
    }
}

/// Normalize every supplied value that has a descriptor.
pub fn normalize_supplied(
    descriptors: &[FieldDescriptor],
    placement: Placement<'_>,
    supplied: &Payload,
) -> Result<Payload, EngineError> {
    let mut out = supplied.clone();
    for descriptor in descriptors {
        let path = placement.path(descriptor);
        if let Some(value) = supplied.get(&path) {
            out.set(&path, normalize_value(descriptor, value)?);
        }
    }
    Ok(out)
}

/// Inputs to one prompt walk.
pub struct PromptRequest<'r> {
    pub descriptors: &'r [FieldDescriptor],
    pub placement: Placement<'r>,
    /// Values already supplied; their paths are never prompted.
    pub supplied: &'r Payload,
    /// Record whose fields become displayed defaults.
    pub record: Option<&'r Value>,
    /// Extra option-source parameters (e.g. the parent router id).
    pub option_params: endpoints::Params,
}

/// Walks descriptors against a [`PromptIo`].
pub struct PromptEngine<'a> {
    session: &'a Session,
    io: &'a mut dyn PromptIo,
    no_prompt: bool,
}

impl<'a> PromptEngine<'a> {
    pub fn new(session: &'a Session, io: &'a mut dyn PromptIo, no_prompt: bool) -> Self {
        Self {
            session,
            io,
            no_prompt,
        }
    }

    /// Produce the answer map for `request`.
    pub async fn prompt(&mut self, request: PromptRequest<'_>) -> Result<Payload, EngineError> {
        let mut ordered: Vec<&FieldDescriptor> = request.descriptors.iter().collect();
        ordered.sort_by_key(|d| d.display_order);

        let secret_paths: Vec<String> = request
            .descriptors
            .iter()
            .filter(|d| d.field_type == FieldType::Password)
            .map(|d| request.placement.path(d))
            .collect();

        let mut answers = Payload::new();
        for descriptor in ordered {
            let path = request.placement.path(descriptor);
            if request.supplied.contains(&path) {
                continue;
            }

            if let Some(gate) = &descriptor.depends_on {
                let open = answers
                    .get(gate)
                    .or_else(|| request.supplied.get(gate))
                    .map(is_truthy)
                    .unwrap_or(false);
                if !open {
                    debug!(field = %path, gate = %gate, "gate closed, clearing");
                    answers.set(&path, Value::Null);
                    continue;
                }
            }

            let default = descriptor
                .default_value
                .clone()
                .or_else(|| record_default(request.record, request.placement, &path, descriptor));

            if self.no_prompt {
                match default {
                    Some(value) => answers.set(&path, normalize_value(descriptor, &value)?),
                    None if descriptor.required => {
                        return Err(EngineError::Validation(format!(
                            "{} is required",
                            descriptor.display_label()
                        )))
                    }
                    None => {}
                }
                continue;
            }

            let mut lookup = request.option_params.clone();
            lookup.extend(
                request
                    .supplied
                    .merged(&answers)
                    .leaves()
                    .into_iter()
                    .filter(|(path, _)| !secret_paths.contains(path)),
            );
            if let Some(value) = self
                .ask(descriptor, default.as_ref(), &lookup)
                .await?
            {
                answers.set(&path, value);
            }
        }
        Ok(answers)
    }

    /// Ask until the answer is acceptable. `None` means "left blank".
    async fn ask(
        &mut self,
        descriptor: &FieldDescriptor,
        default: Option<&Value>,
        lookup: &endpoints::Params,
    ) -> Result<Option<Value>, EngineError> {
        let label = descriptor.display_label().to_string();
        let options = match descriptor.field_type {
            FieldType::Select => self.options_for(descriptor, lookup).await?,
            _ => Vec::new(),
        };
        if descriptor.field_type == FieldType::Select && !options.is_empty() {
            let listing: Vec<String> = options
                .iter()
                .map(|o| format!("  * {} [{}]", o.name, display_value(&o.value)))
                .collect();
            self.io.show(&listing.join("\n"));
        }

        let default_text = default.map(|d| match descriptor.field_type {
            FieldType::Checkbox => match normalize_value(descriptor, d) {
                Ok(Value::Bool(true)) => "on".to_string(),
                Ok(Value::Bool(false)) => "off".to_string(),
                _ => display_value(d),
            },
            _ => display_value(d),
        });

        loop {
            let raw = match descriptor.field_type {
                FieldType::Password => self.io.ask_secret(&label)?,
                _ => self.io.ask(&label, default_text.as_deref())?,
            };
            let raw = raw.trim();

            if raw.is_empty() {
                match default {
                    Some(d) => return Ok(Some(normalize_value(descriptor, d)?)),
                    // blank is a checkbox token like any other
                    None if descriptor.field_type == FieldType::Checkbox => {}
                    None if descriptor.required => {
                        self.io.show(&format!("{} is required", label));
                        continue;
                    }
                    None => return Ok(None),
                }
            }

            let answer = match descriptor.field_type {
                FieldType::Select if !options.is_empty() => options
                    .iter()
                    .find(|o| o.name == raw || display_value(&o.value) == raw)
                    .map(|o| o.value.clone()),
                FieldType::Checkbox => normalize_checkbox(raw).map(Value::Bool),
                FieldType::Number => parse_number(raw),
                _ => Some(Value::String(raw.to_string())),
            };
            match answer {
                Some(value) => return Ok(Some(value)),
                None => self
                    .io
                    .show(&format!("Invalid value '{}' for {}", raw, label)),
            }
        }
    }

    /// Choices of a select field.
    async fn options_for(
        &mut self,
        descriptor: &FieldDescriptor,
        lookup: &endpoints::Params,
    ) -> Result<Vec<SelectOption>, EngineError> {
        let Some(source) = &descriptor.option_source else {
            return Ok(descriptor.select_options.clone());
        };

        let params = lookup.clone();
        debug!(source = %source, params = params.len(), "loading options");

        let unresolvable = |reason: String| {
            EngineError::Validation(format!(
                "unable to load options for {}: {}",
                descriptor.display_label(),
                reason
            ))
        };
        let response = self
            .session
            .execute(&endpoints::options(source, params))
            .await
            .map_err(|e| unresolvable(e.to_string()))?;
        let rows = response
            .get("data")
            .cloned()
            .ok_or_else(|| unresolvable("response has no 'data'".to_string()))?;
        serde_json::from_value(rows).map_err(|e| unresolvable(e.to_string()))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => normalize_checkbox(s).unwrap_or(false),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// Default taken from an existing record. Referenced objects collapse to
/// their id so select fields get something they can send back.
fn record_default(
    record: Option<&Value>,
    placement: Placement<'_>,
    path: &str,
    descriptor: &FieldDescriptor,
) -> Option<Value> {
    let record = record?;
    let prefix = format!("{}.", placement.root_key);
    let relative = path.strip_prefix(&prefix).unwrap_or(path);
    let value = value_at(record, relative).or_else(|| record.get(&descriptor.field_name))?;
    match value {
        Value::Null => None,
        Value::Object(map) => map.get("id").cloned(),
        other => Some(other.clone()),
    }
}
