//! core::types
//!
//! Domain types shared by every resource kind.
//!
//! # Types
//!
//! - [`ResourceType`] - server-described capability flags plus ordered field
//!   descriptors, one list per sub-resource kind
//! - [`FieldDescriptor`] - one prompt/payload unit
//! - [`FieldType`] - the closed set of field kinds the prompt engine understands
//! - [`Resource`] - a concrete record returned by the appliance
//!
//! # Invariants
//!
//! - `FieldDescriptor` carries static `select_options` or an `option_source`,
//!   never both ([`FieldDescriptor::validate`])
//! - A `Resource` always has a numeric id; records without one are rejected
//!   at parse time

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::value_at;

/// The kind of input a field expects.
///
/// Unknown type strings from the appliance are treated as [`FieldType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Checkbox,
    Select,
    Textarea,
    CodeEditor,
    Password,
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "number" => FieldType::Number,
            "checkbox" => FieldType::Checkbox,
            "select" | "typeahead" => FieldType::Select,
            "textarea" => FieldType::Textarea,
            "code-editor" => FieldType::CodeEditor,
            "password" => FieldType::Password,
            _ => FieldType::Text,
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Checkbox => "checkbox",
            FieldType::Select => "select",
            FieldType::Textarea => "textarea",
            FieldType::CodeEditor => "code-editor",
            FieldType::Password => "password",
        };
        write!(f, "{}", s)
    }
}

/// A static choice for a select field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Metadata for one prompt/payload field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub field_name: String,

    /// Dot-path prefix placing the value. Empty or `"domain"` means the
    /// resource's own payload key.
    #[serde(default)]
    pub field_context: Option<String>,

    #[serde(default)]
    pub field_label: Option<String>,

    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub default_value: Option<Value>,

    #[serde(default)]
    pub display_order: i64,

    #[serde(default)]
    pub select_options: Vec<SelectOption>,

    #[serde(default)]
    pub option_source: Option<String>,

    #[serde(default = "default_true")]
    pub show_on_create: bool,

    /// Full path of a checkbox earlier in the sequence that must be true for
    /// this field to be prompted.
    #[serde(default)]
    pub depends_on: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl FieldDescriptor {
    /// Create a descriptor with defaults for everything but name and type.
    pub fn new(field_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field_name: field_name.into(),
            field_context: None,
            field_label: None,
            field_type,
            required: false,
            default_value: None,
            display_order: 0,
            select_options: Vec::new(),
            option_source: None,
            show_on_create: true,
            depends_on: None,
            description: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.field_label = Some(label.into());
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.field_context = Some(context.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn order(mut self, display_order: i64) -> Self {
        self.display_order = display_order;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.select_options = options;
        self
    }

    pub fn source(mut self, option_source: impl Into<String>) -> Self {
        self.option_source = Some(option_source.into());
        self
    }

    pub fn depends_on(mut self, path: impl Into<String>) -> Self {
        self.depends_on = Some(path.into());
        self
    }

    /// The label shown to the user.
    pub fn display_label(&self) -> &str {
        self.field_label.as_deref().unwrap_or(&self.field_name)
    }

    /// Full payload path: context plus field name.
    ///
    /// `default_context` is the resource's payload key, used when the
    /// descriptor has no context of its own.
    pub fn path(&self, default_context: &str) -> String {
        match self.field_context.as_deref() {
            None | Some("") | Some("domain") => join_path(default_context, &self.field_name),
            Some(ctx) => join_path(ctx, &self.field_name),
        }
    }

    /// Check the static-options / option-source exclusivity.
    pub fn validate(&self) -> Result<(), String> {
        if !self.select_options.is_empty() && self.option_source.is_some() {
            return Err(format!(
                "field '{}' declares both static options and an option source",
                self.field_name
            ));
        }
        Ok(())
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Server-described schema and capability flags for a category of resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceType {
    pub id: Option<u64>,
    pub code: String,
    pub name: String,
    pub capabilities: BTreeMap<String, bool>,
    /// Field descriptors per sub-resource kind; `""` is the root resource.
    pub fields: BTreeMap<String, Vec<FieldDescriptor>>,
}

impl ResourceType {
    /// Build a type from its appliance JSON representation.
    ///
    /// Every boolean member becomes a capability flag. `optionTypes` holds
    /// the root descriptors and `<kind>OptionTypes` the descriptors of
    /// sub-resource `<kind>` (e.g. `ruleOptionTypes` -> `rule`).
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let mut rt = ResourceType::default();
        let Some(map) = value.as_object() else {
            return Ok(rt);
        };

        rt.id = map.get("id").and_then(id_of);
        rt.code = map
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        rt.name = map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&rt.code)
            .to_string();

        for (key, member) in map {
            if let Some(flag) = member.as_bool() {
                rt.capabilities.insert(key.clone(), flag);
                continue;
            }
            let sub_kind = if key == "optionTypes" {
                Some("")
            } else {
                key.strip_suffix("OptionTypes")
            };
            if let (Some(sub_kind), Some(list)) = (sub_kind, member.as_array()) {
                let descriptors = list
                    .iter()
                    .cloned()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<FieldDescriptor>, _>>()?;
                rt.fields.insert(sub_kind.to_string(), descriptors);
            }
        }

        Ok(rt)
    }

    /// A type synthesized locally for kinds without a remote type catalog.
    pub fn local(code: &str, name: &str, fields: Vec<FieldDescriptor>) -> Self {
        let mut rt = ResourceType {
            id: None,
            code: code.to_string(),
            name: name.to_string(),
            ..Default::default()
        };
        rt.fields.insert(String::new(), fields);
        rt
    }

    /// Whether a capability flag is present and true.
    pub fn has(&self, flag: &str) -> bool {
        self.capabilities.get(flag).copied().unwrap_or(false)
    }

    /// Descriptors for a sub-resource kind (`""` for the root resource).
    pub fn fields(&self, sub_kind: &str) -> &[FieldDescriptor] {
        self.fields.get(sub_kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Weak reference to a resource's type, as embedded in a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub id: Option<u64>,
    pub code: Option<String>,
    pub name: Option<String>,
}

/// Weak reference to the record a resource lives under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentRef {
    /// `group`, `cloud` or `server`.
    pub kind: &'static str,
    pub id: u64,
    pub name: Option<String>,
}

const PARENT_KEYS: &[(&str, &str)] = &[
    ("site", "group"),
    ("group", "group"),
    ("zone", "cloud"),
    ("cloud", "cloud"),
    ("server", "server"),
];

/// A concrete record held by the appliance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub id: u64,
    pub name: String,
    pub type_ref: Option<TypeRef>,
    pub parent_ref: Option<ParentRef>,
    /// The record exactly as the appliance returned it.
    pub raw: Value,
}

impl Resource {
    /// Parse a record. `name_field` and `type_field` name the members holding
    /// the display name and the type reference for this kind.
    ///
    /// Returns `None` when the record carries no usable id.
    pub fn from_value(raw: Value, name_field: &str, type_field: &str) -> Option<Self> {
        let id = raw.get("id").and_then(id_of)?;
        let name = raw
            .get(name_field)
            .or_else(|| raw.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let type_ref = raw.get(type_field).and_then(|t| match t {
            Value::Object(m) => Some(TypeRef {
                id: m.get("id").and_then(id_of),
                code: m.get("code").and_then(Value::as_str).map(str::to_string),
                name: m.get("name").and_then(Value::as_str).map(str::to_string),
            }),
            Value::String(code) => Some(TypeRef {
                id: None,
                code: Some(code.clone()),
                name: None,
            }),
            _ => None,
        });

        let parent_ref = PARENT_KEYS.iter().find_map(|(key, kind)| {
            let parent = raw.get(*key)?;
            Some(ParentRef {
                kind: *kind,
                id: parent.get("id").and_then(id_of)?,
                name: parent.get("name").and_then(Value::as_str).map(str::to_string),
            })
        });

        Some(Self {
            id,
            name,
            type_ref,
            parent_ref,
            raw,
        })
    }

    /// Child records stored at a dot-path inside this record.
    pub fn children(&self, record_path: &str, name_field: &str) -> Vec<Resource> {
        value_at(&self.raw, record_path)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .cloned()
                    .filter_map(|item| Resource::from_value(item, name_field, "type"))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Look up a member of the raw record by dot-path.
    pub fn field(&self, path: &str) -> Option<&Value> {
        value_at(&self.raw, path)
    }
}

/// Read an id that may be encoded as a number or a numeric string.
pub fn id_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_type_from_unknown_is_text() {
        assert_eq!(FieldType::from("hidden".to_string()), FieldType::Text);
        assert_eq!(FieldType::from("code-editor".to_string()), FieldType::CodeEditor);
    }

    #[test]
    fn descriptor_path_uses_default_context() {
        let plain = FieldDescriptor::new("name", FieldType::Text);
        assert_eq!(plain.path("networkRouter"), "networkRouter.name");

        let domain = FieldDescriptor::new("name", FieldType::Text).context("domain");
        assert_eq!(domain.path("networkRouter"), "networkRouter.name");

        let config = FieldDescriptor::new("mtu", FieldType::Number).context("network.config");
        assert_eq!(config.path("networkRouter"), "network.config.mtu");
    }

    #[test]
    fn descriptor_rejects_both_option_kinds() {
        let d = FieldDescriptor::new("zone", FieldType::Select)
            .options(vec![SelectOption::new("a", "a")])
            .source("zones");
        assert!(d.validate().is_err());
    }

    #[test]
    fn descriptor_deserializes_from_appliance_json() {
        let d: FieldDescriptor = serde_json::from_value(json!({
            "fieldName": "enabled",
            "fieldLabel": "Enabled",
            "type": "checkbox",
            "defaultValue": "on",
            "displayOrder": 3
        }))
        .unwrap();
        assert_eq!(d.field_type, FieldType::Checkbox);
        assert_eq!(d.display_order, 3);
        assert!(d.show_on_create);
        assert_eq!(d.default_value, Some(json!("on")));
    }

    #[test]
    fn resource_type_collects_flags_and_descriptor_lists() {
        let rt = ResourceType::from_value(&json!({
            "id": 3,
            "code": "nsxt",
            "name": "NSX-T Tier-1",
            "hasFirewall": true,
            "hasNat": false,
            "optionTypes": [{"fieldName": "name", "displayOrder": 0}],
            "ruleOptionTypes": [{"fieldName": "action", "type": "select"}]
        }))
        .unwrap();

        assert_eq!(rt.id, Some(3));
        assert!(rt.has("hasFirewall"));
        assert!(!rt.has("hasNat"));
        assert!(!rt.has("hasBgp"));
        assert_eq!(rt.fields("").len(), 1);
        assert_eq!(rt.fields("rule")[0].field_type, FieldType::Select);
        assert!(rt.fields("nat").is_empty());
    }

    #[test]
    fn resource_parses_type_and_parent() {
        let r = Resource::from_value(
            json!({"id": "42", "name": "web01", "type": {"id": 3, "name": "NSX"}, "site": {"id": 1, "name": "dev"}}),
            "name",
            "type",
        )
        .unwrap();
        assert_eq!(r.id, 42);
        assert_eq!(r.type_ref.as_ref().unwrap().id, Some(3));
        let parent = r.parent_ref.unwrap();
        assert_eq!(parent.kind, "group");
        assert_eq!(parent.id, 1);
    }

    #[test]
    fn resource_without_id_is_rejected() {
        assert!(Resource::from_value(json!({"name": "x"}), "name", "type").is_none());
    }

    #[test]
    fn children_are_read_from_record_path() {
        let r = Resource::from_value(
            json!({"id": 1, "name": "r", "firewall": {"rules": [{"id": 5, "name": "allow-web"}, {"name": "no-id"}]}}),
            "name",
            "type",
        )
        .unwrap();
        let rules = r.children("firewall.rules", "name");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "allow-web");
    }
}
