//! engine::assembler
//!
//! Builds the request body from every input source.
//!
//! # Precedence
//!
//! Later sources win collisions, nested objects are deep-merged:
//!
//! 1. payload file (`--payload`), used as the base document
//! 2. `-O key=value` overrides
//! 3. named CLI flags
//! 4. prompt answers, which only fill keys still missing
//!
//! Empty nested objects are pruned afterwards; a body that prunes to nothing
//! is rejected with `NoOp` instead of being sent.
//!
//! # Placement
//!
//! Bodies are rooted at the resource key (`networkRouter`, `rule`, ...). A
//! [`Placement`] knows that key plus the few fields that live at the body
//! root (e.g. `copies` for instances), and maps loose keys and descriptor
//! paths onto it.

use super::outcome::EngineError;
use super::permissions::PermissionPayload;
use crate::core::kinds::{ResourceKind, SubResourceKind};
use crate::core::payload::Payload;
use crate::core::types::FieldDescriptor;

/// Where values land in a request body.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'k> {
    pub root_key: &'k str,
    pub root_level: &'k [&'k str],
}

impl<'k> Placement<'k> {
    pub fn for_kind(kind: &'k ResourceKind) -> Self {
        Self {
            root_key: kind.singular_key,
            root_level: kind.root_level_fields,
        }
    }

    pub fn for_child(sub: &'k SubResourceKind) -> Self {
        Self {
            root_key: sub.payload_key,
            root_level: &[],
        }
    }

    /// Canonical body path of a descriptor's value.
    ///
    /// Contexts are relative to the resource key: `config.mtu` under a
    /// network lands at `network.config.mtu`.
    pub fn path(&self, descriptor: &FieldDescriptor) -> String {
        let raw = descriptor.path(self.root_key);
        if self.root_level.contains(&descriptor.field_name.as_str())
            && raw == format!("{}.{}", self.root_key, descriptor.field_name)
        {
            return descriptor.field_name.clone();
        }
        let first = raw.split('.').next().unwrap_or_default();
        if first == self.root_key {
            raw
        } else {
            format!("{}.{}", self.root_key, raw)
        }
    }

    /// Move loose top-level keys under the resource key.
    pub fn place(&self, payload: &Payload) -> Payload {
        payload.placed(self.root_key, self.root_level)
    }
}

/// User-supplied inputs, before any prompting.
#[derive(Debug, Clone, Default)]
pub struct AssemblyInput {
    /// Full body from `--payload`.
    pub payload_file: Option<Payload>,
    /// `-O` overrides.
    pub options: Payload,
    /// Named CLI flags, already in body shape.
    pub flags: Payload,
    /// Access block from the permission flags, if any were given.
    pub permissions: Option<PermissionPayload>,
}

impl AssemblyInput {
    /// Whether prompting is bypassed entirely.
    pub fn has_payload_file(&self) -> bool {
        self.payload_file.is_some()
    }
}

/// Merges inputs into a request body for one resource key.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'k> {
    placement: Placement<'k>,
}

impl<'k> Assembler<'k> {
    pub fn new(placement: Placement<'k>) -> Self {
        Self { placement }
    }

    /// Everything the user supplied without prompting, merged by precedence.
    ///
    /// `kind` decides where the permission block goes; sub-resources pass
    /// `None` and never carry one.
    pub fn supplied(&self, input: &AssemblyInput, kind: Option<&ResourceKind>) -> Payload {
        let mut flags = self.placement.place(&input.flags);
        if let (Some(permissions), Some(kind)) = (&input.permissions, kind) {
            flags = flags.merged(&permissions.to_payload(kind));
        }
        input
            .payload_file
            .clone()
            .unwrap_or_default()
            .merged(&self.placement.place(&input.options))
            .merged(&flags)
    }

    /// Final body: supplied values, then answers filling the gaps, pruned.
    pub fn assemble(
        &self,
        input: &AssemblyInput,
        kind: Option<&ResourceKind>,
        answers: &Payload,
        noop_message: &str,
    ) -> Result<Payload, EngineError> {
        self.finish(&self.supplied(input, kind), answers, noop_message)
    }

    /// Fill `supplied` from `answers`, prune, and reject an empty result.
    pub fn finish(
        &self,
        supplied: &Payload,
        answers: &Payload,
        noop_message: &str,
    ) -> Result<Payload, EngineError> {
        let body = supplied.filled_from(answers).pruned();
        if body.is_empty() {
            return Err(EngineError::NoOp(noop_message.to_string()));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinds::{INSTANCE, NETWORK, ROUTER};
    use crate::core::payload::parse_options;
    use crate::core::types::FieldType;
    use crate::engine::permissions::{build, Visibility};
    use serde_json::json;

    fn network() -> Assembler<'static> {
        Assembler::new(Placement::for_kind(&NETWORK))
    }

    #[test]
    fn option_overrides_payload_file() {
        let input = AssemblyInput {
            payload_file: Some(Payload::new().with("network.name", "from-file").with("network.cidr", "10.0.0.0/24")),
            options: parse_options(&["network.name=override".to_string()]).unwrap(),
            ..Default::default()
        };
        let body = network().assemble(&input, None, &Payload::new(), "noop").unwrap();
        assert_eq!(body.get("network.name").unwrap(), "override");
        assert_eq!(body.get("network.cidr").unwrap(), "10.0.0.0/24");
    }

    #[test]
    fn flags_override_options_and_answers_only_fill() {
        let input = AssemblyInput {
            options: parse_options(&["name=opt".to_string(), "description=opt".to_string()]).unwrap(),
            flags: Payload::new().with("name", "flag"),
            ..Default::default()
        };
        let answers = Payload::new()
            .with("network.name", "answer")
            .with("network.description", "answer")
            .with("network.mtu", 1500);
        let body = network().assemble(&input, None, &answers, "noop").unwrap();
        assert_eq!(
            body.into_value(),
            json!({"network": {"name": "flag", "description": "opt", "mtu": 1500}})
        );
    }

    #[test]
    fn empty_input_is_noop() {
        let err = network()
            .assemble(&AssemblyInput::default(), None, &Payload::new(), "Specify at least one option to update")
            .unwrap_err();
        assert!(matches!(err, EngineError::NoOp(ref m) if m == "Specify at least one option to update"));
    }

    #[test]
    fn only_empty_maps_is_noop() {
        let input = AssemblyInput {
            payload_file: Some(Payload::from_value(json!({"network": {"config": {}}})).unwrap()),
            ..Default::default()
        };
        assert!(network().assemble(&input, None, &Payload::new(), "noop").is_err());
    }

    #[test]
    fn root_level_fields_stay_at_root() {
        let placement = Placement::for_kind(&INSTANCE);
        let copies = FieldDescriptor::new("copies", FieldType::Number);
        assert_eq!(placement.path(&copies), "copies");
        let name = FieldDescriptor::new("name", FieldType::Text);
        assert_eq!(placement.path(&name), "instance.name");
        let mtu = FieldDescriptor::new("mtu", FieldType::Number).context("config");
        assert_eq!(placement.path(&mtu), "instance.config.mtu");
        let domain = FieldDescriptor::new("name", FieldType::Text).context("domain");
        assert_eq!(placement.path(&domain), "instance.name");

        let input = AssemblyInput {
            options: parse_options(&["copies=2".to_string(), "name=web".to_string()]).unwrap(),
            ..Default::default()
        };
        let body = Assembler::new(placement)
            .assemble(&input, Some(&INSTANCE), &Payload::new(), "noop")
            .unwrap();
        assert_eq!(body.into_value(), json!({"copies": "2", "instance": {"name": "web"}}));
    }

    #[test]
    fn permissions_merge_under_kind_key() {
        let input = AssemblyInput {
            flags: Payload::new().with("name", "edge"),
            permissions: Some(build(Some(Visibility::Public), Some(vec![2]), None)),
            ..Default::default()
        };
        let body = Assembler::new(Placement::for_kind(&ROUTER))
            .assemble(&input, Some(&ROUTER), &Payload::new(), "noop")
            .unwrap();
        assert_eq!(body.get("networkRouter.permissions.visibility").unwrap(), "public");
        assert_eq!(body.get("networkRouter.permissions.tenants").unwrap(), &json!([{"id": 2}]));
        assert_eq!(body.get("networkRouter.name").unwrap(), "edge");
    }
}
