//! engine::permissions
//!
//! The access block shared by many resource kinds: visibility, tenant list
//! and group (site) access.
//!
//! Where the block goes in a body is kind metadata
//! ([`PermissionKey`](crate::core::kinds::PermissionKey)); the builder itself
//! only knows the three shapes.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::core::kinds::{PermissionKey, ResourceKind};
use crate::core::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            other => Err(format!("invalid visibility '{}', must be private or public", other)),
        }
    }
}

/// One group with custom access.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteAccess {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

/// Group access: every group, or an explicit list.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupAccess {
    All(bool),
    Sites(Vec<SiteAccess>),
}

impl GroupAccess {
    fn to_value(&self) -> Value {
        match self {
            GroupAccess::All(all) => json!({"all": all}),
            GroupAccess::Sites(sites) => json!({"sites": sites}),
        }
    }
}

/// The built access block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PermissionPayload {
    pub visibility: Option<Visibility>,
    pub tenants: Option<Vec<u64>>,
    pub group_access: Option<GroupAccess>,
}

/// Build an access block. With nothing specified, visibility is private.
pub fn build(
    visibility: Option<Visibility>,
    tenant_ids: Option<Vec<u64>>,
    group_access: Option<GroupAccess>,
) -> PermissionPayload {
    let nothing_given = visibility.is_none() && tenant_ids.is_none() && group_access.is_none();
    PermissionPayload {
        visibility: if nothing_given {
            Some(Visibility::Private)
        } else {
            visibility
        },
        tenants: tenant_ids,
        group_access,
    }
}

impl PermissionPayload {
    fn tenants_value(&self) -> Option<Value> {
        self.tenants
            .as_ref()
            .map(|ids| Value::Array(ids.iter().map(|id| json!({"id": id})).collect()))
    }

    fn visibility_value(&self) -> Option<Value> {
        self.visibility.map(|v| json!(v))
    }

    /// The block placed under the kind's resource key, or empty for kinds
    /// without a permission key.
    pub fn to_payload(&self, kind: &ResourceKind) -> Payload {
        let Some(key) = kind.permission_key else {
            return Payload::new();
        };

        let mut block = Map::new();
        let mut put = |name: &str, value: Option<Value>| {
            if let Some(value) = value {
                block.insert(name.to_string(), value);
            }
        };
        match key {
            PermissionKey::Permissions => {
                let mut inner = Map::new();
                if let Some(v) = self.visibility_value() {
                    inner.insert("visibility".into(), v);
                }
                if let Some(t) = self.tenants_value() {
                    inner.insert("tenants".into(), t);
                }
                if let Some(g) = &self.group_access {
                    inner.insert("resourcePermissions".into(), g.to_value());
                }
                put("permissions", Some(Value::Object(inner)));
            }
            PermissionKey::ResourcePermission => {
                put("visibility", self.visibility_value());
                put("tenants", self.tenants_value());
                put(
                    "resourcePermissions",
                    self.group_access.as_ref().map(GroupAccess::to_value),
                );
            }
            PermissionKey::Tenants => {
                put("visibility", self.visibility_value());
                put("tenants", self.tenants_value());
            }
        }

        let mut root = Map::new();
        root.insert(kind.singular_key.to_string(), Value::Object(block));
        Payload::from(root)
    }
}
