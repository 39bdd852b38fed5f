//! core::kinds
//!
//! Static metadata describing each resource kind the client manages.
//!
//! # Design
//!
//! The engine is generic over resources. Everything that differs between a
//! router, a network or a role (endpoint paths, payload keys, which fields
//! live at the payload root, where permissions go, which sub-resources exist
//! and which capability flag gates them) is data in this table, not code in
//! the engine.

use crate::core::types::{FieldDescriptor, FieldType, SelectOption};

/// Where the schema for a kind comes from.
#[derive(Debug, Clone, Copy)]
pub enum SchemaSource {
    /// A remote catalog of types (`/api/.../types`) carrying option types.
    Catalog(TypeCatalog),
    /// Descriptors defined locally by the client.
    Static(fn() -> Vec<FieldDescriptor>),
    /// No prompting schema; only flags and overrides.
    None,
}

/// A remote type catalog endpoint.
#[derive(Debug, Clone, Copy)]
pub struct TypeCatalog {
    pub path: &'static str,
    pub singular_key: &'static str,
    pub plural_key: &'static str,
    /// Payload member used to reference the chosen type on create.
    pub payload_field: &'static str,
}

/// Where the permission block is merged into a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKey {
    /// `{root}.permissions = {visibility?, tenants?, resourcePermissions?}`
    Permissions,
    /// `{root}.resourcePermissions`, `{root}.tenants` and `{root}.visibility`
    /// side by side.
    ResourcePermission,
    /// `{root}.tenants` and `{root}.visibility` only; group access is dropped.
    Tenants,
}

/// A kind of record nested under a parent resource.
#[derive(Debug, Clone, Copy)]
pub struct SubResourceKind {
    /// Short name, also the key of its descriptors in the parent type.
    pub name: &'static str,
    pub label: &'static str,
    /// Feature named in "not supported" messages.
    pub feature: &'static str,
    /// Capability flag on the parent type gating every mutation.
    pub capability: &'static str,
    /// Path below `/{parent}/{id}/`.
    pub path: &'static str,
    pub payload_key: &'static str,
    /// Response key of the nested list endpoint.
    pub plural_key: &'static str,
    /// Dot-path of the children inside the detailed parent record.
    pub record_path: &'static str,
    /// Option-source parameters taken from the parent record:
    /// `(parameter name, dot-path in the parent record)`.
    pub option_params: &'static [(&'static str, &'static str)],
}

/// Metadata for a top-level resource kind.
#[derive(Debug, Clone, Copy)]
pub struct ResourceKind {
    pub name: &'static str,
    pub label: &'static str,
    pub path: &'static str,
    pub singular_key: &'static str,
    pub plural_key: &'static str,
    /// Record member holding the display name.
    pub name_field: &'static str,
    /// Record member holding the type reference.
    pub type_field: &'static str,
    /// Query parameter used for name searches.
    pub search_param: &'static str,
    /// List rows are projections; re-fetch by id after a name match.
    pub list_is_thin: bool,
    pub schema: SchemaSource,
    pub permission_key: Option<PermissionKey>,
    /// Payload fields that live at the body root instead of under
    /// `singular_key`.
    pub root_level_fields: &'static [&'static str],
    pub children: &'static [SubResourceKind],
    /// `(column title, dot-path)` for list tables.
    pub columns: &'static [(&'static str, &'static str)],
    /// Web UI path prefix for `view`.
    pub ui_path: Option<&'static str>,
}

impl ResourceKind {
    /// Find a sub-resource kind by name.
    pub fn child(&self, name: &str) -> Option<&'static SubResourceKind> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn item_path(&self, id: u64) -> String {
        format!("{}/{}", self.path, id)
    }

    pub fn catalog(&self) -> Option<&TypeCatalog> {
        match &self.schema {
            SchemaSource::Catalog(catalog) => Some(catalog),
            _ => None,
        }
    }
}

const ROUTER_NAT_PARAMS: &[(&str, &str)] = &[("routerId", "id"), ("networkServerId", "networkServer.id")];
const ROUTER_PARAMS: &[(&str, &str)] = &[("routerId", "id")];

pub const ROUTER_CHILDREN: &[SubResourceKind] = &[
    SubResourceKind {
        name: "rule",
        label: "Firewall Rule",
        feature: "Firewall",
        capability: "hasFirewall",
        path: "firewall/rules",
        payload_key: "rule",
        plural_key: "rules",
        record_path: "firewall.rules",
        option_params: ROUTER_PARAMS,
    },
    SubResourceKind {
        name: "ruleGroup",
        label: "Firewall Rule Group",
        feature: "Firewall rule groups",
        capability: "hasFirewallGroups",
        path: "firewall/rule-groups",
        payload_key: "ruleGroup",
        plural_key: "ruleGroups",
        record_path: "firewall.ruleGroups",
        option_params: ROUTER_PARAMS,
    },
    SubResourceKind {
        name: "nat",
        label: "NAT",
        feature: "NAT",
        capability: "hasNat",
        path: "nats",
        payload_key: "networkRouterNAT",
        plural_key: "networkRouterNATs",
        record_path: "nats",
        option_params: ROUTER_NAT_PARAMS,
    },
    SubResourceKind {
        name: "bgpNeighbor",
        label: "BGP Neighbor",
        feature: "BGP",
        capability: "hasBgp",
        path: "bgp-neighbors",
        payload_key: "networkRouterBgpNeighbor",
        plural_key: "networkRouterBgpNeighbors",
        record_path: "bgpNeighbors",
        option_params: ROUTER_PARAMS,
    },
    SubResourceKind {
        name: "route",
        label: "Route",
        feature: "Routing",
        capability: "hasRouting",
        path: "routes",
        payload_key: "networkRoute",
        plural_key: "networkRoutes",
        record_path: "routes",
        option_params: ROUTER_PARAMS,
    },
];

pub const ROUTER: ResourceKind = ResourceKind {
    name: "router",
    label: "Network Router",
    path: "/api/networks/routers",
    singular_key: "networkRouter",
    plural_key: "networkRouters",
    name_field: "name",
    type_field: "type",
    search_param: "name",
    list_is_thin: true,
    schema: SchemaSource::Catalog(TypeCatalog {
        path: "/api/networks/router-types",
        singular_key: "networkRouterType",
        plural_key: "networkRouterTypes",
        payload_field: "type",
    }),
    permission_key: Some(PermissionKey::Permissions),
    root_level_fields: &[],
    children: ROUTER_CHILDREN,
    columns: &[
        ("ID", "id"),
        ("NAME", "name"),
        ("TYPE", "type.name"),
        ("SERVICE", "networkServer.name"),
        ("STATUS", "status"),
    ],
    ui_path: Some("infrastructure/networks/routers"),
};

pub const NETWORK: ResourceKind = ResourceKind {
    name: "network",
    label: "Network",
    path: "/api/networks",
    singular_key: "network",
    plural_key: "networks",
    name_field: "name",
    type_field: "type",
    search_param: "name",
    list_is_thin: true,
    schema: SchemaSource::Catalog(TypeCatalog {
        path: "/api/network-types",
        singular_key: "networkType",
        plural_key: "networkTypes",
        payload_field: "type",
    }),
    permission_key: Some(PermissionKey::ResourcePermission),
    root_level_fields: &[],
    children: &[],
    columns: &[
        ("ID", "id"),
        ("NAME", "name"),
        ("TYPE", "type.name"),
        ("CLOUD", "zone.name"),
        ("CIDR", "cidr"),
        ("VISIBILITY", "visibility"),
    ],
    ui_path: Some("infrastructure/networks"),
};

pub const INSTANCE: ResourceKind = ResourceKind {
    name: "instance",
    label: "Instance",
    path: "/api/instances",
    singular_key: "instance",
    plural_key: "instances",
    name_field: "name",
    type_field: "instanceType",
    search_param: "name",
    list_is_thin: true,
    schema: SchemaSource::Catalog(TypeCatalog {
        path: "/api/instance-types",
        singular_key: "instanceType",
        plural_key: "instanceTypes",
        payload_field: "instanceType",
    }),
    permission_key: Some(PermissionKey::Tenants),
    root_level_fields: &["copies", "zoneId", "layoutSize"],
    children: &[],
    columns: &[
        ("ID", "id"),
        ("NAME", "name"),
        ("TYPE", "instanceType.name"),
        ("GROUP", "group.name"),
        ("CLOUD", "cloud.name"),
        ("STATUS", "status"),
    ],
    ui_path: Some("provisioning/instances"),
};

/// State-changing instance verbs, each a `PUT /api/instances/{id}/{action}`.
pub const INSTANCE_ACTIONS: &[&str] = &["stop", "start", "restart", "suspend", "eject", "lock", "unlock"];

fn role_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("authority", FieldType::Text)
            .label("Name")
            .required()
            .order(1),
        FieldDescriptor::new("description", FieldType::Text)
            .label("Description")
            .order(2),
        FieldDescriptor::new("roleType", FieldType::Select)
            .label("Role Type")
            .options(vec![
                SelectOption::new("User Role", "user"),
                SelectOption::new("Account Role", "account"),
            ])
            .default_value("user")
            .required()
            .order(3),
        FieldDescriptor::new("baseRoleId", FieldType::Select)
            .label("Copy From Role")
            .source("roles")
            .order(4),
        FieldDescriptor::new("multitenant", FieldType::Checkbox)
            .label("Multitenant")
            .default_value("off")
            .order(5),
        FieldDescriptor::new("multitenantLocked", FieldType::Checkbox)
            .label("Multitenant Locked")
            .default_value("off")
            .depends_on("role.multitenant")
            .order(6),
    ]
}

pub const ROLE: ResourceKind = ResourceKind {
    name: "role",
    label: "Role",
    path: "/api/roles",
    singular_key: "role",
    plural_key: "roles",
    name_field: "authority",
    type_field: "roleType",
    search_param: "phrase",
    list_is_thin: false,
    schema: SchemaSource::Static(role_fields),
    permission_key: None,
    root_level_fields: &[],
    children: &[],
    columns: &[
        ("ID", "id"),
        ("NAME", "authority"),
        ("DESCRIPTION", "description"),
        ("TYPE", "roleType"),
        ("MULTITENANT", "multitenant"),
    ],
    ui_path: Some("admin/roles"),
};

pub const GROUP: ResourceKind = ResourceKind {
    name: "group",
    label: "Group",
    path: "/api/groups",
    singular_key: "group",
    plural_key: "groups",
    name_field: "name",
    type_field: "type",
    search_param: "name",
    list_is_thin: false,
    schema: SchemaSource::None,
    permission_key: None,
    root_level_fields: &[],
    children: &[],
    columns: &[("ID", "id"), ("NAME", "name"), ("LOCATION", "location"), ("CODE", "code")],
    ui_path: Some("infrastructure/groups"),
};
