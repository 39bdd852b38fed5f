//! cli::commands::roles
//!
//! Roles have no remote type catalog; their prompts come from a schema
//! defined in [`crate::core::kinds`].

use anyhow::Result;

use super::common::{assembly_input, Flags, Invocation};
use super::resources;
use crate::cli::args::{RoleAction, RoleFields};
use crate::core::kinds::ROLE;
use crate::core::payload::Payload;
use crate::engine::dispatcher::AddRequest;
use crate::engine::Context;

fn fields(fields: &RoleFields, name: Option<&str>) -> Payload {
    Flags::new()
        .set(ROLE.name_field, name)
        .set("description", fields.description.as_deref())
        .set("roleType", fields.role_type.as_deref())
        .set("multitenant", fields.multitenant)
        .into_payload()
}

pub fn run(ctx: &Context, inv: &Invocation, action: RoleAction) -> Result<i32> {
    match action {
        RoleAction::List(args) => resources::list(ctx, inv, &ROLE, &args),
        RoleAction::Get(args) => resources::get(ctx, inv, &ROLE, &args),
        RoleAction::Add {
            name,
            fields: role_fields,
            mutation,
        } => {
            let conn = inv.connect()?;
            let request = AddRequest {
                type_token: None,
                name,
                input: assembly_input(&mutation.payload, fields(&role_fields, None), None)?,
            };
            resources::add(ctx, inv, &conn, &ROLE, request, &mutation)
        }
        RoleAction::Update {
            id,
            name,
            fields: role_fields,
            mutation,
        } => {
            let conn = inv.connect()?;
            let input = assembly_input(&mutation.payload, fields(&role_fields, name.as_deref()), None)?;
            resources::update(ctx, inv, &conn, &ROLE, &id, input, &mutation)
        }
        RoleAction::Remove(args) => resources::remove(ctx, inv, &ROLE, &args),
    }
}
