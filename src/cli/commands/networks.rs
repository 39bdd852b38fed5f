//! cli::commands::networks

use anyhow::Result;

use super::common::{assembly_input, fail, permissions, Flags, Invocation};
use super::resources;
use crate::cli::args::{NetworkAction, NetworkFields};
use crate::core::kinds::NETWORK;
use crate::core::payload::Payload;
use crate::engine::dispatcher::AddRequest;
use crate::engine::Context;

fn fields(fields: &NetworkFields, name: Option<&str>, group: Option<u64>) -> Payload {
    Flags::new()
        .set("name", name)
        .set("description", fields.description.as_deref())
        .set("cidr", fields.cidr.as_deref())
        .set("gateway", fields.gateway.as_deref())
        .reference("site", group)
        .into_payload()
}

pub fn run(ctx: &Context, inv: &Invocation, action: NetworkAction) -> Result<i32> {
    match action {
        NetworkAction::List(args) => resources::list(ctx, inv, &NETWORK, &args),
        NetworkAction::Get(args) => resources::get(ctx, inv, &NETWORK, &args),
        NetworkAction::Add {
            name,
            network_type,
            fields: network_fields,
            permissions: permission_args,
            mutation,
        } => {
            let conn = inv.connect()?;
            let group = match conn.group_id(network_fields.group.as_deref()) {
                Ok(group) => group,
                Err(err) => return Ok(fail(err)),
            };
            let request = AddRequest {
                type_token: network_type,
                name,
                input: assembly_input(
                    &mutation.payload,
                    fields(&network_fields, None, group),
                    permissions(&permission_args)?,
                )?,
            };
            resources::add(ctx, inv, &conn, &NETWORK, request, &mutation)
        }
        NetworkAction::Update {
            id,
            name,
            fields: network_fields,
            permissions: permission_args,
            mutation,
        } => {
            let conn = inv.connect()?;
            let group = match network_fields.group.as_deref() {
                Some(token) => match conn.group_id(Some(token)) {
                    Ok(group) => group,
                    Err(err) => return Ok(fail(err)),
                },
                None => None,
            };
            let input = assembly_input(
                &mutation.payload,
                fields(&network_fields, name.as_deref(), group),
                permissions(&permission_args)?,
            )?;
            resources::update(ctx, inv, &conn, &NETWORK, &id, input, &mutation)
        }
        NetworkAction::Remove(args) => resources::remove(ctx, inv, &NETWORK, &args),
        NetworkAction::ListTypes(args) => resources::list_types(ctx, inv, &NETWORK, &args),
        NetworkAction::GetType(args) => resources::get_type(ctx, inv, &NETWORK, &args),
    }
}
