//! cli::commands::routers
//!
//! `morpheus routers ...`, including the nested firewall, NAT, BGP and
//! route verbs. Every nested verb is gated on the router type's capability
//! flag before anything is asked or sent.

use anyhow::Result;

use super::common::{assembly_input, fail, mutation_options, permissions, Flags, Invocation, Renderer};
use super::resources;
use crate::cli::args::{ChildAction, RouterAction, RouterFields};
use crate::core::kinds::{SubResourceKind, ROUTER};
use crate::core::payload::Payload;
use crate::engine::dispatcher::AddRequest;
use crate::engine::{Context, MutationOptions};
use crate::ui::prompts::TerminalPrompt;

const CHILD_COLUMNS: &[(&str, &str)] = &[("ID", "id"), ("NAME", "name"), ("DESCRIPTION", "description")];

fn fields(fields: &RouterFields, name: Option<&str>, group: Option<u64>) -> Payload {
    Flags::new()
        .set("name", name)
        .set("description", fields.description.as_deref())
        .set("enabled", fields.enabled)
        .reference("site", group)
        .into_payload()
}

pub fn run(ctx: &Context, inv: &Invocation, action: RouterAction) -> Result<i32> {
    match action {
        RouterAction::List(args) => resources::list(ctx, inv, &ROUTER, &args),
        RouterAction::Get(args) => resources::get(ctx, inv, &ROUTER, &args),
        RouterAction::Add {
            name,
            router_type,
            fields: router_fields,
            permissions: permission_args,
            mutation,
        } => {
            let conn = inv.connect()?;
            let group = match conn.group_id(router_fields.group.as_deref()) {
                Ok(group) => group,
                Err(err) => return Ok(fail(err)),
            };
            let request = AddRequest {
                type_token: router_type,
                name,
                input: assembly_input(
                    &mutation.payload,
                    fields(&router_fields, None, group),
                    permissions(&permission_args)?,
                )?,
            };
            resources::add(ctx, inv, &conn, &ROUTER, request, &mutation)
        }
        RouterAction::Update {
            id,
            name,
            fields: router_fields,
            permissions: permission_args,
            mutation,
        } => {
            let conn = inv.connect()?;
            let group = match router_fields.group.as_deref() {
                Some(token) => match conn.group_id(Some(token)) {
                    Ok(group) => group,
                    Err(err) => return Ok(fail(err)),
                },
                None => None,
            };
            let input = assembly_input(
                &mutation.payload,
                fields(&router_fields, name.as_deref(), group),
                permissions(&permission_args)?,
            )?;
            resources::update(ctx, inv, &conn, &ROUTER, &id, input, &mutation)
        }
        RouterAction::Remove(args) => resources::remove(ctx, inv, &ROUTER, &args),
        RouterAction::ListTypes(args) => resources::list_types(ctx, inv, &ROUTER, &args),
        RouterAction::GetType(args) => resources::get_type(ctx, inv, &ROUTER, &args),
        RouterAction::FirewallRules { action } => child(ctx, inv, "rule", action),
        RouterAction::FirewallRuleGroups { action } => child(ctx, inv, "ruleGroup", action),
        RouterAction::Nats { action } => child(ctx, inv, "nat", action),
        RouterAction::BgpNeighbors { action } => child(ctx, inv, "bgpNeighbor", action),
        RouterAction::Routes { action } => child(ctx, inv, "route", action),
    }
}

fn sub_kind(name: &str) -> Result<&'static SubResourceKind> {
    ROUTER
        .child(name)
        .ok_or_else(|| anyhow::anyhow!("routers have no '{}' records", name))
}

fn child(ctx: &Context, inv: &Invocation, name: &str, action: ChildAction) -> Result<i32> {
    let sub = sub_kind(name)?;
    let conn = inv.connect()?;
    let mut io = TerminalPrompt::new();

    match action {
        ChildAction::List {
            router,
            dry_run,
            output,
        } => {
            let options = MutationOptions {
                dry_run,
                ..mutation_options(ctx, &Default::default())
            };
            let outcome = conn.block_on(conn.dispatcher(&mut io, options).list_child(&ROUTER, &router, sub));
            Renderer::new(ctx, inv.format(&output), CHILD_COLUMNS).render(outcome, "")
        }
        ChildAction::Add {
            router,
            name,
            description,
            mutation,
        } => {
            let flags = Flags::new()
                .set("name", name)
                .set("description", description)
                .into_payload();
            let input = assembly_input(&mutation.payload, flags, None)?;
            let outcome = conn.block_on(
                conn.dispatcher(&mut io, mutation_options(ctx, &mutation.confirm))
                    .add_child(&ROUTER, &router, sub, input),
            );
            Renderer::new(ctx, inv.format(&mutation.output), CHILD_COLUMNS)
                .render(outcome, &format!("{} created", sub.label))
        }
        ChildAction::Update {
            router,
            id,
            name,
            description,
            mutation,
        } => {
            let flags = Flags::new()
                .set("name", name)
                .set("description", description)
                .into_payload();
            let input = assembly_input(&mutation.payload, flags, None)?;
            let outcome = conn.block_on(
                conn.dispatcher(&mut io, mutation_options(ctx, &mutation.confirm))
                    .update_child(&ROUTER, &router, sub, &id, input),
            );
            Renderer::new(ctx, inv.format(&mutation.output), CHILD_COLUMNS)
                .render(outcome, &format!("{} updated", sub.label))
        }
        ChildAction::Remove {
            router,
            id,
            confirm,
            output,
        } => {
            let outcome = conn.block_on(
                conn.dispatcher(&mut io, mutation_options(ctx, &confirm))
                    .remove_child(&ROUTER, &router, sub, &id),
            );
            Renderer::new(ctx, inv.format(&output), CHILD_COLUMNS)
                .render(outcome, &format!("{} removed", sub.label))
        }
    }
}
