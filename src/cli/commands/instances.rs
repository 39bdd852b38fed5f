//! cli::commands::instances
//!
//! `morpheus instances ...`: CRUD, the batch state verbs, clone and view.
//!
//! `copies` and `zoneId` are root-level body fields; the assembler keeps
//! them out of the `instance` object.

use anyhow::{Context as _, Result};

use super::common::{assembly_input, fail, mutation_options, permissions, Flags, Invocation, Renderer};
use super::resources;
use crate::cli::args::{InstanceAction, InstanceFields};
use crate::core::kinds::INSTANCE;
use crate::core::payload::Payload;
use crate::engine::dispatcher::AddRequest;
use crate::engine::resolver::Resolver;
use crate::engine::Context;
use crate::ui::output;
use crate::ui::prompts::TerminalPrompt;

fn fields(fields: &InstanceFields, name: Option<&str>, group: Option<u64>) -> Payload {
    Flags::new()
        .set("name", name)
        .set("description", fields.description.as_deref())
        .reference("site", group)
        .set("zoneId", fields.cloud)
        .set("copies", fields.copies)
        .into_payload()
}

pub fn run(ctx: &Context, inv: &Invocation, action: InstanceAction) -> Result<i32> {
    match action {
        InstanceAction::List(args) => resources::list(ctx, inv, &INSTANCE, &args),
        InstanceAction::Get(args) => resources::get(ctx, inv, &INSTANCE, &args),
        InstanceAction::Add {
            name,
            instance_type,
            fields: instance_fields,
            permissions: permission_args,
            mutation,
        } => {
            let conn = inv.connect()?;
            let group = match conn.group_id(instance_fields.group.as_deref()) {
                Ok(group) => group,
                Err(err) => return Ok(fail(err)),
            };
            let request = AddRequest {
                type_token: instance_type,
                name,
                input: assembly_input(
                    &mutation.payload,
                    fields(&instance_fields, None, group),
                    permissions(&permission_args)?,
                )?,
            };
            resources::add(ctx, inv, &conn, &INSTANCE, request, &mutation)
        }
        InstanceAction::Update {
            id,
            name,
            fields: instance_fields,
            permissions: permission_args,
            mutation,
        } => {
            let conn = inv.connect()?;
            let group = match instance_fields.group.as_deref() {
                Some(token) => match conn.group_id(Some(token)) {
                    Ok(group) => group,
                    Err(err) => return Ok(fail(err)),
                },
                None => None,
            };
            let input = assembly_input(
                &mutation.payload,
                fields(&instance_fields, name.as_deref(), group),
                permissions(&permission_args)?,
            )?;
            resources::update(ctx, inv, &conn, &INSTANCE, &id, input, &mutation)
        }
        InstanceAction::Remove(args) => resources::remove(ctx, inv, &INSTANCE, &args),
        InstanceAction::ListTypes(args) => resources::list_types(ctx, inv, &INSTANCE, &args),
        InstanceAction::GetType(args) => resources::get_type(ctx, inv, &INSTANCE, &args),
        InstanceAction::Stop(args) => resources::action(ctx, inv, &INSTANCE, "stop", &args),
        InstanceAction::Start(args) => resources::action(ctx, inv, &INSTANCE, "start", &args),
        InstanceAction::Restart(args) => resources::action(ctx, inv, &INSTANCE, "restart", &args),
        InstanceAction::Suspend(args) => resources::action(ctx, inv, &INSTANCE, "suspend", &args),
        InstanceAction::Eject(args) => resources::action(ctx, inv, &INSTANCE, "eject", &args),
        InstanceAction::Lock(args) => resources::action(ctx, inv, &INSTANCE, "lock", &args),
        InstanceAction::Unlock(args) => resources::action(ctx, inv, &INSTANCE, "unlock", &args),
        InstanceAction::CloneInstance {
            id,
            name,
            group,
            mutation,
        } => {
            let conn = inv.connect()?;
            let group = match group.as_deref() {
                Some(token) => match conn.group_id(Some(token)) {
                    Ok(group) => group,
                    Err(err) => return Ok(fail(err)),
                },
                None => None,
            };
            let flags = Flags::new().reference("group", group).into_payload();
            let input = assembly_input(&mutation.payload, flags, None)?;
            let mut io = TerminalPrompt::new();
            let outcome = conn.block_on(
                conn.dispatcher(&mut io, mutation_options(ctx, &mutation.confirm))
                    .clone_record(&INSTANCE, &id, name, input),
            );
            Renderer::new(ctx, inv.format(&mutation.output), INSTANCE.columns)
                .render(outcome, "Clone requested")
        }
        InstanceAction::View { id } => view(ctx, inv, &id),
    }
}

/// Open the instance page of the web UI.
fn view(ctx: &Context, inv: &Invocation, token: &str) -> Result<i32> {
    let conn = inv.connect()?;
    let instance = match conn.block_on(Resolver::new(&conn.session).resolve(&INSTANCE, token)) {
        Ok(instance) => instance,
        Err(err) => return Ok(fail(err)),
    };
    let Some(ui_path) = INSTANCE.ui_path else {
        return Ok(fail(crate::engine::EngineError::Validation(
            "instances have no web UI page".to_string(),
        )));
    };
    let link = format!("{}/{}/{}", conn.session.url.trim_end_matches('/'), ui_path, instance.id);
    output::print(&link, output::Verbosity::from_flags(ctx.quiet, ctx.debug));
    open::that(&link).with_context(|| format!("Failed to open {}", link))?;
    Ok(crate::engine::EXIT_OK)
}
