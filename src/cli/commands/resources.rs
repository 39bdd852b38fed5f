//! cli::commands::resources
//!
//! Verbs every resource kind shares. Kind-specific handlers only add their
//! named flags and call into here.

use anyhow::Result;

use super::common::{list_params, mutation_options, Connection, Invocation, Renderer};
use crate::cli::args::{BatchArgs, ConfirmArgs, GetArgs, ListCommandArgs, MutationArgs, RemoveArgs};
use crate::core::kinds::ResourceKind;
use crate::engine::assembler::AssemblyInput;
use crate::engine::dispatcher::AddRequest;
use crate::engine::{Context, MutationOptions};
use crate::ui::prompts::TerminalPrompt;

const TYPE_COLUMNS: &[(&str, &str)] = &[("ID", "id"), ("NAME", "name"), ("CODE", "code")];

fn read_only(ctx: &Context, dry_run: bool) -> MutationOptions {
    mutation_options(
        ctx,
        &ConfirmArgs {
            dry_run,
            yes: false,
        },
    )
}

pub fn list(ctx: &Context, inv: &Invocation, kind: &ResourceKind, args: &ListCommandArgs) -> Result<i32> {
    let conn = inv.connect()?;
    let mut io = TerminalPrompt::new();
    let outcome = conn.block_on(
        conn.dispatcher(&mut io, read_only(ctx, args.dry_run))
            .list(kind, list_params(&args.list)),
    );
    Renderer::new(ctx, inv.format(&args.output), kind.columns).render(outcome, "")
}

pub fn get(ctx: &Context, inv: &Invocation, kind: &ResourceKind, args: &GetArgs) -> Result<i32> {
    let conn = inv.connect()?;
    let mut io = TerminalPrompt::new();
    let outcome = conn.block_on(
        conn.dispatcher(&mut io, read_only(ctx, args.dry_run))
            .get(kind, &args.id),
    );
    Renderer::new(ctx, inv.format(&args.output), kind.columns).render(outcome, "")
}

pub fn list_types(ctx: &Context, inv: &Invocation, kind: &ResourceKind, args: &ListCommandArgs) -> Result<i32> {
    let conn = inv.connect()?;
    let mut io = TerminalPrompt::new();
    let outcome = conn.block_on(
        conn.dispatcher(&mut io, read_only(ctx, args.dry_run))
            .list_types(kind, list_params(&args.list)),
    );
    Renderer::new(ctx, inv.format(&args.output), TYPE_COLUMNS).render(outcome, "")
}

pub fn get_type(ctx: &Context, inv: &Invocation, kind: &ResourceKind, args: &GetArgs) -> Result<i32> {
    let conn = inv.connect()?;
    let mut io = TerminalPrompt::new();
    let outcome = conn.block_on(
        conn.dispatcher(&mut io, read_only(ctx, args.dry_run))
            .get_type(kind, &args.id),
    );
    Renderer::new(ctx, inv.format(&args.output), TYPE_COLUMNS).render(outcome, "")
}

pub fn add(
    ctx: &Context,
    inv: &Invocation,
    conn: &Connection,
    kind: &ResourceKind,
    request: AddRequest,
    mutation: &MutationArgs,
) -> Result<i32> {
    let mut io = TerminalPrompt::new();
    let outcome = conn.block_on(
        conn.dispatcher(&mut io, mutation_options(ctx, &mutation.confirm))
            .add(kind, request),
    );
    Renderer::new(ctx, inv.format(&mutation.output), kind.columns)
        .render(outcome, &format!("{} created", kind.label))
}

pub fn update(
    ctx: &Context,
    inv: &Invocation,
    conn: &Connection,
    kind: &ResourceKind,
    id: &str,
    input: AssemblyInput,
    mutation: &MutationArgs,
) -> Result<i32> {
    let mut io = TerminalPrompt::new();
    let outcome = conn.block_on(
        conn.dispatcher(&mut io, mutation_options(ctx, &mutation.confirm))
            .update(kind, id, input),
    );
    Renderer::new(ctx, inv.format(&mutation.output), kind.columns)
        .render(outcome, &format!("{} updated", kind.label))
}

pub fn remove(ctx: &Context, inv: &Invocation, kind: &ResourceKind, args: &RemoveArgs) -> Result<i32> {
    let conn = inv.connect()?;
    let params = if args.force {
        vec![("force".to_string(), "true".to_string())]
    } else {
        Vec::new()
    };
    let mut io = TerminalPrompt::new();
    let outcome = conn.block_on(
        conn.dispatcher(&mut io, mutation_options(ctx, &args.batch.confirm))
            .remove(kind, &args.batch.ids, params),
    );
    Renderer::new(ctx, inv.format(&args.batch.output), kind.columns).render(outcome, "")
}

/// A state-changing verb over 1..N records.
pub fn action(ctx: &Context, inv: &Invocation, kind: &ResourceKind, action: &str, args: &BatchArgs) -> Result<i32> {
    let conn = inv.connect()?;
    let mut io = TerminalPrompt::new();
    let outcome = conn.block_on(
        conn.dispatcher(&mut io, mutation_options(ctx, &args.confirm))
            .action(kind, &args.ids, action),
    );
    Renderer::new(ctx, inv.format(&args.output), kind.columns).render(outcome, "")
}
