//! cli::commands::common
//!
//! Plumbing shared by the resource handlers: connecting to the appliance,
//! turning flag groups into engine inputs, and rendering an [`Outcome`].

use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use serde_json::{json, Value};
use tokio::runtime::Runtime;

use crate::api::{endpoints, HttpTransport};
use crate::cli::args::{ConfirmArgs, ListArgs, OutputArgs, PayloadArgs, PermissionArgs};
use crate::core::config::{Config, GroupRef};
use crate::core::kinds::GROUP;
use crate::core::payload::{load_payload_file, parse_options, Payload};
use crate::engine::assembler::AssemblyInput;
use crate::engine::permissions::{build, GroupAccess, PermissionPayload, SiteAccess};
use crate::engine::resolver::Resolver;
use crate::engine::{Context, Dispatcher, EngineError, MutationOptions, Outcome, Reply, Session};
use crate::secrets::{token_key, FileSecretStore, SecretStore};
use crate::ui::output::{self, OutputFormat, Verbosity};
use crate::ui::prompts::PromptIo;

/// Name used for a session built from `--url` alone.
pub const DIRECT_REMOTE: &str = "direct";

/// Global inputs of one invocation.
#[derive(Debug)]
pub struct Invocation {
    pub config: Config,
    pub remote: Option<String>,
    pub url: Option<String>,
    pub token: Option<String>,
}

impl Invocation {
    /// The configured default format, `table` when unset or unknown.
    pub fn default_format(&self) -> OutputFormat {
        self.config.default_format().parse().unwrap_or_default()
    }

    pub fn format(&self, args: &OutputArgs) -> OutputFormat {
        OutputFormat::from_flags(args.json, args.yaml, args.csv, self.default_format())
    }

    /// The remote this invocation talks to, and its name.
    pub fn target(&self) -> Result<(String, String, bool, Option<GroupRef>)> {
        if let Some(url) = &self.url {
            return Ok((DIRECT_REMOTE.to_string(), url.trim_end_matches('/').to_string(), false, None));
        }
        let (name, remote) = self.config.remote(self.remote.as_deref()).ok_or_else(|| match &self.remote {
            Some(name) => anyhow!("unknown remote '{}'", name),
            None => anyhow!("no remote configured, run `morpheus remote add <name> <url>` first"),
        })?;
        Ok((
            name.to_string(),
            remote.url.clone(),
            remote.insecure,
            remote.active_group.clone(),
        ))
    }

    /// Build a session against the target remote.
    pub fn connect(&self) -> Result<Connection> {
        let (name, url, insecure, active_group) = self.target()?;
        let token = match &self.token {
            Some(token) => Some(token.clone()),
            None if name == DIRECT_REMOTE => None,
            None => secret_store()?
                .get(&token_key(&name))
                .context("Failed to read stored token")?,
        };
        let transport = HttpTransport::new(&url, token, insecure).context("Failed to build HTTP client")?;
        let session = Session::new(&name, &url, Arc::new(transport)).with_active_group(active_group);
        Connection::new(session)
    }
}

/// Open the token store.
pub fn secret_store() -> Result<FileSecretStore> {
    FileSecretStore::new().context("Failed to initialize secret store")
}

/// A session plus the runtime its requests run on.
pub struct Connection {
    runtime: Runtime,
    pub session: Session,
}

impl Connection {
    pub fn new(session: Session) -> Result<Self> {
        let runtime = Runtime::new().context("Failed to start async runtime")?;
        Ok(Self { runtime, session })
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn dispatcher<'a>(&'a self, io: &'a mut dyn PromptIo, options: MutationOptions) -> Dispatcher<'a> {
        Dispatcher::new(&self.session, io, options)
    }

    /// Group id from `--group`, else the cached active group.
    pub fn group_id(&self, token: Option<&str>) -> Result<Option<u64>, EngineError> {
        match token {
            Some(token) => {
                let group = self.block_on(Resolver::new(&self.session).resolve(&GROUP, token))?;
                Ok(Some(group.id))
            }
            None => Ok(self.session.active_group.as_ref().map(|g| g.id)),
        }
    }
}

pub fn mutation_options(ctx: &Context, confirm: &ConfirmArgs) -> MutationOptions {
    MutationOptions {
        dry_run: confirm.dry_run,
        yes: confirm.yes,
        no_prompt: ctx.no_prompt,
    }
}

/// Query parameters of a `list`.
pub fn list_params(args: &ListArgs) -> endpoints::Params {
    let mut params = Vec::new();
    if let Some(phrase) = &args.phrase {
        params.push(("phrase".to_string(), phrase.clone()));
    }
    if let Some(max) = args.max {
        params.push(("max".to_string(), max.to_string()));
    }
    if let Some(offset) = args.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    params
}

/// Access block from the permission flags; `None` when none was given.
pub fn permissions(args: &PermissionArgs) -> Result<Option<PermissionPayload>> {
    if args.is_empty() {
        return Ok(None);
    }
    let group_access = match args.group_access.as_deref().map(str::trim) {
        None => None,
        Some("all") => Some(GroupAccess::All(true)),
        Some("none") => Some(GroupAccess::All(false)),
        Some(ids) => {
            let sites = ids
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    let id: u64 = s
                        .parse()
                        .map_err(|_| anyhow!("invalid group id '{}' in --group-access", s))?;
                    Ok(SiteAccess {
                        id,
                        default: args.group_defaults.contains(&id).then_some(true),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Some(GroupAccess::Sites(sites))
        }
    };
    Ok(Some(build(args.visibility, args.tenants.clone(), group_access)))
}

/// Engine input from the payload flags plus named flags.
pub fn assembly_input(
    payload: &PayloadArgs,
    flags: Payload,
    permissions: Option<PermissionPayload>,
) -> Result<AssemblyInput> {
    let payload_file = payload
        .payload
        .as_deref()
        .map(load_payload_file)
        .transpose()?;
    Ok(AssemblyInput {
        payload_file,
        options: parse_options(&payload.options)?,
        flags,
        permissions,
    })
}

/// Collects named flags into a payload, skipping the unset ones.
#[derive(Debug, Default)]
pub struct Flags(Payload);

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: &str, value: Option<impl Into<Value>>) -> Self {
        if let Some(value) = value {
            self.0.set(path, value.into());
        }
        self
    }

    pub fn reference(self, path: &str, id: Option<u64>) -> Self {
        self.set(path, id.map(|id| json!({ "id": id })))
    }

    pub fn into_payload(self) -> Payload {
        self.0
    }
}

/// Prints an outcome in the selected format and returns the exit code.
pub struct Renderer<'c> {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    pub columns: &'c [(&'c str, &'c str)],
}

impl<'c> Renderer<'c> {
    pub fn new(ctx: &Context, format: OutputFormat, columns: &'c [(&'c str, &'c str)]) -> Self {
        Self {
            format,
            verbosity: Verbosity::from_flags(ctx.quiet, ctx.debug),
            columns,
        }
    }

    /// Render `outcome`; `done` is printed for replies that carry no record.
    pub fn render(&self, outcome: Outcome<Reply>, done: &str) -> Result<i32> {
        let code = outcome.exit_code();
        match outcome {
            Outcome::Proceed(reply) => self.reply(reply, done)?,
            Outcome::Aborted => output::print("Aborted.", self.verbosity),
            Outcome::Failed(err) => self.failure(&err),
        }
        Ok(code)
    }

    fn reply(&self, reply: Reply, done: &str) -> Result<()> {
        let text = match reply {
            Reply::Preview(requests) => output::format_previews(&requests, self.format)?,
            Reply::Record(record) => output::format_record(&record, self.format)?,
            Reply::List { rows, raw } => output::format_list(&rows, &raw, self.columns, self.format)?,
            Reply::Batch(report) => output::format_batch(&report, self.format)?,
            Reply::Done(response) => match self.format {
                OutputFormat::Json | OutputFormat::Yaml => output::format_record(&response, self.format)?,
                _ => {
                    output::success(done, self.verbosity);
                    return Ok(());
                }
            },
        };
        println!("{}", text);
        Ok(())
    }

    fn failure(&self, err: &EngineError) {
        report(err);
    }
}

/// Candidate table to print after an ambiguity error.
pub fn candidate_listing(err: &EngineError) -> Option<String> {
    match err {
        EngineError::Ambiguous { candidates, .. } => Some(output::format_candidates(candidates)),
        _ => None,
    }
}

fn report(err: &EngineError) {
    output::error(err);
    if let Some(listing) = candidate_listing(err) {
        println!("{}", listing);
    }
    if err.wants_usage() {
        eprintln!("Run with --help for usage.");
    }
}

/// Exit code for a plain engine error outside the dispatcher.
pub fn fail(err: impl Into<EngineError>) -> i32 {
    let err = err.into();
    report(&err);
    err.exit_code()
}

/// Refuse to run interactive-only steps without a terminal.
pub fn require_interactive(ctx: &Context, what: &str) -> Result<()> {
    if ctx.no_prompt {
        bail!("{} requires a prompt; pass it as a flag instead", what);
    }
    Ok(())
}
