//! engine::dispatcher
//!
//! The per-verb state machine.
//!
//! # States
//!
//! ```text
//! Resolve ──> [NotFound | Ambiguous]
//!    └─> CheckCapability ──> [Unsupported]          (sub-resources only)
//!          └─> add:    Schema -> Prompt -> Assemble
//!              update: Assemble (supplied values only)
//!                └─> Confirm ──> [Aborted]           (remove and actions)
//!                      └─> DryRunGate ──> [Previewed]
//!                            └─> Execute ──> [Success | RemoteError]
//! ```
//!
//! Batch verbs resolve every identifier before the first request. Once
//! execution starts each item is attempted independently and the results
//! are collected in a [`BatchReport`]; nothing is rolled back.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::assembler::{Assembler, AssemblyInput, Placement};
use super::dry_run::{DryRunGate, Gated};
use super::outcome::{EngineError, Halt, Outcome, EXIT_ABORTED, EXIT_FAILURE, EXIT_OK};
use super::permissions::build;
use super::prompt::{normalize_supplied, PromptEngine, PromptRequest};
use super::resolver::{is_id, parse_id, resolve_child, Resolver};
use super::schema::{fields_for, SchemaProvider};
use super::Session;
use crate::api::{endpoints, ApiRequest};
use crate::core::kinds::{ResourceKind, SchemaSource, SubResourceKind};
use crate::core::payload::{display_value, Payload};
use crate::core::types::{id_of, Resource, ResourceType};
use crate::ui::prompts::{PromptError, PromptIo};

const UPDATE_NOOP: &str = "Specify at least one option to update";

/// Per-invocation switches for mutating verbs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationOptions {
    /// Preview requests instead of sending them.
    pub dry_run: bool,
    /// Skip confirmations.
    pub yes: bool,
    /// Never prompt.
    pub no_prompt: bool,
}

/// Result of one item of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated batch results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub verb: String,
    pub items: Vec<ItemResult>,
}

impl BatchReport {
    pub fn new(verb: &str) -> Self {
        Self {
            verb: verb.to_string(),
            items: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.error.is_some()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// What a successful dispatch produced.
#[derive(Debug)]
pub enum Reply {
    /// Dry run: the requests that would have been sent, in order.
    Preview(Vec<ApiRequest>),
    /// One detailed record.
    Record(Value),
    /// List rows plus the raw response they came from.
    List { rows: Vec<Value>, raw: Value },
    /// Raw response of a request that returns no record.
    Done(Value),
    Batch(BatchReport),
}

impl Reply {
    pub fn exit_code(&self) -> i32 {
        match self {
            Reply::Batch(report) if !report.is_success() => EXIT_FAILURE,
            _ => EXIT_OK,
        }
    }
}

impl Outcome<Reply> {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Proceed(reply) => reply.exit_code(),
            Outcome::Aborted => EXIT_ABORTED,
            Outcome::Failed(err) => err.exit_code(),
        }
    }
}

/// Inputs of an `add`.
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    /// Type id, name or code (kinds with a type catalog).
    pub type_token: Option<String>,
    /// Name given positionally; its descriptor is not prompted.
    pub name: Option<String>,
    pub input: AssemblyInput,
}

/// Runs verbs against one session.
pub struct Dispatcher<'a> {
    session: &'a Session,
    io: &'a mut dyn PromptIo,
    options: MutationOptions,
    gate: DryRunGate,
}

impl<'a> Dispatcher<'a> {
    pub fn new(session: &'a Session, io: &'a mut dyn PromptIo, options: MutationOptions) -> Self {
        Self {
            session,
            io,
            options,
            gate: DryRunGate::new(options.dry_run),
        }
    }

    // =========================================================================
    // Verbs
    // =========================================================================

    pub async fn list(&mut self, kind: &ResourceKind, params: endpoints::Params) -> Outcome<Reply> {
        let request = endpoints::list(kind, params);
        self.try_list(request, kind.plural_key).await.into()
    }

    pub async fn get(&mut self, kind: &ResourceKind, token: &str) -> Outcome<Reply> {
        self.try_get(kind, token).await.into()
    }

    pub async fn add(&mut self, kind: &ResourceKind, request: AddRequest) -> Outcome<Reply> {
        self.try_add(kind, request).await.into()
    }

    /// Update with supplied values only; nothing is prompted.
    pub async fn update(&mut self, kind: &ResourceKind, token: &str, input: AssemblyInput) -> Outcome<Reply> {
        self.try_update(kind, token, input).await.into()
    }

    pub async fn remove(
        &mut self,
        kind: &ResourceKind,
        tokens: &[String],
        params: endpoints::Params,
    ) -> Outcome<Reply> {
        self.try_remove(kind, tokens, params).await.into()
    }

    /// A state-changing verb (`stop`, `lock`, ...) over 1..N records.
    pub async fn action(&mut self, kind: &ResourceKind, tokens: &[String], action: &str) -> Outcome<Reply> {
        self.try_action(kind, tokens, action).await.into()
    }

    /// Copy an existing record; its values are the prompt defaults.
    pub async fn clone_record(
        &mut self,
        kind: &ResourceKind,
        token: &str,
        name: Option<String>,
        input: AssemblyInput,
    ) -> Outcome<Reply> {
        self.try_clone(kind, token, name, input).await.into()
    }

    pub async fn list_types(&mut self, kind: &ResourceKind, params: endpoints::Params) -> Outcome<Reply> {
        let Some(catalog) = kind.catalog() else {
            return Outcome::Failed(no_types(kind));
        };
        self.try_list(endpoints::type_list(catalog, params), catalog.plural_key)
            .await
            .into()
    }

    pub async fn get_type(&mut self, kind: &ResourceKind, token: &str) -> Outcome<Reply> {
        if kind.catalog().is_none() {
            return Outcome::Failed(no_types(kind));
        }
        let result = SchemaProvider::new(self.session)
            .type_for(kind, token)
            .await
            .map(|rt| Reply::Record(type_value(&rt)));
        result.map_err(Halt::from).into()
    }

    pub async fn list_child(
        &mut self,
        kind: &ResourceKind,
        parent: &str,
        sub: &SubResourceKind,
    ) -> Outcome<Reply> {
        self.try_list_child(kind, parent, sub).await.into()
    }

    pub async fn add_child(
        &mut self,
        kind: &ResourceKind,
        parent: &str,
        sub: &SubResourceKind,
        input: AssemblyInput,
    ) -> Outcome<Reply> {
        self.try_add_child(kind, parent, sub, input).await.into()
    }

    pub async fn update_child(
        &mut self,
        kind: &ResourceKind,
        parent: &str,
        sub: &SubResourceKind,
        child: &str,
        input: AssemblyInput,
    ) -> Outcome<Reply> {
        self.try_update_child(kind, parent, sub, child, input)
            .await
            .into()
    }

    pub async fn remove_child(
        &mut self,
        kind: &ResourceKind,
        parent: &str,
        sub: &SubResourceKind,
        child: &str,
    ) -> Outcome<Reply> {
        self.try_remove_child(kind, parent, sub, child).await.into()
    }

    // =========================================================================
    // State machine steps
    // =========================================================================

    async fn try_list(&mut self, request: ApiRequest, plural_key: &str) -> Result<Reply, Halt> {
        match self.send(request).await? {
            Gated::Preview(_) => Ok(self.previews()),
            Gated::Executed(raw) => {
                let rows = raw
                    .get(plural_key)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                Ok(Reply::List { rows, raw })
            }
        }
    }

    async fn try_get(&mut self, kind: &ResourceKind, token: &str) -> Result<Reply, Halt> {
        if self.gate.is_dry_run() {
            // The first request resolution would make.
            let request = if is_id(token.trim()) {
                endpoints::get(kind, parse_id(kind, token.trim())?)
            } else {
                endpoints::list(kind, vec![(kind.search_param.to_string(), token.trim().to_string())])
            };
            self.send(request).await?;
            return Ok(self.previews());
        }
        let record = Resolver::new(self.session).resolve(kind, token).await?;
        Ok(Reply::Record(record.raw))
    }

    async fn try_add(&mut self, kind: &ResourceKind, request: AddRequest) -> Result<Reply, Halt> {
        let placement = Placement::for_kind(kind);
        let assembler = Assembler::new(placement);
        let mut input = request.input;

        if let Some(name) = &request.name {
            input
                .flags
                .set(&format!("{}.{}", kind.singular_key, kind.name_field), json!(name));
        }
        if !input.has_payload_file() && input.permissions.is_none() && kind.permission_key.is_some() {
            input.permissions = Some(build(None, None, None));
        }

        let resource_type = if input.has_payload_file() && request.type_token.is_none() {
            None
        } else {
            Some(self.add_type(kind, request.type_token.as_deref()).await?)
        };
        if let (Some(catalog), Some(id)) = (
            kind.catalog(),
            resource_type.as_ref().and_then(|rt| rt.id),
        ) {
            input.flags.set(
                &format!("{}.{}", kind.singular_key, catalog.payload_field),
                json!({ "id": id }),
            );
        }

        let mut supplied = assembler.supplied(&input, Some(kind));
        let mut answers = Payload::new();
        if let (false, Some(rt)) = (input.has_payload_file(), &resource_type) {
            let exclude: Vec<&str> = request.name.iter().map(|_| kind.name_field).collect();
            let descriptors = fields_for(rt, "", &exclude, true);
            supplied = normalize_supplied(&descriptors, placement, &supplied)?;
            let option_params = self
                .session
                .active_group
                .as_ref()
                .map(|g| vec![("siteId".to_string(), g.id.to_string())])
                .unwrap_or_default();
            answers = PromptEngine::new(self.session, &mut *self.io, self.options.no_prompt)
                .prompt(PromptRequest {
                    descriptors: &descriptors,
                    placement,
                    supplied: &supplied,
                    record: None,
                    option_params,
                })
                .await?;
        }

        let noop = format!("Nothing to create for {}", kind.label.to_lowercase());
        let body = assembler.finish(&supplied, &answers, &noop)?;

        match self.send(endpoints::create(kind, body.into_value())).await? {
            Gated::Preview(_) => Ok(self.previews()),
            Gated::Executed(response) => {
                let created = response
                    .get(kind.singular_key)
                    .and_then(|r| r.get("id"))
                    .and_then(id_of);
                match created {
                    Some(id) => {
                        debug!(id, "created, fetching details");
                        let record = Resolver::new(self.session).get_by_id(kind, id).await?;
                        Ok(Reply::Record(record.raw))
                    }
                    None => Ok(Reply::Done(response)),
                }
            }
        }
    }

    /// Resolve the type for an add, asking for it when the kind has a
    /// catalog and none was given.
    async fn add_type(&mut self, kind: &ResourceKind, token: Option<&str>) -> Result<ResourceType, Halt> {
        let provider = SchemaProvider::new(self.session);
        let token = match (kind.schema, token) {
            (_, Some(token)) => token.to_string(),
            (SchemaSource::Catalog(_), None) => {
                if self.options.no_prompt {
                    return Err(EngineError::Validation(format!(
                        "{} type is required (--type)",
                        kind.label
                    ))
                    .into());
                }
                let types = provider.all_types(kind).await?;
                let listing: Vec<String> = types
                    .iter()
                    .map(|t| {
                        format!(
                            "  * {} [{}]",
                            t.get("name").map(display_value).unwrap_or_default(),
                            t.get("code").map(display_value).unwrap_or_default()
                        )
                    })
                    .collect();
                self.io.show(&listing.join("\n"));
                loop {
                    let answer = self.io.ask(&format!("{} Type", kind.label), None)?;
                    if !answer.trim().is_empty() {
                        break answer.trim().to_string();
                    }
                    self.io.show("Type is required");
                }
            }
            (_, None) => String::new(),
        };
        Ok(provider.type_for(kind, &token).await?)
    }

    async fn try_update(&mut self, kind: &ResourceKind, token: &str, input: AssemblyInput) -> Result<Reply, Halt> {
        let record = Resolver::new(self.session).resolve(kind, token).await?;
        let placement = Placement::for_kind(kind);
        let assembler = Assembler::new(placement);
        let mut body = assembler.assemble(&input, Some(kind), &Payload::new(), UPDATE_NOOP)?;

        if !input.options.is_empty() && !matches!(kind.schema, SchemaSource::None) {
            let rt = SchemaProvider::new(self.session).type_of(kind, &record).await?;
            body = normalize_supplied(&fields_for(&rt, "", &[], false), placement, &body)?;
        }

        match self
            .send(endpoints::update(kind, record.id, body.into_value()))
            .await?
        {
            Gated::Preview(_) => Ok(self.previews()),
            Gated::Executed(_) => {
                let record = Resolver::new(self.session).get_by_id(kind, record.id).await?;
                Ok(Reply::Record(record.raw))
            }
        }
    }

    async fn try_remove(
        &mut self,
        kind: &ResourceKind,
        tokens: &[String],
        params: endpoints::Params,
    ) -> Result<Reply, Halt> {
        let records = Resolver::new(self.session).resolve_many(kind, tokens).await?;
        self.confirm(&format!(
            "Are you sure you want to delete {} {}?",
            kind.label.to_lowercase(),
            names(&records)
        ))?;
        self.run_batch("remove", &records, |r| {
            endpoints::destroy(kind, r.id, params.clone())
        })
        .await
    }

    async fn try_action(&mut self, kind: &ResourceKind, tokens: &[String], action: &str) -> Result<Reply, Halt> {
        let records = Resolver::new(self.session).resolve_many(kind, tokens).await?;
        self.confirm(&format!(
            "Are you sure you want to {} {} {}?",
            action,
            kind.label.to_lowercase(),
            names(&records)
        ))?;
        self.run_batch(action, &records, |r| endpoints::action(kind, r.id, action, None))
            .await
    }

    async fn try_clone(
        &mut self,
        kind: &ResourceKind,
        token: &str,
        name: Option<String>,
        mut input: AssemblyInput,
    ) -> Result<Reply, Halt> {
        let source = Resolver::new(self.session).resolve(kind, token).await?;
        let placement = Placement::for_kind(kind);
        let assembler = Assembler::new(placement);
        if let Some(name) = &name {
            input
                .flags
                .set(&format!("{}.{}", kind.singular_key, kind.name_field), json!(name));
        }

        let mut supplied = assembler.supplied(&input, Some(kind));
        let mut answers = Payload::new();
        if !input.has_payload_file() {
            let rt = SchemaProvider::new(self.session).type_of(kind, &source).await?;
            let descriptors = fields_for(&rt, "", &[], true);
            supplied = normalize_supplied(&descriptors, placement, &supplied)?;
            answers = PromptEngine::new(self.session, &mut *self.io, self.options.no_prompt)
                .prompt(PromptRequest {
                    descriptors: &descriptors,
                    placement,
                    supplied: &supplied,
                    record: Some(&source.raw),
                    option_params: Vec::new(),
                })
                .await?;
        }

        let noop = format!("Nothing to clone for {}", kind.label.to_lowercase());
        let body = assembler.finish(&supplied, &answers, &noop)?;
        match self
            .send(endpoints::action(kind, source.id, "clone", Some(body.into_value())))
            .await?
        {
            Gated::Preview(_) => Ok(self.previews()),
            Gated::Executed(response) => Ok(Reply::Done(response)),
        }
    }

    /// Resolve the parent and check the capability gating `sub`.
    async fn parent_scope(
        &mut self,
        kind: &ResourceKind,
        parent: &str,
        sub: &SubResourceKind,
    ) -> Result<(Resource, ResourceType), Halt> {
        let parent = Resolver::new(self.session).resolve(kind, parent).await?;
        let rt = SchemaProvider::new(self.session).type_of(kind, &parent).await?;
        if !rt.has(sub.capability) {
            return Err(EngineError::Unsupported {
                feature: sub.feature.to_string(),
                type_name: rt.name.clone(),
            }
            .into());
        }
        Ok((parent, rt))
    }

    async fn try_list_child(&mut self, kind: &ResourceKind, parent: &str, sub: &SubResourceKind) -> Result<Reply, Halt> {
        let (parent, _) = self.parent_scope(kind, parent, sub).await?;
        self.try_list(endpoints::child_list(kind, parent.id, sub, Vec::new()), sub.plural_key)
            .await
    }

    async fn try_add_child(
        &mut self,
        kind: &ResourceKind,
        parent: &str,
        sub: &SubResourceKind,
        input: AssemblyInput,
    ) -> Result<Reply, Halt> {
        let (parent, rt) = self.parent_scope(kind, parent, sub).await?;
        let placement = Placement::for_child(sub);
        let assembler = Assembler::new(placement);

        let mut supplied = assembler.supplied(&input, None);
        let mut answers = Payload::new();
        if !input.has_payload_file() {
            let descriptors = fields_for(&rt, sub.name, &[], true);
            supplied = normalize_supplied(&descriptors, placement, &supplied)?;
            let option_params = sub
                .option_params
                .iter()
                .filter_map(|(param, path)| {
                    parent
                        .field(path)
                        .map(|v| (param.to_string(), display_value(v)))
                })
                .collect();
            answers = PromptEngine::new(self.session, &mut *self.io, self.options.no_prompt)
                .prompt(PromptRequest {
                    descriptors: &descriptors,
                    placement,
                    supplied: &supplied,
                    record: None,
                    option_params,
                })
                .await?;
        }

        let noop = format!("Nothing to create for {}", sub.label.to_lowercase());
        let body = assembler.finish(&supplied, &answers, &noop)?;
        match self
            .send(endpoints::child_create(kind, parent.id, sub, body.into_value()))
            .await?
        {
            Gated::Preview(_) => Ok(self.previews()),
            Gated::Executed(response) => Ok(Reply::Done(response)),
        }
    }

    async fn try_update_child(
        &mut self,
        kind: &ResourceKind,
        parent: &str,
        sub: &SubResourceKind,
        child: &str,
        input: AssemblyInput,
    ) -> Result<Reply, Halt> {
        let (parent, rt) = self.parent_scope(kind, parent, sub).await?;
        let child = resolve_child(&parent, sub, child)?;
        let placement = Placement::for_child(sub);
        let body = Assembler::new(placement).assemble(&input, None, &Payload::new(), UPDATE_NOOP)?;
        let body = normalize_supplied(&fields_for(&rt, sub.name, &[], false), placement, &body)?;

        match self
            .send(endpoints::child_update(kind, parent.id, sub, child.id, body.into_value()))
            .await?
        {
            Gated::Preview(_) => Ok(self.previews()),
            Gated::Executed(response) => Ok(Reply::Done(response)),
        }
    }

    async fn try_remove_child(
        &mut self,
        kind: &ResourceKind,
        parent: &str,
        sub: &SubResourceKind,
        child: &str,
    ) -> Result<Reply, Halt> {
        let (parent, _) = self.parent_scope(kind, parent, sub).await?;
        let child = resolve_child(&parent, sub, child)?;
        self.confirm(&format!(
            "Are you sure you want to delete {} {}?",
            sub.label.to_lowercase(),
            child.name
        ))?;
        match self
            .send(endpoints::child_destroy(kind, parent.id, sub, child.id))
            .await?
        {
            Gated::Preview(_) => Ok(self.previews()),
            Gated::Executed(response) => Ok(Reply::Done(response)),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn send(&mut self, request: ApiRequest) -> Result<Gated, Halt> {
        Ok(self.gate.guard(self.session, request).await?)
    }

    fn previews(&mut self) -> Reply {
        Reply::Preview(self.gate.take_previews())
    }

    fn confirm(&mut self, message: &str) -> Result<(), Halt> {
        if self.options.yes || self.options.dry_run {
            return Ok(());
        }
        if self.options.no_prompt {
            return Err(EngineError::Validation(
                "confirmation required, pass --yes to proceed".to_string(),
            )
            .into());
        }
        match self.io.confirm(message, false) {
            Ok(true) => Ok(()),
            Ok(false) | Err(PromptError::Cancelled) => Err(Halt::Aborted),
            Err(e) => Err(e.into()),
        }
    }

    async fn run_batch<F>(&mut self, verb: &str, records: &[Resource], request_for: F) -> Result<Reply, Halt>
    where
        F: Fn(&Resource) -> ApiRequest,
    {
        let mut report = BatchReport::new(verb);
        for record in records {
            let error = match self.gate.guard(self.session, request_for(record)).await {
                Ok(_) => None,
                Err(e) => {
                    warn!(id = record.id, error = %e, "batch item failed");
                    Some(e.to_string())
                }
            };
            report.items.push(ItemResult {
                id: record.id,
                name: record.name.clone(),
                error,
            });
        }
        if self.gate.is_dry_run() {
            return Ok(self.previews());
        }
        Ok(Reply::Batch(report))
    }
}

fn names(records: &[Resource]) -> String {
    records
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn no_types(kind: &ResourceKind) -> EngineError {
    EngineError::Unsupported {
        feature: "Types".to_string(),
        type_name: kind.label.to_string(),
    }
}

fn type_value(rt: &ResourceType) -> Value {
    serde_json::to_value(rt).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockCollection, MockTransport};
    use crate::api::{Method, TransportError};
    use crate::core::kinds::{INSTANCE, ROLE, ROUTER};
    use crate::ui::prompts::ScriptedPrompt;
    use std::sync::Arc;

    fn instances() -> MockTransport {
        MockTransport::new().with_collection(MockCollection::for_kind(&INSTANCE).records(vec![
            json!({"id": 10, "name": "app-1"}),
            json!({"id": 11, "name": "app-2"}),
            json!({"id": 12, "name": "app-3"}),
        ]))
    }

    fn tokens(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    #[tokio::test]
    async fn declined_confirmation_aborts_without_mutation() {
        let mock = instances();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let mut io = ScriptedPrompt::new().confirms([false]);
        let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
            .action(&INSTANCE, &tokens("10,11"), "stop")
            .await;
        assert!(matches!(outcome, Outcome::Aborted));
        assert_eq!(outcome.exit_code(), EXIT_ABORTED);
        assert_eq!(mock.mutation_count(), 0);
    }

    #[tokio::test]
    async fn batch_collects_failures_and_keeps_going() {
        let mock = instances().fail_on(crate::api::mock::FailOn::Request {
            method: Method::Put,
            path: "/api/instances/11/restart".to_string(),
            error: TransportError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        });
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let mut io = ScriptedPrompt::new();
        let options = MutationOptions {
            yes: true,
            ..Default::default()
        };
        let outcome = Dispatcher::new(&session, &mut io, options)
            .action(&INSTANCE, &tokens("10,11,12"), "restart")
            .await;

        assert_eq!(outcome.exit_code(), EXIT_FAILURE);
        match outcome {
            Outcome::Proceed(Reply::Batch(report)) => {
                assert_eq!(report.failed(), 1);
                assert_eq!(report.items.len(), 3);
                assert_eq!(report.items[1].error.as_deref(), Some("500 - boom"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(mock.mutation_count(), 3);
    }

    #[tokio::test]
    async fn role_add_prompts_and_refetches() {
        let mock = MockTransport::new()
            .with_collection(MockCollection::for_kind(&ROLE))
            .with_stub(Method::Get, "/api/options/roles", json!({"data": []}));
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let mut io = ScriptedPrompt::new().answers(["ops team", "", "", "yes", "no"]);
        let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
            .add(
                &ROLE,
                AddRequest {
                    name: Some("ops".to_string()),
                    ..Default::default()
                },
            )
            .await;

        let record = match outcome {
            Outcome::Proceed(Reply::Record(record)) => record,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(record["authority"], "ops");
        assert_eq!(record["roleType"], "user");
        assert_eq!(record["multitenant"], true);
        assert_eq!(record["multitenantLocked"], false);
        assert!(!io.asked.contains(&"Name".to_string()));

        let ops = mock.operations();
        assert_eq!(ops.last().unwrap().method, Method::Get);
        assert_eq!(mock.mutation_count(), 1);
    }

    #[tokio::test]
    async fn unsupported_child_stops_before_prompting() {
        let mock = MockTransport::new()
            .with_collection(
                MockCollection::for_kind(&ROUTER).record(json!({"id": 42, "name": "edge", "type": {"id": 3}})),
            )
            .with_collection(
                MockCollection::for_catalog(ROUTER.catalog().unwrap())
                    .record(json!({"id": 3, "name": "Tier-1", "hasFirewall": false})),
            );
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let mut io = ScriptedPrompt::new();
        let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
            .add_child(&ROUTER, "42", ROUTER.child("rule").unwrap(), AssemblyInput::default())
            .await;

        assert_eq!(
            outcome.failure().unwrap().to_string(),
            "Firewall not supported for Tier-1"
        );
        assert_eq!(io.question_count(), 0);
        assert_eq!(mock.mutation_count(), 0);
    }

    #[tokio::test]
    async fn dry_run_get_previews_lookup() {
        let mock = instances();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let mut io = ScriptedPrompt::new();
        let options = MutationOptions {
            dry_run: true,
            ..Default::default()
        };
        let outcome = Dispatcher::new(&session, &mut io, options)
            .get(&INSTANCE, "app-1")
            .await;
        match outcome {
            Outcome::Proceed(Reply::Preview(requests)) => {
                assert_eq!(requests.len(), 1);
                assert_eq!(requests[0].to_string(), "GET /api/instances?name=app-1");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(mock.operations().is_empty());
    }

    #[tokio::test]
    async fn dry_run_get_of_oversized_id_is_not_found() {
        let mock = instances();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let mut io = ScriptedPrompt::new();
        let token = "99999999999999999999999";

        let preview = Dispatcher::new(&session, &mut io, MutationOptions { dry_run: true, ..Default::default() })
            .get(&INSTANCE, token)
            .await;
        let live = Dispatcher::new(&session, &mut io, MutationOptions::default())
            .get(&INSTANCE, token)
            .await;

        assert!(matches!(preview.failure(), Some(EngineError::NotFound { .. })));
        assert_eq!(
            preview.failure().map(ToString::to_string),
            live.failure().map(ToString::to_string)
        );
        assert!(mock.operations().is_empty());
    }
}
