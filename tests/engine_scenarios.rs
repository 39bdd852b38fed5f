//! End-to-end engine scenarios against the in-memory appliance.
//!
//! Each test drives a [`Dispatcher`] verb through a `MockTransport` and a
//! `ScriptedPrompt`, then asserts on the outcome, the exit code and the
//! requests the appliance saw.

use std::sync::Arc;

use serde_json::json;

use morpheus_cli::api::mock::{MockCollection, MockTransport};
use morpheus_cli::api::Method;
use morpheus_cli::core::config::GroupRef;
use morpheus_cli::core::kinds::{INSTANCE, NETWORK, ROLE, ROUTER};
use morpheus_cli::core::payload::{parse_options, Payload};
use morpheus_cli::engine::assembler::AssemblyInput;
use morpheus_cli::engine::dispatcher::AddRequest;
use morpheus_cli::engine::resolver::Resolver;
use morpheus_cli::engine::{
    Dispatcher, EngineError, MutationOptions, Outcome, Reply, Session, EXIT_ABORTED, EXIT_FAILURE,
    EXIT_OK,
};
use morpheus_cli::ui::prompts::ScriptedPrompt;

// =============================================================================
// Fixtures
// =============================================================================

fn router_catalog() -> MockCollection {
    MockCollection::for_catalog(ROUTER.catalog().unwrap()).records(vec![
        json!({
            "id": 3,
            "code": "nsx-t1",
            "name": "Tier-1",
            "hasFirewall": false,
            "hasRouting": true,
            "optionTypes": [
                {"fieldName": "name", "fieldLabel": "Name", "type": "text", "required": true, "displayOrder": 1},
                {"fieldName": "description", "fieldLabel": "Description", "type": "text", "displayOrder": 2},
                {"fieldName": "enabled", "fieldLabel": "Enabled", "type": "checkbox", "defaultValue": "on", "displayOrder": 3}
            ],
            "routeOptionTypes": [
                {"fieldName": "name", "fieldLabel": "Name", "type": "text", "required": true, "displayOrder": 1},
                {"fieldName": "destination", "fieldLabel": "Destination", "type": "text", "required": true, "displayOrder": 2}
            ]
        }),
        json!({"id": 4, "code": "nsx-t0", "name": "Tier-0", "hasFirewall": true}),
    ])
}

fn routers() -> MockTransport {
    MockTransport::new()
        .with_collection(MockCollection::for_kind(&ROUTER).records(vec![
            json!({"id": 40, "name": "web01", "type": {"id": 3}, "routes": [{"id": 7, "name": "default"}]}),
            json!({"id": 41, "name": "db", "type": {"id": 3}}),
            json!({"id": 42, "name": "db", "type": {"id": 3}}),
        ]))
        .with_collection(router_catalog())
}

fn instances() -> MockTransport {
    MockTransport::new()
        .with_collection(MockCollection::for_kind(&INSTANCE).records(vec![
            json!({"id": 10, "name": "app-1", "description": "web tier", "instanceType": {"id": 5}}),
            json!({"id": 11, "name": "app-2", "instanceType": {"id": 5}}),
            json!({"id": 12, "name": "app-3", "instanceType": {"id": 5}}),
        ]))
        .with_collection(
            MockCollection::for_catalog(INSTANCE.catalog().unwrap()).record(json!({
                "id": 5,
                "code": "nginx",
                "name": "Nginx",
                "optionTypes": [
                    {"fieldName": "name", "fieldLabel": "Name", "type": "text", "required": true, "displayOrder": 1},
                    {"fieldName": "description", "fieldLabel": "Description", "type": "text", "displayOrder": 2}
                ]
            })),
        )
}

fn session(mock: &MockTransport) -> Session {
    Session::new("lab", "https://morpheus.test", Arc::new(mock.clone()))
}

fn tokens(s: &str) -> Vec<String> {
    vec![s.to_string()]
}

fn yes() -> MutationOptions {
    MutationOptions {
        yes: true,
        ..Default::default()
    }
}

fn dry_run() -> MutationOptions {
    MutationOptions {
        dry_run: true,
        yes: true,
        ..Default::default()
    }
}

// =============================================================================
// Identifier resolution
// =============================================================================

#[tokio::test]
async fn get_by_unique_name_refetches_detailed_record() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .get(&ROUTER, "web01")
        .await;

    assert_eq!(outcome.exit_code(), EXIT_OK);
    match outcome {
        Outcome::Proceed(Reply::Record(record)) => {
            assert_eq!(record["id"], 40);
            // Only the detailed record carries the type.
            assert_eq!(record["type"]["id"], 3);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let last = mock.operations().pop().unwrap();
    assert_eq!(last.to_string(), "GET /api/networks/routers/40");
}

#[tokio::test]
async fn get_by_ambiguous_name_lists_candidates_without_detail_fetch() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .get(&ROUTER, "db")
        .await;

    assert_eq!(outcome.exit_code(), EXIT_FAILURE);
    match outcome.failure() {
        Some(EngineError::Ambiguous { candidates, .. }) => {
            let ids: Vec<u64> = candidates.iter().map(|c| c.id).collect();
            assert_eq!(ids, vec![41, 42]);
        }
        other => panic!("unexpected failure {:?}", other),
    }
    assert_eq!(mock.operations().len(), 1);
    assert_eq!(mock.operations()[0].method, Method::Get);
    assert!(mock.operations()[0].path.ends_with("/routers"));
}

#[tokio::test]
async fn resolving_by_id_and_unique_name_agree() {
    let mock = routers();
    let session = session(&mock);
    let resolver = Resolver::new(&session);

    let by_id = resolver.resolve(&ROUTER, "40").await.unwrap();
    let by_name = resolver.resolve(&ROUTER, "web01").await.unwrap();
    assert_eq!(by_id, by_name);
}

#[tokio::test]
async fn ambiguous_remove_sends_nothing() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();

    let outcome = Dispatcher::new(&session, &mut io, yes())
        .remove(&ROUTER, &tokens("db"), Vec::new())
        .await;

    assert!(matches!(outcome.failure(), Some(EngineError::Ambiguous { .. })));
    assert_eq!(mock.mutation_count(), 0);
}

#[tokio::test]
async fn batch_resolution_fails_fast_before_any_mutation() {
    let mock = instances();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();

    let outcome = Dispatcher::new(&session, &mut io, yes())
        .action(&INSTANCE, &tokens("10,missing,12"), "stop")
        .await;

    assert_eq!(
        outcome.failure().unwrap().to_string(),
        "Instance not found for 'missing'"
    );
    assert_eq!(mock.mutation_count(), 0);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn update_without_input_is_rejected() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .update(&ROUTER, "42", AssemblyInput::default())
        .await;

    assert_eq!(outcome.exit_code(), EXIT_FAILURE);
    let err = outcome.failure().unwrap();
    assert_eq!(err.to_string(), "Specify at least one option to update");
    assert!(err.wants_usage());
    assert_eq!(mock.mutation_count(), 0);
    assert_eq!(io.question_count(), 0);
}

#[tokio::test]
async fn update_normalizes_option_values_by_field_type() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();
    let input = AssemblyInput {
        options: parse_options(&["enabled=off".to_string()]).unwrap(),
        ..Default::default()
    };

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .update(&ROUTER, "web01", input)
        .await;

    assert!(outcome.is_proceed());
    let put = mock.mutations().pop().unwrap();
    assert_eq!(put.to_string(), "PUT /api/networks/routers/40");
    assert_eq!(put.body.unwrap(), json!({"networkRouter": {"enabled": false}}));
}

// =============================================================================
// Capability gating
// =============================================================================

#[tokio::test]
async fn missing_capability_blocks_child_add_before_prompting() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new().answers(["never asked"]);

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .add_child(&ROUTER, "web01", ROUTER.child("rule").unwrap(), AssemblyInput::default())
        .await;

    assert_eq!(outcome.exit_code(), EXIT_FAILURE);
    assert_eq!(
        outcome.failure().unwrap().to_string(),
        "Firewall not supported for Tier-1"
    );
    assert_eq!(io.question_count(), 0);
    assert_eq!(mock.mutation_count(), 0);
}

#[tokio::test]
async fn supported_child_add_prompts_from_sub_kind_descriptors() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new().answers(["0.0.0.0/0"]);
    let input = AssemblyInput {
        flags: Payload::new().with("name", "egress"),
        ..Default::default()
    };

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .add_child(&ROUTER, "web01", ROUTER.child("route").unwrap(), input)
        .await;

    assert!(outcome.is_proceed());
    assert_eq!(io.asked, vec!["Destination".to_string()]);
    let post = mock.mutations().pop().unwrap();
    assert_eq!(post.to_string(), "POST /api/networks/routers/40/routes");
    assert_eq!(
        post.body.unwrap(),
        json!({"networkRoute": {"name": "egress", "destination": "0.0.0.0/0"}})
    );
}

#[tokio::test]
async fn child_remove_resolves_within_parent_record() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new().confirms([true]);

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .remove_child(&ROUTER, "40", ROUTER.child("route").unwrap(), "default")
        .await;

    assert!(outcome.is_proceed());
    assert_eq!(io.confirmed.len(), 1);
    let delete = mock.mutations().pop().unwrap();
    assert_eq!(delete.to_string(), "DELETE /api/networks/routers/40/routes/7");
}

// =============================================================================
// Dry run and confirmation
// =============================================================================

#[tokio::test]
async fn dry_run_batch_previews_every_item() {
    let mock = instances();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();

    let outcome = Dispatcher::new(&session, &mut io, dry_run())
        .action(&INSTANCE, &tokens("10,11,12"), "stop")
        .await;

    assert_eq!(outcome.exit_code(), EXIT_OK);
    match outcome {
        Outcome::Proceed(Reply::Preview(requests)) => {
            let lines: Vec<String> = requests.iter().map(ToString::to_string).collect();
            assert_eq!(
                lines,
                vec![
                    "PUT /api/instances/10/stop",
                    "PUT /api/instances/11/stop",
                    "PUT /api/instances/12/stop",
                ]
            );
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(mock.mutation_count(), 0);
}

#[tokio::test]
async fn dry_run_add_previews_one_post() {
    let mock = MockTransport::new().with_collection(MockCollection::for_kind(&NETWORK));
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();
    let input = AssemblyInput {
        payload_file: Some(Payload::new().with("network.name", "lan")),
        ..Default::default()
    };

    let outcome = Dispatcher::new(&session, &mut io, dry_run())
        .add(&NETWORK, AddRequest { input, ..Default::default() })
        .await;

    match outcome {
        Outcome::Proceed(Reply::Preview(requests)) => {
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].method, Method::Post);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(mock.mutation_count(), 0);
}

#[tokio::test]
async fn declining_confirmation_exits_nine() {
    let mock = instances();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new().confirms([false]);

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .remove(&INSTANCE, &tokens("app-1"), Vec::new())
        .await;

    assert!(matches!(outcome, Outcome::Aborted));
    assert_eq!(outcome.exit_code(), EXIT_ABORTED);
    assert_eq!(mock.mutation_count(), 0);
}

#[tokio::test]
async fn no_prompt_requires_yes_for_confirmation() {
    let mock = instances();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();
    let options = MutationOptions {
        no_prompt: true,
        ..Default::default()
    };

    let outcome = Dispatcher::new(&session, &mut io, options)
        .remove(&INSTANCE, &tokens("10"), Vec::new())
        .await;

    assert_eq!(outcome.exit_code(), EXIT_FAILURE);
    assert_eq!(mock.mutation_count(), 0);
}

// =============================================================================
// Add, merge precedence, clone
// =============================================================================

#[tokio::test]
async fn option_override_beats_payload_file() {
    let mock = MockTransport::new().with_collection(MockCollection::for_kind(&NETWORK));
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();
    let input = AssemblyInput {
        payload_file: Some(
            Payload::new()
                .with("network.name", "from-file")
                .with("network.cidr", "10.0.0.0/24"),
        ),
        options: parse_options(&["network.name=override".to_string()]).unwrap(),
        ..Default::default()
    };

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .add(&NETWORK, AddRequest { input, ..Default::default() })
        .await;

    match outcome {
        Outcome::Proceed(Reply::Record(record)) => {
            assert_eq!(record["name"], "override");
            assert_eq!(record["cidr"], "10.0.0.0/24");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let post = &mock.mutations()[0];
    assert_eq!(post.body.as_ref().unwrap()["network"]["name"], "override");
    assert_eq!(io.question_count(), 0);
}

#[tokio::test]
async fn add_without_prompting_uses_defaults_and_private_visibility() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();
    let options = MutationOptions {
        no_prompt: true,
        ..Default::default()
    };

    let outcome = Dispatcher::new(&session, &mut io, options)
        .add(
            &ROUTER,
            AddRequest {
                type_token: Some("nsx-t1".to_string()),
                name: Some("edge-9".to_string()),
                input: AssemblyInput::default(),
            },
        )
        .await;

    assert!(outcome.is_proceed(), "{:?}", outcome);
    assert_eq!(io.question_count(), 0);
    let body = mock.mutations()[0].body.clone().unwrap();
    assert_eq!(body["networkRouter"]["name"], "edge-9");
    assert_eq!(body["networkRouter"]["type"], json!({"id": 3}));
    assert_eq!(body["networkRouter"]["enabled"], true);
    assert!(body["networkRouter"]["permissions"]["visibility"].is_string());
}

#[tokio::test]
async fn add_without_prompting_fails_on_missing_required_field() {
    let mock = routers();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new();
    let options = MutationOptions {
        no_prompt: true,
        ..Default::default()
    };

    let outcome = Dispatcher::new(&session, &mut io, options)
        .add(
            &ROUTER,
            AddRequest {
                type_token: Some("3".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(outcome.failure(), Some(EngineError::Validation(_))));
    assert_eq!(mock.mutation_count(), 0);
}

#[tokio::test]
async fn add_asks_for_type_when_catalog_kind_has_none() {
    let mock = routers();
    let session = session(&mock).with_active_group(Some(GroupRef {
        id: 2,
        name: "dev".to_string(),
    }));
    let mut io = ScriptedPrompt::new().answers(["Tier-1", "desc", ""]);

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .add(
            &ROUTER,
            AddRequest {
                name: Some("edge-10".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(outcome.is_proceed(), "{:?}", outcome);
    assert_eq!(
        io.asked,
        vec![
            "Network Router Type".to_string(),
            "Description".to_string(),
            "Enabled".to_string()
        ]
    );
    assert!(io.shown[0].contains("Tier-0"));
    let body = mock.mutations()[0].body.clone().unwrap();
    assert_eq!(body["networkRouter"]["description"], "desc");
}

#[tokio::test]
async fn clone_offers_source_values_as_defaults() {
    let mock = instances();
    let session = session(&mock);
    let mut io = ScriptedPrompt::new().answers([""]);

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .clone_record(&INSTANCE, "app-1", Some("app-1-copy".to_string()), AssemblyInput::default())
        .await;

    assert!(outcome.is_proceed(), "{:?}", outcome);
    assert_eq!(io.asked, vec!["Description".to_string()]);
    let put = mock.mutations().pop().unwrap();
    assert_eq!(put.to_string(), "PUT /api/instances/10/clone");
    assert_eq!(
        put.body.unwrap(),
        json!({"instance": {"name": "app-1-copy", "description": "web tier"}})
    );
}

#[tokio::test]
async fn static_schema_role_is_created_with_answers() {
    let mock = MockTransport::new()
        .with_collection(MockCollection::for_kind(&ROLE))
        .with_stub(Method::Get, "/api/options/roles", json!({"data": []}));
    let session = session(&mock);
    let mut io = ScriptedPrompt::new().answers(["auditors", "", "", ""]);

    let outcome = Dispatcher::new(&session, &mut io, MutationOptions::default())
        .add(
            &ROLE,
            AddRequest {
                name: Some("audit".to_string()),
                ..Default::default()
            },
        )
        .await;

    match outcome {
        Outcome::Proceed(Reply::Record(record)) => {
            assert_eq!(record["authority"], "audit");
            assert_eq!(record["description"], "auditors");
            assert_eq!(record["multitenant"], false);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    // The locked flag is gated on multitenant and never asked.
    assert!(!io.asked.contains(&"Multitenant Locked".to_string()));
}
