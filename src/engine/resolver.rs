//! engine::resolver
//!
//! Turns user tokens into detailed records.
//!
//! # Resolution
//!
//! - A token of only ASCII digits is an id: `GET /{kind}/{id}`; a 404 is
//!   `NotFound`.
//! - Anything else is a name: `GET /{kind}?{search_param}=token`, then the
//!   rows are filtered to exact name matches. Zero rows is `NotFound`, more
//!   than one is `Ambiguous` with the `{id, name}` candidates. A single row
//!   from a thin list is re-fetched by id so callers always see the detailed
//!   record.
//!
//! Resolution never mutates. Batch resolution is all-or-nothing: the first
//! token that fails stops the batch before anything else happens.

use serde_json::Value;
use tracing::debug;

use super::outcome::{Candidate, EngineError};
use super::Session;
use crate::api::{endpoints, TransportError};
use crate::core::kinds::{ResourceKind, SubResourceKind};
use crate::core::types::Resource;

/// Whether a token is a numeric id.
pub fn is_id(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an all-digit token. Ids too large for `u64` match nothing.
pub fn parse_id(kind: &ResourceKind, token: &str) -> Result<u64, EngineError> {
    token.parse::<u64>().map_err(|_| EngineError::NotFound {
        kind: kind.label.to_string(),
        token: token.to_string(),
    })
}

/// Split batch arguments on commas and whitespace, dropping empties.
///
/// `["10,11", "12"]` becomes `["10", "11", "12"]`.
pub fn split_tokens(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves identifiers against the appliance.
pub struct Resolver<'a> {
    session: &'a Session,
}

impl<'a> Resolver<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Resolve one token to a detailed record.
    pub async fn resolve(&self, kind: &ResourceKind, token: &str) -> Result<Resource, EngineError> {
        let token = token.trim();
        if is_id(token) {
            debug!(kind = kind.name, token, "resolving by id");
            let id = parse_id(kind, token)?;
            return self.get_by_id(kind, id).await;
        }

        debug!(kind = kind.name, token, "resolving by name");
        let request = endpoints::list(
            kind,
            vec![(kind.search_param.to_string(), token.to_string())],
        );
        let response = self.session.execute(&request).await?;
        let rows = response
            .get(kind.plural_key)
            .and_then(Value::as_array)
            .ok_or_else(|| missing_key(kind.plural_key))?;

        let matches: Vec<Resource> = rows
            .iter()
            .cloned()
            .filter_map(|row| Resource::from_value(row, kind.name_field, kind.type_field))
            .filter(|r| r.name == token)
            .collect();

        match matches.as_slice() {
            [] => Err(EngineError::NotFound {
                kind: kind.label.to_string(),
                token: token.to_string(),
            }),
            [only] if kind.list_is_thin => {
                debug!(id = only.id, "re-fetching detailed record");
                self.get_by_id(kind, only.id).await
            }
            [only] => Ok(only.clone()),
            many => Err(EngineError::Ambiguous {
                kind: kind.label.to_string(),
                token: token.to_string(),
                candidates: many
                    .iter()
                    .map(|r| Candidate {
                        id: r.id,
                        name: r.name.clone(),
                    })
                    .collect(),
            }),
        }
    }

    /// Fetch the detailed record for an id.
    pub async fn get_by_id(&self, kind: &ResourceKind, id: u64) -> Result<Resource, EngineError> {
        let response = match self.session.execute(&endpoints::get(kind, id)).await {
            Ok(response) => response,
            Err(TransportError::NotFound(_)) => {
                return Err(EngineError::NotFound {
                    kind: kind.label.to_string(),
                    token: id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let record = response
            .get(kind.singular_key)
            .cloned()
            .ok_or_else(|| missing_key(kind.singular_key))?;
        Resource::from_value(record, kind.name_field, kind.type_field)
            .ok_or_else(|| missing_key("id").into())
    }

    /// Resolve every token before anything else happens.
    ///
    /// Fails on the first token that does not resolve to exactly one record.
    pub async fn resolve_many(
        &self,
        kind: &ResourceKind,
        tokens: &[String],
    ) -> Result<Vec<Resource>, EngineError> {
        let tokens = split_tokens(tokens);
        if tokens.is_empty() {
            return Err(EngineError::Validation(format!(
                "at least one {} is required",
                kind.label.to_lowercase()
            )));
        }
        let mut resolved = Vec::with_capacity(tokens.len());
        for token in &tokens {
            resolved.push(self.resolve(kind, token).await?);
        }
        Ok(resolved)
    }
}

/// Resolve a child record within its (detailed) parent.
///
/// Ids and names are matched against the children embedded in the parent
/// record; no request is made.
pub fn resolve_child(
    parent: &Resource,
    sub: &SubResourceKind,
    token: &str,
) -> Result<Resource, EngineError> {
    let token = token.trim();
    let children = parent.children(sub.record_path, "name");
    let matches: Vec<&Resource> = if is_id(token) {
        children
            .iter()
            .filter(|c| c.id.to_string() == token)
            .collect()
    } else {
        children.iter().filter(|c| c.name == token).collect()
    };

    match matches.as_slice() {
        [] => Err(EngineError::NotFound {
            kind: sub.label.to_string(),
            token: token.to_string(),
        }),
        [only] => Ok((*only).clone()),
        many => Err(EngineError::Ambiguous {
            kind: sub.label.to_string(),
            token: token.to_string(),
            candidates: many
                .iter()
                .map(|r| Candidate {
                    id: r.id,
                    name: r.name.clone(),
                })
                .collect(),
        }),
    }
}

fn missing_key(key: &str) -> TransportError {
    TransportError::InvalidResponse(format!("response has no '{}'", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockCollection, MockTransport};
    use crate::core::kinds::{ROLE, ROUTER};
    use serde_json::json;
    use std::sync::Arc;

    fn session_for(mock: &MockTransport) -> Session {
        Session::new("test", "https://m", Arc::new(mock.clone()))
    }

    fn routers() -> MockTransport {
        MockTransport::new().with_collection(MockCollection::for_kind(&ROUTER).records(vec![
            json!({"id": 1, "name": "web01", "type": {"id": 3}, "status": "ok"}),
            json!({"id": 2, "name": "db", "type": {"id": 3}}),
            json!({"id": 3, "name": "db", "type": {"id": 3}}),
            json!({"id": 4, "name": "web01-old", "type": {"id": 3}}),
        ]))
    }

    #[test]
    fn id_tokens() {
        assert!(is_id("42"));
        assert!(!is_id("42a"));
        assert!(!is_id(""));
        assert!(!is_id("-1"));
    }

    #[test]
    fn split_tokens_on_commas() {
        let args = vec!["10,11".to_string(), " 12 ".to_string(), ",".to_string()];
        assert_eq!(split_tokens(&args), vec!["10", "11", "12"]);
    }

    #[tokio::test]
    async fn name_match_refetches_thin_rows() {
        let mock = routers();
        let session = session_for(&mock);
        let resolver = Resolver::new(&session);
        let router = resolver.resolve(&ROUTER, "web01").await.unwrap();
        assert_eq!(router.id, 1);
        // detailed fields only come from the get-by-id
        assert_eq!(router.raw["status"], "ok");
        let ops = mock.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].path, "/api/networks/routers/1");
    }

    #[tokio::test]
    async fn ambiguous_names_list_candidates() {
        let mock = routers();
        let session = session_for(&mock);
        let resolver = Resolver::new(&session);
        let err = resolver.resolve(&ROUTER, "db").await.unwrap_err();
        match err {
            EngineError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 3]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
        assert_eq!(mock.operations().len(), 1);
    }

    #[tokio::test]
    async fn missing_id_is_not_found() {
        let mock = routers();
        let session = session_for(&mock);
        let resolver = Resolver::new(&session);
        let err = resolver.resolve(&ROUTER, "99").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { ref token, .. } if token == "99"));
    }

    #[tokio::test]
    async fn full_list_rows_are_used_directly() {
        let mock = MockTransport::new().with_collection(
            MockCollection::for_kind(&ROLE).record(json!({"id": 7, "authority": "ops"})),
        );
        let session = session_for(&mock);
        let resolver = Resolver::new(&session);
        let role = resolver.resolve(&ROLE, "ops").await.unwrap();
        assert_eq!(role.id, 7);
        assert_eq!(mock.operations()[0].param("phrase"), Some("ops"));
        assert_eq!(mock.operations().len(), 1);
    }

    #[tokio::test]
    async fn batch_stops_at_first_failure() {
        let mock = routers();
        let session = session_for(&mock);
        let resolver = Resolver::new(&session);
        let err = resolver
            .resolve_many(&ROUTER, &["1,missing,2".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        // "2" was never looked up
        assert!(mock.operations().iter().all(|op| op.path != "/api/networks/routers/2"));
    }

    #[test]
    fn child_resolution_searches_parent_record() {
        let parent = Resource::from_value(
            json!({"id": 1, "name": "r", "firewall": {"rules": [
                {"id": 5, "name": "allow-web"},
                {"id": 6, "name": "dup"},
                {"id": 7, "name": "dup"}
            ]}}),
            "name",
            "type",
        )
        .unwrap();
        let rule = ROUTER.child("rule").unwrap();
        assert_eq!(resolve_child(&parent, rule, "allow-web").unwrap().id, 5);
        assert_eq!(resolve_child(&parent, rule, "6").unwrap().name, "dup");
        assert!(matches!(
            resolve_child(&parent, rule, "dup"),
            Err(EngineError::Ambiguous { .. })
        ));
        assert!(matches!(
            resolve_child(&parent, rule, "nope"),
            Err(EngineError::NotFound { .. })
        ));
    }
}
