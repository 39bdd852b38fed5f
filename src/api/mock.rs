//! api::mock
//!
//! In-memory appliance for deterministic testing.
//!
//! # Design
//!
//! `MockTransport` implements [`Transport`] over a small REST store. Each
//! registered [`MockCollection`] answers list, get, create, update, delete
//! and `PUT {id}/{action}` for its path. Exact-path stubs take priority over
//! collections, and every request is recorded so tests can assert on what
//! was (or was not) sent.
//!
//! # Example
//!
//! ```
//! use morpheus_cli::api::mock::{MockCollection, MockTransport};
//! use morpheus_cli::api::{ApiRequest, Transport};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mock = MockTransport::new().with_collection(
//!     MockCollection::new("/api/roles", "role", "roles")
//!         .name_field("authority")
//!         .record(json!({"id": 1, "authority": "ops"})),
//! );
//!
//! let found = mock.execute(&ApiRequest::get("/api/roles/1")).await.unwrap();
//! assert_eq!(found["role"]["authority"], "ops");
//! assert_eq!(mock.mutation_count(), 0);
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::traits::{ApiRequest, Method, Transport, TransportError};
use crate::core::kinds::{ResourceKind, TypeCatalog};
use crate::core::payload::deep_merge;
use crate::core::types::id_of;

/// A REST collection served by the mock.
#[derive(Debug, Clone)]
pub struct MockCollection {
    path: String,
    singular: String,
    plural: String,
    name_field: String,
    search_param: String,
    /// List rows carry only `id` and the name field.
    thin: bool,
    records: BTreeMap<u64, Value>,
}

impl MockCollection {
    pub fn new(path: &str, singular: &str, plural: &str) -> Self {
        Self {
            path: path.to_string(),
            singular: singular.to_string(),
            plural: plural.to_string(),
            name_field: "name".to_string(),
            search_param: "name".to_string(),
            thin: false,
            records: BTreeMap::new(),
        }
    }

    /// A collection shaped like a resource kind's endpoint.
    pub fn for_kind(kind: &ResourceKind) -> Self {
        let mut collection = Self::new(kind.path, kind.singular_key, kind.plural_key)
            .name_field(kind.name_field)
            .search_param(kind.search_param);
        collection.thin = kind.list_is_thin;
        collection
    }

    /// A collection shaped like a type catalog endpoint.
    pub fn for_catalog(catalog: &TypeCatalog) -> Self {
        Self::new(catalog.path, catalog.singular_key, catalog.plural_key)
    }

    pub fn name_field(mut self, field: &str) -> Self {
        self.name_field = field.to_string();
        self
    }

    pub fn search_param(mut self, param: &str) -> Self {
        self.search_param = param.to_string();
        self
    }

    pub fn thin(mut self) -> Self {
        self.thin = true;
        self
    }

    /// Add a record; it must carry an `id`.
    pub fn record(mut self, record: Value) -> Self {
        if let Some(id) = record.get("id").and_then(id_of) {
            self.records.insert(id, record);
        }
        self
    }

    pub fn records(self, records: Vec<Value>) -> Self {
        records.into_iter().fold(self, |c, r| c.record(r))
    }

    fn list(&self, request: &ApiRequest) -> Value {
        let needle = request
            .param(&self.search_param)
            .map(|s| s.to_lowercase());
        let rows: Vec<Value> = self
            .records
            .values()
            .filter(|record| match &needle {
                // Appliance name searches are partial matches.
                Some(needle) => record
                    .get(&self.name_field)
                    .and_then(Value::as_str)
                    .map(|name| name.to_lowercase().contains(needle.as_str()))
                    .unwrap_or(false),
                None => true,
            })
            .map(|record| {
                if self.thin {
                    json!({
                        "id": record.get("id").cloned().unwrap_or(Value::Null),
                        self.name_field.as_str(): record.get(&self.name_field).cloned().unwrap_or(Value::Null),
                    })
                } else {
                    record.clone()
                }
            })
            .collect();
        let total = rows.len();
        json!({ self.plural.as_str(): rows, "meta": {"total": total} })
    }
}

/// Configuration for which request should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail the request with this method and exact path.
    Request {
        method: Method,
        path: String,
        error: TransportError,
    },
    /// Fail every mutating request.
    Mutations(TransportError),
}

#[derive(Debug, Clone)]
struct Stub {
    method: Method,
    path: String,
    response: Result<Value, TransportError>,
}

#[derive(Debug)]
struct MockTransportInner {
    collections: Vec<MockCollection>,
    stubs: Vec<Stub>,
    next_id: u64,
    fail_on: Vec<FailOn>,
    operations: Vec<ApiRequest>,
}

/// Mock transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                collections: Vec::new(),
                stubs: Vec::new(),
                next_id: 1000,
                fail_on: Vec::new(),
                operations: Vec::new(),
            })),
        }
    }

    pub fn with_collection(self, collection: MockCollection) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.collections.push(collection);
            // Longest path first so nested collections win over their parents.
            inner
                .collections
                .sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        }
        self
    }

    /// Answer `method path` (query ignored) with a fixed response.
    pub fn with_stub(self, method: Method, path: &str, response: Value) -> Self {
        self.push_stub(method, path, Ok(response))
    }

    /// Answer `method path` with an error.
    pub fn with_error_stub(self, method: Method, path: &str, error: TransportError) -> Self {
        self.push_stub(method, path, Err(error))
    }

    fn push_stub(self, method: Method, path: &str, response: Result<Value, TransportError>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.stubs.push(Stub {
                method,
                path: path.to_string(),
                response,
            });
        }
        self
    }

    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on.push(fail_on);
        }
        self
    }

    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on.clear();
    }

    /// Every request received, in order.
    pub fn operations(&self) -> Vec<ApiRequest> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Requests received with a mutating method.
    pub fn mutations(&self) -> Vec<ApiRequest> {
        self.operations()
            .into_iter()
            .filter(ApiRequest::is_mutation)
            .collect()
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations().len()
    }

    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Current stored state of a record.
    pub fn record(&self, path: &str, id: u64) -> Option<Value> {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .iter()
            .find(|c| c.path == path)
            .and_then(|c| c.records.get(&id).cloned())
    }
}

impl MockTransportInner {
    fn check_fail(&self, request: &ApiRequest) -> Result<(), TransportError> {
        for fail in &self.fail_on {
            match fail {
                FailOn::Request {
                    method,
                    path,
                    error,
                } if *method == request.method && *path == request.path => {
                    return Err(error.clone());
                }
                FailOn::Mutations(error) if request.is_mutation() => return Err(error.clone()),
                _ => {}
            }
        }
        Ok(())
    }

    fn route(&mut self, request: &ApiRequest) -> Result<Value, TransportError> {
        if let Some(stub) = self
            .stubs
            .iter()
            .find(|s| s.method == request.method && s.path == request.path)
        {
            return stub.response.clone();
        }

        let not_found = || TransportError::NotFound(request.path.clone());

        // Exact collection match.
        if let Some(index) = self.collections.iter().position(|c| c.path == request.path) {
            return match request.method {
                Method::Get => Ok(self.collections[index].list(request)),
                Method::Post => {
                    let id = self.next_id;
                    self.next_id += 1;
                    let collection = &mut self.collections[index];
                    let mut record = request
                        .body
                        .as_ref()
                        .and_then(|b| b.get(&collection.singular))
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_else(Map::new);
                    record.insert("id".to_string(), json!(id));
                    let record = Value::Object(record);
                    collection.records.insert(id, record.clone());
                    Ok(json!({"success": true, collection.singular.as_str(): record}))
                }
                _ => Err(not_found()),
            };
        }

        // Item or item action.
        for collection in self.collections.iter_mut() {
            let Some(rest) = request
                .path
                .strip_prefix(collection.path.as_str())
                .and_then(|r| r.strip_prefix('/'))
            else {
                continue;
            };
            let mut segments = rest.splitn(2, '/');
            let Some(id) = segments.next().and_then(|s| s.parse::<u64>().ok()) else {
                continue;
            };
            let action = segments.next();

            if !collection.records.contains_key(&id) {
                return Err(not_found());
            }

            return match (request.method, action) {
                (Method::Get, None) => {
                    Ok(json!({ collection.singular.as_str(): collection.records[&id].clone() }))
                }
                (Method::Put, None) => {
                    let patch = request
                        .body
                        .as_ref()
                        .and_then(|b| b.get(&collection.singular))
                        .cloned()
                        .unwrap_or_else(|| json!({}));
                    let updated = deep_merge(&collection.records[&id], &patch);
                    collection.records.insert(id, updated.clone());
                    Ok(json!({"success": true, collection.singular.as_str(): updated}))
                }
                (Method::Delete, None) => {
                    collection.records.remove(&id);
                    Ok(json!({"success": true}))
                }
                (Method::Put, Some(_)) | (Method::Post, Some(_)) => Ok(json!({"success": true})),
                _ => Err(not_found()),
            };
        }

        Err(not_found())
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(request.clone());
        inner.check_fail(request)?;
        inner.route(request)
    }
}
