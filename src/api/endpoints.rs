//! api::endpoints
//!
//! Request builders for every call the engine makes. Each returns the
//! [`ApiRequest`] descriptor only; nothing here performs I/O, so the same
//! builders back both real execution and dry-run previews.

use serde_json::Value;

use super::traits::{ApiRequest, Method};
use crate::core::kinds::{ResourceKind, SubResourceKind, TypeCatalog};

/// Query parameters as owned pairs.
pub type Params = Vec<(String, String)>;

pub fn list(kind: &ResourceKind, params: Params) -> ApiRequest {
    ApiRequest::get(kind.path).with_params(params)
}

pub fn get(kind: &ResourceKind, id: u64) -> ApiRequest {
    ApiRequest::get(kind.item_path(id))
}

pub fn create(kind: &ResourceKind, body: Value) -> ApiRequest {
    ApiRequest::post(kind.path, body)
}

pub fn update(kind: &ResourceKind, id: u64, body: Value) -> ApiRequest {
    ApiRequest::put(kind.item_path(id)).with_body(body)
}

pub fn destroy(kind: &ResourceKind, id: u64, params: Params) -> ApiRequest {
    ApiRequest::delete(kind.item_path(id)).with_params(params)
}

/// `PUT /{kind}/{id}/{action}`, used for state changes like `stop` or `clone`.
pub fn action(kind: &ResourceKind, id: u64, action: &str, body: Option<Value>) -> ApiRequest {
    let req = ApiRequest::new(Method::Put, format!("{}/{}", kind.item_path(id), action));
    match body {
        Some(body) => req.with_body(body),
        None => req,
    }
}

fn child_path(kind: &ResourceKind, parent_id: u64, sub: &SubResourceKind) -> String {
    format!("{}/{}", kind.item_path(parent_id), sub.path)
}

pub fn child_list(kind: &ResourceKind, parent_id: u64, sub: &SubResourceKind, params: Params) -> ApiRequest {
    ApiRequest::get(child_path(kind, parent_id, sub)).with_params(params)
}

pub fn child_create(kind: &ResourceKind, parent_id: u64, sub: &SubResourceKind, body: Value) -> ApiRequest {
    ApiRequest::post(child_path(kind, parent_id, sub), body)
}

pub fn child_update(
    kind: &ResourceKind,
    parent_id: u64,
    sub: &SubResourceKind,
    id: u64,
    body: Value,
) -> ApiRequest {
    ApiRequest::put(format!("{}/{}", child_path(kind, parent_id, sub), id)).with_body(body)
}

pub fn child_destroy(kind: &ResourceKind, parent_id: u64, sub: &SubResourceKind, id: u64) -> ApiRequest {
    ApiRequest::delete(format!("{}/{}", child_path(kind, parent_id, sub), id))
}

pub fn type_list(catalog: &TypeCatalog, params: Params) -> ApiRequest {
    ApiRequest::get(catalog.path).with_params(params)
}

pub fn type_get(catalog: &TypeCatalog, id: u64) -> ApiRequest {
    ApiRequest::get(format!("{}/{}", catalog.path, id))
}

/// Dynamic select options: `GET /api/options/{source}`.
pub fn options(source: &str, params: Params) -> ApiRequest {
    ApiRequest::get(format!("/api/options/{}", source)).with_params(params)
}

pub fn whoami() -> ApiRequest {
    ApiRequest::get("/api/whoami")
}
