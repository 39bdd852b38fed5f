//! engine::schema
//!
//! Supplies resource types and their field descriptors.
//!
//! Type lookup mirrors identifier resolution (numeric id or name) but runs
//! against the kind's type catalog. Kinds without a catalog get a locally
//! synthesized type. Capability checks are not made here.

use serde_json::Value;
use tracing::debug;

use super::outcome::{Candidate, EngineError};
use super::resolver::is_id;
use super::Session;
use crate::api::{endpoints, TransportError};
use crate::core::kinds::{ResourceKind, SchemaSource, TypeCatalog};
use crate::core::types::{FieldDescriptor, Resource, ResourceType};

pub struct SchemaProvider<'a> {
    session: &'a Session,
}

impl<'a> SchemaProvider<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Look up a type by id, name or code.
    pub async fn type_for(&self, kind: &ResourceKind, token: &str) -> Result<ResourceType, EngineError> {
        let catalog = match kind.schema {
            SchemaSource::Catalog(catalog) => catalog,
            SchemaSource::Static(fields) => return Ok(ResourceType::local(kind.name, kind.label, fields())),
            SchemaSource::None => return Ok(ResourceType::local(kind.name, kind.label, Vec::new())),
        };
        let token = token.trim();
        let type_label = format!("{} Type", kind.label);

        if is_id(token) {
            let id = token.parse::<u64>().map_err(|_| EngineError::NotFound {
                kind: type_label.clone(),
                token: token.to_string(),
            })?;
            return self.fetch(&catalog, id, &type_label).await;
        }

        // A name search would not match codes, so scan the whole catalog.
        debug!(catalog = catalog.path, token, "looking up type by name or code");
        let rows = self.all_types(kind).await?;
        let matches: Vec<&Value> = rows
            .iter()
            .filter(|row| {
                row.get("name").and_then(Value::as_str) == Some(token)
                    || row.get("code").and_then(Value::as_str) == Some(token)
            })
            .collect();

        match matches.as_slice() {
            [] => Err(EngineError::NotFound {
                kind: type_label,
                token: token.to_string(),
            }),
            [only] => match only.get("id").and_then(crate::core::types::id_of) {
                Some(id) => self.fetch(&catalog, id, &type_label).await,
                None => parse_type(only),
            },
            many => Err(EngineError::Ambiguous {
                kind: type_label,
                token: token.to_string(),
                candidates: many
                    .iter()
                    .filter_map(|row| {
                        Some(Candidate {
                            id: row.get("id").and_then(crate::core::types::id_of)?,
                            name: row.get("name").and_then(Value::as_str)?.to_string(),
                        })
                    })
                    .collect(),
            }),
        }
    }

    /// The type of an existing record, via its embedded type reference.
    pub async fn type_of(&self, kind: &ResourceKind, record: &Resource) -> Result<ResourceType, EngineError> {
        if kind.catalog().is_none() {
            return self.type_for(kind, "").await;
        }
        let type_ref = record.type_ref.as_ref();
        let token = type_ref
            .and_then(|t| t.id.map(|id| id.to_string()))
            .or_else(|| type_ref.and_then(|t| t.code.clone()))
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "{} '{}' has no type",
                    kind.label, record.name
                ))
            })?;
        self.type_for(kind, &token).await
    }

    /// Every row of the kind's type catalog, unpaged.
    pub async fn all_types(&self, kind: &ResourceKind) -> Result<Vec<Value>, EngineError> {
        self.list_types(kind, vec![("max".to_string(), "-1".to_string())])
            .await
    }

    /// Rows of the kind's type catalog.
    pub async fn list_types(
        &self,
        kind: &ResourceKind,
        params: endpoints::Params,
    ) -> Result<Vec<Value>, EngineError> {
        let catalog = kind.catalog().ok_or_else(|| EngineError::Unsupported {
            feature: "Types".to_string(),
            type_name: kind.label.to_string(),
        })?;
        let response = self
            .session
            .execute(&endpoints::type_list(catalog, params))
            .await?;
        Ok(response
            .get(catalog.plural_key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch(&self, catalog: &TypeCatalog, id: u64, label: &str) -> Result<ResourceType, EngineError> {
        let response = match self.session.execute(&endpoints::type_get(catalog, id)).await {
            Ok(response) => response,
            Err(TransportError::NotFound(_)) => {
                return Err(EngineError::NotFound {
                    kind: label.to_string(),
                    token: id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let raw = response.get(catalog.singular_key).ok_or_else(|| {
            TransportError::InvalidResponse(format!("response has no '{}'", catalog.singular_key))
        })?;
        parse_type(raw)
    }
}

fn parse_type(raw: &Value) -> Result<ResourceType, EngineError> {
    ResourceType::from_value(raw)
        .map_err(|e| TransportError::InvalidResponse(format!("bad option types: {}", e)).into())
}

/// Descriptors of `sub_kind`, minus exclusions, ordered by display order.
///
/// When `adding`, descriptors with `showOnCreate == false` are dropped too.
pub fn fields_for(
    resource_type: &ResourceType,
    sub_kind: &str,
    exclude: &[&str],
    adding: bool,
) -> Vec<FieldDescriptor> {
    let mut fields: Vec<FieldDescriptor> = resource_type
        .fields(sub_kind)
        .iter()
        .filter(|d| !exclude.contains(&d.field_name.as_str()))
        .filter(|d| !adding || d.show_on_create)
        .cloned()
        .collect();
    fields.sort_by_key(|d| d.display_order);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockCollection, MockTransport};
    use crate::core::kinds::{GROUP, ROLE, ROUTER};
    use crate::core::types::FieldType;
    use serde_json::json;
    use std::sync::Arc;

    fn router_types() -> MockTransport {
        MockTransport::new().with_collection(
            MockCollection::for_catalog(ROUTER.catalog().unwrap()).records(vec![
                json!({"id": 3, "code": "nsxt", "name": "NSX-T", "hasFirewall": true,
                       "optionTypes": [
                           {"fieldName": "description", "displayOrder": 5},
                           {"fieldName": "name", "displayOrder": 1},
                           {"fieldName": "hidden", "displayOrder": 2, "showOnCreate": false}
                       ]}),
                json!({"id": 4, "code": "nsxt-t0", "name": "NSX-T Tier-0"}),
            ]),
        )
    }

    #[tokio::test]
    async fn type_by_name_or_code() {
        let mock = router_types();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let provider = SchemaProvider::new(&session);

        let by_name = provider.type_for(&ROUTER, "NSX-T").await.unwrap();
        assert_eq!(by_name.id, Some(3));
        assert!(by_name.has("hasFirewall"));

        let by_code = provider.type_for(&ROUTER, "nsxt-t0").await.unwrap();
        assert_eq!(by_code.name, "NSX-T Tier-0");

        let by_id = provider.type_for(&ROUTER, "3").await.unwrap();
        assert_eq!(by_id.code, "nsxt");

        let missing = provider.type_for(&ROUTER, "vyos").await.unwrap_err();
        assert!(matches!(missing, EngineError::NotFound { ref kind, .. } if kind == "Network Router Type"));
    }

    #[tokio::test]
    async fn name_lookup_reads_the_whole_catalog() {
        let mock = router_types();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        SchemaProvider::new(&session)
            .type_for(&ROUTER, "NSX-T Tier-0")
            .await
            .unwrap();

        let scan = &mock.operations()[0];
        assert_eq!(scan.path, "/api/networks/router-types");
        assert_eq!(scan.param("max"), Some("-1"));
    }

    #[tokio::test]
    async fn local_schemas_need_no_requests() {
        let mock = MockTransport::new();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let provider = SchemaProvider::new(&session);

        let role = provider.type_for(&ROLE, "").await.unwrap();
        assert_eq!(role.fields("")[0].field_name, "authority");
        assert!(provider.type_for(&GROUP, "").await.unwrap().fields("").is_empty());
        assert!(mock.operations().is_empty());
    }

    #[tokio::test]
    async fn type_of_follows_type_ref() {
        let mock = router_types();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let provider = SchemaProvider::new(&session);
        let record = Resource::from_value(json!({"id": 1, "name": "r", "type": {"id": 4}}), "name", "type").unwrap();
        assert_eq!(provider.type_of(&ROUTER, &record).await.unwrap().id, Some(4));

        let untyped = Resource::from_value(json!({"id": 2, "name": "bare"}), "name", "type").unwrap();
        assert!(matches!(
            provider.type_of(&ROUTER, &untyped).await,
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn fields_for_filters_and_orders() {
        let rt = ResourceType::from_value(&json!({
            "optionTypes": [
                {"fieldName": "description", "displayOrder": 5},
                {"fieldName": "name", "displayOrder": 1},
                {"fieldName": "hidden", "displayOrder": 2, "showOnCreate": false},
                {"fieldName": "enabled", "type": "checkbox", "displayOrder": 3}
            ]
        }))
        .unwrap();

        let adding: Vec<String> = fields_for(&rt, "", &["name"], true)
            .into_iter()
            .map(|d| d.field_name)
            .collect();
        assert_eq!(adding, vec!["enabled", "description"]);

        let updating = fields_for(&rt, "", &[], false);
        assert_eq!(updating.len(), 4);
        assert_eq!(updating[0].field_name, "name");
        assert_eq!(updating[2].field_type, FieldType::Checkbox);
    }
}
