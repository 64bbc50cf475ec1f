//! Generic resource objects
//!
//! A `GenericResourceObject` carries the fields every resource shares and keeps
//! everything else as an opaque payload.

use crate::error::EngineError;
use crate::manifest::ManifestDocument;
use cluster_client::gvk_from_api_version;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use kube::core::{GroupVersionKind, TypeMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema-agnostic resource decoded from one manifest document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericResourceObject {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Everything besides apiVersion, kind and metadata (spec, data, rules, ...)
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// Decode one manifest document.
///
/// The document must be a mapping with non-empty `apiVersion` and `kind`. The
/// rest of the document is not inspected; in particular `metadata.name` may be
/// absent, as in objects created with `generateName`.
pub fn decode_object(document: &ManifestDocument) -> Result<GenericResourceObject, EngineError> {
    let fail = |reason: String| EngineError::Decode {
        index: document.index,
        reason,
    };

    if !document.content.is_mapping() {
        return Err(fail("document is not a mapping".to_string()));
    }
    let value = serde_json::to_value(&document.content).map_err(|e| fail(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(fail("document is not a mapping".to_string()));
    };

    let api_version = take_string(&mut fields, "apiVersion").map_err(fail)?;
    let kind = take_string(&mut fields, "kind").map_err(fail)?;
    let metadata: ObjectMeta = match fields.remove("metadata") {
        Some(Value::Null) | None => ObjectMeta::default(),
        Some(meta) => serde_json::from_value(meta).map_err(|e| fail(format!("invalid metadata: {e}")))?,
    };
    Ok(GenericResourceObject {
        api_version,
        kind,
        metadata,
        data: fields,
    })
}

/// Decode one manifest document that must be addressable by name
pub fn decode_named_object(document: &ManifestDocument) -> Result<GenericResourceObject, EngineError> {
    let object = decode_object(document)?;
    if object.name().is_empty() {
        return Err(EngineError::Decode {
            index: document.index,
            reason: format!("{} has no metadata.name", object.kind),
        });
    }
    Ok(object)
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Result<String, String> {
    match fields.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | Some(Value::Null) | None => Err(format!("{key} is missing")),
        Some(other) => Err(format!("{key} must be a string, got {other}")),
    }
}

impl GenericResourceObject {
    /// Parse a single-document YAML string
    pub fn from_yaml(text: &str) -> Result<Self, EngineError> {
        let mut content: serde_yaml::Value = serde_yaml::from_str(text)?;
        content.apply_merge()?;
        decode_object(&ManifestDocument { index: 0, content })
    }

    /// Convert an object read from the cluster back into the generic form.
    ///
    /// `gvk` fills in apiVersion and kind when the server omitted them (list
    /// items usually do). Server-managed field ownership data is dropped.
    pub fn from_dynamic(object: DynamicObject, gvk: &GroupVersionKind) -> Self {
        let (api_version, kind) = match object.types {
            Some(types) => (types.api_version, types.kind),
            None => (gvk.api_version(), gvk.kind.clone()),
        };
        let mut metadata = object.metadata;
        metadata.managed_fields = None;
        let data = match object.data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            api_version,
            kind,
            metadata,
            data,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Namespace written in the object, `None` when absent or empty
    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    pub fn resource_version(&self) -> Option<&str> {
        self.metadata.resource_version.as_deref()
    }

    pub fn gvk(&self) -> GroupVersionKind {
        gvk_from_api_version(&self.api_version, &self.kind)
    }

    /// Kind and name for messages, e.g. `Deployment/web`
    pub fn describe(&self) -> String {
        format!("{}/{}", self.kind, self.name())
    }

    /// Build the dynamic object sent to the cluster, placed in `namespace`
    pub fn to_dynamic(&self, namespace: Option<&str>) -> DynamicObject {
        let mut metadata = self.metadata.clone();
        metadata.namespace = namespace.map(str::to_string);
        DynamicObject {
            types: Some(TypeMeta {
                api_version: self.api_version.clone(),
                kind: self.kind.clone(),
            }),
            metadata,
            data: Value::Object(self.data.clone()),
        }
    }

    pub fn to_yaml(&self) -> Result<String, EngineError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::split_documents;
    use serde_json::json;

    fn decode(text: &str) -> Result<GenericResourceObject, EngineError> {
        let docs = split_documents(text).unwrap();
        decode_object(&docs[0])
    }

    #[test]
    fn test_decode_keeps_payload_opaque() {
        let object = decode(
            "apiVersion: clickhouse.altinity.com/v1\nkind: ClickHouseInstallation\nmetadata:\n  name: demo\n  namespace: db\nspec:\n  configuration:\n    clusters: [{name: c1}]\n",
        )
        .unwrap();
        assert_eq!(object.name(), "demo");
        assert_eq!(object.namespace(), Some("db"));
        assert_eq!(object.gvk().group, "clickhouse.altinity.com");
        assert_eq!(object.data["spec"]["configuration"]["clusters"][0]["name"], "c1");
    }

    #[test]
    fn test_decode_requires_api_version_and_kind() {
        let err = decode("kind: ConfigMap\nmetadata:\n  name: x\n").unwrap_err();
        assert!(matches!(err, EngineError::Decode { index: 0, ref reason } if reason.contains("apiVersion")));

        let err = decode("apiVersion: v1\nkind: \"\"\nmetadata:\n  name: x\n").unwrap_err();
        assert!(matches!(err, EngineError::Decode { ref reason, .. } if reason.contains("kind")));
    }

    #[test]
    fn test_decode_allows_generate_name() {
        let object = decode("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  generateName: settings-\n").unwrap();
        assert_eq!(object.name(), "");
        assert_eq!(object.metadata.generate_name.as_deref(), Some("settings-"));
    }

    #[test]
    fn test_named_decode_requires_name() {
        let docs = split_documents("apiVersion: v1\nkind: ConfigMap\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  generateName: s-\n").unwrap();
        assert!(decode_named_object(&docs[0]).is_err());
        let err = decode_named_object(&docs[1]).unwrap_err();
        assert!(matches!(err, EngineError::Decode { index: 1, ref reason } if reason.contains("Secret")));
    }

    #[test]
    fn test_decode_rejects_non_mapping() {
        let err = decode("- just\n- a list\n").unwrap_err();
        assert!(matches!(err, EngineError::Decode { .. }));
    }

    #[test]
    fn test_empty_namespace_is_none() {
        let object = decode("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n  namespace: \"\"\n").unwrap();
        assert_eq!(object.namespace(), None);
    }

    #[test]
    fn test_to_dynamic_sets_namespace_and_types() {
        let object = GenericResourceObject::from_yaml("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\ndata:\n  a: b\n").unwrap();
        let dynamic = object.to_dynamic(Some("demo"));
        assert_eq!(dynamic.metadata.namespace.as_deref(), Some("demo"));
        assert_eq!(dynamic.types.unwrap().kind, "ConfigMap");
        assert_eq!(dynamic.data, json!({"data": {"a": "b"}}));
    }

    #[test]
    fn test_from_dynamic_fills_missing_types() {
        let dynamic = DynamicObject {
            types: None,
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                resource_version: Some("42".to_string()),
                ..Default::default()
            },
            data: json!({"spec": {"replicas": 2}}),
        };
        let object = GenericResourceObject::from_dynamic(dynamic, &gvk_from_api_version("apps/v1", "Deployment"));
        assert_eq!(object.api_version, "apps/v1");
        assert_eq!(object.kind, "Deployment");
        assert_eq!(object.resource_version(), Some("42"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let object = GenericResourceObject::from_yaml("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\ndata:\n  a: b\n").unwrap();
        let again = GenericResourceObject::from_yaml(&object.to_yaml().unwrap()).unwrap();
        assert_eq!(object, again);
    }
}
