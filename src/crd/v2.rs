//! v2 CRD types
//!
//! Same model as v1beta1 with the client-facing Service renamed:
//! - `spec.service` is now `spec.clientService`

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use super::status::RabbitmqClusterCondition;

/// RabbitmqCluster v2 - a clustered RabbitMQ deployment
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "rabbitmq.com",
    version = "v2",
    kind = "RabbitmqCluster",
    shortname = "rmq",
    namespaced,
    status = "RabbitmqClusterStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Replicas", "type":"integer", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Status", "type":"string", "jsonPath":".status.clusterStatus"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct RabbitmqClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(
        rename = "imagePullSecret",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub image_pull_secret: String,

    // === RENAMED IN v2 (was `service`) ===
    /// Client-facing Service
    #[serde(rename = "clientService", default)]
    pub client_service: RabbitmqClusterClientServiceSpec,

    #[serde(default)]
    pub rabbitmq: RabbitmqClusterConfigurationSpec,
}

/// Settings for the client-facing Service
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RabbitmqClusterClientServiceSpec {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_: String,

    /// `None` means no annotation policy; `Some` of an empty map clears them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RabbitmqClusterConfigurationSpec {
    #[serde(rename = "additionalPlugins", skip_serializing_if = "Option::is_none")]
    pub additional_plugins: Option<Vec<Plugin>>,

    #[serde(
        rename = "additionalConfig",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub additional_config: String,

    #[serde(
        rename = "advancedConfig",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub advanced_config: String,

    #[serde(rename = "envConfig", default, skip_serializing_if = "String::is_empty")]
    pub env_config: String,
}

/// Name of a RabbitMQ plugin
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, JsonSchema)]
#[serde(transparent)]
pub struct Plugin(pub String);

impl AsRef<str> for Plugin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Plugin {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for Plugin {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RabbitmqClusterStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<RabbitmqClusterAdmin>,

    #[serde(default)]
    pub conditions: Option<Vec<RabbitmqClusterCondition>>,

    #[serde(
        rename = "clusterStatus",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub cluster_status: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct RabbitmqClusterAdmin {
    #[serde(rename = "secretReference")]
    pub secret_reference: RabbitmqClusterSecretReference,

    #[serde(rename = "serviceReference")]
    pub service_reference: RabbitmqClusterServiceReference,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct RabbitmqClusterSecretReference {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct RabbitmqClusterServiceReference {
    pub name: String,
    pub namespace: String,
}
