//! v1beta1 CRD types
//!
//! The legacy schema. It is the storage version and acts as the
//! conversion hub: every other version converts to and from it.
//!
//! Differs from v2 in one place: the client-facing service is named
//! `service` here and `clientService` in v2.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use super::status::RabbitmqClusterCondition;

/// RabbitmqCluster v1beta1 - a clustered RabbitMQ deployment
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "rabbitmq.com",
    version = "v1beta1",
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
    /// Number of RabbitMQ nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// RabbitMQ container image
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    /// Name of the Secret used to pull `image`
    #[serde(
        rename = "imagePullSecret",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub image_pull_secret: String,

    /// Client-facing Service
    #[serde(default)]
    pub service: RabbitmqClusterServiceSpec,

    /// RabbitMQ configuration
    #[serde(default)]
    pub rabbitmq: RabbitmqClusterConfigurationSpec,
}

/// Settings for the client-facing Service
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RabbitmqClusterServiceSpec {
    /// Service type, e.g. ClusterIP, NodePort or LoadBalancer
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_: String,

    /// Annotations to put on the Service.
    ///
    /// `None` means no annotation policy; `Some` of an empty map clears them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// Broker configuration passed through to RabbitMQ
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RabbitmqClusterConfigurationSpec {
    /// Plugins enabled on top of the default set
    #[serde(rename = "additionalPlugins", skip_serializing_if = "Option::is_none")]
    pub additional_plugins: Option<Vec<Plugin>>,

    /// Appended to rabbitmq.conf
    #[serde(
        rename = "additionalConfig",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub additional_config: String,

    /// Contents of advanced.config
    #[serde(
        rename = "advancedConfig",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub advanced_config: String,

    /// Contents of rabbitmq-env.conf
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

/// Observed state of a RabbitmqCluster
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RabbitmqClusterStatus {
    /// Where the default user credentials live. Set once they are generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<RabbitmqClusterAdmin>,

    /// Serialized as `null` when unset
    #[serde(default)]
    pub conditions: Option<Vec<RabbitmqClusterCondition>>,

    /// Summary of the cluster health
    #[serde(
        rename = "clusterStatus",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub cluster_status: String,
}

/// References to the Secret and Service for the default user
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

    /// Maps credential names (username, password) to Secret keys
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct RabbitmqClusterServiceReference {
    pub name: String,
    pub namespace: String,
}
