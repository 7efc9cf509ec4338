//! Status types shared by every RabbitmqCluster API version
//!
//! Conditions carry the same shape in v1beta1 and v2, so both versions
//! re-export this type instead of declaring their own.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single observation about the state of a RabbitmqCluster
///
/// Typical types are `AllReplicasReady`, `ClusterAvailable`,
/// `NoWarnings` and `ReconcileSuccess`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct RabbitmqClusterCondition {
    /// Condition type
    #[serde(rename = "type")]
    pub type_: String,

    /// One of "True", "False" or "Unknown"
    pub status: String,

    /// Last time the condition changed status
    #[serde(rename = "lastTransitionTime", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub last_transition_time: Option<Time>,

    /// One-word, CamelCase reason for the last transition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    /// Human-readable details about the last transition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}
