//! Conversion hub for RabbitmqCluster
//!
//! A `ClusterObject` holds a RabbitmqCluster in exactly one of the two
//! served versions. The converter entry points take it as the generic
//! source or destination and match on the variant they expect.

use std::fmt;

use serde::Serialize;

use super::{v1beta1, v2, GROUP};

/// Served API versions of RabbitmqCluster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    V1beta1,
    V2,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 2] = [ApiVersion::V1beta1, ApiVersion::V2];

    /// Version part only, e.g. "v1beta1"
    pub fn version(self) -> &'static str {
        match self {
            ApiVersion::V1beta1 => "v1beta1",
            ApiVersion::V2 => "v2",
        }
    }

    /// Full apiVersion, e.g. "rabbitmq.com/v1beta1"
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1beta1 => "rabbitmq.com/v1beta1",
            ApiVersion::V2 => "rabbitmq.com/v2",
        }
    }

    /// Parse a full `group/version` string
    ///
    /// Returns `None` for other groups, bare versions and unknown versions.
    pub fn parse(api_version: &str) -> Option<Self> {
        let (group, version) = api_version.split_once('/')?;
        if group != GROUP {
            return None;
        }
        Self::ALL.into_iter().find(|v| v.version() == version)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A RabbitmqCluster in one of the served versions
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClusterObject {
    V1beta1(Box<v1beta1::RabbitmqCluster>),
    V2(Box<v2::RabbitmqCluster>),
}

impl ClusterObject {
    /// An object of `version` with default spec and no status, used as a
    /// conversion destination
    pub fn empty(version: ApiVersion) -> Self {
        match version {
            ApiVersion::V1beta1 => ClusterObject::V1beta1(Box::new(
                v1beta1::RabbitmqCluster::new("", Default::default()),
            )),
            ApiVersion::V2 => {
                ClusterObject::V2(Box::new(v2::RabbitmqCluster::new("", Default::default())))
            }
        }
    }

    pub fn version(&self) -> ApiVersion {
        match self {
            ClusterObject::V1beta1(_) => ApiVersion::V1beta1,
            ClusterObject::V2(_) => ApiVersion::V2,
        }
    }

    /// Decode a raw object whose apiVersion has already been resolved
    pub fn from_value(
        version: ApiVersion,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match version {
            ApiVersion::V1beta1 => ClusterObject::V1beta1(Box::new(serde_json::from_value(value)?)),
            ApiVersion::V2 => ClusterObject::V2(Box::new(serde_json::from_value(value)?)),
        })
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl From<v1beta1::RabbitmqCluster> for ClusterObject {
    fn from(cluster: v1beta1::RabbitmqCluster) -> Self {
        ClusterObject::V1beta1(Box::new(cluster))
    }
}

impl From<v2::RabbitmqCluster> for ClusterObject {
    fn from(cluster: v2::RabbitmqCluster) -> Self {
        ClusterObject::V2(Box::new(cluster))
    }
}
