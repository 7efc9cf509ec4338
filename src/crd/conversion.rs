//! CRD version conversion between v1beta1 and v2
//!
//! Provides bidirectional conversion for the RabbitmqCluster CRD.
//! v1beta1 is the hub; v2 converts to it (`convert_to`) and from it
//! (`convert_from`).
//!
//! ## Conversion rules:
//! - metadata is copied verbatim
//! - `clientService` (v2) <-> `service` (v1beta1): `type` only when non-empty,
//!   `annotations` only when set (an empty map is still copied)
//! - image, replicas, imagePullSecret and rabbitmq config strings are copied as-is
//! - plugins are relabeled element by element; an empty list stays unset
//! - status: admin is copied whole or not at all, conditions are never left
//!   null, clusterStatus is copied as-is
//!
//! Fields left untouched by a rule keep whatever the destination already held.
//! Empty plugin lists stay unset while empty conditions become an explicit
//! empty list.

use thiserror::Error;
use tracing::debug;

use super::hub::{ApiVersion, ClusterObject};
use super::status::RabbitmqClusterCondition;
use super::{v1beta1, v2};

/// Errors that can occur during conversion
///
/// Conversion of well-typed objects never fails; the only error is a hub
/// handle holding a different version than the entry point expects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("conversion hub holds {found}, expected {expected}")]
    HubVersionMismatch {
        expected: ApiVersion,
        found: ApiVersion,
    },
}

impl v2::RabbitmqCluster {
    /// Convert this v2 object into the v1beta1 hub held by `dst`
    ///
    /// On error `dst` is left as it was.
    pub fn convert_to(&self, dst: &mut ClusterObject) -> Result<(), ConversionError> {
        match dst {
            ClusterObject::V1beta1(hub) => {
                populate_v1beta1(self, hub);
                Ok(())
            }
            ClusterObject::V2(_) => Err(ConversionError::HubVersionMismatch {
                expected: ApiVersion::V1beta1,
                found: ApiVersion::V2,
            }),
        }
    }

    /// Populate this v2 object from the v1beta1 hub held by `src`
    ///
    /// On error `self` is left as it was.
    pub fn convert_from(&mut self, src: &ClusterObject) -> Result<(), ConversionError> {
        match src {
            ClusterObject::V1beta1(hub) => {
                populate_v2(hub, self);
                Ok(())
            }
            ClusterObject::V2(_) => Err(ConversionError::HubVersionMismatch {
                expected: ApiVersion::V1beta1,
                found: ApiVersion::V2,
            }),
        }
    }
}

impl ClusterObject {
    /// Convert into `desired`, passing through objects already in that version
    pub fn convert_into(self, desired: ApiVersion) -> Result<ClusterObject, ConversionError> {
        match (self, desired) {
            (ClusterObject::V2(spoke), ApiVersion::V1beta1) => {
                let mut hub = ClusterObject::empty(ApiVersion::V1beta1);
                spoke.convert_to(&mut hub)?;
                Ok(hub)
            }
            (hub @ ClusterObject::V1beta1(_), ApiVersion::V2) => {
                let mut spoke = v2::RabbitmqCluster::new("", Default::default());
                spoke.convert_from(&hub)?;
                Ok(ClusterObject::V2(Box::new(spoke)))
            }
            (same, _) => Ok(same),
        }
    }
}

/// Convert a v2 RabbitmqCluster to v1beta1
pub fn to_legacy(src: &v2::RabbitmqCluster) -> v1beta1::RabbitmqCluster {
    let mut dst = v1beta1::RabbitmqCluster::new("", Default::default());
    populate_v1beta1(src, &mut dst);
    dst
}

/// Convert a v1beta1 RabbitmqCluster to v2
pub fn from_legacy(src: &v1beta1::RabbitmqCluster) -> v2::RabbitmqCluster {
    let mut dst = v2::RabbitmqCluster::new("", Default::default());
    populate_v2(src, &mut dst);
    dst
}

fn populate_v1beta1(src: &v2::RabbitmqCluster, dst: &mut v1beta1::RabbitmqCluster) {
    debug!(
        name = ?src.metadata.name,
        namespace = ?src.metadata.namespace,
        "Converting RabbitmqCluster v2 -> v1beta1"
    );

    dst.metadata = src.metadata.clone();

    // clientService -> service
    let client_service = &src.spec.client_service;
    if !client_service.type_.is_empty() {
        dst.spec.service.type_ = client_service.type_.clone();
    }
    if let Some(annotations) = &client_service.annotations {
        dst.spec.service.annotations = Some(annotations.clone());
    }

    dst.spec.image = src.spec.image.clone();
    dst.spec.replicas = src.spec.replicas;
    dst.spec.image_pull_secret = src.spec.image_pull_secret.clone();

    let rabbitmq = &src.spec.rabbitmq;
    dst.spec.rabbitmq.advanced_config = rabbitmq.advanced_config.clone();
    dst.spec.rabbitmq.additional_config = rabbitmq.additional_config.clone();
    dst.spec.rabbitmq.env_config = rabbitmq.env_config.clone();
    if let Some(plugins) = plugins_to_v1beta1(rabbitmq.additional_plugins.as_deref()) {
        dst.spec.rabbitmq.additional_plugins = Some(plugins);
    }

    let empty = v2::RabbitmqClusterStatus::default();
    let src_status = src.status.as_ref().unwrap_or(&empty);
    let dst_status = dst.status.get_or_insert_with(Default::default);

    if let Some(admin) = &src_status.admin {
        dst_status.admin = Some(v1beta1::RabbitmqClusterAdmin {
            secret_reference: v1beta1::RabbitmqClusterSecretReference {
                name: admin.secret_reference.name.clone(),
                namespace: admin.secret_reference.namespace.clone(),
                keys: admin.secret_reference.keys.clone(),
            },
            service_reference: v1beta1::RabbitmqClusterServiceReference {
                name: admin.service_reference.name.clone(),
                namespace: admin.service_reference.namespace.clone(),
            },
        });
    }
    dst_status.conditions = Some(normalize_conditions(src_status.conditions.as_deref()));
    dst_status.cluster_status = src_status.cluster_status.clone();
}

fn populate_v2(src: &v1beta1::RabbitmqCluster, dst: &mut v2::RabbitmqCluster) {
    debug!(
        name = ?src.metadata.name,
        namespace = ?src.metadata.namespace,
        "Converting RabbitmqCluster v1beta1 -> v2"
    );

    dst.metadata = src.metadata.clone();

    // service -> clientService
    let service = &src.spec.service;
    if !service.type_.is_empty() {
        dst.spec.client_service.type_ = service.type_.clone();
    }
    if let Some(annotations) = &service.annotations {
        dst.spec.client_service.annotations = Some(annotations.clone());
    }

    dst.spec.image = src.spec.image.clone();
    dst.spec.replicas = src.spec.replicas;
    dst.spec.image_pull_secret = src.spec.image_pull_secret.clone();

    let rabbitmq = &src.spec.rabbitmq;
    dst.spec.rabbitmq.advanced_config = rabbitmq.advanced_config.clone();
    dst.spec.rabbitmq.additional_config = rabbitmq.additional_config.clone();
    dst.spec.rabbitmq.env_config = rabbitmq.env_config.clone();
    if let Some(plugins) = plugins_to_v2(rabbitmq.additional_plugins.as_deref()) {
        dst.spec.rabbitmq.additional_plugins = Some(plugins);
    }

    let empty = v1beta1::RabbitmqClusterStatus::default();
    let src_status = src.status.as_ref().unwrap_or(&empty);
    let dst_status = dst.status.get_or_insert_with(Default::default);

    if let Some(admin) = &src_status.admin {
        dst_status.admin = Some(v2::RabbitmqClusterAdmin {
            secret_reference: v2::RabbitmqClusterSecretReference {
                name: admin.secret_reference.name.clone(),
                namespace: admin.secret_reference.namespace.clone(),
                keys: admin.secret_reference.keys.clone(),
            },
            service_reference: v2::RabbitmqClusterServiceReference {
                name: admin.service_reference.name.clone(),
                namespace: admin.service_reference.namespace.clone(),
            },
        });
    }
    dst_status.conditions = Some(normalize_conditions(src_status.conditions.as_deref()));
    dst_status.cluster_status = src_status.cluster_status.clone();
}

/// Relabel plugins from one version's `Plugin` type to another's
///
/// An empty (or absent) list yields `None`, never `Some(vec![])`.
/// Order and duplicates are kept.
pub fn transcode_plugins<S, T>(src: Option<&[S]>) -> Option<Vec<T>>
where
    S: AsRef<str>,
    T: From<String>,
{
    match src {
        None | Some([]) => None,
        Some(plugins) => Some(
            plugins
                .iter()
                .map(|plugin| T::from(plugin.as_ref().to_string()))
                .collect(),
        ),
    }
}

pub fn plugins_to_v1beta1(src: Option<&[v2::Plugin]>) -> Option<Vec<v1beta1::Plugin>> {
    transcode_plugins(src)
}

pub fn plugins_to_v2(src: Option<&[v1beta1::Plugin]>) -> Option<Vec<v2::Plugin>> {
    transcode_plugins(src)
}

/// Conditions are never emitted as null
fn normalize_conditions(src: Option<&[RabbitmqClusterCondition]>) -> Vec<RabbitmqClusterCondition> {
    match src {
        None | Some([]) => Vec::new(),
        Some(conditions) => conditions.to_vec(),
    }
}

#[cfg(test)]
#[path = "conversion_test.rs"]
mod tests;
