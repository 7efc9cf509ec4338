//! RabbitmqCluster custom resource in both served API versions
//!
//! - `v1beta1`: legacy schema, storage version and conversion hub
//! - `v2`: current schema, converted to and from the hub

pub mod conversion;
pub mod hub;
pub mod status;
pub mod v1beta1;
pub mod v2;

/// API group shared by every RabbitmqCluster version
pub const GROUP: &str = "rabbitmq.com";

/// Kind shared by every RabbitmqCluster version
pub const KIND: &str = "RabbitmqCluster";

#[cfg(test)]
#[path = "types_test.rs"]
mod types_tests;
