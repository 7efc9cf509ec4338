//! CRD Conversion Webhook for RabbitmqCluster resources
//!
//! Handles conversion between v1beta1 and v2 versions of the RabbitmqCluster CRD.
//! Kubernetes calls this webhook when it needs to convert between versions.
//!
//! ## Endpoints
//! - POST /convert - Kubernetes ConversionReview webhook
//!
//! Each object is decoded into its typed version, converted through the
//! v1beta1 hub and encoded again. The first failing object fails the
//! whole review.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::crd::conversion::ConversionError;
use crate::crd::hub::{ApiVersion, ClusterObject};
use crate::crd::KIND;
use crate::server::http::ServerState;

pub const STATUS_SUCCESS: &str = "Success";
pub const STATUS_FAILED: &str = "Failed";

/// Kubernetes ConversionReview request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReview {
    pub api_version: String,
    pub kind: String,
    pub request: ConversionRequest,
}

/// The actual conversion request from Kubernetes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// Unique ID for this request
    pub uid: String,
    /// Target API version (e.g., "rabbitmq.com/v1beta1")
    #[serde(rename = "desiredAPIVersion", alias = "desiredApiVersion")]
    pub desired_api_version: String,
    /// Objects to convert
    pub objects: Vec<Value>,
}

/// Result status for conversion
#[derive(Debug, Serialize, PartialEq)]
pub struct ConversionResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for a conversion request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub uid: String,
    pub result: ConversionResult,
    pub converted_objects: Vec<Value>,
}

impl ConversionResponse {
    fn failed(uid: String, message: String) -> Self {
        Self {
            uid,
            result: ConversionResult {
                status: STATUS_FAILED.to_string(),
                message: Some(message),
            },
            converted_objects: vec![],
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.status == STATUS_SUCCESS
    }
}

/// Full ConversionReview response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub response: ConversionResponse,
}

/// Why a single object could not be converted
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("missing apiVersion{context}")]
    MissingApiVersion { context: String },

    #[error("unsupported apiVersion '{api_version}'{context}")]
    UnsupportedApiVersion { api_version: String, context: String },

    #[error("unexpected kind '{kind}'{context}, expected RabbitmqCluster")]
    UnexpectedKind { kind: String, context: String },

    #[error("failed to decode {version} object{context}: {source}")]
    Decode {
        version: ApiVersion,
        context: String,
        source: serde_json::Error,
    },

    #[error("failed to encode {version} object{context}: {source}")]
    Encode {
        version: ApiVersion,
        context: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Outcome of converting one object, for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectOutcome {
    pub from: Option<ApiVersion>,
    pub to: ApiVersion,
    pub success: bool,
}

/// Build a short context string (namespace/name) for error messages
fn object_context(obj: &Value) -> String {
    let metadata = obj.get("metadata");
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(|n| n.as_str());
    let namespace = metadata
        .and_then(|m| m.get("namespace"))
        .and_then(|n| n.as_str());
    match (namespace, name) {
        (Some(ns), Some(n)) => format!(" (namespace: {}, name: {})", ns, n),
        (None, Some(n)) => format!(" (name: {})", n),
        (Some(ns), None) => format!(" (namespace: {})", ns),
        _ => String::new(),
    }
}

/// Resolve the version a raw object is currently in
fn source_version(obj: &Value) -> Result<ApiVersion, ObjectError> {
    let api_version = obj
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ObjectError::MissingApiVersion {
            context: object_context(obj),
        })?;

    if let Some(kind) = obj.get("kind").and_then(|k| k.as_str()) {
        if kind != KIND {
            return Err(ObjectError::UnexpectedKind {
                kind: kind.to_string(),
                context: object_context(obj),
            });
        }
    }

    ApiVersion::parse(api_version).ok_or_else(|| ObjectError::UnsupportedApiVersion {
        api_version: api_version.to_string(),
        context: object_context(obj),
    })
}

/// Convert a single RabbitmqCluster object to the desired version
pub fn convert_object(obj: &Value, desired: ApiVersion) -> Result<Value, ObjectError> {
    let current = source_version(obj)?;

    // Same version - no conversion needed
    if current == desired {
        return Ok(obj.clone());
    }

    let source =
        ClusterObject::from_value(current, obj.clone()).map_err(|source| ObjectError::Decode {
            version: current,
            context: object_context(obj),
            source,
        })?;

    let converted = source.convert_into(desired)?;

    converted.to_value().map_err(|source| ObjectError::Encode {
        version: desired,
        context: object_context(obj),
        source,
    })
}

/// Convert all objects in a request
///
/// Returns the response along with one outcome per object attempted.
pub fn convert_clusters(request: ConversionRequest) -> (ConversionResponse, Vec<ObjectOutcome>) {
    let desired = match ApiVersion::parse(&request.desired_api_version) {
        Some(v) => v,
        None => {
            let message = format!(
                "Unsupported desired API version: {}",
                request.desired_api_version
            );
            return (ConversionResponse::failed(request.uid, message), vec![]);
        }
    };

    let mut outcomes = Vec::with_capacity(request.objects.len());
    let mut converted_objects = Vec::with_capacity(request.objects.len());

    for (index, obj) in request.objects.iter().enumerate() {
        let from = source_version(obj).ok();
        match convert_object(obj, desired) {
            Ok(converted) => {
                outcomes.push(ObjectOutcome {
                    from,
                    to: desired,
                    success: true,
                });
                converted_objects.push(converted);
            }
            Err(e) => {
                outcomes.push(ObjectOutcome {
                    from,
                    to: desired,
                    success: false,
                });
                let message = format!("Conversion of object {} failed: {}", index, e);
                return (ConversionResponse::failed(request.uid, message), outcomes);
            }
        }
    }

    let response = ConversionResponse {
        uid: request.uid,
        result: ConversionResult {
            status: STATUS_SUCCESS.to_string(),
            message: None,
        },
        converted_objects,
    };
    (response, outcomes)
}

/// Axum handler for the /convert endpoint
pub async fn handle_convert(
    State(state): State<ServerState>,
    Json(review): Json<ConversionReview>,
) -> impl IntoResponse {
    info!(
        uid = %review.request.uid,
        desired_version = %review.request.desired_api_version,
        object_count = review.request.objects.len(),
        "Processing conversion request"
    );

    let (response, outcomes) = convert_clusters(review.request);

    for outcome in &outcomes {
        state.metrics.record_object(outcome);
    }
    state.metrics.record_review(response.is_success());

    if response.is_success() {
        info!(
            uid = %response.uid,
            converted_count = response.converted_objects.len(),
            "Conversion successful"
        );
    } else {
        warn!(
            uid = %response.uid,
            error = ?response.result.message,
            "Conversion failed"
        );
    }

    let review_response = ConversionReviewResponse {
        api_version: "apiextensions.k8s.io/v1".to_string(),
        kind: "ConversionReview".to_string(),
        response,
    };

    (StatusCode::OK, Json(review_response))
}

#[cfg(test)]
#[path = "webhook_test.rs"]
mod tests;
