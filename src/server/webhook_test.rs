//! Tests for CRD conversion webhook

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{convert_clusters, convert_object, ConversionRequest, ObjectError};
use crate::crd::hub::ApiVersion;
use serde_json::json;

fn request(desired: &str, objects: Vec<serde_json::Value>) -> ConversionRequest {
    ConversionRequest {
        uid: "test-uid-123".to_string(),
        desired_api_version: desired.to_string(),
        objects,
    }
}

fn v2_object() -> serde_json::Value {
    json!({
        "apiVersion": "rabbitmq.com/v2",
        "kind": "RabbitmqCluster",
        "metadata": {
            "name": "hello-world",
            "namespace": "default",
            "labels": {"app": "rabbitmq"},
            "annotations": {"note": "test"},
            "resourceVersion": "17"
        },
        "spec": {
            "replicas": 3,
            "image": "rabbitmq:3.13-management",
            "clientService": {
                "type": "LoadBalancer",
                "annotations": {"a": "b"}
            },
            "rabbitmq": {
                "additionalPlugins": ["rabbitmq_management", "rabbitmq_shovel"]
            }
        }
    })
}

/// Test: Webhook converts v2 to v1beta1
#[test]
fn test_convert_v2_to_v1beta1() {
    let (response, outcomes) =
        convert_clusters(request("rabbitmq.com/v1beta1", vec![v2_object()]));

    assert_eq!(response.result.status, "Success");
    assert_eq!(response.uid, "test-uid-123");
    assert_eq!(response.converted_objects.len(), 1);
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].from, Some(ApiVersion::V2));

    let converted = &response.converted_objects[0];
    assert_eq!(converted["apiVersion"], "rabbitmq.com/v1beta1");
    assert_eq!(converted["kind"], "RabbitmqCluster");
    assert_eq!(converted["spec"]["service"]["type"], "LoadBalancer");
    assert_eq!(converted["spec"]["service"]["annotations"]["a"], "b");
    assert!(converted["spec"].get("clientService").is_none());
    assert_eq!(
        converted["spec"]["rabbitmq"]["additionalPlugins"],
        json!(["rabbitmq_management", "rabbitmq_shovel"])
    );
    assert_eq!(converted["spec"]["replicas"], 3);
    assert_eq!(converted["status"]["conditions"], json!([]));
    assert!(converted["status"].get("admin").is_none());
}

/// Test: Webhook converts v1beta1 to v2
#[test]
fn test_convert_v1beta1_to_v2() {
    let object = json!({
        "apiVersion": "rabbitmq.com/v1beta1",
        "kind": "RabbitmqCluster",
        "metadata": {"name": "legacy", "namespace": "default"},
        "spec": {
            "replicas": 1,
            "service": {"type": "NodePort"}
        },
        "status": {
            "clusterStatus": "Running",
            "conditions": null,
            "admin": {
                "secretReference": {
                    "name": "legacy-default-user",
                    "namespace": "default",
                    "keys": {"username": "username", "password": "password"}
                },
                "serviceReference": {"name": "legacy", "namespace": "default"}
            }
        }
    });

    let (response, _) = convert_clusters(request("rabbitmq.com/v2", vec![object]));

    assert_eq!(response.result.status, "Success");
    let converted = &response.converted_objects[0];
    assert_eq!(converted["apiVersion"], "rabbitmq.com/v2");
    assert_eq!(converted["spec"]["clientService"]["type"], "NodePort");
    assert!(converted["spec"]["clientService"].get("annotations").is_none());
    assert!(converted["spec"].get("service").is_none());
    assert!(converted["spec"]["rabbitmq"].get("additionalPlugins").is_none());
    assert_eq!(converted["status"]["clusterStatus"], "Running");
    assert_eq!(converted["status"]["conditions"], json!([]));
    assert_eq!(
        converted["status"]["admin"]["secretReference"]["name"],
        "legacy-default-user"
    );
    assert_eq!(
        converted["status"]["admin"]["serviceReference"]["name"],
        "legacy"
    );
}

/// Test: Webhook preserves metadata during conversion
#[test]
fn test_convert_preserves_metadata() {
    let (response, _) = convert_clusters(request("rabbitmq.com/v1beta1", vec![v2_object()]));

    let converted = &response.converted_objects[0];
    assert_eq!(converted["metadata"]["name"], "hello-world");
    assert_eq!(converted["metadata"]["namespace"], "default");
    assert_eq!(converted["metadata"]["labels"]["app"], "rabbitmq");
    assert_eq!(converted["metadata"]["annotations"]["note"], "test");
    assert_eq!(converted["metadata"]["resourceVersion"], "17");
}

/// Test: Webhook handles multiple objects in single request
#[test]
fn test_convert_multiple_objects() {
    let mut second = v2_object();
    second["metadata"]["name"] = json!("second");

    let (response, outcomes) =
        convert_clusters(request("rabbitmq.com/v1beta1", vec![v2_object(), second]));

    assert_eq!(response.result.status, "Success");
    assert_eq!(response.converted_objects.len(), 2);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(response.converted_objects[0]["metadata"]["name"], "hello-world");
    assert_eq!(response.converted_objects[1]["metadata"]["name"], "second");
}

/// Test: Webhook handles same-version "conversion" (no-op)
#[test]
fn test_convert_same_version_is_noop() {
    let original = v2_object();

    let converted = convert_object(&original, ApiVersion::V2).unwrap();

    assert_eq!(converted, original);
}

/// Test: Webhook returns error for unknown desired version
#[test]
fn test_convert_unknown_desired_version_fails() {
    let (response, outcomes) = convert_clusters(request("rabbitmq.com/v3", vec![v2_object()]));

    assert_eq!(response.result.status, "Failed");
    assert!(response.result.message.unwrap().contains("rabbitmq.com/v3"));
    assert!(response.converted_objects.is_empty());
    assert!(outcomes.is_empty());
}

/// Test: Desired version from another group is rejected
#[test]
fn test_convert_foreign_group_fails() {
    let (response, _) = convert_clusters(request("apps.example.com/v1beta1", vec![v2_object()]));

    assert_eq!(response.result.status, "Failed");
}

/// Test: One bad object fails the whole review and names the object
#[test]
fn test_convert_bad_object_fails_review() {
    let bad = json!({
        "apiVersion": "rabbitmq.com/v1alpha1",
        "kind": "RabbitmqCluster",
        "metadata": {"name": "ancient", "namespace": "old"},
        "spec": {}
    });

    let (response, outcomes) =
        convert_clusters(request("rabbitmq.com/v1beta1", vec![v2_object(), bad]));

    assert_eq!(response.result.status, "Failed");
    assert!(response.converted_objects.is_empty());
    let message = response.result.message.unwrap();
    assert!(message.contains("object 1"), "message: {}", message);
    assert!(message.contains("namespace: old, name: ancient"), "message: {}", message);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].success);
    assert!(!outcomes[1].success);
    assert_eq!(outcomes[1].from, None);
}

/// Test: Missing apiVersion is reported
#[test]
fn test_convert_missing_api_version() {
    let object = json!({"kind": "RabbitmqCluster", "metadata": {"name": "x"}, "spec": {}});

    let err = convert_object(&object, ApiVersion::V2).unwrap_err();

    assert!(matches!(err, ObjectError::MissingApiVersion { .. }));
}

/// Test: Objects of another kind are rejected
#[test]
fn test_convert_wrong_kind() {
    let object = json!({
        "apiVersion": "rabbitmq.com/v2",
        "kind": "Queue",
        "metadata": {"name": "q"},
        "spec": {}
    });

    let err = convert_object(&object, ApiVersion::V1beta1).unwrap_err();

    assert!(matches!(err, ObjectError::UnexpectedKind { .. }));
}

/// Test: Objects that do not match the schema are reported as decode errors
#[test]
fn test_convert_undecodable_object() {
    let object = json!({
        "apiVersion": "rabbitmq.com/v2",
        "kind": "RabbitmqCluster",
        "metadata": {"name": "broken"},
        "spec": {"replicas": "three"}
    });

    let err = convert_object(&object, ApiVersion::V1beta1).unwrap_err();

    assert!(matches!(
        err,
        ObjectError::Decode {
            version: ApiVersion::V2,
            ..
        }
    ));
    assert!(err.to_string().contains("name: broken"));
}
