#![allow(clippy::unwrap_used)]

use super::*;
use crate::crd::hub::ApiVersion;

#[test]
fn test_fresh_registry_encodes() {
    let metrics = create_metrics().unwrap();

    // Counter vectors without samples are not emitted yet
    assert!(metrics.encode().is_ok());
}

#[test]
fn test_records_objects_by_direction_and_result() {
    let metrics = create_metrics().unwrap();

    metrics.record_object(&ObjectOutcome {
        from: Some(ApiVersion::V2),
        to: ApiVersion::V1beta1,
        success: true,
    });
    metrics.record_object(&ObjectOutcome {
        from: Some(ApiVersion::V2),
        to: ApiVersion::V1beta1,
        success: true,
    });
    metrics.record_object(&ObjectOutcome {
        from: None,
        to: ApiVersion::V2,
        success: false,
    });

    let body = metrics.encode().unwrap();
    assert!(
        body.contains(
            r#"rabbitmq_conversion_objects_total{from="v2",result="success",to="v1beta1"} 2"#
        ),
        "{}",
        body
    );
    assert!(
        body.contains(
            r#"rabbitmq_conversion_objects_total{from="unknown",result="failure",to="v2"} 1"#
        ),
        "{}",
        body
    );
}

#[test]
fn test_records_reviews() {
    let metrics = create_metrics().unwrap();

    metrics.record_review(true);
    metrics.record_review(false);
    metrics.record_review(true);

    let body = metrics.encode().unwrap();
    assert!(body.contains(r#"rabbitmq_conversion_reviews_total{result="success"} 2"#));
    assert!(body.contains(r#"rabbitmq_conversion_reviews_total{result="failure"} 1"#));
}
