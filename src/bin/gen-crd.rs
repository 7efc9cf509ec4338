use kube::CustomResourceExt;
use rabbitmq_conversion::config::{DEFAULT_HTTPS_PORT, DEFAULT_NAMESPACE, DEFAULT_SERVICE_NAME};
use rabbitmq_conversion::crd::v1beta1::RabbitmqCluster as RabbitmqClusterV1beta1;
use rabbitmq_conversion::crd::v2::RabbitmqCluster as RabbitmqClusterV2;
use serde_json::{json, Value};

fn main() -> anyhow::Result<()> {
    // Generate the CRD with both versions and the conversion webhook
    // Use: cargo run --bin gen-crd | python3 -c "import sys,json,yaml; print(yaml.dump(json.load(sys.stdin), default_flow_style=False))"
    // to convert to YAML

    // v1beta1 is the hub, so it stays the storage version
    let mut crd: Value = serde_json::to_value(RabbitmqClusterV1beta1::crd())?;
    let v2_crd: Value = serde_json::to_value(RabbitmqClusterV2::crd())?;

    let mut v2 = v2_crd["spec"]["versions"][0].clone();
    v2["served"] = json!(true);
    v2["storage"] = json!(false);

    let versions = crd["spec"]["versions"]
        .as_array_mut()
        .ok_or_else(|| anyhow::anyhow!("generated CRD has no versions"))?;
    if let Some(v1beta1) = versions.get_mut(0) {
        v1beta1["served"] = json!(true);
        v1beta1["storage"] = json!(true);
    }
    versions.push(v2);

    crd["spec"]["conversion"] = json!({
        "strategy": "Webhook",
        "webhook": {
            "clientConfig": {
                "service": {
                    "name": DEFAULT_SERVICE_NAME,
                    "namespace": DEFAULT_NAMESPACE,
                    "path": "/convert",
                    "port": DEFAULT_HTTPS_PORT
                }
            },
            "conversionReviewVersions": ["v1"]
        }
    });

    println!("{}", serde_json::to_string_pretty(&crd)?);
    Ok(())
}
