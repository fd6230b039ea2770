// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end admission of pods through a configured chain.

use k8s_localtime_admission::admission::attributes::{GroupVersionKind, GroupVersionResource};
use k8s_localtime_admission::admission::{AdmissionConfiguration, Scheme};
use k8s_localtime_admission::plugins::localtime::{LOCALTIME_PATH, LOCALTIME_VOLUME_NAME};
use k8s_localtime_admission::plugins::register_all_admission_plugins;
use k8s_localtime_admission::{
    AdmissionError, AttributesRecord, ChainHandler, Operation, Phase, Pod, Plugins,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn localtime_chain() -> ChainHandler {
    let plugins = Plugins::new();
    register_all_admission_plugins(&plugins);
    let config = AdmissionConfiguration::from_slice(
        br#"{"plugins": [{"name": "Localtime", "configuration": {"unused": 1}}]}"#,
    )
    .unwrap();
    plugins.new_from_configuration(&config).unwrap()
}

fn decode_pod(operation: Operation, raw: &str) -> AttributesRecord {
    let pod: Pod = serde_json::from_str(raw).unwrap();
    AttributesRecord::new_pod(operation, pod)
}

const OPTED_IN_POD: &str = r#"{
    "metadata": {
        "name": "123",
        "namespace": "test",
        "annotations": {"kubernetes.io/localtime": "true"}
    },
    "spec": {
        "initContainers": [{"name": "init1", "image": "image"}],
        "containers": [
            {"name": "ctr1", "image": "image"},
            {"name": "ctr2", "image": "image"}
        ]
    }
}"#;

#[test]
fn mutate_then_validate_opted_in_pod() {
    init_tracing();
    let chain = localtime_chain();
    let mut attrs = decode_pod(Operation::Create, OPTED_IN_POD);

    chain.run(Phase::Mutating, &mut attrs).unwrap();
    chain.run(Phase::Validating, &mut attrs).unwrap();

    let pod = attrs.get_pod().unwrap();
    assert_eq!(pod.spec.volumes.len(), 1);
    assert_eq!(pod.spec.volumes[0].name, LOCALTIME_VOLUME_NAME);
    assert_eq!(pod.spec.volumes[0].host_path(), Some(LOCALTIME_PATH));
    for c in pod.spec.init_containers.iter().chain(&pod.spec.containers) {
        assert_eq!(c.volume_mounts.len(), 1, "container {}", c.name);
    }

    let stored = serde_json::to_value(pod).unwrap();
    assert_eq!(
        stored["spec"]["containers"][1]["volumeMounts"][0],
        serde_json::json!({"name": "kubernetes-localtime", "mountPath": "/etc/localtime", "readOnly": true})
    );
    assert_eq!(
        stored["spec"]["volumes"][0],
        serde_json::json!({"name": "kubernetes-localtime", "hostPath": {"path": "/etc/localtime"}})
    );
}

#[test]
fn pod_without_annotation_is_untouched() {
    init_tracing();
    let chain = localtime_chain();
    let mut attrs = decode_pod(
        Operation::Create,
        r#"{"metadata": {"name": "plain"}, "spec": {}}"#,
    );

    chain.run(Phase::Mutating, &mut attrs).unwrap();
    chain.run(Phase::Validating, &mut attrs).unwrap();

    let pod = attrs.get_pod().unwrap();
    assert!(pod.spec.volumes.is_empty());
    assert!(pod.spec.containers.is_empty());
}

/// Mutation only runs on create; an update that dropped the mount is caught
/// by validation.
#[test]
fn update_is_validated_but_not_mutated() {
    init_tracing();
    let chain = localtime_chain();
    let mut attrs = decode_pod(Operation::Update, OPTED_IN_POD);

    chain.run(Phase::Mutating, &mut attrs).unwrap();
    assert!(attrs.get_pod().unwrap().spec.volumes.is_empty());

    let err = chain.run(Phase::Validating, &mut attrs).unwrap_err();
    assert_eq!(err.code(), 403);
    assert_eq!(err.field_error().unwrap().field, "spec.volumes");
}

#[test]
fn delete_is_not_handled() {
    let chain = localtime_chain();
    let mut attrs = decode_pod(Operation::Delete, OPTED_IN_POD);

    chain.run(Phase::Mutating, &mut attrs).unwrap();
    chain.run(Phase::Validating, &mut attrs).unwrap();
    assert!(attrs.get_pod().unwrap().spec.volumes.is_empty());
}

#[test]
fn pre_populated_pod_validates_without_change() {
    let chain = localtime_chain();
    let raw = r#"{
        "metadata": {"name": "ready", "annotations": {"kubernetes.io/localtime": "true"}},
        "spec": {
            "initContainers": [{"name": "init1", "volumeMounts": [
                {"name": "kubernetes-localtime", "mountPath": "/etc/localtime", "readOnly": true}
            ]}],
            "containers": [{"name": "ctr1", "volumeMounts": [
                {"name": "kubernetes-localtime", "mountPath": "/etc/localtime", "readOnly": true}
            ]}],
            "volumes": [{"name": "kubernetes-localtime", "hostPath": {"path": "/etc/localtime"}}]
        }
    }"#;
    let mut attrs = decode_pod(Operation::Create, raw);
    let before = attrs.get_pod().unwrap().clone();

    chain.run(Phase::Validating, &mut attrs).unwrap();
    assert_eq!(attrs.get_pod().unwrap(), &before);
}

#[test]
fn subresource_request_with_foreign_payload_is_ignored() {
    let chain = localtime_chain();
    let scheme = Scheme::new();
    let mut attrs = AttributesRecord::from_raw(
        &scheme,
        "web",
        "default",
        GroupVersionResource::new("", "v1", "pods"),
        "binding",
        Operation::Create,
        GroupVersionKind::new("", "v1", "Service"),
        br#"{"metadata": {"name": "web"}}"#,
    )
    .unwrap();

    chain.run(Phase::Mutating, &mut attrs).unwrap();
    chain.run(Phase::Validating, &mut attrs).unwrap();
}

#[test]
fn pod_resource_with_foreign_payload_is_a_bad_request() {
    let chain = localtime_chain();
    let scheme = Scheme::new();
    let mut attrs = AttributesRecord::from_raw(
        &scheme,
        "web",
        "default",
        GroupVersionResource::new("", "v1", "pods"),
        "",
        Operation::Create,
        GroupVersionKind::new("", "v1", "Service"),
        br#"{"metadata": {"name": "web"}}"#,
    )
    .unwrap();

    let err = chain.run(Phase::Mutating, &mut attrs).unwrap_err();
    assert!(matches!(err, AdmissionError::BadRequest(_)));
    assert_eq!(err.code(), 400);
}

#[test]
fn denial_names_first_offending_container() {
    let chain = localtime_chain();
    let raw = r#"{
        "metadata": {"name": "half", "namespace": "prod", "annotations": {"kubernetes.io/localtime": "true"}},
        "spec": {
            "containers": [
                {"name": "ok", "volumeMounts": [
                    {"name": "kubernetes-localtime", "mountPath": "/etc/localtime", "readOnly": true}
                ]},
                {"name": "rw", "volumeMounts": [
                    {"name": "kubernetes-localtime", "mountPath": "/etc/localtime"}
                ]},
                {"name": "bare"}
            ],
            "volumes": [{"name": "kubernetes-localtime", "hostPath": {"path": "/etc/localtime"}}]
        }
    }"#;
    let mut attrs = decode_pod(Operation::Create, raw);

    let err = chain.run(Phase::Validating, &mut attrs).unwrap_err();
    assert_eq!(
        err.field_error().unwrap().field,
        "spec.containers[1].volumeMounts"
    );
    assert!(err.to_string().starts_with("pods \"half\" is forbidden: "));
}

#[test]
fn admitted_pod_keeps_fields_outside_the_localtime_mount() {
    let chain = localtime_chain();
    let scheme = Scheme::new();
    let raw = br#"{
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": "p",
            "labels": {"app": "web"},
            "annotations": {"kubernetes.io/localtime": "true"}
        },
        "spec": {
            "nodeName": "node-1",
            "containers": [{
                "name": "c",
                "image": "i",
                "command": ["sleep", "3600"],
                "env": [{"name": "TZ", "value": "UTC"}]
            }],
            "volumes": [{"name": "cfg", "configMap": {"name": "app-config"}}]
        }
    }"#;
    let mut attrs = AttributesRecord::from_raw(
        &scheme,
        "p",
        "",
        GroupVersionResource::new("", "v1", "pods"),
        "",
        Operation::Create,
        GroupVersionKind::new("", "v1", "Pod"),
        raw,
    )
    .unwrap();

    chain.run(Phase::Mutating, &mut attrs).unwrap();
    chain.run(Phase::Validating, &mut attrs).unwrap();

    let stored = serde_json::to_value(attrs.get_pod().unwrap()).unwrap();
    assert_eq!(stored["apiVersion"], "v1");
    assert_eq!(stored["kind"], "Pod");
    assert_eq!(stored["metadata"]["labels"]["app"], "web");
    assert_eq!(stored["spec"]["nodeName"], "node-1");
    assert_eq!(stored["spec"]["containers"][0]["command"], serde_json::json!(["sleep", "3600"]));
    assert_eq!(stored["spec"]["containers"][0]["env"][0]["value"], "UTC");
    assert_eq!(
        stored["spec"]["volumes"][0],
        serde_json::json!({"name": "cfg", "configMap": {"name": "app-config"}})
    );
    assert_eq!(stored["spec"]["volumes"][1]["name"], LOCALTIME_VOLUME_NAME);
}
