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

//! Core Kubernetes API types (Pod, Container, Volume, Service).
//!
//! Only the fields admission plugins in this crate read or write are modelled.
//! Everything else is carried through untouched in `extra` maps, so a decoded
//! object re-encodes with all of its original fields. Objects serialize with
//! the API server's camelCase field names and the `metadata`/`spec` envelope.

use crate::admission::attributes::GroupResource;
use crate::admission::field::Path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;

/// ApiObject is a trait for Kubernetes API objects that can be used in admission.
pub trait ApiObject: Send + Sync {
    /// Returns the object as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the object as mutable Any for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the kind of this object.
    fn kind(&self) -> &str;
}

// ============================================================================
// Metadata
// ============================================================================

/// ObjectMeta is the subset of object metadata carried by the types here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Volume Types
// ============================================================================

/// HostPathType constrains what may exist at a host path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HostPathType {
    /// No checks are performed before mounting.
    #[default]
    #[serde(rename = "")]
    Unset,
    DirectoryOrCreate,
    Directory,
    FileOrCreate,
    File,
    Socket,
    CharDevice,
    BlockDevice,
}

/// HostPathVolumeSource represents a file or directory on the node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostPathVolumeSource {
    /// Path of the file or directory on the host.
    pub path: String,
    /// Type for the host path.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<HostPathType>,
}

impl HostPathVolumeSource {
    /// Create a host path source with no type check.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            type_: None,
        }
    }
}

/// EmptyDirVolumeSource is a scratch directory that lives as long as the pod.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmptyDirVolumeSource {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub medium: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// VolumeSource represents the source of a volume. At most one member is set.
/// Source kinds not modelled here (configMap, secret, ...) land in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Volume represents a named volume in a pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Name of the volume.
    pub name: String,
    /// Volume source.
    #[serde(flatten)]
    pub volume_source: VolumeSource,
}

impl Volume {
    /// Create a new host path volume.
    pub fn new_host_path(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            volume_source: VolumeSource {
                host_path: Some(HostPathVolumeSource::new(path)),
                ..Default::default()
            },
        }
    }

    /// Create a new emptyDir volume.
    pub fn new_empty_dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            volume_source: VolumeSource {
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            },
        }
    }

    /// The host path this volume is backed by, if it is a host path volume.
    pub fn host_path(&self) -> Option<&str> {
        self.volume_source
            .host_path
            .as_ref()
            .map(|hp| hp.path.as_str())
    }
}

/// VolumeMount describes a mounting of a Volume within a container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeMount {
    /// Must match the name of a pod volume.
    pub name: String,
    /// Path within the container at which the volume should be mounted.
    pub mount_path: String,
    /// Mounted read-only if true.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VolumeMount {
    pub fn new(name: &str, mount_path: &str, read_only: bool) -> Self {
        Self {
            name: name.to_string(),
            mount_path: mount_path.to_string(),
            read_only,
            extra: Map::new(),
        }
    }
}

// ============================================================================
// Container
// ============================================================================

/// Container represents a single container in a pod.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Container {
    /// Name of the container.
    pub name: String,
    /// Container image name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Pod volumes to mount into the container's filesystem.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    /// Command, env, resources and the rest of the container.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Container {
    /// Create a new container with the given name and image.
    pub fn new(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            volume_mounts: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Create a new container with the given mounts.
    pub fn with_mounts(name: &str, image: &str, volume_mounts: Vec<VolumeMount>) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            volume_mounts,
            extra: Map::new(),
        }
    }
}

// ============================================================================
// PodSpec
// ============================================================================

/// PodSpec describes the specification of a pod.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodSpec {
    /// List of initialization containers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub init_containers: Vec<Container>,
    /// List of containers.
    pub containers: Vec<Container>,
    /// List of volumes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PodSpec {
    /// Create a new empty PodSpec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit init containers, then regular containers, with their field paths.
    /// Stops and returns false as soon as the visitor does.
    pub fn visit_containers_with_path<F>(&self, base_path: &Path, mut visitor: F) -> bool
    where
        F: FnMut(&Container, Path) -> bool,
    {
        for (i, c) in self.init_containers.iter().enumerate() {
            if !visitor(c, base_path.clone().child("initContainers").index(i)) {
                return false;
            }
        }
        for (i, c) in self.containers.iter().enumerate() {
            if !visitor(c, base_path.clone().child("containers").index(i)) {
                return false;
            }
        }
        true
    }

    /// Visit all containers mutably with their field paths.
    pub fn visit_containers_with_path_mut<F>(&mut self, base_path: &Path, mut visitor: F) -> bool
    where
        F: FnMut(&mut Container, Path) -> bool,
    {
        for (i, c) in self.init_containers.iter_mut().enumerate() {
            if !visitor(c, base_path.clone().child("initContainers").index(i)) {
                return false;
            }
        }
        for (i, c) in self.containers.iter_mut().enumerate() {
            if !visitor(c, base_path.clone().child("containers").index(i)) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// Pod
// ============================================================================

/// Pod represents a Kubernetes Pod.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ObjectWire<PodSpec>", into = "ObjectWire<PodSpec>")]
pub struct Pod {
    /// Name of the pod.
    pub name: String,
    /// Namespace of the pod.
    pub namespace: String,
    /// Pod specification.
    pub spec: PodSpec,
    /// Annotations is an unstructured key value map.
    pub annotations: HashMap<String, String>,
    /// Metadata fields other than name, namespace and annotations.
    pub metadata_extra: Map<String, Value>,
    /// Top-level fields outside metadata and spec (apiVersion, kind, status).
    pub extra: Map<String, Value>,
}

impl Pod {
    /// Create a new pod with the given name and namespace.
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            spec: PodSpec::default(),
            annotations: HashMap::new(),
            metadata_extra: Map::new(),
            extra: Map::new(),
        }
    }

    /// Add an annotation, builder style.
    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }
}

impl ApiObject for Pod {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> &str {
        "Pod"
    }
}

/// Wire envelope shared by the object types: `{"metadata": ..., "spec": ...}`.
#[derive(Serialize, Deserialize)]
struct ObjectWire<S> {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: S,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<ObjectWire<PodSpec>> for Pod {
    fn from(wire: ObjectWire<PodSpec>) -> Self {
        Self {
            name: wire.metadata.name,
            namespace: wire.metadata.namespace,
            annotations: wire.metadata.annotations,
            metadata_extra: wire.metadata.extra,
            spec: wire.spec,
            extra: wire.extra,
        }
    }
}

impl From<Pod> for ObjectWire<PodSpec> {
    fn from(pod: Pod) -> Self {
        Self {
            metadata: ObjectMeta {
                name: pod.name,
                namespace: pod.namespace,
                annotations: pod.annotations,
                extra: pod.metadata_extra,
            },
            spec: pod.spec,
            extra: pod.extra,
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// ServiceSpec represents the specification of a service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(rename = "externalIPs", skip_serializing_if = "Vec::is_empty")]
    pub external_ips: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Service represents a Kubernetes Service. Admission sees it as a non-pod object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ObjectWire<ServiceSpec>", into = "ObjectWire<ServiceSpec>")]
pub struct Service {
    pub name: String,
    pub namespace: String,
    pub spec: ServiceSpec,
    pub metadata_extra: Map<String, Value>,
    pub extra: Map<String, Value>,
}

impl Service {
    /// Create a new service with the given name and namespace.
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            spec: ServiceSpec::default(),
            metadata_extra: Map::new(),
            extra: Map::new(),
        }
    }
}

impl From<ObjectWire<ServiceSpec>> for Service {
    fn from(wire: ObjectWire<ServiceSpec>) -> Self {
        Self {
            name: wire.metadata.name,
            namespace: wire.metadata.namespace,
            metadata_extra: wire.metadata.extra,
            spec: wire.spec,
            extra: wire.extra,
        }
    }
}

impl From<Service> for ObjectWire<ServiceSpec> {
    fn from(service: Service) -> Self {
        Self {
            metadata: ObjectMeta {
                name: service.name,
                namespace: service.namespace,
                annotations: HashMap::new(),
                extra: service.metadata_extra,
            },
            spec: service.spec,
            extra: service.extra,
        }
    }
}

impl ApiObject for Service {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> &str {
        "Service"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Helper to create a core API resource GroupResource.
pub fn resource(name: &str) -> GroupResource {
    GroupResource::new("", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pod_spec_visit_containers() {
        let spec = PodSpec {
            init_containers: vec![Container::new("init1", "busybox")],
            containers: vec![
                Container::new("main1", "nginx"),
                Container::new("main2", "redis"),
            ],
            ..Default::default()
        };

        let mut visited = vec![];
        spec.visit_containers_with_path(&Path::new("spec"), |c, path| {
            visited.push((c.name.clone(), path.to_string()));
            true
        });

        assert_eq!(visited.len(), 3);
        assert_eq!(visited[0], ("init1".to_string(), "spec.initContainers[0]".to_string()));
        assert_eq!(visited[1], ("main1".to_string(), "spec.containers[0]".to_string()));
        assert_eq!(visited[2], ("main2".to_string(), "spec.containers[1]".to_string()));
    }

    #[test]
    fn test_pod_spec_visit_containers_short_circuit() {
        let spec = PodSpec {
            containers: vec![
                Container::new("main1", "nginx"),
                Container::new("main2", "redis"),
            ],
            ..Default::default()
        };

        let mut count = 0;
        let result = spec.visit_containers_with_path(&Path::new("spec"), |_, _| {
            count += 1;
            false
        });

        assert!(!result);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_pod_as_api_object() {
        let pod = Pod::new("test", "default");
        let obj: &dyn ApiObject = &pod;
        assert_eq!(obj.kind(), "Pod");

        let downcast = obj.as_any().downcast_ref::<Pod>();
        assert!(downcast.is_some());
        assert_eq!(downcast.unwrap().name, "test");

        let service = Service::new("svc", "default");
        let obj: &dyn ApiObject = &service;
        assert!(obj.as_any().downcast_ref::<Pod>().is_none());
    }

    #[test]
    fn test_volume_host_path() {
        let vol = Volume::new_host_path("tz", "/etc/localtime");
        assert_eq!(vol.host_path(), Some("/etc/localtime"));
        assert_eq!(Volume::new_empty_dir("scratch").host_path(), None);
    }

    #[test]
    fn test_pod_deserialize() {
        let raw = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "web",
                "namespace": "prod",
                "annotations": {"kubernetes.io/localtime": "true"}
            },
            "spec": {
                "containers": [{
                    "name": "app",
                    "image": "nginx",
                    "volumeMounts": [{"name": "tz", "mountPath": "/etc/localtime", "readOnly": true}]
                }],
                "volumes": [{"name": "tz", "hostPath": {"path": "/etc/localtime", "type": "File"}}]
            }
        });

        let pod: Pod = serde_json::from_value(raw).unwrap();
        assert_eq!(pod.name, "web");
        assert_eq!(pod.namespace, "prod");
        assert_eq!(pod.annotations.get("kubernetes.io/localtime").map(String::as_str), Some("true"));
        assert_eq!(pod.spec.containers[0].volume_mounts[0], VolumeMount::new("tz", "/etc/localtime", true));
        let host_path = pod.spec.volumes[0].volume_source.host_path.as_ref().unwrap();
        assert_eq!(host_path.path, "/etc/localtime");
        assert_eq!(host_path.type_, Some(HostPathType::File));
    }

    #[test]
    fn test_pod_serialize_uses_api_field_names() {
        let mut pod = Pod::new("web", "prod");
        pod.spec.volumes.push(Volume::new_host_path("tz", "/etc/localtime"));
        pod.spec.init_containers.push(Container::with_mounts(
            "init",
            "busybox",
            vec![VolumeMount::new("tz", "/etc/localtime", true)],
        ));

        let value = serde_json::to_value(&pod).unwrap();
        assert_eq!(value["metadata"]["name"], "web");
        assert_eq!(value["spec"]["volumes"][0]["hostPath"]["path"], "/etc/localtime");
        assert_eq!(value["spec"]["initContainers"][0]["volumeMounts"][0]["mountPath"], "/etc/localtime");
        assert_eq!(value["spec"]["initContainers"][0]["volumeMounts"][0]["readOnly"], true);
    }

    #[test]
    fn test_pod_round_trip_keeps_unmodelled_fields() {
        let raw = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "web",
                "namespace": "prod",
                "labels": {"app": "web"},
                "uid": "2b9f6c1e"
            },
            "spec": {
                "nodeName": "node-1",
                "restartPolicy": "Always",
                "containers": [{
                    "name": "app",
                    "image": "nginx",
                    "command": ["nginx", "-g", "daemon off;"],
                    "env": [{"name": "TZ", "value": "UTC"}],
                    "volumeMounts": [{"name": "cfg", "mountPath": "/etc/app", "subPath": "app.conf"}]
                }],
                "volumes": [
                    {"name": "cfg", "configMap": {"name": "app-config"}},
                    {"name": "scratch", "emptyDir": {"sizeLimit": "1Gi"}}
                ]
            },
            "status": {"phase": "Pending"}
        });

        let pod: Pod = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(pod.spec.volumes[0].host_path(), None);
        assert_eq!(pod.spec.containers[0].extra["command"][0], "nginx");
        assert_eq!(serde_json::to_value(&pod).unwrap(), raw);
    }
}
