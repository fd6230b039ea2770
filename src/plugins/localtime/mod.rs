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

//! Localtime admission controller.
//!
//! Pods that opt in with the annotation `kubernetes.io/localtime: "true"` get
//! the node's `/etc/localtime` as a host path volume named
//! `kubernetes-localtime`, mounted read-only at `/etc/localtime` in every init
//! container and every regular container. Containers then report wall-clock
//! time in the node's time zone without baking zone data into images.
//!
//! The mutating phase appends the volume and the mounts on create. The
//! validating phase rejects opted-in pods that lack them, on create and update.
//!
//! Appending is unconditional: admitting an already-mutated pod again adds a
//! second volume and a second mount per container.

use crate::admission::errors::field_not_supported;
use crate::admission::field::Path;
use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface, Operation,
    Phase, Plugins, ValidationInterface,
};
use crate::api::core::{resource, ApiObject, Pod, Volume, VolumeMount};
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, trace};

/// Plugin name for the Localtime admission controller.
pub const PLUGIN_NAME: &str = "Localtime";

/// Annotation a pod sets to `"true"` to opt in.
pub const ANNOTATION_LOCALTIME: &str = "kubernetes.io/localtime";

/// Host file and in-container mount target.
pub const LOCALTIME_PATH: &str = "/etc/localtime";

/// Name of the injected volume and of the mounts that reference it.
pub const LOCALTIME_VOLUME_NAME: &str = "kubernetes-localtime";

const CONVERSION_ERROR: &str = "Resource was marked with kind Pod but was unable to be converted";

const EXPECTED_VOLUME: &[&str] = &["name:kubernetes-localtime", "path:/etc/localtime"];

const EXPECTED_MOUNT: &[&str] = &[
    "name:kubernetes-localtime",
    "mountPath:/etc/localtime",
    "readOnly:true",
];

/// Register the Localtime plugin with the plugin registry. The plugin takes no
/// configuration; any supplied is ignored.
pub fn register(plugins: &Plugins) {
    plugins.register(PLUGIN_NAME, |_config: Option<&mut dyn Read>| {
        Ok(Arc::new(Localtime::new()) as Arc<dyn Interface>)
    });
}

/// Localtime injects and enforces the node-local time zone mount on opted-in pods.
pub struct Localtime {
    mutating: Handler,
    validating: Handler,
}

impl Localtime {
    /// Create a new Localtime admission controller.
    pub fn new() -> Self {
        Self {
            mutating: Handler::new_create(),
            validating: Handler::new_create_update(),
        }
    }

    /// Requests on subresources or on anything but core pods are out of scope.
    fn should_ignore(&self, attributes: &dyn Attributes) -> bool {
        if !attributes.get_subresource().is_empty() {
            return true;
        }

        attributes.get_resource().group_resource() != resource("pods")
    }

    fn opted_in(pod: &Pod) -> bool {
        pod.annotations
            .get(ANNOTATION_LOCALTIME)
            .is_some_and(|v| v == "true")
    }

    fn localtime_volume() -> Volume {
        Volume::new_host_path(LOCALTIME_VOLUME_NAME, LOCALTIME_PATH)
    }

    fn localtime_mount() -> VolumeMount {
        VolumeMount::new(LOCALTIME_VOLUME_NAME, LOCALTIME_PATH, true)
    }

    fn is_localtime_volume(volume: &Volume) -> bool {
        volume.name == LOCALTIME_VOLUME_NAME && volume.host_path() == Some(LOCALTIME_PATH)
    }

    fn is_localtime_mount(mount: &VolumeMount) -> bool {
        mount.name == LOCALTIME_VOLUME_NAME && mount.mount_path == LOCALTIME_PATH && mount.read_only
    }

    fn forbidden(
        attributes: &dyn Attributes,
        field: &Path,
        value: &impl Serialize,
        expected: &[&str],
    ) -> AdmissionError {
        // Rendering plain data into a JSON string cannot fail.
        let rendered = serde_json::to_string(value).unwrap_or_default();
        AdmissionError::forbidden(
            attributes.get_name(),
            attributes.get_namespace(),
            "pods",
            field_not_supported(field, &rendered, expected),
        )
    }
}

impl Default for Localtime {
    fn default() -> Self {
        Self::new()
    }
}

fn as_pod(object: Option<&dyn ApiObject>) -> AdmissionResult<&Pod> {
    object
        .and_then(|obj| obj.as_any().downcast_ref::<Pod>())
        .ok_or_else(|| AdmissionError::bad_request(CONVERSION_ERROR))
}

fn as_pod_mut<'a>(
    object: Option<&'a mut (dyn ApiObject + 'static)>,
) -> AdmissionResult<&'a mut Pod> {
    object
        .and_then(|obj| obj.as_any_mut().downcast_mut::<Pod>())
        .ok_or_else(|| AdmissionError::bad_request(CONVERSION_ERROR))
}

impl Interface for Localtime {
    fn handles(&self, operation: Operation) -> bool {
        self.mutating.handles(operation) || self.validating.handles(operation)
    }

    fn handles_phase(&self, phase: Phase, operation: Operation) -> bool {
        match phase {
            Phase::Mutating => self.mutating.handles(operation),
            Phase::Validating => self.validating.handles(operation),
        }
    }

    fn as_mutation(&self) -> Option<&dyn MutationInterface> {
        Some(self)
    }

    fn as_validation(&self) -> Option<&dyn ValidationInterface> {
        Some(self)
    }
}

impl MutationInterface for Localtime {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        if self.should_ignore(attributes) {
            trace!(resource = %attributes.get_resource().group_resource(), "localtime: request out of scope");
            return Ok(());
        }

        let pod = as_pod_mut(attributes.get_object_mut())?;
        if !Self::opted_in(pod) {
            return Ok(());
        }

        pod.spec.volumes.push(Self::localtime_volume());

        let mut mounted = 0usize;
        pod.spec
            .visit_containers_with_path_mut(&Path::new("spec"), |c, _path| {
                c.volume_mounts.push(Self::localtime_mount());
                mounted += 1;
                true
            });

        debug!(
            pod = %pod.name,
            namespace = %pod.namespace,
            containers = mounted,
            "localtime: injected host time zone mount"
        );
        Ok(())
    }
}

impl ValidationInterface for Localtime {
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        if self.should_ignore(attributes) {
            trace!(resource = %attributes.get_resource().group_resource(), "localtime: request out of scope");
            return Ok(());
        }

        let pod = as_pod(attributes.get_object())?;
        if !Self::opted_in(pod) {
            return Ok(());
        }

        if !pod.spec.volumes.iter().any(Self::is_localtime_volume) {
            return Err(Self::forbidden(
                attributes,
                &Path::new("spec").child("volumes"),
                &pod.spec.volumes,
                EXPECTED_VOLUME,
            ));
        }

        // Fail on the first container without the mount.
        let mut violation = None;
        pod.spec.visit_containers_with_path(&Path::new("spec"), |c, path| {
            if c.volume_mounts.iter().any(Self::is_localtime_mount) {
                return true;
            }
            violation = Some(Self::forbidden(
                attributes,
                &path.child("volumeMounts"),
                &c.volume_mounts,
                EXPECTED_MOUNT,
            ));
            false
        });

        match violation {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
