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

//! Localtime admission plugin.
//!
//! Pods annotated with `kubernetes.io/localtime: "true"` get the node's
//! `/etc/localtime` bind-mounted read-only into every init and regular container
//! during the mutating phase, and are rejected during the validating phase when
//! that mount is missing.

pub mod admission;
pub mod api;
pub mod plugins;

// Re-export commonly used types
pub use admission::{
    AdmissionError, AdmissionResult, Attributes, AttributesRecord, ChainHandler, Handler,
    Interface, MutationInterface, Operation, Phase, Plugins, ValidationInterface,
};
pub use api::core::{Container, HostPathVolumeSource, Pod, PodSpec, Volume, VolumeMount};
pub use plugins::localtime::Localtime;
