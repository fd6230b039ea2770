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

//! Admission controller interfaces and types.
//!
//! This module provides the request attributes, the phase capabilities a plugin
//! implements, the error model, the plugin registry, and the chain that runs
//! registered plugins in order.

pub mod attributes;
pub mod chain;
pub mod config;
pub mod errors;
pub mod field;
mod handler;
mod interfaces;
pub mod object;
mod plugins;

pub use attributes::{Attributes, AttributesRecord};
pub use chain::ChainHandler;
pub use config::{AdmissionConfiguration, AdmissionPluginConfiguration};
pub use errors::{AdmissionError, AdmissionResult};
pub use handler::Handler;
pub use interfaces::{Interface, MutationInterface, Operation, Phase, ValidationInterface};
pub use object::{ObjectInterfaces, Scheme};
pub use plugins::{Factory, Plugins};
