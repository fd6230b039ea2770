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

//! Ordered admission chain.

use super::attributes::Attributes;
use super::errors::AdmissionResult;
use super::interfaces::{Interface, MutationInterface, Operation, Phase, ValidationInterface};
use std::sync::Arc;
use tracing::debug;

/// ChainHandler runs its plugins in registration order. The first plugin to
/// return an error stops the chain and the error is handed back unchanged.
#[derive(Default, Clone)]
pub struct ChainHandler {
    plugins: Vec<(String, Arc<dyn Interface>)>,
}

impl ChainHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin to the end of the chain.
    pub fn push(&mut self, name: &str, plugin: Arc<dyn Interface>) {
        self.plugins.push((name.to_string(), plugin));
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Names of the chained plugins, in order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Run one phase of the chain.
    pub fn run(&self, phase: Phase, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        match phase {
            Phase::Mutating => self.admit(attributes),
            Phase::Validating => self.validate(attributes),
        }
    }
}

impl Interface for ChainHandler {
    fn handles(&self, operation: Operation) -> bool {
        self.plugins.iter().any(|(_, p)| p.handles(operation))
    }

    fn handles_phase(&self, phase: Phase, operation: Operation) -> bool {
        self.plugins
            .iter()
            .any(|(_, p)| p.handles_phase(phase, operation))
    }

    fn as_mutation(&self) -> Option<&dyn MutationInterface> {
        Some(self)
    }

    fn as_validation(&self) -> Option<&dyn ValidationInterface> {
        Some(self)
    }
}

impl MutationInterface for ChainHandler {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        let operation = attributes.get_operation();
        for (name, plugin) in &self.plugins {
            if !plugin.handles_phase(Phase::Mutating, operation) {
                continue;
            }
            let Some(mutator) = plugin.as_mutation() else {
                continue;
            };
            if let Err(err) = mutator.admit(attributes) {
                debug!(plugin = %name, %operation, code = err.code(), "admission plugin denied request");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl ValidationInterface for ChainHandler {
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        let operation = attributes.get_operation();
        for (name, plugin) in &self.plugins {
            if !plugin.handles_phase(Phase::Validating, operation) {
                continue;
            }
            let Some(validator) = plugin.as_validation() else {
                continue;
            };
            if let Err(err) = validator.validate(attributes) {
                debug!(plugin = %name, %operation, code = err.code(), "admission plugin denied request");
                return Err(err);
            }
        }
        Ok(())
    }
}
