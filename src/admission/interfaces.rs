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

//! Core admission controller interfaces.

use super::attributes::Attributes;
use super::errors::AdmissionResult;
use std::fmt;

/// Operation is the type of resource operation being checked for admission control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create indicates a resource creation operation.
    Create,
    /// Update indicates a resource update operation.
    Update,
    /// Delete indicates a resource deletion operation.
    Delete,
    /// Connect indicates a resource connect operation (e.g., pod exec).
    Connect,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Connect => write!(f, "CONNECT"),
        }
    }
}

impl Operation {
    /// Parse an operation from a string, ignoring case.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CREATE" => Some(Operation::Create),
            "UPDATE" => Some(Operation::Update),
            "DELETE" => Some(Operation::Delete),
            "CONNECT" => Some(Operation::Connect),
            _ => None,
        }
    }
}

/// Phase is the stage of the admission chain a plugin is invoked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Mutating plugins may rewrite the object under review.
    Mutating,
    /// Validating plugins see the final object and may only reject it.
    Validating,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Mutating => write!(f, "mutating"),
            Phase::Validating => write!(f, "validating"),
        }
    }
}

/// Interface is the base trait every admission plugin implements.
///
/// A plugin advertises which phases it takes part in through
/// [`Interface::as_mutation`] and [`Interface::as_validation`]; the chain never
/// probes for capabilities any other way.
pub trait Interface: Send + Sync {
    /// Returns true if this admission controller can handle the given operation.
    fn handles(&self, operation: Operation) -> bool;

    /// Returns true if the plugin wants `operation` during `phase`.
    fn handles_phase(&self, _phase: Phase, operation: Operation) -> bool {
        self.handles(operation)
    }

    /// The mutating capability, if the plugin has one.
    fn as_mutation(&self) -> Option<&dyn MutationInterface> {
        None
    }

    /// The validating capability, if the plugin has one.
    fn as_validation(&self) -> Option<&dyn ValidationInterface> {
        None
    }
}

/// MutationInterface is implemented by admission plugins that can modify objects.
pub trait MutationInterface: Interface {
    /// Admit makes an admission decision based on the request attributes.
    /// It may modify the object in the attributes.
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()>;
}

/// ValidationInterface is implemented by admission plugins that validate objects.
pub trait ValidationInterface: Interface {
    /// Validate makes an admission decision based on the request attributes.
    /// It is NOT allowed to modify the object.
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()>;
}
