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

//! Conversion of raw request payloads into typed API objects.

use super::attributes::{AttributesRecord, GroupVersionKind, GroupVersionResource};
use super::errors::{AdmissionError, AdmissionResult};
use super::interfaces::Operation;
use crate::api::core::{ApiObject, Pod, Service};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// ObjectInterfaces turns the raw bytes of a request body into a typed object.
pub trait ObjectInterfaces: Send + Sync {
    /// Decode `raw` as an object of `kind`.
    fn decode(&self, kind: &GroupVersionKind, raw: &[u8]) -> AdmissionResult<Box<dyn ApiObject>>;

    /// Returns true if `kind` can be decoded.
    fn recognizes(&self, kind: &GroupVersionKind) -> bool;
}

type Decoder = fn(&[u8]) -> Result<Box<dyn ApiObject>, serde_json::Error>;

fn decode_json<T>(raw: &[u8]) -> Result<Box<dyn ApiObject>, serde_json::Error>
where
    T: ApiObject + DeserializeOwned + 'static,
{
    Ok(Box::new(serde_json::from_slice::<T>(raw)?))
}

/// Scheme maps core kinds to JSON decoders.
pub struct Scheme {
    decoders: HashMap<(String, String), Decoder>,
}

impl Scheme {
    /// Create a scheme that knows the core kinds this crate models.
    pub fn new() -> Self {
        let mut scheme = Self {
            decoders: HashMap::new(),
        };
        scheme.add_known_type::<Pod>("", "Pod");
        scheme.add_known_type::<Service>("", "Service");
        scheme
    }

    /// Register a decodable type under `group`/`kind`. Versions are not
    /// distinguished.
    pub fn add_known_type<T>(&mut self, group: &str, kind: &str)
    where
        T: ApiObject + DeserializeOwned + 'static,
    {
        self.decoders
            .insert((group.to_string(), kind.to_string()), decode_json::<T>);
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectInterfaces for Scheme {
    fn decode(&self, kind: &GroupVersionKind, raw: &[u8]) -> AdmissionResult<Box<dyn ApiObject>> {
        let decoder = self
            .decoders
            .get(&(kind.group.clone(), kind.kind.clone()))
            .ok_or_else(|| {
                AdmissionError::bad_request(format!(
                    "no kind \"{}\" is registered for version \"{}\"",
                    kind.kind, kind.version
                ))
            })?;
        decoder(raw).map_err(|err| {
            AdmissionError::bad_request(format!("unable to decode {}: {}", kind.kind, err))
        })
    }

    fn recognizes(&self, kind: &GroupVersionKind) -> bool {
        self.decoders
            .contains_key(&(kind.group.clone(), kind.kind.clone()))
    }
}

impl AttributesRecord {
    /// Build a record from a raw object body, decoding it through `scheme`.
    /// Name and namespace are taken from the request, not the body.
    pub fn from_raw(
        scheme: &dyn ObjectInterfaces,
        name: &str,
        namespace: &str,
        resource: GroupVersionResource,
        subresource: &str,
        operation: Operation,
        kind: GroupVersionKind,
        raw: &[u8],
    ) -> AdmissionResult<Self> {
        let object = scheme.decode(&kind, raw)?;
        Ok(Self::new(
            name,
            namespace,
            resource,
            subresource,
            operation,
            Some(object),
            kind,
        ))
    }
}
