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

//! AdmissionConfiguration: which plugins run, in which order, with what
//! per-plugin configuration.

use super::errors::{field_required, AdmissionError, AdmissionResult};
use super::field::Path;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// AdmissionConfiguration lists the plugins to enable, in chain order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdmissionConfiguration {
    pub plugins: Vec<AdmissionPluginConfiguration>,
}

/// AdmissionPluginConfiguration names one plugin and carries its opaque
/// configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdmissionPluginConfiguration {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

impl AdmissionConfiguration {
    /// Decode and check a configuration document.
    pub fn from_reader<R: Read>(reader: R) -> AdmissionResult<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Decode and check a configuration document held in memory.
    pub fn from_slice(raw: &[u8]) -> AdmissionResult<Self> {
        Self::from_reader(raw)
    }

    /// Every entry must name a plugin.
    pub fn validate(&self) -> AdmissionResult<()> {
        for (i, plugin) in self.plugins.iter().enumerate() {
            if plugin.name.trim().is_empty() {
                return Err(AdmissionError::InvalidConfiguration(field_required(
                    &Path::new("plugins").index(i).child("name"),
                )));
            }
        }
        Ok(())
    }

    /// Names of the enabled plugins, in order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }
}

impl AdmissionPluginConfiguration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            configuration: None,
        }
    }

    /// The plugin's configuration serialized back to bytes, ready to hand to
    /// its factory as a reader.
    pub fn configuration_bytes(&self) -> AdmissionResult<Option<Vec<u8>>> {
        self.configuration
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(AdmissionError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_configuration() {
        let raw = br#"{
            "plugins": [
                {"name": "Localtime"},
                {"name": "Other", "configuration": {"limit": 3}}
            ]
        }"#;

        let config = AdmissionConfiguration::from_slice(raw).unwrap();
        assert_eq!(config.plugin_names(), vec!["Localtime", "Other"]);
        assert!(config.plugins[0].configuration_bytes().unwrap().is_none());
        assert_eq!(
            config.plugins[1].configuration_bytes().unwrap().unwrap(),
            br#"{"limit":3}"#.to_vec()
        );
    }

    #[test]
    fn test_empty_document_enables_nothing() {
        let config = AdmissionConfiguration::from_slice(b"{}").unwrap();
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_missing_plugin_name() {
        let raw = br#"{"plugins": [{"name": "Localtime"}, {"configuration": {}}]}"#;
        let err = AdmissionConfiguration::from_slice(raw).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("plugins[1].name: Required value"));
    }

    #[test]
    fn test_malformed_configuration() {
        let err = AdmissionConfiguration::from_slice(b"plugins: []").unwrap_err();
        assert!(matches!(err, AdmissionError::Config(_)));
    }
}
