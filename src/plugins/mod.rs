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

//! Admission plugins module.

pub mod localtime;

use crate::admission::Plugins;

/// All plugins this crate provides, in execution order.
pub const ALL_ORDERED_PLUGINS: &[&str] = &[localtime::PLUGIN_NAME];

/// Plugins enabled when no admission configuration names any. Localtime only
/// acts on pods that opt in, but it stays off until an operator enables it.
pub const DEFAULT_ON_PLUGINS: &[&str] = &[];

/// Get the list of plugins that are OFF by default.
pub fn default_off_plugins() -> Vec<&'static str> {
    ALL_ORDERED_PLUGINS
        .iter()
        .filter(|p| !DEFAULT_ON_PLUGINS.contains(p))
        .copied()
        .collect()
}

/// Register every plugin this crate provides with `plugins`. Call this once
/// from wherever the admission chain is assembled.
pub fn register_all_admission_plugins(plugins: &Plugins) {
    localtime::register(plugins);
}
