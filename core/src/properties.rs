// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

/// Properties gives access to process-level configuration.
///
/// Process properties are set by the program itself rather than inherited from
/// the parent process. Credential and region providers consult them after the
/// environment.
pub trait Properties: Debug + Send + Sync + 'static {
    /// Get a property by key, returns `None` if it is not set.
    fn property(&self, key: &str) -> Option<String>;
}

static PROCESS_PROPERTIES: Lazy<RwLock<HashMap<String, String>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// ProcessProperties reads from the process-wide property registry.
///
/// ```
/// use wssign_core::{ProcessProperties, Properties};
///
/// ProcessProperties::set("SERVICE_REGION", "us-east-1");
/// assert_eq!(ProcessProperties.property("SERVICE_REGION").as_deref(), Some("us-east-1"));
/// ProcessProperties::remove("SERVICE_REGION");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessProperties;

impl ProcessProperties {
    /// Set a property for the whole process, returns the previous value.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let mut props = PROCESS_PROPERTIES
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        props.insert(key.into(), value.into())
    }

    /// Remove a property from the process, returns the previous value.
    pub fn remove(key: &str) -> Option<String> {
        let mut props = PROCESS_PROPERTIES
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        props.remove(key)
    }

    /// Get a property of the process.
    pub fn get(key: &str) -> Option<String> {
        let props = PROCESS_PROPERTIES
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        props.get(key).cloned()
    }
}

impl Properties for ProcessProperties {
    fn property(&self, key: &str) -> Option<String> {
        Self::get(key)
    }
}

/// StaticProperties provides a fixed set of properties.
///
/// This is useful for testing.
#[derive(Debug, Clone, Default)]
pub struct StaticProperties {
    /// The properties to use.
    pub props: HashMap<String, String>,
}

impl<K, V, const N: usize> From<[(K, V); N]> for StaticProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(value: [(K, V); N]) -> Self {
        Self {
            props: value
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Properties for StaticProperties {
    fn property(&self, key: &str) -> Option<String> {
        self.props.get(key).cloned()
    }
}

/// NoopProperties always returns `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProperties;

impl Properties for NoopProperties {
    fn property(&self, _key: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_properties() {
        let key = "wssign.test.process_properties";

        assert!(ProcessProperties.property(key).is_none());
        assert!(ProcessProperties::set(key, "first").is_none());
        assert_eq!(
            ProcessProperties::set(key, "second").as_deref(),
            Some("first")
        );
        assert_eq!(ProcessProperties.property(key).as_deref(), Some("second"));
        assert_eq!(ProcessProperties::remove(key).as_deref(), Some("second"));
        assert!(ProcessProperties::get(key).is_none());
    }

    #[test]
    fn test_static_properties() {
        let props = StaticProperties::from([("aws.accessKeyId", "AKIA")]);

        assert_eq!(props.property("aws.accessKeyId").as_deref(), Some("AKIA"));
        assert!(props.property("aws.secretKey").is_none());
        assert!(NoopProperties.property("aws.accessKeyId").is_none());
    }
}
