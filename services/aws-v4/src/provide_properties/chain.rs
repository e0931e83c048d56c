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

use super::{
    EnvPropertiesProvider, ProcessPropertiesProvider, ProvideProperties, SigV4Properties,
};
use log::{info, warn};
use std::fmt::{self, Debug};
use wssign_core::{Context, Error, Result};

/// A chain of properties providers that will be tried in order.
///
/// The default chain reads `SERVICE_REGION` from:
///
/// 1. the environment
/// 2. the process properties
///
/// Nothing is cached, every call reads the sources again.
pub struct ChainedPropertiesProvider {
    providers: Vec<Box<dyn ProvideProperties>>,
}

impl ChainedPropertiesProvider {
    /// Create the default chain.
    pub fn new() -> Self {
        Self::empty()
            .push(EnvPropertiesProvider::new())
            .push(ProcessPropertiesProvider::new())
    }

    /// Create a chain without any provider.
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a properties provider to the chain.
    pub fn push(mut self, provider: impl ProvideProperties) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Create a properties provider chain from a vector of providers.
    pub fn from_vec(providers: Vec<Box<dyn ProvideProperties>>) -> Self {
        Self { providers }
    }
}

impl Default for ChainedPropertiesProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ChainedPropertiesProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedPropertiesProvider")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ProvideProperties for ChainedPropertiesProvider {
    fn provide_properties(&self, ctx: &Context) -> Result<SigV4Properties> {
        for provider in &self.providers {
            match provider.provide_properties(ctx) {
                Ok(props) => {
                    info!(
                        "loading SigV4 properties from provider {}: {props:?}",
                        provider.name()
                    );
                    return Ok(props);
                }
                Err(err) => {
                    info!(
                        "unable to load SigV4 properties from provider {}: {err}",
                        provider.name()
                    );
                }
            }
        }

        let message = "Unable to load SigV4 properties from any of the providers";
        warn!("{message}");
        Err(Error::properties_not_found(message))
    }

    fn name(&self) -> &str {
        "ChainedPropertiesProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SERVICE_REGION;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use wssign_core::{ErrorKind, StaticEnv, StaticProperties};

    fn ctx(env: Option<&str>, prop: Option<&str>) -> Context {
        let mut envs = HashMap::new();
        if let Some(v) = env {
            envs.insert(SERVICE_REGION.to_string(), v.to_string());
        }
        let mut props = StaticProperties::default();
        if let Some(v) = prop {
            props.props.insert(SERVICE_REGION.to_string(), v.to_string());
        }

        Context::new()
            .with_env(StaticEnv {
                home_dir: None,
                envs,
            })
            .with_properties(props)
    }

    #[test]
    fn test_env_wins() {
        let _ = env_logger::builder().is_test(true).try_init();

        let props = ChainedPropertiesProvider::new()
            .provide_properties(&ctx(Some("us-west-2"), Some("us-east-1")))
            .unwrap();
        assert_eq!(props.service_region(), "us-west-2");
    }

    /// Records the name and outcome of every call before delegating.
    struct Recording<P> {
        inner: P,
        calls: Arc<Mutex<Vec<(String, bool)>>>,
    }

    impl<P: ProvideProperties> ProvideProperties for Recording<P> {
        fn provide_properties(&self, ctx: &Context) -> Result<SigV4Properties> {
            let result = self.inner.provide_properties(ctx);
            self.calls
                .lock()
                .unwrap()
                .push((self.inner.name().to_string(), result.is_ok()));
            result
        }
    }

    #[test]
    fn test_blank_env_falls_back_to_process_property() {
        let _ = env_logger::builder().is_test(true).try_init();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = ChainedPropertiesProvider::empty()
            .push(Recording {
                inner: EnvPropertiesProvider::new(),
                calls: calls.clone(),
            })
            .push(Recording {
                inner: ProcessPropertiesProvider::new(),
                calls: calls.clone(),
            });

        let props = chain
            .provide_properties(&ctx(Some("   "), Some("us-east-1")))
            .unwrap();
        assert_eq!(props.service_region(), "us-east-1");

        let calls = calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (EnvPropertiesProvider::new().name().to_string(), false),
                (ProcessPropertiesProvider::new().name().to_string(), true),
            ]
        );
    }

    #[test]
    fn test_all_sources_blank() {
        let _ = env_logger::builder().is_test(true).try_init();

        let err = ChainedPropertiesProvider::new()
            .provide_properties(&ctx(Some(""), Some(" ")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PropertiesNotFound);
        assert_eq!(
            err.message(),
            "Unable to load SigV4 properties from any of the providers"
        );
    }

    #[test]
    fn test_custom_strategies_short_circuit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let chain = ChainedPropertiesProvider::from_vec(vec![
            Box::new(|_: &Context| -> Result<SigV4Properties> {
                Err(Error::properties_not_found("first has nothing"))
            }) as Box<dyn ProvideProperties>,
            Box::new(|_: &Context| SigV4Properties::new("eu-central-1")),
            Box::new(move |_: &Context| {
                counter.fetch_add(1, Ordering::SeqCst);
                SigV4Properties::new("never-used")
            }),
        ]);

        let props = chain.provide_properties(&Context::new()).unwrap();
        assert_eq!(props.service_region(), "eu-central-1");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_every_call_reads_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let chain = ChainedPropertiesProvider::empty().push(move |_: &Context| {
            counter.fetch_add(1, Ordering::SeqCst);
            SigV4Properties::new("us-east-1")
        });

        chain.provide_properties(&Context::new()).unwrap();
        chain.provide_properties(&Context::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
