// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of capability plugins, keyed by name scope.
//!
//! Every callable function is namespaced as `<scope>-<method>`, so the
//! registry can route an execution request back to the owning plugin by
//! splitting the qualified name at the first `-`. The registry is built once
//! at startup by [`PluginRegistryBuilder`] and never mutated afterwards; the
//! function catalog it exposes is stable for the process lifetime.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use kantoro_core::{FunctionDefinition, FunctionError, FunctionSpec, KantoroError};
use tracing::debug;

/// A capability provider exposing callable functions under a unique scope.
///
/// Each plugin owns its external-API concerns (authentication, token
/// caching, request shaping) internally; the registry only sees the
/// success or failure outcome.
#[async_trait]
pub trait CapabilityPlugin: Send + Sync {
    /// The scope prefix, unique across the registry. Qualified function
    /// names are `<scope>-<method>`.
    fn scope(&self) -> &str;

    /// The plugin's function catalog, in declaration order.
    fn definitions(&self) -> Vec<FunctionSpec>;

    /// Execute `method` with the raw argument JSON produced by the model
    /// and the caller's email address.
    ///
    /// Argument parsing is the plugin's responsibility; malformed JSON must
    /// come back as [`FunctionError::InvalidArguments`], never a panic.
    async fn invoke(
        &self,
        method: &str,
        args_json: &str,
        caller_email: &str,
    ) -> Result<String, FunctionError>;
}

/// Builder collecting the compiled-in plugins before validation.
#[derive(Default)]
pub struct PluginRegistryBuilder {
    plugins: Vec<Arc<dyn CapabilityPlugin>>,
}

impl PluginRegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Register a plugin. Registration order determines catalog order.
    pub fn register(mut self, plugin: Arc<dyn CapabilityPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Validate and freeze the registry.
    ///
    /// Fails on a duplicate scope, a duplicate qualified function name, or
    /// a definition whose name is not namespaced under its plugin's scope.
    pub fn build(self) -> Result<PluginRegistry, KantoroError> {
        let mut by_scope = HashMap::new();
        let mut specs = Vec::new();
        let mut names = HashSet::new();

        for (index, plugin) in self.plugins.iter().enumerate() {
            let scope = plugin.scope().to_string();
            if by_scope.insert(scope.clone(), index).is_some() {
                return Err(KantoroError::Config(format!(
                    "duplicate plugin scope: {scope}"
                )));
            }

            for spec in plugin.definitions() {
                let routable = spec
                    .name()
                    .strip_prefix(&scope)
                    .is_some_and(|rest| rest.starts_with('-'));
                if !routable {
                    return Err(KantoroError::Config(format!(
                        "function {} is not namespaced under scope {scope}",
                        spec.name()
                    )));
                }
                if !names.insert(spec.name().to_string()) {
                    return Err(KantoroError::Config(format!(
                        "duplicate function name: {}",
                        spec.name()
                    )));
                }
                specs.push(spec);
            }
        }

        debug!(
            plugins = self.plugins.len(),
            functions = specs.len(),
            "plugin registry built"
        );

        Ok(PluginRegistry {
            plugins: self.plugins,
            by_scope,
            specs,
        })
    }
}

/// Immutable registry of capability plugins and their function catalog.
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn CapabilityPlugin>>,
    by_scope: HashMap<String, usize>,
    specs: Vec<FunctionSpec>,
}

impl PluginRegistry {
    /// Start building a registry.
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::new()
    }

    /// The full function catalog, in registration order.
    pub fn function_definitions(&self) -> &[FunctionSpec] {
        &self.specs
    }

    /// Exact-name lookup of a function's registry entry.
    pub fn find_definition(&self, qualified_name: &str) -> Option<&FunctionSpec> {
        self.specs.iter().find(|s| s.name() == qualified_name)
    }

    /// The wire-facing catalog, optionally restricted to one scope.
    ///
    /// `Some(scope)` keeps only names with that scope prefix; an unknown
    /// scope yields an empty catalog, which forces a plain chat answer.
    pub fn scoped_catalog(&self, scope: Option<&str>) -> Vec<FunctionDefinition> {
        match scope {
            Some(scope) => {
                let prefix = format!("{scope}-");
                self.specs
                    .iter()
                    .filter(|s| s.name().starts_with(&prefix))
                    .map(|s| s.definition.clone())
                    .collect()
            }
            None => self.specs.iter().map(|s| s.definition.clone()).collect(),
        }
    }

    /// Execute a function by qualified name.
    ///
    /// The name splits into (scope, method) at the first `-`; the scope
    /// resolves the plugin, which parses the arguments and runs the method.
    /// Side effects are entirely the plugin's; the registry never retries.
    pub async fn execute(
        &self,
        qualified_name: &str,
        arguments_json: &str,
        caller_email: &str,
    ) -> Result<String, FunctionError> {
        let Some((scope, method)) = qualified_name.split_once('-') else {
            return Err(FunctionError::Unknown {
                name: qualified_name.to_string(),
            });
        };
        let Some(&index) = self.by_scope.get(scope) else {
            return Err(FunctionError::Unknown {
                name: qualified_name.to_string(),
            });
        };

        debug!(function = qualified_name, "dispatching function call");
        self.plugins[index].invoke(method, arguments_json, caller_email).await
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if no plugins are registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kantoro_core::FollowUp;

    struct EchoPlugin {
        scope: &'static str,
    }

    fn test_spec(name: &str) -> FunctionSpec {
        FunctionSpec {
            definition: FunctionDefinition {
                name: name.to_string(),
                description: format!("Test function {name}"),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            },
            follow_up: FollowUp::default(),
        }
    }

    #[async_trait]
    impl CapabilityPlugin for EchoPlugin {
        fn scope(&self) -> &str {
            self.scope
        }

        fn definitions(&self) -> Vec<FunctionSpec> {
            vec![
                test_spec(&format!("{}-echo", self.scope)),
                test_spec(&format!("{}-get-details", self.scope)),
            ]
        }

        async fn invoke(
            &self,
            method: &str,
            args_json: &str,
            caller_email: &str,
        ) -> Result<String, FunctionError> {
            match method {
                "echo" => Ok(format!("{}|{args_json}|{caller_email}", self.scope)),
                "get-details" => Ok(format!("{} details", self.scope)),
                _ => Err(FunctionError::Unknown {
                    name: format!("{}-{method}", self.scope),
                }),
            }
        }
    }

    fn test_registry() -> PluginRegistry {
        PluginRegistry::builder()
            .register(Arc::new(EchoPlugin { scope: "Joan" }))
            .register(Arc::new(EchoPlugin { scope: "CVs" }))
            .build()
            .unwrap()
    }

    #[test]
    fn catalog_follows_registration_order() {
        let registry = test_registry();
        let names: Vec<&str> = registry
            .function_definitions()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(
            names,
            vec!["Joan-echo", "Joan-get-details", "CVs-echo", "CVs-get-details"]
        );
    }

    #[test]
    fn find_definition_is_exact() {
        let registry = test_registry();
        assert!(registry.find_definition("Joan-echo").is_some());
        assert!(registry.find_definition("Joan-ech").is_none());
        assert!(registry.find_definition("joan-echo").is_none());
    }

    #[test]
    fn scoped_catalog_filters_by_prefix() {
        let registry = test_registry();

        let all = registry.scoped_catalog(None);
        assert_eq!(all.len(), 4);

        let joan = registry.scoped_catalog(Some("Joan"));
        assert_eq!(joan.len(), 2);
        assert!(joan.iter().all(|d| d.name.starts_with("Joan-")));

        let unknown = registry.scoped_catalog(Some("Nope"));
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn execute_routes_to_owning_plugin() {
        let registry = test_registry();
        let result = registry
            .execute("CVs-echo", "{\"q\":1}", "user@example.com")
            .await
            .unwrap();
        assert_eq!(result, "CVs|{\"q\":1}|user@example.com");
    }

    #[tokio::test]
    async fn execute_splits_at_first_dash_only() {
        let registry = test_registry();
        // Method names may themselves contain dashes.
        let result = registry.execute("Joan-get-details", "{}", "u@e.com").await.unwrap();
        assert_eq!(result, "Joan details");
    }

    #[tokio::test]
    async fn execute_unknown_scope_is_unknown_function() {
        let registry = test_registry();
        let err = registry.execute("Unknown-doStuff", "{}", "u@e.com").await.unwrap_err();
        assert!(matches!(err, FunctionError::Unknown { name } if name == "Unknown-doStuff"));
    }

    #[tokio::test]
    async fn execute_unqualified_name_is_unknown_function() {
        let registry = test_registry();
        let err = registry.execute("echo", "{}", "u@e.com").await.unwrap_err();
        assert!(matches!(err, FunctionError::Unknown { .. }));
    }

    #[tokio::test]
    async fn execute_unknown_method_is_unknown_function() {
        let registry = test_registry();
        let err = registry.execute("Joan-doStuff", "{}", "u@e.com").await.unwrap_err();
        assert!(matches!(err, FunctionError::Unknown { name } if name == "Joan-doStuff"));
    }

    #[test]
    fn build_rejects_duplicate_scope() {
        let result = PluginRegistry::builder()
            .register(Arc::new(EchoPlugin { scope: "Joan" }))
            .register(Arc::new(EchoPlugin { scope: "Joan" }))
            .build();
        let err = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("duplicate plugin scope"), "got: {err}");
    }

    #[test]
    fn build_rejects_duplicate_function_name() {
        struct DupPlugin;

        #[async_trait]
        impl CapabilityPlugin for DupPlugin {
            fn scope(&self) -> &str {
                "Dup"
            }
            fn definitions(&self) -> Vec<FunctionSpec> {
                vec![test_spec("Dup-echo"), test_spec("Dup-echo")]
            }
            async fn invoke(&self, _: &str, _: &str, _: &str) -> Result<String, FunctionError> {
                Ok(String::new())
            }
        }

        let result = PluginRegistry::builder().register(Arc::new(DupPlugin)).build();
        let err = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("duplicate function name"), "got: {err}");
    }

    #[test]
    fn build_rejects_unscoped_function_name() {
        struct BadPlugin;

        #[async_trait]
        impl CapabilityPlugin for BadPlugin {
            fn scope(&self) -> &str {
                "Bad"
            }
            fn definitions(&self) -> Vec<FunctionSpec> {
                vec![test_spec("Other-echo")]
            }
            async fn invoke(&self, _: &str, _: &str, _: &str) -> Result<String, FunctionError> {
                Ok(String::new())
            }
        }

        let result = PluginRegistry::builder().register(Arc::new(BadPlugin)).build();
        let err = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("not namespaced"), "got: {err}");
    }

    #[test]
    fn empty_registry_has_empty_catalog() {
        let registry = PluginRegistry::builder().build().unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.function_definitions().is_empty());
        assert!(registry.scoped_catalog(None).is_empty());
    }
}
