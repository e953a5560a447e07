use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use dashlink_core::{ActionName, ActionSchema, ArgMap, ArgSpec};
use dashlink_transport::TransportError;
use serde::Deserialize;
use serde_json::Value;

use crate::{ActionClient, InvokeError};

/// Catalog introspection is expressed as two plain action invocations.
const DESCRIBE_ACTION: &str = "catalog.describe_plugins";
const ENABLED_ACTION: &str = "catalog.enabled_plugins";

/// Wire shape of one plugin entry in the describe reply.
#[derive(Debug, Deserialize)]
struct PluginDescriptor {
    #[serde(default)]
    actions: HashMap<String, ActionDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ActionDescriptor {
    #[serde(default)]
    args: BTreeMap<String, ArgSpec>,
    #[serde(default)]
    has_kwargs: bool,
    #[serde(default)]
    doc: String,
    #[serde(default)]
    doc_url: String,
}

#[derive(Debug, Default)]
struct Catalog {
    schemas: HashMap<ActionName, Arc<ActionSchema>>,
    namespaces: Vec<String>,
}

impl Catalog {
    fn build(described: Value, enabled: Value) -> Result<Self, InvokeError> {
        let mut plugins: HashMap<String, PluginDescriptor> =
            serde_json::from_value(described).map_err(TransportError::MalformedBody)?;
        let enabled: Vec<String> =
            serde_json::from_value(enabled).map_err(TransportError::MalformedBody)?;

        let mut schemas = HashMap::new();
        let mut namespaces = Vec::new();

        for namespace in enabled {
            let Some(plugin) = plugins.remove(&namespace) else {
                tracing::warn!("enabled plugin '{namespace}' missing from catalog");
                continue;
            };

            for (verb, descriptor) in plugin.actions {
                let name = ActionName::from(format!("{namespace}.{verb}"));
                let schema = ActionSchema {
                    name: name.clone(),
                    args: descriptor.args,
                    supports_extra_args: descriptor.has_kwargs,
                    doc: descriptor.doc,
                    doc_url: descriptor.doc_url,
                };
                schemas.insert(name, Arc::new(schema));
            }

            namespaces.push(namespace);
        }

        namespaces.sort();

        Ok(Self {
            schemas,
            namespaces,
        })
    }
}

/// Session-cached map of every invocable action and its argument shape.
///
/// `refresh` rebuilds the whole catalog before swapping it in, so readers
/// holding the previous snapshot never observe a half-built state.
pub struct SchemaRegistry {
    client: ActionClient,
    catalog: RwLock<Arc<Catalog>>,
}

impl SchemaRegistry {
    pub fn new(client: ActionClient) -> Self {
        Self {
            client,
            catalog: RwLock::new(Arc::new(Catalog::default())),
        }
    }

    /// Fetch the full catalog and replace the in-memory map.
    pub async fn refresh(&self) -> Result<(), InvokeError> {
        let described = self.client.invoke(DESCRIBE_ACTION, ArgMap::new()).await?;
        let enabled = self.client.invoke(ENABLED_ACTION, ArgMap::new()).await?;

        let catalog = Catalog::build(described, enabled)?;
        tracing::info!(
            "catalog refreshed: {} actions across {} namespaces",
            catalog.schemas.len(),
            catalog.namespaces.len()
        );

        *self.catalog.write().unwrap() = Arc::new(catalog);
        Ok(())
    }

    /// O(1) lookup by fully qualified name. Absent means the name does not
    /// exist or the catalog has not been fetched yet.
    pub fn lookup(&self, name: &str) -> Option<Arc<ActionSchema>> {
        self.snapshot().schemas.get(&ActionName::from(name)).cloned()
    }

    /// Sorted plugin namespaces, for the first stage of autocomplete.
    pub fn namespaces(&self) -> Vec<String> {
        self.snapshot().namespaces.clone()
    }

    /// Sorted action names within one namespace, for the second stage.
    pub fn actions_in(&self, namespace: &str) -> Vec<ActionName> {
        let snapshot = self.snapshot();
        let mut actions: Vec<_> = snapshot
            .schemas
            .keys()
            .filter(|name| name.namespace() == namespace)
            .cloned()
            .collect();
        actions.sort();
        actions
    }

    fn snapshot(&self) -> Arc<Catalog> {
        self.catalog.read().unwrap().clone()
    }
}
