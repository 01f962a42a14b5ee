// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create, read, update, delete and import for every registered kind.
//!
//! Every kind goes through the same steps: the plan is validated and turned
//! into a manifest, applied with server-side apply, optionally waited on, and
//! the object returned by the API server becomes the new state.

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::kubernetes::{crd_is_served, wait_for_crd};
use crate::manifest::{self, metadata_from_object, spec_from_object};
use crate::resources::{Registry, ResourceDescriptor};
use crate::schema::Schema;
use crate::state::{
    object_id, parse_import_id, DataSourceConfig, DataSourceState, ManifestState, ResourceState,
    StateMetadata,
};
use crate::validation::{validate_metadata, validate_state};
use crate::wait::{wait_for_delete, wait_for_upsert, WaitDefaults};
use kube::api::{DeleteParams, DynamicObject, Patch, PatchParams};
use kube::Client;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub struct Provider {
    client: Client,
    config: ProviderConfig,
    registry: Registry,
}

impl Provider {
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self::with_registry(client, config, Registry::cert_manager())
    }

    pub fn with_registry(client: Client, config: ProviderConfig, registry: Registry) -> Self {
        Self {
            client,
            config,
            registry,
        }
    }

    pub fn resource_types(&self) -> Vec<String> {
        self.registry.type_names().map(str::to_string).collect()
    }

    pub fn data_source_types(&self) -> Vec<String> {
        self.registry.data_source_type_names()
    }

    pub fn schema(&self, type_name: &str) -> Result<Schema> {
        Ok(self.registry.get(type_name)?.resource_schema())
    }

    pub fn data_source_schema(&self, type_name: &str) -> Result<Schema> {
        self.registry.data_source_schema(type_name)
    }

    /// Fail unless the cluster serves the kind behind `type_name`, waiting up
    /// to `timeout` for it to appear when given.
    pub async fn ensure_served(&self, type_name: &str, timeout: Option<Duration>) -> Result<()> {
        let desc = self.registry.get(type_name)?;
        if let Some(timeout) = timeout {
            return wait_for_crd(&self.client, &desc.api_resource, timeout).await;
        }
        if crd_is_served(&self.client, &desc.api_resource).await? {
            Ok(())
        } else {
            Err(ProviderError::CrdNotServed(format!(
                "{} ({})",
                desc.kind(),
                desc.api_version()
            )))
        }
    }

    fn wait_defaults(&self) -> WaitDefaults {
        WaitDefaults::from(&self.config)
    }

    #[instrument(skip(self, plan), fields(name = %plan.metadata.name))]
    pub async fn create(&self, type_name: &str, plan: ResourceState) -> Result<ResourceState> {
        let desc = self.registry.get(type_name)?;
        self.apply(desc, plan).await
    }

    /// Apply `plan` over `prior`. Objects cannot be renamed or moved, so a
    /// different name or namespace requires replacement.
    #[instrument(skip(self, prior, plan), fields(name = %plan.metadata.name))]
    pub async fn update(
        &self,
        type_name: &str,
        prior: &ResourceState,
        plan: ResourceState,
    ) -> Result<ResourceState> {
        let desc = self.registry.get(type_name)?;

        if prior.metadata.name != plan.metadata.name {
            return Err(ProviderError::ReplacementRequired {
                attribute: "metadata.name".to_string(),
                from: prior.metadata.name.clone(),
                to: plan.metadata.name.clone(),
            });
        }
        if prior.metadata.namespace != plan.metadata.namespace {
            return Err(ProviderError::ReplacementRequired {
                attribute: "metadata.namespace".to_string(),
                from: prior.metadata.namespace.clone().unwrap_or_default(),
                to: plan.metadata.namespace.clone().unwrap_or_default(),
            });
        }

        self.apply(desc, plan).await
    }

    async fn apply(&self, desc: &ResourceDescriptor, plan: ResourceState) -> Result<ResourceState> {
        validate_state(&plan, desc.namespaced)?;
        let manifest = manifest::build(desc, &plan.metadata, plan.spec.as_ref())?;

        let name = plan.name();
        let object = desc.display(plan.namespace(), name);
        let api = desc.api(self.client.clone(), plan.namespace())?;

        let field_manager = plan
            .field_manager
            .clone()
            .unwrap_or_else(|| self.config.field_manager.clone());
        let force = plan.force_conflicts.unwrap_or(false);

        let mut pp = PatchParams::apply(&field_manager);
        if force {
            pp = pp.force();
        }

        info!("Applying {} as field manager {}", object, field_manager);
        let mut applied = api.patch(name, &pp, &Patch::Apply(&manifest)).await?;

        if let Some(conditions) = plan.wait_for_upsert.as_deref().filter(|c| !c.is_empty()) {
            wait_for_upsert(&api, name, &object, conditions, &self.wait_defaults()).await?;
            applied = api.get(name).await?;
        }

        info!("Successfully applied {}", object);
        self.state_from_object(desc, &applied, plan, true)
    }

    /// Refresh `state` from the cluster; `None` when the object no longer exists
    #[instrument(skip(self, state), fields(name = %state.metadata.name))]
    pub async fn read(&self, type_name: &str, state: &ResourceState) -> Result<Option<ResourceState>> {
        let desc = self.registry.get(type_name)?;
        let api = desc.api(self.client.clone(), state.namespace())?;

        match api.get_opt(state.name()).await? {
            Some(obj) => Ok(Some(self.state_from_object(desc, &obj, state.clone(), true)?)),
            None => {
                info!(
                    "{} no longer exists",
                    desc.display(state.namespace(), state.name())
                );
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, state), fields(name = %state.metadata.name))]
    pub async fn delete(&self, type_name: &str, state: &ResourceState) -> Result<()> {
        let desc = self.registry.get(type_name)?;
        let name = state.name();
        let object = desc.display(state.namespace(), name);
        let api = desc.api(self.client.clone(), state.namespace())?;

        let dp = DeleteParams {
            propagation_policy: Some(state.deletion_propagation.unwrap_or_default().into()),
            ..Default::default()
        };

        info!("Deleting {}", object);
        match api.delete(name, &dp).await {
            Ok(_) => {}
            Err(kube::Error::Api(err)) if err.code == 404 => {
                info!("{} already deleted", object);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(wait) = &state.wait_for_delete {
            wait_for_delete(&api, name, &object, wait, &self.wait_defaults()).await?;
        }

        info!("Successfully deleted {}", object);
        Ok(())
    }

    /// Adopt an existing object identified by `namespace/name` or `name`
    #[instrument(skip(self))]
    pub async fn import(&self, type_name: &str, id: &str) -> Result<ResourceState> {
        let desc = self.registry.get(type_name)?;
        let (namespace, name) = parse_import_id(id, desc.namespaced)?;
        let object = desc.display(namespace.as_deref(), &name);
        let api = desc.api(self.client.clone(), namespace.as_deref())?;

        let obj = api
            .get_opt(&name)
            .await?
            .ok_or_else(|| ProviderError::NotFound(object.clone()))?;

        info!("Importing {}", object);
        let base = ResourceState {
            field_manager: Some(self.config.field_manager.clone()),
            force_conflicts: Some(false),
            metadata: StateMetadata {
                name,
                namespace,
                ..Default::default()
            },
            ..Default::default()
        };
        self.state_from_object(desc, &obj, base, false)
    }

    #[instrument(skip(self, config), fields(name = %config.metadata.name))]
    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: &DataSourceConfig,
    ) -> Result<DataSourceState> {
        let desc = self.registry.get(type_name)?;
        validate_metadata(&config.metadata, desc.namespaced)?;

        let namespace = config.metadata.namespace.as_deref();
        let name = &config.metadata.name;
        let api = desc.api(self.client.clone(), namespace)?;
        let obj = api
            .get_opt(name)
            .await?
            .ok_or_else(|| ProviderError::NotFound(desc.display(namespace, name)))?;

        debug!("Read {}", desc.display(namespace, name));
        let json = serde_json::to_value(&obj)?;
        Ok(DataSourceState {
            id: object_id(namespace, name),
            api_version: desc.api_version().to_string(),
            kind: desc.kind().to_string(),
            metadata: metadata_from_object(&obj, None),
            spec: spec_from_object(desc, &json),
        })
    }

    /// Render the manifest of a `<type>_manifest` data source, offline
    pub fn render_manifest(&self, type_name: &str, config: &ManifestState) -> Result<ManifestState> {
        manifest::render(self.registry.manifest(type_name)?, config)
    }

    fn state_from_object(
        &self,
        desc: &ResourceDescriptor,
        obj: &DynamicObject,
        base: ResourceState,
        known_keys_only: bool,
    ) -> Result<ResourceState> {
        let json = serde_json::to_value(obj)?;
        let metadata = metadata_from_object(obj, known_keys_only.then_some(&base.metadata));

        Ok(ResourceState {
            id: Some(object_id(metadata.namespace.as_deref(), &metadata.name)),
            api_version: Some(desc.api_version().to_string()),
            kind: Some(desc.kind().to_string()),
            field_manager: Some(
                base.field_manager
                    .unwrap_or_else(|| self.config.field_manager.clone()),
            ),
            force_conflicts: Some(base.force_conflicts.unwrap_or(false)),
            deletion_propagation: Some(base.deletion_propagation.unwrap_or_default()),
            wait_for_upsert: base.wait_for_upsert,
            wait_for_delete: base.wait_for_delete,
            spec: spec_from_object(desc, &json),
            metadata,
        })
    }
}
