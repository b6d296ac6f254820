//! Apply and destroy orchestration.
//!
//! Both operations follow the same sequence: derive the state key, render
//! the workspace sources, take the per-key lock, open a fresh workspace,
//! write the sources, run engine `init`, write the variable file, and run
//! engine `apply` in the requested mode. Any failure ends the operation;
//! the workspace is removed on every path.

use std::path::{Path, PathBuf};

use tracing::Instrument;

use tfconnect_types::action::ActionEvent;
use tfconnect_types::config::BridgeConfig;
use tfconnect_types::error::BridgeError;
use tfconnect_types::state::{ApplyMode, OperationOutcome, StateKey};
use tfconnect_types::variables::VariableSet;

use super::locks::StateKeyLocks;
use super::state_key::derive_state_key;
use crate::engine::EngineDriver;
use crate::engine::state::extract_entity_id;
use crate::render::template::{BOOTSTRAP_FILE_NAME, RESOURCE_FILE_NAME, TemplateRenderer};
use crate::render::variables::{build_variables, write_var_file};
use crate::workspace::{WorkspaceManager, write_private_file};

/// Rendered source files for one workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceSources {
    pub bootstrap: String,
    pub resource: Vec<u8>,
}

impl WorkspaceSources {
    /// Write the bootstrap and resource files into `dir`.
    pub async fn write_to(&self, dir: &Path) -> Result<(), BridgeError> {
        write_private_file(dir, BOOTSTRAP_FILE_NAME, self.bootstrap.as_bytes()).await?;
        write_private_file(dir, RESOURCE_FILE_NAME, &self.resource).await?;
        Ok(())
    }
}

/// Files produced by [`render_workspace`].
#[derive(Debug, Clone)]
pub struct RenderedWorkspace {
    pub state_key: StateKey,
    pub mode: ApplyMode,
    pub var_file: PathBuf,
}

/// Composes templates, workspaces, variables and the engine into the two
/// top-level operations.
pub struct Orchestrator<E: EngineDriver> {
    engine: E,
    renderer: TemplateRenderer,
    workspaces: WorkspaceManager,
    locks: StateKeyLocks,
    show_after_apply: bool,
}

impl<E: EngineDriver> Orchestrator<E> {
    pub fn new(engine: E, config: &BridgeConfig) -> Self {
        Self {
            engine,
            renderer: TemplateRenderer::new(&config.templates),
            workspaces: WorkspaceManager::new(&config.workspace),
            locks: StateKeyLocks::new(),
            show_after_apply: config.engine.show_after_apply,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn locks(&self) -> &StateKeyLocks {
        &self.locks
    }

    /// Converge infrastructure for the event's entity toward its template.
    pub async fn apply(&self, event: &ActionEvent) -> Result<OperationOutcome, BridgeError> {
        let key = derive_state_key(event);
        self.execute(event, key, ApplyMode::Apply).await
    }

    /// Tear down the infrastructure tracked under the event's entity.
    ///
    /// Fails with [`BridgeError::MissingEntityReference`] before touching
    /// the filesystem or the engine when the event names no entity.
    pub async fn destroy(&self, event: &ActionEvent) -> Result<OperationOutcome, BridgeError> {
        let entity = event
            .entity_ref
            .as_deref()
            .ok_or(BridgeError::MissingEntityReference)?;
        let key = StateKey::from_entity(entity);
        self.execute(event, key, ApplyMode::Destroy).await
    }

    async fn execute(
        &self,
        event: &ActionEvent,
        key: StateKey,
        mode: ApplyMode,
    ) -> Result<OperationOutcome, BridgeError> {
        let span = tracing::info_span!(
            "operation",
            run_id = %event.run_id,
            trigger = %event.trigger,
            state_key = %key,
            blueprint = %event.blueprint,
            mode = %mode,
        );

        async {
            let sources = render_sources(&self.renderer, &event.blueprint, &key).await?;
            tracing::debug!(bootstrap = %sources.bootstrap, "bootstrap rendered");

            let _guard = self.locks.acquire(&key).await;
            tracing::debug!("state key lock acquired");

            let key_ref = &key;
            let entity_id = self
                .workspaces
                .with_workspace(|dir| async move {
                    sources.write_to(&dir).await?;

                    self.engine
                        .init(&dir)
                        .await
                        .map_err(BridgeError::EngineInitFailed)?;
                    tracing::info!("engine init complete");

                    let vars = variables_for(event, key_ref, mode);
                    let var_file = write_var_file(&dir, &vars).await?;

                    self.engine
                        .apply(&dir, &var_file, mode)
                        .await
                        .map_err(|source| BridgeError::EngineApplyFailed { mode, source })?;
                    tracing::info!("engine {mode} complete");

                    let entity_id = if mode == ApplyMode::Apply && self.show_after_apply {
                        self.read_entity_id(&dir).await
                    } else {
                        None
                    };
                    Ok::<_, BridgeError>(entity_id)
                })
                .await?;

            Ok::<_, BridgeError>(OperationOutcome {
                run_id: event.run_id.clone(),
                state_key: key.clone(),
                mode,
                entity_id,
            })
        }
        .instrument(span)
        .await
    }

    /// Best effort: a failed `show` is logged and yields `None`.
    async fn read_entity_id(&self, dir: &Path) -> Option<String> {
        match self.engine.show(dir).await {
            Ok(state) => {
                let id = extract_entity_id(&state);
                if id.is_none() {
                    tracing::debug!("no single entity resource in state");
                }
                id
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read state after apply");
                None
            }
        }
    }
}

/// Write the files an operation for `event` would use into `dir`,
/// without running the engine.
///
/// Follows the same state-key and variable rules as the real operation,
/// including the destroy-requires-entity check.
pub async fn render_workspace(
    renderer: &TemplateRenderer,
    event: &ActionEvent,
    dir: &Path,
) -> Result<RenderedWorkspace, BridgeError> {
    let (key, mode) = if event.trigger.is_destructive() {
        let entity = event
            .entity_ref
            .as_deref()
            .ok_or(BridgeError::MissingEntityReference)?;
        (StateKey::from_entity(entity), ApplyMode::Destroy)
    } else {
        (derive_state_key(event), ApplyMode::Apply)
    };

    let sources = render_sources(renderer, &event.blueprint, &key).await?;
    sources.write_to(dir).await?;
    let var_file = write_var_file(dir, &variables_for(event, &key, mode)).await?;

    Ok(RenderedWorkspace {
        state_key: key,
        mode,
        var_file,
    })
}

async fn render_sources(
    renderer: &TemplateRenderer,
    blueprint: &str,
    key: &StateKey,
) -> Result<WorkspaceSources, BridgeError> {
    let bootstrap = renderer.render_bootstrap(key).await?;
    let resource = renderer.load_resource_template(blueprint).await?;
    Ok(WorkspaceSources {
        bootstrap,
        resource,
    })
}

/// Destroy omits entity properties; the entity is going away.
fn variables_for(event: &ActionEvent, key: &StateKey, mode: ApplyMode) -> VariableSet {
    let entity_props = match mode {
        ApplyMode::Apply => Some(&event.entity_properties),
        ApplyMode::Destroy => None,
    };
    build_variables(
        entity_props,
        &event.payload_properties,
        key,
        &event.blueprint,
        &event.run_id,
    )
}
