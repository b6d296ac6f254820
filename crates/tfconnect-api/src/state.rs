//! Application state wiring the services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the webhook server. `ActionService` is generic over the engine driver
//! and status reporter ports; AppState pins it to the concrete infra
//! implementations.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use tfconnect_core::orchestration::orchestrator::Orchestrator;
use tfconnect_core::orchestration::service::ActionService;
use tfconnect_core::report::StatusReporter;
use tfconnect_infra::engine::terraform::TerraformCli;
use tfconnect_infra::port::client::PortClient;
use tfconnect_types::config::BridgeConfig;
use tfconnect_types::error::{ConfigError, ReportError};
use tfconnect_types::state::ActionStatus;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteActionService = ActionService<TerraformCli, Reporter>;

/// Status reporter chosen at startup.
pub enum Reporter {
    /// Report to the upstream action API.
    Port(PortClient),
    /// Log only (`run --no-report`).
    Disabled,
}

impl StatusReporter for Reporter {
    async fn report(&self, run_id: &str, status: ActionStatus) -> Result<(), ReportError> {
        match self {
            Reporter::Port(client) => client.report(run_id, status).await,
            Reporter::Disabled => {
                tracing::info!(run_id = %run_id, status = %status, "status reporting disabled");
                Ok(())
            }
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub action_service: Arc<ConcreteActionService>,
    /// Key for inbound webhook signatures.
    pub webhook_secret: SecretString,
    /// Caller-side deadline for one request.
    pub request_timeout: Option<Duration>,
}

impl AppState {
    /// Install the engine, authenticate upstream, and wire the service.
    ///
    /// Fails if the engine is missing or the wrong version, if credentials
    /// are absent, or if the upstream API rejects them.
    pub async fn init(config: &BridgeConfig) -> anyhow::Result<Self> {
        let engine = TerraformCli::install(&config.engine).await?;

        let client = PortClient::new(&config.port)?;
        tracing::info!(base_url = %client.base_url(), "authenticating with status endpoint");
        client.authenticate().await?;
        let webhook_secret = client.client_secret().clone();

        Ok(Self::from_parts(
            engine,
            Reporter::Port(client),
            webhook_secret,
            config,
        ))
    }

    /// Wire state from already-constructed parts.
    pub fn from_parts(
        engine: TerraformCli,
        reporter: Reporter,
        webhook_secret: SecretString,
        config: &BridgeConfig,
    ) -> Self {
        let orchestrator = Orchestrator::new(engine, config);
        Self {
            action_service: Arc::new(ActionService::new(orchestrator, reporter)),
            webhook_secret,
            request_timeout: config.server.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Build the reporter for one-shot CLI runs.
pub fn cli_reporter(config: &BridgeConfig, report: bool) -> Result<Reporter, ConfigError> {
    if report {
        Ok(Reporter::Port(PortClient::new(&config.port)?))
    } else {
        Ok(Reporter::Disabled)
    }
}
