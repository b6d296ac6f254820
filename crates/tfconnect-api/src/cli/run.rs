//! One-shot execution of an action document.

use std::path::Path;

use anyhow::Result;
use console::style;

use tfconnect_core::orchestration::orchestrator::Orchestrator;
use tfconnect_core::orchestration::service::ActionService;
use tfconnect_infra::engine::terraform::TerraformCli;
use tfconnect_types::config::BridgeConfig;

use crate::cli::read_action;
use crate::state::cli_reporter;

/// Run the action in `event` through the same service the webhook uses.
pub async fn run(config: &BridgeConfig, event: &Path, report: bool, json: bool) -> Result<()> {
    let body = read_action(event).await?;

    let engine = TerraformCli::install(&config.engine).await?;
    let reporter = cli_reporter(config, report)?;
    let service = ActionService::new(Orchestrator::new(engine, config), reporter);

    let outcome = service.handle(&body).await?;

    if json {
        let out = serde_json::json!({
            "run_id": outcome.run_id,
            "state_key": outcome.state_key.as_str(),
            "mode": outcome.mode,
            "entity_id": outcome.entity_id,
            "reported": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} finished for run {}",
        style("✓").green().bold(),
        outcome.mode,
        style(&outcome.run_id).cyan()
    );
    println!("  State key: {}", style(outcome.state_key.as_str()).bold());
    if let Some(entity_id) = &outcome.entity_id {
        println!("  Entity:    {}", style(entity_id).bold());
    }
    if !report {
        println!("  {}", style("Status not reported (--no-report)").dim());
    }
    println!();
    Ok(())
}
