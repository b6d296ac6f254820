//! Render an action's workspace files for inspection.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use tfconnect_core::orchestration::orchestrator::{RenderedWorkspace, render_workspace};
use tfconnect_core::render::template::{BOOTSTRAP_FILE_NAME, RESOURCE_FILE_NAME, TemplateRenderer};
use tfconnect_types::action::ActionEvent;
use tfconnect_types::config::BridgeConfig;

use crate::cli::read_action;

/// Write the bootstrap, resource template, and variable file into `out`.
pub async fn render(config: &BridgeConfig, event: &Path, out: &Path, json: bool) -> Result<()> {
    let body = read_action(event).await?;
    let rendered = render_to(config, &ActionEvent::from_body(&body)?, out).await?;

    let files = [
        out.join(BOOTSTRAP_FILE_NAME),
        out.join(RESOURCE_FILE_NAME),
        rendered.var_file.clone(),
    ];

    if json {
        let paths: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        let report = serde_json::json!({
            "state_key": rendered.state_key.as_str(),
            "mode": rendered.mode,
            "files": paths,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Rendered {} workspace into {}",
        style("✓").green().bold(),
        rendered.mode,
        style(out.display()).cyan()
    );
    println!("  State key: {}", style(rendered.state_key.as_str()).bold());
    for file in &files {
        println!("  {}", style(file.display()).dim());
    }
    println!();
    Ok(())
}

async fn render_to(
    config: &BridgeConfig,
    event: &ActionEvent,
    out: &Path,
) -> Result<RenderedWorkspace> {
    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("failed to create {}", out.display()))?;
    let renderer = TemplateRenderer::new(&config.templates);
    Ok(render_workspace(&renderer, event, out).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    async fn fixture() -> (TempDir, BridgeConfig) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        tokio::fs::write(root.join("main.tf"), "key = \"{{ .storage_key }}\"\n")
            .await
            .unwrap();
        tokio::fs::create_dir(root.join("templates")).await.unwrap();
        tokio::fs::write(root.join("templates/bucket.tf"), "variable \"name\" {}\n")
            .await
            .unwrap();

        let mut config = BridgeConfig::default();
        config.templates.dir = root.join("templates");
        config.templates.bootstrap = root.join("main.tf");
        (tmp, config)
    }

    async fn write_event(dir: &Path, trigger: &str, entity: Option<&str>) -> std::path::PathBuf {
        let path = dir.join("event.json");
        let body = json!({
            "context": { "entity": entity, "blueprint": "bucket", "runId": "r_9" },
            "payload": {
                "entity": { "properties": { "region": "eu" } },
                "action": { "identifier": "bucket_action", "trigger": trigger },
                "properties": { "name": "x" }
            }
        });
        tokio::fs::write(&path, body.to_string()).await.unwrap();
        path
    }

    #[tokio::test]
    async fn render_writes_all_three_files() {
        let (tmp, config) = fixture().await;
        let event = write_event(tmp.path(), "DAY-2", Some("e_abc")).await;
        let out = tmp.path().join("out/nested");

        render(&config, &event, &out, true).await.unwrap();

        let bootstrap = tokio::fs::read_to_string(out.join(BOOTSTRAP_FILE_NAME)).await.unwrap();
        assert_eq!(bootstrap, "key = \"e_abc\"\n");
        assert!(out.join(RESOURCE_FILE_NAME).exists());

        let vars: Value = serde_json::from_slice(
            &tokio::fs::read(out.join("port.tfvars.json")).await.unwrap(),
        )
        .unwrap();
        assert_eq!(vars["entity_identifier"], "e_abc");
        assert_eq!(vars["region"], "eu");
        assert_eq!(vars["run_id"], "r_9");
    }

    #[tokio::test]
    async fn render_delete_without_entity_fails() {
        let (tmp, config) = fixture().await;
        let event = write_event(tmp.path(), "DELETE", None).await;
        let out = tmp.path().join("out");

        assert!(render(&config, &event, &out, true).await.is_err());
        assert!(!out.join(BOOTSTRAP_FILE_NAME).exists());
    }
}
