//! Bootstrap and resource template loading.
//!
//! The bootstrap template carries the backend block and exactly one
//! parameter, the state key, written as `{{ .storage_key }}`. Resource
//! templates are copied verbatim; they are never interpreted here.

use std::path::{Path, PathBuf};

use tfconnect_types::config::TemplateConfig;
use tfconnect_types::error::BridgeError;
use tfconnect_types::state::StateKey;

/// Placeholder name the bootstrap template uses for the state key.
pub const STORAGE_KEY_PARAM: &str = "storage_key";

/// File name the rendered bootstrap is written under in a workspace.
pub const BOOTSTRAP_FILE_NAME: &str = "main.tf";

/// File name the resource template is written under in a workspace.
pub const RESOURCE_FILE_NAME: &str = "template.tf";

/// Loads templates from the configured locations.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    bootstrap: PathBuf,
    dir: PathBuf,
    extension: String,
}

impl TemplateRenderer {
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            bootstrap: config.bootstrap.clone(),
            dir: config.dir.clone(),
            extension: config.extension.clone(),
        }
    }

    /// Render the bootstrap template with the state key substituted.
    pub async fn render_bootstrap(&self, key: &StateKey) -> Result<String, BridgeError> {
        let source = tokio::fs::read_to_string(&self.bootstrap)
            .await
            .map_err(|e| {
                BridgeError::TemplateError(format!("{}: {e}", self.bootstrap.display()))
            })?;

        substitute(&source, &[(STORAGE_KEY_PARAM, key.as_str())]).map_err(|reason| {
            BridgeError::TemplateError(format!("{}: {reason}", self.bootstrap.display()))
        })
    }

    /// Load the resource template for `blueprint`, byte for byte.
    pub async fn load_resource_template(&self, blueprint: &str) -> Result<Vec<u8>, BridgeError> {
        let path = self.template_path(blueprint)?;
        tokio::fs::read(&path)
            .await
            .map_err(|_| BridgeError::TemplateNotFound {
                blueprint: blueprint.to_string(),
                path: path.display().to_string(),
            })
    }

    /// Location of the resource template for `blueprint`.
    ///
    /// Blueprint identifiers that could escape the template folder are
    /// rejected as not found.
    pub fn template_path(&self, blueprint: &str) -> Result<PathBuf, BridgeError> {
        let escapes = blueprint.is_empty()
            || blueprint.contains(['/', '\\'])
            || blueprint == "."
            || blueprint.contains("..");
        let path = self.dir.join(format!("{blueprint}.{}", self.extension));
        if escapes {
            return Err(BridgeError::TemplateNotFound {
                blueprint: blueprint.to_string(),
                path: path.display().to_string(),
            });
        }
        Ok(path)
    }

    pub fn bootstrap_path(&self) -> &Path {
        &self.bootstrap
    }
}

/// Replace every `{{ .name }}` action in `source` with its parameter.
///
/// Whitespace inside the braces and the leading dot are optional. `{{- `
/// and ` -}}` trim markers remove the adjacent whitespace outside the
/// action, and `{{/* ... */}}` comments render as nothing. Text outside
/// of actions is copied unchanged. An unclosed action or a name not in
/// `params` is an error.
fn substitute(source: &str, params: &[(&str, &str)]) -> Result<String, String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];

        let trim_left = after.starts_with('-') && after[1..].starts_with(char::is_whitespace);
        let body_start = if trim_left { 1 } else { 0 };

        // Comments may contain `}}`, so look for the close after `*/`.
        let search_from = match after[body_start..].trim_start().strip_prefix("/*") {
            Some(comment) => {
                let end = comment
                    .find("*/")
                    .ok_or_else(|| "unclosed comment in template".to_string())?;
                after.len() - comment.len() + end + 2
            }
            None => body_start,
        };
        let close = after[search_from..]
            .find("}}")
            .map(|i| search_from + i)
            .ok_or_else(|| "unclosed '{{' in template".to_string())?;

        let mut raw = &after[body_start..close];
        let trim_right = raw.ends_with('-') && raw[..raw.len() - 1].ends_with(char::is_whitespace);
        if trim_right {
            raw = &raw[..raw.len() - 1];
        }

        if trim_left {
            out.truncate(out.trim_end().len());
        }

        let inner = raw.trim();
        if !(inner.starts_with("/*") && inner.ends_with("*/")) {
            let name = inner.strip_prefix('.').unwrap_or(inner);
            let value = params
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
                .ok_or_else(|| format!("unknown template parameter '{inner}'"))?;
            out.push_str(value);
        }

        rest = &after[close + 2..];
        if trim_right {
            rest = rest.trim_start();
        }
    }
    out.push_str(rest);

    Ok(out)
}
