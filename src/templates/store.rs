use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use crate::core::error::{DocumentError, DocumentResult};

/// Holds the `.docx` template files. Everything found in the template
/// directory is loaded into memory at startup; lookups fall back to the
/// filesystem so templates dropped in later are picked up without a restart.
pub struct TemplateStore {
    local_path: PathBuf,
    templates: RwLock<HashMap<String, Vec<u8>>>,
}

impl TemplateStore {
    pub async fn new(local_path: PathBuf) -> Result<Self> {
        let store = TemplateStore {
            local_path,
            templates: RwLock::new(HashMap::new()),
        };
        store.load_local_templates().await?;
        Ok(store)
    }

    pub async fn get(&self, template_id: &str) -> DocumentResult<Vec<u8>> {
        if !is_valid_template_id(template_id) {
            return Err(DocumentError::Validation(format!(
                "invalid template identifier: {:?}",
                template_id
            )));
        }

        {
            let templates = self.templates.read().await;
            if let Some(bytes) = templates.get(template_id) {
                return Ok(bytes.clone());
            }
        }

        let path = self.local_path.join(format!("{}.docx", template_id));
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                self.templates
                    .write()
                    .await
                    .insert(template_id.to_string(), bytes.clone());
                Ok(bytes)
            }
            Err(_) => Err(DocumentError::TemplateNotFound(template_id.to_string())),
        }
    }

    pub async fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.templates.read().await.keys().cloned().collect();

        if let Ok(entries) = std::fs::read_dir(&self.local_path) {
            for entry in entries.filter_map(Result::ok) {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) == Some("docx") {
                    if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
                        if !ids.iter().any(|existing| existing == id) {
                            ids.push(id.to_string());
                        }
                    }
                }
            }
        }

        ids.sort();
        ids
    }

    async fn load_local_templates(&self) -> Result<()> {
        if !self.local_path.exists() {
            tracing::warn!("Template directory does not exist: {:?}", self.local_path);
            return Ok(());
        }

        let entries = std::fs::read_dir(&self.local_path)
            .context(format!("Failed to read template directory: {:?}", self.local_path))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some("docx") {
                continue;
            }
            let template_id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid template filename"))?;

            let bytes = tokio::fs::read(&path)
                .await
                .context(format!("Failed to read template: {:?}", path))?;
            self.templates
                .write()
                .await
                .insert(template_id.to_string(), bytes);

            tracing::info!("Loaded template: {}", template_id);
        }

        Ok(())
    }
}

fn is_valid_template_id(id: &str) -> bool {
    !id.is_empty()
        && !id.contains("..")
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
