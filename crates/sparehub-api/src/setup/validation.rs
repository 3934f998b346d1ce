//! Configuration validation
//!
//! Checks the parts of the configuration that only matter once the server is about
//! to run: the template cache directory and the upload spool directory.

use anyhow::{Context, Result};
use sparehub_core::Config;

/// Validate configuration before anything else is started
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();
    if config.is_production() && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    std::fs::create_dir_all(config.template_dir()).with_context(|| {
        format!(
            "Template directory {} could not be created",
            config.template_dir().display()
        )
    })?;

    if let Some(dir) = &config.ingestion().upload_tmp_dir {
        if !dir.is_dir() {
            return Err(anyhow::anyhow!(
                "UPLOAD_TMP_DIR {} does not exist or is not a directory",
                dir.display()
            ));
        }
    }

    if config.max_import_rows() > 50_000 {
        tracing::warn!(
            max_import_rows = config.max_import_rows(),
            "MAX_IMPORT_ROWS is very high - whole files are held in memory while parsing"
        );
    }

    Ok(())
}
