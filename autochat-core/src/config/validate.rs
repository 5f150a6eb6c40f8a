//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
///
/// The API key is not checked here: history commands work without one.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.provider.api_base.trim().is_empty() {
        errors.push("provider.api_base must not be empty".to_string());
    }
    if config.provider.model.trim().is_empty() {
        errors.push("provider.model must not be empty".to_string());
    }
    if config.provider.timeout_secs == 0 {
        errors.push("provider.timeout_secs must be > 0".to_string());
    }
    if config.storage.dir.trim().is_empty() {
        errors.push("storage.dir must not be empty".to_string());
    }
    if config.storage.key.trim().is_empty() {
        errors.push("storage.key must not be empty".to_string());
    }
    if config.history.preview_chars == 0 {
        errors.push("history.preview_chars must be > 0".to_string());
    }
    if !matches!(
        config.logging.format.to_ascii_lowercase().as_str(),
        "text" | "json"
    ) {
        errors.push("logging.format must be either text or json".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
