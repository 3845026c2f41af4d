use maitred_core::config::{AppConfig, LoadOptions};
use serde_json::json;

/// Renders the effective configuration with secrets redacted; loading
/// problems come back as the same JSON envelope with an error field.
pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => render(&config),
        Err(error) => serde_json::to_string_pretty(&json!({
            "command": "config",
            "status": "error",
            "message": format!("configuration issue: {error}"),
        }))
        .unwrap_or_default(),
    }
}

fn render(config: &AppConfig) -> String {
    let payload = json!({
        "command": "config",
        "status": "ok",
        "database": {
            "url": config.database.url,
            "max_connections": config.database.max_connections,
            "timeout_secs": config.database.timeout_secs,
        },
        "llm": {
            "provider": config.llm.provider,
            "api_key": config.llm.api_key.as_ref().map(|_| "***redacted***"),
            "base_url": config.llm.base_url,
            "model": config.llm.model,
            "timeout_secs": config.llm.timeout_secs,
            "max_retries": config.llm.max_retries,
        },
        "server": {
            "bind_address": config.server.bind_address,
            "port": config.server.port,
            "graceful_shutdown_secs": config.server.graceful_shutdown_secs,
        },
        "logging": {
            "level": config.logging.level,
            "format": config.logging.format,
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use maitred_core::config::AppConfig;

    use super::render;

    #[test]
    fn rendered_config_redacts_the_api_key() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("gsk-very-secret".to_string().into());

        let rendered = render(&config);
        assert!(rendered.contains("***redacted***"));
        assert!(!rendered.contains("gsk-very-secret"));
    }

    #[test]
    fn rendered_config_shows_absent_key_as_null() {
        let config = AppConfig::default();
        let rendered = render(&config);
        assert!(rendered.contains("\"api_key\": null"));
    }
}
