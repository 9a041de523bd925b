use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use tourbook_core::config::{resolve_config_path, AppConfig, LlmProvider, LogFormat};
use toml::Value;

use crate::commands::{load_config, CommandResult};

/// One effective setting together with the environment keys that can set it.
struct Setting {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl Setting {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> CommandResult {
    let config = match load_config() {
        Ok(config) => config,
        Err(failure) => return failure.into_result("config"),
    };

    let path = resolve_config_path(None);
    let document = path.as_deref().and_then(read_document);

    CommandResult { exit_code: 0, output: render(&config, path.as_deref(), document.as_ref()) }
}

pub(crate) fn render(config: &AppConfig, path: Option<&Path>, document: Option<&Value>) -> String {
    let mut lines = vec![match path {
        Some(path) => format!(
            "effective config (source precedence: env > file > default; file: {}):",
            path.display()
        ),
        None => "effective config (source precedence: env > file > default; no config file):"
            .to_string(),
    }];

    for setting in settings(config) {
        let source = source_of(&setting, document, path);
        lines.push(format!("- {} = {} (source: {source})", setting.key, setting.value));
    }

    lines.join("\n")
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    let api_key = match &config.llm.api_key {
        Some(key) => redact_key(key.expose_secret()),
        None => "<unset>".to_string(),
    };
    let catalog_path = match &config.catalog.path {
        Some(path) => path.display().to_string(),
        None => "<builtin>".to_string(),
    };

    vec![
        Setting::new("database.url", &config.database.url, &["TOURBOOK_DATABASE_URL"]),
        Setting::new(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["TOURBOOK_DATABASE_MAX_CONNECTIONS"],
        ),
        Setting::new(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["TOURBOOK_DATABASE_TIMEOUT_SECS"],
        ),
        Setting::new("llm.provider", provider_name(config.llm.provider), &["TOURBOOK_LLM_PROVIDER"]),
        Setting::new("llm.model", &config.llm.model, &["TOURBOOK_LLM_MODEL"]),
        Setting::new(
            "llm.base_url",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            &["TOURBOOK_LLM_BASE_URL"],
        ),
        Setting::new("llm.api_key", api_key, &["TOURBOOK_LLM_API_KEY"]),
        Setting::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["TOURBOOK_LLM_TIMEOUT_SECS"],
        ),
        Setting::new(
            "server.bind_address",
            &config.server.bind_address,
            &["TOURBOOK_SERVER_BIND_ADDRESS"],
        ),
        Setting::new("server.port", config.server.port.to_string(), &["TOURBOOK_SERVER_PORT"]),
        Setting::new(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["TOURBOOK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        Setting::new("catalog.path", catalog_path, &["TOURBOOK_CATALOG_PATH"]),
        Setting::new(
            "logging.level",
            &config.logging.level,
            &["TOURBOOK_LOGGING_LEVEL", "TOURBOOK_LOG_LEVEL"],
        ),
        Setting::new(
            "logging.format",
            format_name(config.logging.format),
            &["TOURBOOK_LOGGING_FORMAT", "TOURBOOK_LOG_FORMAT"],
        ),
    ]
}

fn read_document(path: &Path) -> Option<Value> {
    fs::read_to_string(path).ok()?.parse::<Value>().ok()
}

fn source_of(setting: &Setting, document: Option<&Value>, path: Option<&Path>) -> String {
    if let Some(env_key) = setting.env_keys.iter().find(|key| is_set(key)) {
        return format!("env ({env_key})");
    }

    if document.is_some_and(|doc| contains_path(doc, setting.key)) {
        let file = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("config file"));
        return format!("file ({})", file.display());
    }

    "default".to_string()
}

/// Blank values are ignored by the loader, so they do not count as a source.
fn is_set(key: &str) -> bool {
    env::var(key).is_ok_and(|value| !value.trim().is_empty())
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    key_path.split('.').try_fold(root, |current, key| current.get(key)).is_some()
}

fn provider_name(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "openai",
        LlmProvider::Ollama => "ollama",
    }
}

fn format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

/// Keeps a recognisable key prefix (`sk-`) and hides the rest.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once('-') {
        Some((prefix, _)) => format!("{prefix}-***"),
        None => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use tourbook_core::config::AppConfig;

    use super::{contains_path, redact_key, render};

    #[test]
    fn redaction_keeps_only_the_prefix() {
        assert_eq!(redact_key("sk-live-abcdef"), "sk-***");
        assert_eq!(redact_key("plainsecret"), "<redacted>");
        assert_eq!(redact_key("   "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc: toml::Value = "[server]\nport = 8080\n".parse().expect("toml");
        assert!(contains_path(&doc, "server.port"));
        assert!(!contains_path(&doc, "server.bind_address"));
        assert!(!contains_path(&doc, "logging.level"));
    }

    #[test]
    fn file_values_are_attributed_to_the_file() {
        let mut config = AppConfig::default();
        config.server.port = 8080;
        config.llm.api_key = Some(SecretString::from("sk-file-secret".to_string()));
        let doc: toml::Value =
            "[server]\nport = 8080\n[llm]\napi_key = \"sk-file-secret\"\n".parse().expect("toml");

        let output = render(&config, Some(std::path::Path::new("tourbook.toml")), Some(&doc));

        assert!(output.contains("- server.port = 8080 (source: file (tourbook.toml))"));
        assert!(output.contains("- llm.api_key = sk-*** (source: file (tourbook.toml))"));
        assert!(!output.contains("sk-file-secret"));
        assert!(output.contains("- catalog.path = <builtin> (source: default)"));
    }
}
