use std::path::{Path, PathBuf};

use super::types::AppConfig;

const LOCAL_CONFIG_FILE: &str = "consilium.toml";

/// Get the default data directory: ~/.consilium
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".consilium"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.consilium/config.toml (highest)
    let user_config = get_data_dir()?.join("config.toml");

    // Priority 2: ./consilium.toml (current directory)
    let local_config = Path::new(LOCAL_CONFIG_FILE);

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let mut cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    expand_paths(&mut cfg);
    Ok(cfg)
}

fn expand_paths(cfg: &mut AppConfig) {
    if let Some(dir) = cfg.logging.directory.as_deref() {
        let expanded = shellexpand::tilde(dir.trim()).into_owned();
        cfg.logging.directory = Some(expanded);
    }
}

/// Environment variable overrides (Priority 0: highest).
///
/// `lookup` is injected so tests do not have to mutate the process environment.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("CONSILIUM_LLM_API_KEY") {
        cfg.llm.api_key = v;
    }
    if let Some(v) = non_empty("CONSILIUM_LLM_BASE_URL") {
        cfg.llm.base_url = v;
    }
    if let Some(v) = non_empty("CONSILIUM_LLM_MODEL") {
        cfg.llm.model = v;
    }
    if let Some(v) = non_empty("CONSILIUM_RETRIEVAL_URL") {
        cfg.retrieval.base_url = v;
    }
    if let Some(v) = non_empty("CONSILIUM_RETRIEVAL_API_KEY") {
        cfg.retrieval.api_key = v;
    }
    if let Some(v) = non_empty("CONSILIUM_LOG_LEVEL") {
        cfg.logging.level = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerProvider;
    use crate::executor::types::SpecialistCategory;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_load_from_path_with_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[orchestrator]
consult_timeout_ms = 5000
max_concurrent_consultations = 4

[compiler]
provider = "digest"

[logging]
directory = "~/consilium-logs"

[[specialists]]
id = "maritime"
category = "counsel"
display_name = "Maritime Counsel"
"#
        )
        .unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.orchestrator.consult_timeout_ms, 5000);
        assert_eq!(cfg.orchestrator.retrieval_timeout_ms, 30_000);
        assert_eq!(cfg.orchestrator.retrieval_top_k, 5);
        assert_eq!(cfg.orchestrator.max_concurrent_consultations, Some(4));
        assert_eq!(cfg.compiler.provider, CompilerProvider::Digest);
        assert_eq!(cfg.http_server.port, 8080);
        assert!(!cfg
            .logging
            .directory
            .as_deref()
            .unwrap()
            .starts_with('~'));

        let catalog = cfg.specialist_catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].category, SpecialistCategory::Counsel);
        assert!(catalog[0].persona.is_empty());
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[orchestrator]\nconsult_timeout_ms = \"soon\"").unwrap();
        let err = load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_env_overrides_skip_blank_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CONSILIUM_LLM_API_KEY", "sk-test"),
            ("CONSILIUM_RETRIEVAL_URL", "http://search:9000"),
            ("CONSILIUM_LOG_LEVEL", "   "),
        ]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.llm.api_key, "sk-test");
        assert_eq!(cfg.retrieval.base_url, "http://search:9000");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_default_catalog_has_both_categories() {
        let cfg = AppConfig::default();
        let catalog = cfg.specialist_catalog();
        assert!(catalog
            .iter()
            .any(|s| s.category == SpecialistCategory::Expert && s.id == "medical"));
        assert!(catalog
            .iter()
            .any(|s| s.category == SpecialistCategory::Counsel && s.id == "labor"));
    }
}
