use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::executor::types::SpecialistCategory;
use crate::state::RetentionPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Specialist catalog. An empty table falls back to the built-in panel.
    #[serde(default)]
    pub specialists: Vec<SpecialistConfig>,
}

impl AppConfig {
    /// Configured specialists, or the built-in panel when none are configured.
    pub fn specialist_catalog(&self) -> Vec<SpecialistConfig> {
        if self.specialists.is_empty() {
            default_specialists()
        } else {
            self.specialists.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "consilium_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. `~` is expanded.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-call timeout shared by every consultation in a batch.
    #[serde(default = "default_consult_timeout_ms")]
    pub consult_timeout_ms: u64,

    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,

    /// Upper bound on the single retrieval call; exceeding it counts as a retrieval failure.
    #[serde(default = "default_retrieval_timeout_ms")]
    pub retrieval_timeout_ms: u64,

    /// Upper bound on concurrent consultations within one batch. Unset = unbounded.
    #[serde(default)]
    pub max_concurrent_consultations: Option<usize>,
}

fn default_consult_timeout_ms() -> u64 {
    120_000
}

fn default_retrieval_top_k() -> usize {
    5
}

fn default_retrieval_timeout_ms() -> u64 {
    30_000
}

impl OrchestratorConfig {
    pub fn consult_timeout(&self) -> Duration {
        Duration::from_millis(self.consult_timeout_ms)
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            consult_timeout_ms: default_consult_timeout_ms(),
            retrieval_top_k: default_retrieval_top_k(),
            retrieval_timeout_ms: default_retrieval_timeout_ms(),
            max_concurrent_consultations: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// 0 disables the periodic sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_max_terminal_age_secs")]
    pub max_terminal_age_secs: u64,

    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_max_terminal_age_secs() -> u64 {
    3600
}

fn default_keep_recent() -> usize {
    100
}

impl RegistryConfig {
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_terminal_age: Duration::from_secs(self.max_terminal_age_secs),
            keep_recent: self.keep_recent,
        }
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            max_terminal_age_secs: default_max_terminal_age_secs(),
            keep_recent: default_keep_recent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// When false no retrieval service is called and context is always empty.
    #[serde(default = "default_retrieval_enabled")]
    pub enabled: bool,
    #[serde(default = "default_retrieval_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_retrieval_service_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_retrieval_enabled() -> bool {
    true
}

fn default_retrieval_url() -> String {
    "http://127.0.0.1:8900".to_string()
}

fn default_retrieval_service_timeout_ms() -> u64 {
    10_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: default_retrieval_enabled(),
            base_url: default_retrieval_url(),
            api_key: String::new(),
            timeout_ms: default_retrieval_service_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API root, e.g. "https://api.openai.com/v1".
    #[serde(default = "default_llm_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_temperature() -> f32 {
    0.2
}

fn default_llm_timeout_ms() -> u64 {
    180_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompilerProvider {
    /// Synthesize with the configured LLM.
    #[default]
    Llm,
    /// Deterministic digest of opinions and context, no network.
    Digest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub provider: CompilerProvider,
    /// Max characters of each context snippet handed to the compiler.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_max_context_chars() -> usize {
    2_000
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            provider: CompilerProvider::default(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistConfig {
    pub id: String,
    pub category: SpecialistCategory,
    pub display_name: String,
    /// System prompt describing the specialist's discipline.
    #[serde(default)]
    pub persona: String,
    /// Overrides `[llm].model` for this specialist.
    #[serde(default)]
    pub model: Option<String>,
}

impl SpecialistConfig {
    pub fn new(id: &str, category: SpecialistCategory, display_name: &str, persona: &str) -> Self {
        Self {
            id: id.to_string(),
            category,
            display_name: display_name.to_string(),
            persona: persona.to_string(),
            model: None,
        }
    }
}

pub fn default_specialists() -> Vec<SpecialistConfig> {
    use SpecialistCategory::{Counsel, Expert};
    vec![
        SpecialistConfig::new(
            "medical",
            Expert,
            "Medical Expert",
            "You are a forensic medical expert. Assess causation, injuries and medical records.",
        ),
        SpecialistConfig::new(
            "engineering",
            Expert,
            "Engineering Expert",
            "You are a forensic engineer. Assess technical failures, standards and safety compliance.",
        ),
        SpecialistConfig::new(
            "accounting",
            Expert,
            "Forensic Accountant",
            "You are a forensic accountant. Quantify damages, losses and financial exposure.",
        ),
        SpecialistConfig::new(
            "labor",
            Counsel,
            "Labor Counsel",
            "You are an employment and labor law attorney. Analyse obligations between employers and employees.",
        ),
        SpecialistConfig::new(
            "civil",
            Counsel,
            "Civil Counsel",
            "You are a civil litigation attorney. Analyse liability, contracts and torts.",
        ),
        SpecialistConfig::new(
            "criminal",
            Counsel,
            "Criminal Counsel",
            "You are a criminal law attorney. Analyse criminal exposure and procedural rights.",
        ),
        SpecialistConfig::new(
            "tax",
            Counsel,
            "Tax Counsel",
            "You are a tax attorney. Analyse tax consequences and compliance risk.",
        ),
    ]
}
