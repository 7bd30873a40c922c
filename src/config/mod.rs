//! Configuration management
//!
//! Values come from an optional TOML file and are then overridden by the
//! environment variables the hosted handlers have always used
//! (`OPENROUTER_API_KEY`, `YOUR_SITE_NAME`, `PORT`, ...).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_SITE: &str = "Definitive AI";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    /// Default per-call deadline in seconds
    pub timeout_secs: u64,
    pub deployments: Vec<DeploymentConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            timeout_secs: 60,
            deployments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// The external LLM services an adapter can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Perplexity,
    OpenRouter,
}

impl ProviderKind {
    /// Environment variable holding this provider's key(s)
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Perplexity => "PERPLEXITY_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn all() -> [ProviderKind; 3] {
        [
            ProviderKind::Gemini,
            ProviderKind::Perplexity,
            ProviderKind::OpenRouter,
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderKeys {
    /// Interchangeable API keys; calls rotate through them
    pub api_keys: Vec<String>,
    /// Endpoint override (proxies, tests)
    pub base_url: Option<String>,
}

impl ProviderKeys {
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            api_keys: keys.into_iter().map(Into::into).collect(),
            base_url: None,
        }
    }
}

/// Site identification sent to OpenRouter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub url: String,
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SITE.to_string(),
            name: DEFAULT_SITE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: ProviderKeys,
    pub perplexity: ProviderKeys,
    pub openrouter: ProviderKeys,
    pub site: SiteConfig,
}

impl ProvidersConfig {
    pub fn keys(&self, kind: ProviderKind) -> &ProviderKeys {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Perplexity => &self.perplexity,
            ProviderKind::OpenRouter => &self.openrouter,
        }
    }

    fn keys_mut(&mut self, kind: ProviderKind) -> &mut ProviderKeys {
        match kind {
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::Perplexity => &mut self.perplexity,
            ProviderKind::OpenRouter => &mut self.openrouter,
        }
    }
}

/// One adapter invocation in a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSpec {
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Overrides the reported result source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl AdapterSpec {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: None,
            label: None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// How surviving results become the answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Earliest-listed success wins; all-failed degrades to a 200 fallback
    FirstSuccess,
    /// All successes are folded into one synthesis call
    Synthesis {
        adapter: AdapterSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instructions: Option<String>,
    },
}

impl PolicyConfig {
    /// Name used for the `kind` tag in TOML
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyConfig::FirstSuccess => "first_success",
            PolicyConfig::Synthesis { .. } => "synthesis",
        }
    }
}

/// Response body shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    /// Text body on success, `{error, details}` on failure
    #[default]
    Plain,
    /// `{status, json}` wrapper
    Wrapped,
}

/// Recency routing: prompts matching a keyword use `live_adapters`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_live_keywords")]
    pub keywords: Vec<String>,
    pub live_adapters: Vec<AdapterSpec>,
}

pub fn default_live_keywords() -> Vec<String> {
    [
        "current", "latest", "trending", "today", "upcoming", "recent", "news",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}

/// Declarative description of one handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub name: String,
    pub adapters: Vec<AdapterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterConfig>,
    pub policy: PolicyConfig,
    #[serde(default)]
    pub envelope: Envelope,
    #[serde(default)]
    pub annotate_timing: bool,
    /// Overrides the global `timeout_secs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load from `path`, or the default location when `None`, then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut config = Self::from_file(&path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Read a TOML file; a missing file yields defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "definitive") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for kind in ProviderKind::all() {
            if let Some(value) = lookup(kind.env_var()) {
                let keys: Vec<String> = value
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
                if !keys.is_empty() {
                    self.providers.keys_mut(kind).api_keys = keys;
                }
            }
        }

        if let Some(url) = lookup("YOUR_SITE_URL").filter(|v| !v.is_empty()) {
            self.providers.site.url = url;
        }
        if let Some(name) = lookup("YOUR_SITE_NAME").filter(|v| !v.is_empty()) {
            self.providers.site.name = name;
        }

        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value '{}'", port),
            }
        }
        if let Some(secs) = lookup("API_TIMEOUT_SECS") {
            match secs.trim().parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid API_TIMEOUT_SECS value '{}'", secs),
            }
        }
    }

    /// Configured deployments, or the built-in set when none are configured
    pub fn deployments(&self) -> Vec<DeploymentConfig> {
        if self.deployments.is_empty() {
            builtin_deployments()
        } else {
            self.deployments.clone()
        }
    }
}

const COMPARE_INSTRUCTIONS: &str =
    "Generate a definitive summary on the basis of these sources in html format.";

const DEFINITIVE_INSTRUCTIONS: &str = "Generate a definitive & comprehensive summary on the basis of these sources. \
Please don't include any planning or reasoning text which you use. Simply provide the actual summary. \
The response should be in html format which can be rendered directly on a web page. \
Once the html is formed, please remove the text between <think> tags from the final html response.";

fn openrouter(model: &str) -> AdapterSpec {
    AdapterSpec::new(ProviderKind::OpenRouter).with_model(model)
}

/// The handlers shipped by default
pub fn builtin_deployments() -> Vec<DeploymentConfig> {
    vec![
        DeploymentConfig {
            name: "compare-llms".to_string(),
            adapters: vec![
                AdapterSpec::new(ProviderKind::Gemini),
                AdapterSpec::new(ProviderKind::Perplexity),
                openrouter("deepseek/deepseek-chat-v3-0324:free"),
                openrouter("moonshotai/kimi-k2:free"),
                openrouter("openai/gpt-oss-20b:free"),
            ],
            router: None,
            policy: PolicyConfig::Synthesis {
                adapter: openrouter("qwen/qwen3-235b-a22b:free"),
                instructions: Some(COMPARE_INSTRUCTIONS.to_string()),
            },
            envelope: Envelope::Plain,
            annotate_timing: false,
            timeout_secs: None,
        },
        DeploymentConfig {
            name: "definitive".to_string(),
            adapters: vec![
                AdapterSpec::new(ProviderKind::Perplexity),
                openrouter("mistralai/mistral-small-3.2-24b-instruct:free"),
                openrouter("meta-llama/llama-3.2-3b-instruct:free"),
            ],
            router: None,
            policy: PolicyConfig::Synthesis {
                adapter: openrouter("openai/gpt-oss-20b:free"),
                instructions: Some(DEFINITIVE_INSTRUCTIONS.to_string()),
            },
            envelope: Envelope::Wrapped,
            annotate_timing: false,
            timeout_secs: Some(180),
        },
        DeploymentConfig {
            name: "quick-answer".to_string(),
            adapters: vec![
                openrouter("mistralai/mistral-small-3.2-24b-instruct:free"),
                openrouter("openai/gpt-oss-20b:free"),
            ],
            router: Some(RouterConfig {
                keywords: default_live_keywords(),
                live_adapters: vec![
                    AdapterSpec::new(ProviderKind::Perplexity),
                    AdapterSpec::new(ProviderKind::Gemini),
                ],
            }),
            policy: PolicyConfig::FirstSuccess,
            envelope: Envelope::Plain,
            annotate_timing: true,
            timeout_secs: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.providers.site.name, "Definitive AI");
        assert!(config.providers.openrouter.api_keys.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("OPENROUTER_API_KEY", "or-1, or-2"),
            ("GEMINI_API_KEY", "g-1"),
            ("YOUR_SITE_NAME", "My Site"),
            ("PORT", "8080"),
            ("API_TIMEOUT_SECS", "180"),
        ]));

        assert_eq!(config.providers.openrouter.api_keys, vec!["or-1", "or-2"]);
        assert_eq!(config.providers.gemini.api_keys, vec!["g-1"]);
        assert!(config.providers.perplexity.api_keys.is_empty());
        assert_eq!(config.providers.site.name, "My Site");
        assert_eq!(config.providers.site.url, "Definitive AI");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.timeout_secs, 180);
    }

    #[test]
    fn test_invalid_numbers_are_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("PORT", "eighty"), ("API_TIMEOUT_SECS", "-1")]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_blank_key_env_keeps_file_keys() {
        let mut config = Config::default();
        config.providers.gemini = ProviderKeys::with_keys(["from-file"]);
        config.apply_env(env(&[("GEMINI_API_KEY", " , ")]));
        assert_eq!(config.providers.gemini.api_keys, vec!["from-file"]);
    }

    #[test]
    fn test_builtin_deployments() {
        let config = Config::default();
        let deployments = config.deployments();
        let names: Vec<_> = deployments.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["compare-llms", "definitive", "quick-answer"]);

        let quick = &deployments[2];
        assert_eq!(quick.policy, PolicyConfig::FirstSuccess);
        assert_eq!(quick.policy.kind(), "first_success");
        assert!(quick.annotate_timing);
        assert!(quick
            .router
            .as_ref()
            .unwrap()
            .keywords
            .contains(&"latest".to_string()));
    }

    #[test]
    fn test_policy_kind_matches_serialized_tag() {
        for deployment in builtin_deployments() {
            let value = serde_json::to_value(&deployment.policy).unwrap();
            assert_eq!(value["kind"], deployment.policy.kind());
        }
    }

    #[test]
    fn test_parse_deployment_toml() {
        let config: Config = toml::from_str(
            r#"
            timeout_secs = 90

            [providers.openrouter]
            api_keys = ["a", "b"]

            [[deployments]]
            name = "news"
            envelope = "wrapped"
            adapters = [
                { provider = "perplexity" },
                { provider = "openrouter", model = "openai/gpt-oss-20b:free", label = "gpt" },
            ]
            policy = { kind = "synthesis", adapter = { provider = "gemini" } }
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout_secs, 90);
        assert_eq!(config.providers.openrouter.api_keys.len(), 2);
        assert_eq!(config.deployments().len(), 1);

        let news = &config.deployments[0];
        assert_eq!(news.envelope, Envelope::Wrapped);
        assert_eq!(news.policy.kind(), "synthesis");
        assert_eq!(news.adapters[1].label.as_deref(), Some("gpt"));
        assert_eq!(
            news.policy,
            PolicyConfig::Synthesis {
                adapter: AdapterSpec::new(ProviderKind::Gemini),
                instructions: None,
            }
        );
    }
}
