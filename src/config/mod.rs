pub mod defaults;

use crate::cli::Args;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Resolved engine configuration. Precedence: CLI args > environment
/// variables > config file > built-in defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_endpoint: String,
    pub model: String,
    pub system_prompt: String,
    pub user_name: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub stream_timeout: u64,
    /// User/assistant pairs kept per conversation; `None` disables trimming.
    pub max_history_pairs: Option<usize>,
    pub plugins_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiFileConfig,
    #[serde(default)]
    pub assistant: AssistantFileConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiFileConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub stream_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssistantFileConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub max_history_pairs: Option<usize>,
    #[serde(default)]
    pub plugins_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self, String> {
        let file_config = FileConfig::load().unwrap_or_default();

        // API key is required from the environment for security
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| "OPENAI_API_KEY environment variable not set".to_string())?;

        let api_endpoint = args
            .api_endpoint
            .clone()
            .or_else(|| env::var("APOLLO_API_ENDPOINT").ok())
            .or(file_config.api.endpoint.clone())
            .map(normalize_endpoint)
            .unwrap_or_else(|| defaults::API_ENDPOINT.to_string());

        let model = args
            .model
            .clone()
            .or_else(|| env::var("APOLLO_MODEL").ok())
            .or(file_config.assistant.model.clone())
            .unwrap_or_else(|| defaults::MODEL.to_string());

        let system_prompt = env::var("APOLLO_SYSTEM_PROMPT")
            .ok()
            .or(file_config.assistant.system_prompt.clone())
            .unwrap_or_else(|| defaults::SYSTEM_PROMPT.to_string());

        let user_name = env::var("APOLLO_USER_NAME")
            .ok()
            .or(file_config.assistant.user_name.clone())
            .filter(|name| !name.is_empty());

        let stream_timeout = env::var("APOLLO_STREAM_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .or(file_config.api.stream_timeout)
            .unwrap_or(defaults::STREAM_TIMEOUT_SECS);

        let max_history_pairs = match env::var("APOLLO_MAX_HISTORY_PAIRS").ok() {
            Some(raw) if raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => raw.parse::<usize>().ok().or(Some(defaults::MAX_HISTORY_PAIRS)),
            None => file_config
                .assistant
                .max_history_pairs
                .or(Some(defaults::MAX_HISTORY_PAIRS)),
        };

        let plugins_dir = args
            .plugins_dir
            .clone()
            .or_else(|| env::var("APOLLO_PLUGINS_DIR").ok().map(PathBuf::from))
            .or(file_config.assistant.plugins_dir.clone());

        Ok(Config {
            api_key,
            api_endpoint,
            model,
            system_prompt,
            user_name,
            temperature: file_config
                .assistant
                .temperature
                .unwrap_or(defaults::TEMPERATURE),
            max_tokens: file_config
                .assistant
                .max_tokens
                .unwrap_or(defaults::MAX_TOKENS),
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stream_timeout,
            max_history_pairs,
            plugins_dir,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            api_endpoint: defaults::API_ENDPOINT.to_string(),
            model: defaults::MODEL.to_string(),
            system_prompt: defaults::SYSTEM_PROMPT.to_string(),
            user_name: None,
            temperature: defaults::TEMPERATURE,
            max_tokens: defaults::MAX_TOKENS,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stream_timeout: defaults::STREAM_TIMEOUT_SECS,
            max_history_pairs: Some(defaults::MAX_HISTORY_PAIRS),
            plugins_dir: None,
        }
    }
}

/// Accept bare base URLs and append the chat-completions path.
fn normalize_endpoint(endpoint: String) -> String {
    if endpoint.ends_with("/chat/completions") {
        endpoint
    } else if endpoint.ends_with("/v1") {
        format!("{}/chat/completions", endpoint)
    } else if endpoint.ends_with("/v1/") {
        format!("{}chat/completions", endpoint)
    } else {
        format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'))
    }
}

impl FileConfig {
    pub fn load() -> anyhow::Result<Self> {
        for path in Self::config_paths() {
            if path.exists() {
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

                let ext = path.extension().and_then(|s| s.to_str());
                let config: FileConfig = if ext == Some("yaml") || ext == Some("yml") {
                    serde_yaml::from_str(&contents).with_context(|| {
                        format!("Failed to parse YAML config file: {}", path.display())
                    })?
                } else {
                    serde_json::from_str(&contents).with_context(|| {
                        format!("Failed to parse JSON config file: {}", path.display())
                    })?
                };

                return Ok(config);
            }
        }

        Ok(FileConfig::default())
    }

    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".apollo.yaml"),
            PathBuf::from(".apollo.yml"),
            PathBuf::from(".apollo.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("apollo");
            paths.push(config_dir.join("apollo.yaml"));
            paths.push(config_dir.join("apollo.yml"));
            paths.push(config_dir.join("apollo.json"));
        }

        paths
    }
}
