use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    /// "hourly" | "daily" | anything else = never
    pub rotation: String,
    pub server: ServerConfig,
    pub kafka: KafkaConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "transfer_gateway.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            server: ServerConfig::default(),
            kafka: KafkaConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    /// Startup connection attempts before giving up
    pub connect_max_attempts: u32,
    pub connect_retry_delay_ms: u64,
    /// Bound on a single connection attempt
    pub connect_attempt_timeout_ms: u64,
    /// Bound on waiting for a produce acknowledgment
    pub ack_timeout_ms: u64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            topic: "transfer-requests".to_string(),
            connect_max_attempts: 15,
            connect_retry_delay_ms: 2000,
            connect_attempt_timeout_ms: 10_000,
            ack_timeout_ms: 10_000,
        }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`, then apply environment overrides.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        Self::load_from(Path::new(&config_path), |name| std::env::var(name).ok())
    }

    /// Load from `path` with `lookup` as the environment.
    ///
    /// Precedence, lowest first: built-in defaults, file, environment. A
    /// missing file is fine. Each leaf key `a.b_c` is overridden by the
    /// variable `A_B_C`; list values take a comma-separated string.
    pub fn load_from(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut tree = serde_yaml::to_value(AppConfig::default())?;

        match fs::read_to_string(path) {
            Ok(content) => merge(&mut tree, serde_yaml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        }

        let mut key_path = Vec::new();
        apply_env_overrides(&mut tree, &mut key_path, &lookup);

        let config: AppConfig = serde_yaml::from_value(tree)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kafka.brokers.is_empty() {
            return Err(ConfigError::Invalid("kafka.brokers must not be empty".into()));
        }
        if self.kafka.brokers.iter().any(|b| b.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "kafka.brokers must not contain empty entries".into(),
            ));
        }
        if self.kafka.topic.trim().is_empty() {
            return Err(ConfigError::Invalid("kafka.topic must not be empty".into()));
        }
        if self.kafka.ack_timeout_ms == 0 {
            return Err(ConfigError::Invalid("kafka.ack_timeout_ms must be > 0".into()));
        }
        if self.kafka.connect_attempt_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "kafka.connect_attempt_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Deep-merge `overlay` into `base`; mappings merge key by key, anything
/// else replaces. A null overlay (empty file) changes nothing.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(slot) = base_map.get_mut(&key) {
                    merge(slot, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(
    node: &mut Value,
    key_path: &mut Vec<String>,
    lookup: &impl Fn(&str) -> Option<String>,
) {
    let Value::Mapping(map) = node else {
        return;
    };
    for (key, value) in map.iter_mut() {
        let Some(key) = key.as_str() else {
            continue;
        };
        key_path.push(key.to_string());
        if value.is_mapping() {
            apply_env_overrides(value, key_path, lookup);
        } else {
            let name = env_var_name(key_path);
            if let Some(raw) = lookup(&name) {
                *value = env_value(value, &raw);
            }
        }
        key_path.pop();
    }
}

/// `["kafka", "topic"]` → `KAFKA_TOPIC`
fn env_var_name(key_path: &[String]) -> String {
    key_path.join("_").replace('.', "_").to_uppercase()
}

/// Parse an environment string into the shape of the value it replaces
fn env_value(current: &Value, raw: &str) -> Value {
    match current {
        Value::String(_) => Value::String(raw.to_string()),
        Value::Sequence(_) => Value::Sequence(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        _ => serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}
