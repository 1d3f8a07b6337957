use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub lottery: LotteryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub name: String,
    /// 完整连接串，设置后忽略上面的分项
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            name: "lottery".to_string(),
            url: None,
            max_connections: 10,
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// PostgreSQL 连接串
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.name
            ),
        }
    }
}

/// 抽奖是否需要参与者名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantMode {
    Required,
    #[default]
    Optional,
    Disabled,
}

impl FromStr for ParticipantMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(ParticipantMode::Required),
            "optional" => Ok(ParticipantMode::Optional),
            "disabled" => Ok(ParticipantMode::Disabled),
            other => Err(AppError::ConfigError(format!(
                "unknown participant mode: {other}"
            ))),
        }
    }
}

impl fmt::Display for ParticipantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParticipantMode::Required => "required",
            ParticipantMode::Optional => "optional",
            ParticipantMode::Disabled => "disabled",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LotteryConfig {
    #[serde(default)]
    pub participant_mode: ParticipantMode,
    /// 无可用奖品时是否仍然创建参与者
    #[serde(default)]
    pub create_participant_on_empty: bool,
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            // 无配置文件：使用默认值（仅适用于本地开发），再由环境变量覆盖
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Config file {config_path} not found, using defaults");
                Config {
                    server: ServerConfig::default(),
                    database: DatabaseConfig::default(),
                    lottery: LotteryConfig::default(),
                }
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "无法读取配置文件 {config_path}: {e}"
                )));
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("解析配置文件失败: {e}")))
    }

    // 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) -> AppResult<()> {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DB_PORT")
            && let Ok(p) = v.parse()
        {
            self.database.port = p;
        }
        if let Ok(v) = env::var("DB_USER") {
            self.database.username = v;
        }
        if let Ok(v) = env::var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            && let Ok(secs) = v.parse()
        {
            self.database.acquire_timeout_secs = secs;
        }
        if let Ok(v) = env::var("LOTTERY_PARTICIPANT_MODE") {
            self.lottery.participant_mode = v.parse()?;
        }
        if let Ok(v) = env::var("LOTTERY_CREATE_PARTICIPANT_ON_EMPTY")
            && let Ok(flag) = v.parse()
        {
            self.lottery.create_participant_on_empty = flag;
        }
        Ok(())
    }
}
