//! 로깅 설정 -- TOML 파싱 및 환경변수 오버라이드
//!
//! 어펜더를 호스팅하는 프로세스가 [`LoggingConfig`]를 로드하고
//! [`init_tracing`](crate::logging::init_tracing)에 전달합니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`KAA_APPENDER_LOG_LEVEL=debug` 형식)
//! 2. 설정 파일 (`[logging]` 섹션)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), kaa_appender_core::error::AppenderError> {
//! use kaa_appender_core::config::LoggingConfig;
//!
//! let config = LoggingConfig::load("appender.toml").await?;
//! let config = LoggingConfig::parse("[logging]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppenderError, ConfigError};

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["json", "pretty"];

/// 설정 파일 최상위 구조
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    logging: LoggingConfig,
}

/// 로깅 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

impl LoggingConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AppenderError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppenderError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                AppenderError::Io(e)
            }
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열의 `[logging]` 섹션을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, AppenderError> {
        let file: ConfigFile = toml::from_str(toml_str).map_err(|e| {
            AppenderError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })?;
        Ok(file.logging)
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.log_level, "KAA_APPENDER_LOG_LEVEL");
        override_string(&mut self.log_format, "KAA_APPENDER_LOG_FORMAT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.log_level".to_owned(),
                reason: format!("must be one of: {}", VALID_LEVELS.join(", ")),
            });
        }

        if !VALID_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.log_format".to_owned(),
                reason: format!("must be one of: {}", VALID_FORMATS.join(", ")),
            });
        }

        Ok(())
    }
}

fn override_string(target: &mut String, env_key: &str) {
    match std::env::var(env_key) {
        Ok(value) if !value.is_empty() => *target = value,
        Ok(_) => warn!(key = env_key, "ignoring empty environment override"),
        Err(_) => {}
    }
}
