//! 로깅 초기화 -- 어펜더를 내장한 호스트 프로세스용
//!
//! [`LoggingConfig`]로 전역 `tracing-subscriber`를 설치합니다.
//! 어펜더 자체는 subscriber를 설치하지 않으며, 호스트가 시작 시 한 번 호출합니다.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{AppenderError, ConfigError};

/// 전역 tracing subscriber를 설치합니다.
///
/// `RUST_LOG`가 설정되어 있으면 `config.log_level`보다 우선합니다.
///
/// - `"json"`: 한 줄 JSON (기본값)
/// - `"pretty"`: 사람이 읽기 쉬운 형식
///
/// 알 수 없는 형식이면 [`ConfigError::InvalidValue`], 이미 subscriber가
/// 설치되어 있으면 [`AppenderError::InvalidState`]를 반환합니다.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), AppenderError> {
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        "pretty" => tracing_subscriber::fmt::layer().pretty().boxed(),
        other => {
            return Err(ConfigError::InvalidValue {
                field: "logging.log_format".to_owned(),
                reason: format!("unknown log format '{other}', expected 'json' or 'pretty'"),
            }
            .into());
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| {
            AppenderError::InvalidState(format!(
                "failed to install {} tracing subscriber: {e}",
                config.log_format
            ))
        })
}
