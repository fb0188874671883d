#![doc = include_str!("../README.md")]

pub mod appender;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AppenderError, ConfigError, DeliveryError, SerializationError};

// 설정
pub use config::LoggingConfig;

// 이벤트
pub use event::{BatchMetadata, LogEventBatch, LogRecord, LogSchema, WireEvent};

// 어펜더 trait
pub use appender::{
    AppendOutcome, BoxFuture, ClientManager, DynClientManager, EventBuilder, LogAppender,
    SkipReason,
};

// 도메인 타입
pub use types::{AppenderIdentity, HealthStatus, NodeEndpoint, NodePool};
