//! 에러 타입 -- 어펜더 도메인별 에러 정의
//!
//! 전파 정책:
//! - [`ConfigError`]만 `init` 경계를 넘어 호출자에게 전달됩니다.
//! - [`DeliveryError`], [`SerializationError`]는 어펜더 내부에서 로그로 기록되고
//!   `append` 호출자에게는 절대 에러로 전달되지 않습니다. 따라서
//!   [`AppenderError`]에는 이 둘에 대한 variant가 없습니다.

/// 어펜더 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AppenderError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 현재 생명주기 상태에서 허용되지 않는 호출
    #[error("invalid appender state: {0}")]
    InvalidState(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 원격 노드 전송 에러
///
/// 복구 가능한 조건입니다. 어펜더는 이 에러를 삼키고 로그만 남깁니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// 노드 풀이 비어 있음
    #[error("no flume nodes available")]
    NoAvailableNodes,

    /// 연결 실패
    #[error("connect to {node} failed: {reason}")]
    Connect { node: String, reason: String },

    /// 타임아웃
    #[error("{node} timed out after {timeout_ms}ms")]
    Timeout { node: String, timeout_ms: u64 },

    /// 원격 노드가 이벤트를 거부함
    #[error("{node} rejected event with status {status}")]
    Rejected { node: String, status: u8 },

    /// 전송 중 I/O 실패
    #[error("io failure on {node}: {reason}")]
    Io { node: String, reason: String },

    /// 클라이언트 매니저가 이미 닫힘
    #[error("client manager closed")]
    Closed,
}

impl DeliveryError {
    /// 에러가 발생한 노드 (`host:port`)를 반환합니다.
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::Connect { node, .. }
            | Self::Timeout { node, .. }
            | Self::Rejected { node, .. }
            | Self::Io { node, .. } => Some(node),
            Self::NoAvailableNodes | Self::Closed => None,
        }
    }
}

/// 이벤트 직렬화 에러
///
/// 잘못된 배치는 전송하지 않고 버립니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    /// 레코드 내용이 올바르지 않음
    #[error("malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// 직렬화된 이벤트가 최대 크기 초과
    #[error("event too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    /// 인코딩 실패
    #[error("encode failed: {0}")]
    Encode(String),
}
