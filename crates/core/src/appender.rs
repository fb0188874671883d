//! 어펜더 trait -- 이벤트 빌더, 클라이언트 매니저, 로그 어펜더 확장 포인트
//!
//! # 데이터 흐름
//! ```text
//! LogAppender::append(batch) -> EventBuilder::build -> ClientManager::send -> 원격 노드 풀
//! ```
//!
//! [`ClientManager`]는 RPITIT를 사용하므로 `dyn ClientManager`가 불가합니다.
//! 어펜더는 [`DynClientManager`]를 통해 `Arc<dyn DynClientManager>`로 보관합니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::{AppenderError, DeliveryError, SerializationError};
use crate::event::{LogEventBatch, WireEvent};
use crate::types::{AppenderIdentity, HealthStatus};

/// dyn-compatible trait에서 사용하는 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 로그 배치를 전송 이벤트로 변환하는 trait
///
/// 순수 변환이어야 합니다. I/O나 부수 효과가 없어야 합니다.
pub trait EventBuilder: Send + Sync {
    /// 배치를 전송 이벤트로 변환합니다.
    ///
    /// 잘못된 레코드가 있으면 [`SerializationError`]를 반환합니다.
    fn build(&self, batch: &LogEventBatch) -> Result<WireEvent, SerializationError>;
}

/// 원격 노드 풀로 이벤트를 전송하는 trait
///
/// 노드 선택(밸런싱 정책), 연결 생명주기, 타임아웃은 구현체가 담당합니다.
/// 재시도 스케줄링은 담당하지 않습니다.
pub trait ClientManager: Send + Sync + 'static {
    /// 이벤트 하나를 밸런싱 정책이 선택한 노드로 전송합니다.
    ///
    /// 확인 응답을 받으면 `Ok(())`, 전송 실패 시 [`DeliveryError`]를 반환합니다.
    fn send(&self, event: &WireEvent) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// 모든 노드 연결을 해제합니다. 여러 번 호출해도 안전해야 합니다.
    fn close(&self) -> impl Future<Output = ()> + Send;

    /// 설정된 노드 수
    fn node_count(&self) -> usize;
}

/// dyn-compatible 클라이언트 매니저 trait
///
/// `ClientManager`를 구현한 타입은 자동으로 `DynClientManager`도 구현됩니다.
pub trait DynClientManager: Send + Sync {
    fn send<'a>(&'a self, event: &'a WireEvent) -> BoxFuture<'a, Result<(), DeliveryError>>;

    fn close(&self) -> BoxFuture<'_, ()>;

    fn node_count(&self) -> usize;
}

impl<T: ClientManager> DynClientManager for T {
    fn send<'a>(&'a self, event: &'a WireEvent) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(ClientManager::send(self, event))
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(ClientManager::close(self))
    }

    fn node_count(&self) -> usize {
        ClientManager::node_count(self)
    }
}

/// 배치를 전송하지 않은 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 클라이언트 매니저가 바인딩되지 않음 (초기화 전)
    Unbound,
    /// 어펜더가 닫힘
    Closed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => write!(f, "unbound"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// `append` 한 번의 결과
///
/// 호출자에게 에러로 전파되지 않으며, 로그와 메트릭으로만 드러납니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// 원격 노드가 확인 응답함
    Delivered,
    /// 전송을 시도하지 않음
    Skipped(SkipReason),
    /// 직렬화 실패로 배치를 버림
    Dropped(SerializationError),
    /// 전송 실패
    Failed(DeliveryError),
}

impl AppendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// 메트릭 레이블용 결과명
    pub fn result_name(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Skipped(_) => "skipped",
            Self::Dropped(_) => "dropped",
            Self::Failed(_) => "failed",
        }
    }
}

/// 로그 어펜더 trait
///
/// # 생명주기
/// ```text
/// Uninitialized → init() → Initialized → close() → Closed
/// ```
///
/// `append`는 `Initialized` 상태에서만 전송하며, 그 외 상태에서는 no-op입니다.
pub trait LogAppender: Send + Sync {
    /// 어펜더 식별 정보
    fn identity(&self) -> &AppenderIdentity;

    /// 원시 설정 바이트로 어펜더를 초기화합니다.
    ///
    /// 외부로 실패를 전달할 수 있는 유일한 연산입니다.
    fn init(
        &self,
        raw_configuration: &[u8],
    ) -> impl Future<Output = Result<(), AppenderError>> + Send;

    /// 배치를 전송합니다. 어떤 경우에도 에러를 전파하지 않습니다.
    fn append(&self, batch: LogEventBatch) -> impl Future<Output = AppendOutcome> + Send;

    /// 리소스를 해제합니다. 멱등입니다.
    fn close(&self) -> impl Future<Output = ()> + Send;

    /// 어펜더 건강 상태
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
