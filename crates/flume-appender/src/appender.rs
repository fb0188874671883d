//! Flume 로그 어펜더
//!
//! [`FlumeLogAppender`]는 생명주기(init/close)와 append 연산을 조율합니다.
//! 이벤트 생성은 [`EventBuilder`]에, 전송은 클라이언트 매니저에 위임합니다.
//!
//! # 상태 전이
//! ```text
//! Uninitialized --init--> Initialized --close--> Closed
//!                          |     ^
//!                          +-init+  (재초기화: 이전 매니저를 닫고 교체)
//! ```
//!
//! 상태는 `RwLock`으로 보호되며, 네트워크 I/O 동안에는 락을 잡지 않습니다.
//! `append`는 어떤 경우에도 에러를 전파하지 않고 [`AppendOutcome`]을 반환합니다.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use kaa_appender_core::appender::{
    AppendOutcome, ClientManager, DynClientManager, EventBuilder, LogAppender, SkipReason,
};
use kaa_appender_core::error::AppenderError;
use kaa_appender_core::event::LogEventBatch;
use kaa_appender_core::metrics as m;
use kaa_appender_core::types::{AppenderIdentity, HealthStatus};

use crate::config::FlumeConfig;
use crate::event_builder::FlumeEventBuilder;
use crate::manager::FlumeClientManager;

/// 초기화 후 바인딩되는 협력 객체
#[derive(Clone)]
struct Bound {
    client_manager: Arc<dyn DynClientManager>,
    event_builder: Arc<dyn EventBuilder>,
}

enum AppenderState {
    Uninitialized,
    Initialized(Bound),
    Closed,
}

impl AppenderState {
    fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized(_) => "initialized",
            Self::Closed => "closed",
        }
    }
}

/// Flume 로그 어펜더
///
/// 클라이언트 매니저나 이벤트 빌더를 주입하지 않으면 `init` 시 설정으로부터
/// [`FlumeClientManager`]와 [`FlumeEventBuilder`]를 생성합니다.
pub struct FlumeLogAppender {
    identity: AppenderIdentity,
    event_builder: Option<Arc<dyn EventBuilder>>,
    client_manager: Option<Arc<dyn DynClientManager>>,
    state: RwLock<AppenderState>,
}

impl FlumeLogAppender {
    /// 기본 협력 객체를 사용하는 어펜더를 생성합니다.
    pub fn new(identity: AppenderIdentity) -> Self {
        FlumeLogAppenderBuilder::new(identity).build()
    }

    pub fn builder(identity: AppenderIdentity) -> FlumeLogAppenderBuilder {
        FlumeLogAppenderBuilder::new(identity)
    }

    /// 현재 상태 이름 (`uninitialized`, `initialized`, `closed`)
    pub async fn state_name(&self) -> &'static str {
        self.state.read().await.name()
    }

    fn resolve(&self, config: &FlumeConfig) -> Bound {
        let client_manager = match &self.client_manager {
            Some(manager) => Arc::clone(manager),
            None => Arc::new(FlumeClientManager::from_config(config)) as Arc<dyn DynClientManager>,
        };
        let event_builder = match &self.event_builder {
            Some(builder) => Arc::clone(builder),
            None => Arc::new(FlumeEventBuilder::from_config(self.identity.clone(), config))
                as Arc<dyn EventBuilder>,
        };
        Bound {
            client_manager,
            event_builder,
        }
    }

    fn is_injected(&self, manager: &Arc<dyn DynClientManager>) -> bool {
        self.client_manager
            .as_ref()
            .is_some_and(|injected| std::ptr::addr_eq(Arc::as_ptr(injected), Arc::as_ptr(manager)))
    }

    fn record(&self, outcome: &AppendOutcome) {
        metrics::counter!(
            m::APPENDER_APPENDS_TOTAL,
            m::LABEL_APPENDER => self.identity.name.clone(),
            m::LABEL_RESULT => outcome.result_name()
        )
        .increment(1);
    }
}

impl LogAppender for FlumeLogAppender {
    fn identity(&self) -> &AppenderIdentity {
        &self.identity
    }

    async fn init(&self, raw_configuration: &[u8]) -> Result<(), AppenderError> {
        let config = FlumeConfig::from_bytes(raw_configuration).inspect_err(|e| {
            warn!(appender = %self.identity, error = %e, "invalid flume appender configuration");
        })?;

        let bound = self.resolve(&config);
        let node_count = bound.client_manager.node_count();

        let previous = {
            let mut state = self.state.write().await;
            if matches!(*state, AppenderState::Closed) {
                drop(state);
                if !self.is_injected(&bound.client_manager) {
                    bound.client_manager.close().await;
                }
                return Err(AppenderError::InvalidState(
                    "appender is closed and cannot be re-initialized".to_owned(),
                ));
            }
            std::mem::replace(&mut *state, AppenderState::Initialized(bound.clone()))
        };

        if let AppenderState::Initialized(old) = previous {
            if !Arc::ptr_eq(&old.client_manager, &bound.client_manager) {
                debug!(appender = %self.identity, "closing replaced client manager");
                old.client_manager.close().await;
            }
        }

        info!(
            appender = %self.identity,
            application_id = %self.identity.application_id,
            nodes = node_count,
            balancing = ?config.balancing,
            "flume appender initialized"
        );
        Ok(())
    }

    async fn append(&self, batch: LogEventBatch) -> AppendOutcome {
        let bound = match &*self.state.read().await {
            AppenderState::Initialized(bound) => Ok(bound.clone()),
            AppenderState::Uninitialized => Err(SkipReason::Unbound),
            AppenderState::Closed => Err(SkipReason::Closed),
        };

        let bound = match bound {
            Ok(bound) => bound,
            Err(reason) => {
                debug!(appender = %self.identity, batch_id = %batch.id, %reason, "append skipped");
                let outcome = AppendOutcome::Skipped(reason);
                self.record(&outcome);
                return outcome;
            }
        };

        let event = match bound.event_builder.build(&batch) {
            Ok(event) => event,
            Err(e) => {
                warn!(appender = %self.identity, batch_id = %batch.id, error = %e, "dropping batch that failed to serialize");
                metrics::counter!(
                    m::APPENDER_SERIALIZATION_ERRORS_TOTAL,
                    m::LABEL_APPENDER => self.identity.name.clone()
                )
                .increment(1);
                let outcome = AppendOutcome::Dropped(e);
                self.record(&outcome);
                return outcome;
            }
        };

        let outcome = match bound.client_manager.send(&event).await {
            Ok(()) => {
                debug!(
                    appender = %self.identity,
                    batch_id = %batch.id,
                    records = batch.len(),
                    "batch delivered"
                );
                metrics::counter!(
                    m::APPENDER_RECORDS_DELIVERED_TOTAL,
                    m::LABEL_APPENDER => self.identity.name.clone()
                )
                .increment(batch.len() as u64);
                AppendOutcome::Delivered
            }
            Err(e) => {
                warn!(
                    appender = %self.identity,
                    batch_id = %batch.id,
                    records = batch.len(),
                    error = %e,
                    "failed to deliver batch"
                );
                AppendOutcome::Failed(e)
            }
        };

        self.record(&outcome);
        outcome
    }

    async fn close(&self) {
        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, AppenderState::Closed)
        };

        match previous {
            AppenderState::Initialized(bound) => {
                bound.client_manager.close().await;
                info!(appender = %self.identity, "flume appender closed");
            }
            AppenderState::Uninitialized => {
                debug!(appender = %self.identity, "closing uninitialized flume appender");
            }
            AppenderState::Closed => {
                debug!(appender = %self.identity, "flume appender already closed");
            }
        }
    }

    async fn health_check(&self) -> HealthStatus {
        let state = self.state.read().await;
        match &*state {
            AppenderState::Uninitialized => HealthStatus::Unhealthy("not initialized".to_owned()),
            AppenderState::Closed => HealthStatus::Unhealthy("closed".to_owned()),
            AppenderState::Initialized(bound) if bound.client_manager.node_count() == 0 => {
                HealthStatus::Degraded("no flume nodes configured".to_owned())
            }
            AppenderState::Initialized(_) => HealthStatus::Healthy,
        }
    }
}

/// [`FlumeLogAppender`] 빌더
///
/// 협력 객체를 생성자 주입으로 교체합니다.
///
/// # 사용 예시
/// ```ignore
/// let appender = FlumeLogAppender::builder(identity)
///     .client_manager(my_manager)
///     .build();
/// appender.init(&raw_config).await?;
/// ```
pub struct FlumeLogAppenderBuilder {
    identity: AppenderIdentity,
    event_builder: Option<Arc<dyn EventBuilder>>,
    client_manager: Option<Arc<dyn DynClientManager>>,
}

impl FlumeLogAppenderBuilder {
    pub fn new(identity: AppenderIdentity) -> Self {
        Self {
            identity,
            event_builder: None,
            client_manager: None,
        }
    }

    /// 이벤트 빌더를 주입합니다.
    pub fn event_builder(mut self, builder: impl EventBuilder + 'static) -> Self {
        self.event_builder = Some(Arc::new(builder));
        self
    }

    /// 공유 이벤트 빌더를 주입합니다.
    pub fn shared_event_builder(mut self, builder: Arc<dyn EventBuilder>) -> Self {
        self.event_builder = Some(builder);
        self
    }

    /// 클라이언트 매니저를 주입합니다. 어펜더가 소유하며 `close` 시 닫힙니다.
    pub fn client_manager<M: ClientManager>(mut self, manager: M) -> Self {
        self.client_manager = Some(Arc::new(manager));
        self
    }

    /// 공유 클라이언트 매니저를 주입합니다.
    pub fn shared_client_manager(mut self, manager: Arc<dyn DynClientManager>) -> Self {
        self.client_manager = Some(manager);
        self
    }

    pub fn build(self) -> FlumeLogAppender {
        FlumeLogAppender {
            identity: self.identity,
            event_builder: self.event_builder,
            client_manager: self.client_manager,
            state: RwLock::new(AppenderState::Uninitialized),
        }
    }
}
