//! Flume 클라이언트 매니저
//!
//! [`FlumeClientManager`]는 노드 풀의 노드마다 [`NodeClient`]를 하나씩 보유하고,
//! [`BalancingPolicy`]가 반환한 후보를 순서대로 시도합니다.
//!
//! `close()` 이후의 전송은 [`DeliveryError::Closed`]로 즉시 실패하며,
//! 진행 중인 전송도 취소 토큰에 의해 중단됩니다.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kaa_appender_core::appender::ClientManager;
use kaa_appender_core::error::DeliveryError;
use kaa_appender_core::event::WireEvent;
use kaa_appender_core::metrics as m;
use kaa_appender_core::types::NodePool;

use crate::balancer::{BalancingPolicy, policy_for};
use crate::client::NodeClient;
use crate::codec::encode_frame;
use crate::config::FlumeConfig;

/// Flume 노드 풀 클라이언트 매니저
pub struct FlumeClientManager {
    pool: NodePool,
    clients: Vec<NodeClient>,
    policy: Box<dyn BalancingPolicy>,
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl FlumeClientManager {
    /// 설정으로부터 매니저를 생성합니다. 연결은 첫 전송 시 맺습니다.
    pub fn from_config(config: &FlumeConfig) -> Self {
        Self::with_policy(config, policy_for(config.balancing))
    }

    /// 선택 정책을 직접 지정하여 매니저를 생성합니다.
    pub fn with_policy(config: &FlumeConfig, policy: Box<dyn BalancingPolicy>) -> Self {
        let pool = config.node_pool();
        let clients = pool
            .iter()
            .map(|endpoint| {
                NodeClient::new(
                    endpoint.clone(),
                    config.connect_timeout(),
                    config.request_timeout(),
                )
            })
            .collect();

        debug!(
            nodes = pool.len(),
            policy = policy.name(),
            "flume client manager created"
        );

        Self {
            pool,
            clients,
            policy,
            cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn send_to_candidates(&self, event: &WireEvent) -> Result<(), DeliveryError> {
        let frame = encode_frame(event).map_err(|e| DeliveryError::Io {
            node: "-".to_owned(),
            reason: format!("frame encoding failed: {e}"),
        })?;

        let mut last_error = DeliveryError::NoAvailableNodes;
        for idx in self.policy.candidates(self.clients.len()) {
            let Some(client) = self.clients.get(idx) else {
                continue;
            };

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(DeliveryError::Closed),
                res = client.send_frame(&frame) => res,
            };

            match result {
                Ok(()) => {
                    debug!(node = %client.endpoint(), bytes = frame.len(), "event acknowledged");
                    return Ok(());
                }
                Err(DeliveryError::Closed) => return Err(DeliveryError::Closed),
                Err(e) => {
                    metrics::counter!(
                        m::CLIENT_DELIVERY_FAILURES_TOTAL,
                        m::LABEL_NODE => client.endpoint().to_string()
                    )
                    .increment(1);
                    warn!(node = %client.endpoint(), error = %e, "delivery attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

impl ClientManager for FlumeClientManager {
    async fn send(&self, event: &WireEvent) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        if self.clients.is_empty() {
            return Err(DeliveryError::NoAvailableNodes);
        }
        self.send_to_candidates(event).await
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel.cancel();
        for client in &self.clients {
            client.close().await;
        }
        info!(nodes = self.clients.len(), "flume client manager closed");
    }

    fn node_count(&self) -> usize {
        self.pool.len()
    }
}
