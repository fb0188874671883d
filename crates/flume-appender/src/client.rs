//! 노드 클라이언트 -- 단일 Flume 노드와의 TCP 연결을 관리합니다.
//!
//! 노드당 연결 하나를 `Mutex`로 보호합니다. 첫 전송 시 연결하고(lazy connect),
//! 이후 재사용합니다. I/O 실패가 발생하면 연결을 버리고 다음 전송에서
//! 다시 연결합니다.

use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use kaa_appender_core::error::DeliveryError;
use kaa_appender_core::metrics as m;
use kaa_appender_core::types::NodeEndpoint;

use crate::codec::ACK_OK;

/// 단일 노드 클라이언트
pub struct NodeClient {
    endpoint: NodeEndpoint,
    /// 메트릭/로그용 `host:port`
    label: String,
    conn: Mutex<Option<TcpStream>>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl NodeClient {
    pub fn new(endpoint: NodeEndpoint, connect_timeout: Duration, request_timeout: Duration) -> Self {
        let label = endpoint.to_string();
        Self {
            endpoint,
            label,
            conn: Mutex::new(None),
            connect_timeout,
            request_timeout,
        }
    }

    pub fn endpoint(&self) -> &NodeEndpoint {
        &self.endpoint
    }

    /// 현재 연결이 열려 있는지 확인합니다.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// 인코딩된 프레임을 전송하고 확인 응답을 기다립니다.
    ///
    /// 연결과 전송+응답은 각각 타임아웃으로 제한됩니다. 교환 중에는 스트림을
    /// 슬롯에서 꺼내 두고, 교환이 끝까지 완료된 경우에만 되돌려 놓습니다.
    /// 호출 future가 중간에 drop되면 연결도 함께 닫히고 다음 전송은 재연결합니다.
    pub async fn send_frame(&self, frame: &Bytes) -> Result<(), DeliveryError> {
        let mut guard = self.conn.lock().await;

        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };

        let started = Instant::now();
        let result = match timeout(self.request_timeout, exchange(&mut stream, frame)).await {
            Ok(Ok(ack)) => self.check_ack(ack),
            Ok(Err(e)) => Err(DeliveryError::Io {
                node: self.label.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(DeliveryError::Timeout {
                node: self.label.clone(),
                timeout_ms: millis(self.request_timeout),
            }),
        };

        metrics::histogram!(m::CLIENT_SEND_DURATION_SECONDS, m::LABEL_NODE => self.label.clone())
            .record(started.elapsed().as_secs_f64());

        match &result {
            // 프레임 경계가 유지되므로 거부 응답 후에도 재사용 가능
            Ok(()) | Err(DeliveryError::Rejected { .. }) => *guard = Some(stream),
            Err(e) => {
                warn!(node = %self.label, error = %e, "dropping flume connection");
            }
        }

        result
    }

    /// 연결을 해제합니다. 여러 번 호출해도 안전합니다.
    pub async fn close(&self) {
        if let Some(mut stream) = self.conn.lock().await.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(node = %self.label, error = %e, "flume connection shutdown failed");
            }
            debug!(node = %self.label, "flume connection closed");
        }
    }

    async fn connect(&self) -> Result<TcpStream, DeliveryError> {
        let addr = (self.endpoint.host(), self.endpoint.port());
        let stream = match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(DeliveryError::Connect {
                    node: self.label.clone(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(DeliveryError::Timeout {
                    node: self.label.clone(),
                    timeout_ms: millis(self.connect_timeout),
                });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!(node = %self.label, error = %e, "failed to set TCP_NODELAY");
        }

        metrics::counter!(m::CLIENT_NODE_CONNECTS_TOTAL, m::LABEL_NODE => self.label.clone())
            .increment(1);
        debug!(node = %self.label, "connected to flume node");
        Ok(stream)
    }

    fn check_ack(&self, ack: u8) -> Result<(), DeliveryError> {
        if ack == ACK_OK {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                node: self.label.clone(),
                status: ack,
            })
        }
    }
}

async fn exchange(stream: &mut TcpStream, frame: &Bytes) -> std::io::Result<u8> {
    stream.write_all(frame).await?;
    stream.flush().await?;
    stream.read_u8().await
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
