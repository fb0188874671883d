//! 전송 프레이밍 -- 이벤트 하나를 길이 접두사 프레임 하나로 인코딩합니다.
//!
//! # 프레임 구조 (big endian)
//! ```text
//! u32 payload_len
//! payload:
//!   u16 header_count
//!   header_count x { u16 key_len, key, u32 value_len, value }
//!   u32 body_len, body
//! ```
//!
//! 노드는 프레임마다 1바이트 확인 응답을 보냅니다. [`ACK_OK`]는 수락,
//! 그 외 값은 거부 상태 코드입니다.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use kaa_appender_core::error::SerializationError;
use kaa_appender_core::event::WireEvent;

/// 최대 프레임 페이로드 크기 (16MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// 수락 응답 바이트
pub const ACK_OK: u8 = 0x00;

/// 이벤트를 길이 접두사를 포함한 프레임으로 인코딩합니다.
///
/// 헤더 키는 u16, 값과 본문은 u32 길이를 넘을 수 없습니다.
pub fn encode_frame(event: &WireEvent) -> Result<Bytes, SerializationError> {
    let header_count = u16::try_from(event.headers.len())
        .map_err(|_| SerializationError::Encode("too many headers".to_owned()))?;

    let payload_len = payload_len(event);
    if payload_len > MAX_FRAME_SIZE {
        return Err(SerializationError::TooLarge {
            size: payload_len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buf = BytesMut::with_capacity(4 + payload_len);
    buf.put_u32(len_u32(payload_len)?);
    buf.put_u16(header_count);
    for (key, value) in &event.headers {
        let key_len = u16::try_from(key.len())
            .map_err(|_| SerializationError::Encode(format!("header key too long: {key}")))?;
        buf.put_u16(key_len);
        buf.put_slice(key.as_bytes());
        buf.put_u32(len_u32(value.len())?);
        buf.put_slice(value.as_bytes());
    }
    buf.put_u32(len_u32(event.body.len())?);
    buf.put_slice(&event.body);

    Ok(buf.freeze())
}

/// 길이 접두사를 제외한 프레임 페이로드 크기 (헤더 + 본문)
pub fn payload_len(event: &WireEvent) -> usize {
    2 + event
        .headers
        .iter()
        .map(|(k, v)| 2 + k.len() + 4 + v.len())
        .sum::<usize>()
        + 4
        + event.body.len()
}

/// 길이 접두사를 제외한 프레임 페이로드를 디코딩합니다.
pub fn decode_frame(payload: &[u8]) -> Result<WireEvent, SerializationError> {
    let mut cur = payload;
    let header_count = take_u16(&mut cur)?;

    let mut event = WireEvent::default();
    for _ in 0..header_count {
        let key_len = usize::from(take_u16(&mut cur)?);
        let key = take_utf8(&mut cur, key_len)?;
        let value_len = take_u32_len(&mut cur)?;
        let value = take_utf8(&mut cur, value_len)?;
        event.headers.insert(key, value);
    }

    let body_len = take_u32_len(&mut cur)?;
    if cur.remaining() != body_len {
        return Err(SerializationError::Encode(format!(
            "body length mismatch: declared {body_len}, remaining {}",
            cur.remaining()
        )));
    }
    event.body = Bytes::copy_from_slice(cur);

    Ok(event)
}

/// 스트림에서 프레임 하나를 읽어 디코딩합니다.
///
/// 프레임 경계에서 EOF이면 `Ok(None)`을 반환합니다.
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Option<WireEvent>>
where
    R: AsyncRead + Unpin,
{
    let payload_len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };

    if payload_len > MAX_FRAME_SIZE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("frame too large: {payload_len} bytes"),
        ));
    }

    let mut payload = vec![0u8; payload_len];
    reader.read_exact(&mut payload).await?;

    decode_frame(&payload)
        .map(Some)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}

fn len_u32(len: usize) -> Result<u32, SerializationError> {
    u32::try_from(len).map_err(|_| SerializationError::TooLarge {
        size: len,
        max: MAX_FRAME_SIZE,
    })
}

fn take_u16(cur: &mut &[u8]) -> Result<u16, SerializationError> {
    if cur.remaining() < 2 {
        return Err(truncated());
    }
    Ok(cur.get_u16())
}

fn take_u32_len(cur: &mut &[u8]) -> Result<usize, SerializationError> {
    if cur.remaining() < 4 {
        return Err(truncated());
    }
    Ok(cur.get_u32() as usize)
}

fn take_utf8(cur: &mut &[u8], len: usize) -> Result<String, SerializationError> {
    if cur.remaining() < len {
        return Err(truncated());
    }
    let data: &[u8] = *cur;
    let (head, tail) = data.split_at(len);
    let s = std::str::from_utf8(head)
        .map_err(|e| SerializationError::Encode(format!("invalid utf-8 in header: {e}")))?
        .to_owned();
    *cur = tail;
    Ok(s)
}

fn truncated() -> SerializationError {
    SerializationError::Encode("truncated frame".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> WireEvent {
        WireEvent::new(Bytes::from_static(br#"{"events":[]}"#))
            .with_header("appender_id", "appender_id")
            .with_header("event_count", "0")
    }

    #[test]
    fn encoded_frame_starts_with_payload_length() {
        let frame = encode_frame(&sample_event()).unwrap();
        let declared = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(declared, frame.len() - 4);
    }

    #[test]
    fn decode_restores_headers_and_body() {
        let event = sample_event();
        let frame = encode_frame(&event).unwrap();
        let decoded = decode_frame(&frame[4..]).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn payload_len_matches_encoded_frame() {
        let event = sample_event();
        let frame = encode_frame(&event).unwrap();
        assert_eq!(payload_len(&event), frame.len() - 4);
    }

    #[test]
    fn empty_event_encodes() {
        let frame = encode_frame(&WireEvent::default()).unwrap();
        // u32 len + u16 header count + u32 body len
        assert_eq!(frame.len(), 4 + 2 + 4);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let frame = encode_frame(&sample_event()).unwrap();
        let result = decode_frame(&frame[4..frame.len() - 3]);
        assert!(result.is_err());
    }

    #[test]
    fn oversized_body_is_rejected() {
        let event = WireEvent::new(vec![0u8; MAX_FRAME_SIZE]);
        let err = encode_frame(&event).unwrap_err();
        assert!(matches!(err, SerializationError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn read_frame_from_stream() {
        let first = sample_event();
        let second = WireEvent::new(Bytes::from_static(b"second"));

        let mut wire = Vec::new();
        wire.extend_from_slice(&encode_frame(&first).unwrap());
        wire.extend_from_slice(&encode_frame(&second).unwrap());

        let mut reader = wire.as_slice();
        assert_eq!(read_frame(&mut reader).await.unwrap(), Some(first));
        assert_eq!(read_frame(&mut reader).await.unwrap(), Some(second));
        assert_eq!(read_frame(&mut reader).await.unwrap(), None);
    }
}
