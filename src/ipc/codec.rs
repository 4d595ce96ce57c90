//! ClipMon - Item wire codec
//!
//! Frame layout, identical in both directions:
//!
//! ```text
//! [u32 big-endian length][zstd(postcard(Item))]
//! ```
//!
//! There is no resynchronisation marker, so any malformed frame leaves the
//! stream unusable and is reported as an error.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::clipboard::models::Item;

const LEN_PREFIX: usize = 4;
/// Upper bound on a compressed frame
pub const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;
const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream ended inside a frame: expected {expected} bytes, got {available}")]
    Truncated { expected: usize, available: usize },
    #[error("frame of {0} bytes exceeds limit")]
    FrameTooLarge(usize),
    #[error("failed to decompress frame: {0}")]
    Decompress(std::io::Error),
    #[error("failed to compress frame: {0}")]
    Compress(std::io::Error),
    #[error("malformed item: {0}")]
    Deserialize(postcard::Error),
    #[error("failed to serialize item: {0}")]
    Serialize(postcard::Error),
}

impl CodecError {
    /// Errors that mean the stream itself broke rather than its contents
    pub fn is_disconnect(&self) -> bool {
        matches!(self, CodecError::Io(_))
    }
}

/// Length-prefixed, compressed item codec
#[derive(Debug, Default, Clone, Copy)]
pub struct ItemCodec;

impl ItemCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Serialize and compress one item into a frame payload
pub fn encode_payload(item: &Item) -> Result<Vec<u8>, CodecError> {
    let bytes = postcard::to_allocvec(item).map_err(CodecError::Serialize)?;
    zstd::bulk::compress(&bytes, ZSTD_LEVEL).map_err(CodecError::Compress)
}

/// Decompress and deserialize one frame payload
pub fn decode_payload(payload: &[u8]) -> Result<Item, CodecError> {
    let bytes = zstd::stream::decode_all(payload).map_err(CodecError::Decompress)?;
    postcard::from_bytes(&bytes).map_err(CodecError::Deserialize)
}

impl Encoder<Item> for ItemCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Item, dst: &mut BytesMut) -> Result<(), CodecError> {
        <Self as Encoder<&Item>>::encode(self, &item, dst)
    }
}

impl<'a> Encoder<&'a Item> for ItemCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &'a Item, dst: &mut BytesMut) -> Result<(), CodecError> {
        let payload = encode_payload(item)?;
        if payload.len() > MAX_FRAME_LEN {
            return Err(CodecError::FrameTooLarge(payload.len()));
        }
        dst.reserve(LEN_PREFIX + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

impl Decoder for ItemCodec {
    type Item = Item;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Item>, CodecError> {
        if src.len() < LEN_PREFIX {
            return Ok(None);
        }

        let mut prefix = [0u8; LEN_PREFIX];
        prefix.copy_from_slice(&src[..LEN_PREFIX]);
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_FRAME_LEN {
            return Err(CodecError::FrameTooLarge(len));
        }

        if src.len() < LEN_PREFIX + len {
            src.reserve(LEN_PREFIX + len - src.len());
            return Ok(None);
        }

        src.advance(LEN_PREFIX);
        let payload = src.split_to(len);
        decode_payload(&payload).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Item>, CodecError> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() => Ok(None),
            None => {
                let expected = if src.len() >= LEN_PREFIX {
                    let mut prefix = [0u8; LEN_PREFIX];
                    prefix.copy_from_slice(&src[..LEN_PREFIX]);
                    u32::from_be_bytes(prefix) as usize
                } else {
                    LEN_PREFIX
                };
                let available = src.len().saturating_sub(LEN_PREFIX);
                src.clear();
                Err(CodecError::Truncated { expected, available })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::models::{Snapshot, MIME_HTML, MIME_TEXT};

    fn item() -> Item {
        Snapshot::new()
            .with(MIME_TEXT, "Hello")
            .with(MIME_HTML, "<b>Hello</b>")
    }

    #[test]
    fn frame_has_big_endian_length_prefix() {
        let mut buf = BytesMut::new();
        ItemCodec.encode(&item(), &mut buf).unwrap();

        let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(len, buf.len() - 4);
        assert_eq!(decode_payload(&buf[4..]).unwrap(), item());
    }

    #[test]
    fn decodes_back_to_back_frames_in_order() {
        let first = Snapshot::from_text("first");
        let second = Snapshot::from_text("second");
        let mut buf = BytesMut::new();
        ItemCodec.encode(&first, &mut buf).unwrap();
        ItemCodec.encode(&second, &mut buf).unwrap();

        let mut codec = ItemCodec;
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(first));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(second));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn waits_for_the_rest_of_a_partial_frame() {
        let mut full = BytesMut::new();
        ItemCodec.encode(&item(), &mut full).unwrap();
        let tail = full.split_off(full.len() / 2);

        let mut codec = ItemCodec;
        assert_eq!(codec.decode(&mut full).unwrap(), None);
        full.extend_from_slice(&tail);
        assert_eq!(codec.decode(&mut full).unwrap(), Some(item()));
    }

    #[test]
    fn eof_inside_a_frame_is_truncation() {
        let mut buf = BytesMut::new();
        buf.put_u32(120);
        buf.extend_from_slice(&[0u8; 80]);

        let err = ItemCodec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { expected: 120, available: 80 }));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32(5);
        buf.extend_from_slice(b"nope!");

        let err = ItemCodec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::Decompress(_)));
        assert!(!err.is_disconnect());
    }

    #[test]
    fn valid_zstd_of_non_item_bytes_is_rejected() {
        let payload = zstd::bulk::compress(&[0xFF; 8], ZSTD_LEVEL).unwrap();
        let mut buf = BytesMut::new();
        buf.put_u32(payload.len() as u32);
        buf.extend_from_slice(&payload);

        let err = ItemCodec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::Deserialize(_)));
        assert!(!err.is_disconnect());
    }

    #[test]
    fn oversized_length_is_rejected_before_buffering() {
        let mut buf = BytesMut::new();
        buf.put_u32(u32::MAX);
        assert!(matches!(
            ItemCodec.decode(&mut buf),
            Err(CodecError::FrameTooLarge(_))
        ));
    }
}
