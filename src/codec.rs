//! Slotted inventory codec.
//!
//! Encodes a fixed-size inventory (one optional item per slot) into a
//! versioned byte blob. Empty slots are not stored, only occupied ones.
//!
//! Wire layout, multi-byte fields big-endian:
//! ```text
//! u8    format version (1)
//! u8    slot count N
//! u8    occupied count (header copy)
//! per occupied slot, ascending slot order:
//!   u8    slot index
//!   u16   payload length
//!   [u8]  payload produced by the item codec
//! u16   occupied count (trailer, drives decoding)
//! ```
//!
//! The decoder checks the header copy against the trailer and rejects the
//! blob when they disagree, which is how a truncated blob is caught.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::io::{self, Cursor};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use thiserror::Error;

pub const FORMAT_VERSION: u8 = 1;

/// Largest slot count the one-byte header field can describe.
pub const MAX_SLOTS: usize = u8::MAX as usize;

/// Largest item payload the two-byte length field can describe.
pub const MAX_ITEM_BYTES: usize = u16::MAX as usize;

const HEADER_LEN: usize = 3;
const TRAILER_LEN: usize = 2;

/// Encode/decode capability for a single item stack.
///
/// Each call is self-contained: a payload produced by `encode` must decode on
/// its own, without knowledge of neighbouring slots.
pub trait ItemCodec {
    type Item;
    type Error: StdError + Send + Sync + 'static;

    fn encode(&self, item: &Self::Item) -> Result<Vec<u8>, Self::Error>;
    fn decode(&self, bytes: &[u8]) -> Result<Self::Item, Self::Error>;
}

/// Item codec that keeps payloads as raw bytes.
///
/// Used when the real item type is not available, e.g. to inspect a stored
/// snapshot from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawItemCodec;

impl ItemCodec for RawItemCodec {
    type Item = Vec<u8>;
    type Error = Infallible;

    fn encode(&self, item: &Vec<u8>) -> Result<Vec<u8>, Infallible> {
        Ok(item.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, Infallible> {
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported serialized inventory version {0}")]
    UnsupportedVersion(u8),

    #[error("corrupt inventory data: {0}")]
    CorruptInventoryData(Corruption),

    #[error("inventory has {0} slots, at most 255 can be encoded")]
    TooManySlots(usize),

    #[error("item in slot {slot} encodes to {len} bytes, at most 65535 allowed")]
    ItemTooLarge { slot: usize, len: usize },

    #[error("failed to encode item in slot {slot}: {source}")]
    ItemEncode {
        slot: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// What exactly was wrong with a corrupt blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Corruption {
    #[error("stream ended early")]
    Truncated,

    #[error("occupied count mismatch: header says {header}, trailer says {trailer}")]
    CountMismatch { header: u8, trailer: u16 },

    #[error("{occupied} occupied slots in an inventory of {slots}")]
    TooManyOccupied { occupied: u16, slots: u8 },

    #[error("slot {slot} out of range for an inventory of {slots}")]
    SlotOutOfRange { slot: u8, slots: u8 },

    #[error("slot {0} appears twice")]
    DuplicateSlot(u8),

    #[error("{0} unread bytes before the trailer")]
    TrailingBytes(usize),

    #[error("item in slot {slot} failed to decode: {message}")]
    ItemDecode { slot: u8, message: String },
}

impl From<Corruption> for CodecError {
    fn from(corruption: Corruption) -> Self {
        CodecError::CorruptInventoryData(corruption)
    }
}

fn truncated(_: io::Error) -> Corruption {
    Corruption::Truncated
}

/// Encode a slotted inventory into the versioned wire format.
pub fn encode_inventory<C: ItemCodec>(
    codec: &C,
    slots: &[Option<C::Item>],
) -> Result<Vec<u8>, CodecError> {
    if slots.len() > MAX_SLOTS {
        return Err(CodecError::TooManySlots(slots.len()));
    }

    // bounded by slots.len(), so it fits the header byte
    let occupied = slots.iter().filter(|slot| slot.is_some()).count();

    let mut out = Vec::with_capacity(HEADER_LEN + TRAILER_LEN);
    out.push(FORMAT_VERSION);
    out.push(slots.len() as u8);
    out.push(occupied as u8);

    let mut written: u16 = 0;
    for (slot, item) in slots.iter().enumerate() {
        let Some(item) = item else { continue };

        let payload = codec.encode(item).map_err(|e| CodecError::ItemEncode {
            slot,
            source: Box::new(e),
        })?;
        let len = u16::try_from(payload.len()).map_err(|_| CodecError::ItemTooLarge {
            slot,
            len: payload.len(),
        })?;

        out.push(slot as u8);
        put_u16(&mut out, len);
        out.extend_from_slice(&payload);
        written += 1;
    }

    put_u16(&mut out, written);
    Ok(out)
}

/// Decode a blob produced by [`encode_inventory`].
///
/// The returned vector always has exactly the encoded slot count.
pub fn decode_inventory<C: ItemCodec>(
    codec: &C,
    bytes: &[u8],
) -> Result<Vec<Option<C::Item>>, CodecError> {
    let version = *bytes.first().ok_or(Corruption::Truncated)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(Corruption::Truncated.into());
    }

    let (body, trailer) = bytes.split_at(bytes.len() - TRAILER_LEN);
    let occupied = BigEndian::read_u16(trailer);

    let mut cursor = Cursor::new(body);
    cursor.set_position(1);
    let slot_count = cursor.read_u8().map_err(truncated)?;
    let header_occupied = cursor.read_u8().map_err(truncated)?;

    // the header copy is only a consistency check; a truncated blob leaves
    // garbage where the trailer should be and will disagree with it
    if u16::from(header_occupied) != occupied {
        return Err(Corruption::CountMismatch {
            header: header_occupied,
            trailer: occupied,
        }
        .into());
    }
    if occupied > u16::from(slot_count) {
        return Err(Corruption::TooManyOccupied {
            occupied,
            slots: slot_count,
        }
        .into());
    }

    let mut slots: Vec<Option<C::Item>> = (0..slot_count).map(|_| None).collect();

    for _ in 0..occupied {
        let slot = cursor.read_u8().map_err(truncated)?;
        let len = usize::from(cursor.read_u16::<BigEndian>().map_err(truncated)?);

        let start = cursor.position() as usize;
        let payload = body
            .get(start..start + len)
            .ok_or(Corruption::Truncated)?;
        cursor.set_position((start + len) as u64);

        let target = slots
            .get_mut(usize::from(slot))
            .ok_or(Corruption::SlotOutOfRange {
                slot,
                slots: slot_count,
            })?;
        if target.is_some() {
            return Err(Corruption::DuplicateSlot(slot).into());
        }

        let item = codec
            .decode(payload)
            .map_err(|e| Corruption::ItemDecode {
                slot,
                message: e.to_string(),
            })?;
        *target = Some(item);
    }

    let remaining = body.len() - cursor.position() as usize;
    if remaining != 0 {
        return Err(Corruption::TrailingBytes(remaining).into());
    }

    Ok(slots)
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    let mut field = [0u8; 2];
    BigEndian::write_u16(&mut field, value);
    out.extend_from_slice(&field);
}
