//! JSON export of a stored snapshot.
//!
//! Item payloads are opaque here, so each occupied slot is exported as the
//! hex encoding of its raw bytes.

use serde::Serialize;

use crate::codec::{CodecError, RawItemCodec};
use crate::reason::SnapshotReason;
use crate::snapshot::Snapshot;

#[derive(Debug, Serialize)]
pub struct SnapshotExport {
    pub id: i64,
    pub owner_id: String,
    pub reason: SnapshotReason,
    pub label: &'static str,
    pub created_at: String,
    pub slot_count: usize,
    pub items: Vec<SlotExport>,
}

#[derive(Debug, Serialize)]
pub struct SlotExport {
    pub slot: usize,
    pub payload_hex: String,
}

impl SnapshotExport {
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, CodecError> {
        let slots = snapshot.item_stacks(&RawItemCodec)?;
        let slot_count = slots.len();
        let items = slots
            .into_iter()
            .enumerate()
            .filter_map(|(slot, payload)| {
                payload.map(|bytes| SlotExport {
                    slot,
                    payload_hex: to_hex(&bytes),
                })
            })
            .collect();

        Ok(SnapshotExport {
            id: snapshot.id(),
            owner_id: snapshot.owner_id().to_string(),
            reason: snapshot.reason(),
            label: snapshot.reason().label(),
            created_at: snapshot.created_at().to_rfc3339(),
            slot_count,
            items,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn render(snapshot: &Snapshot) -> Result<String, ExportError> {
    let export = SnapshotExport::from_snapshot(snapshot)?;
    Ok(serde_json::to_string_pretty(&export)?)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
