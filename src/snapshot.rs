//! Snapshot entity.
//!
//! A snapshot is an immutable capture of one owner's inventory:
//! - owner identity and the reason it was taken
//! - the encoded inventory blob, decoded only on demand
//! - creation time with second granularity
//!
//! Snapshots start unsaved (`id == UNSAVED_ID`) and receive their id from
//! the store on insert.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use crate::codec::{self, CodecError, ItemCodec};
use crate::reason::SnapshotReason;

/// Id carried by a snapshot that has not been persisted yet.
pub const UNSAVED_ID: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    id: i64,
    owner_id: Uuid,
    reason: SnapshotReason,
    inventory: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build an unsaved snapshot from an already encoded inventory.
    ///
    /// `created_at` is truncated to whole seconds.
    pub fn new(
        owner_id: Uuid,
        reason: SnapshotReason,
        inventory: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Snapshot {
            id: UNSAVED_ID,
            owner_id,
            reason,
            inventory,
            created_at: created_at.trunc_subsecs(0),
        }
    }

    /// Encode the given slots and stamp the snapshot with the current time.
    pub fn capture<C: ItemCodec>(
        codec: &C,
        owner_id: Uuid,
        reason: SnapshotReason,
        slots: &[Option<C::Item>],
    ) -> Result<Self, CodecError> {
        let inventory = codec::encode_inventory(codec, slots)?;
        Ok(Snapshot::new(owner_id, reason, inventory, Utc::now()))
    }

    pub(crate) fn persisted(
        id: i64,
        owner_id: Uuid,
        reason: SnapshotReason,
        inventory: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Snapshot {
            id,
            owner_id,
            reason,
            inventory,
            created_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn reason(&self) -> SnapshotReason {
        self.reason
    }

    /// Raw encoded inventory as stored.
    pub fn inventory(&self) -> &[u8] {
        &self.inventory
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Decode the stored inventory back into slots.
    pub fn item_stacks<C: ItemCodec>(&self, codec: &C) -> Result<Vec<Option<C::Item>>, CodecError> {
        codec::decode_inventory(codec, &self.inventory)
    }

    /// Time elapsed between capture and `now`, never negative.
    pub fn age_since(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).max(Duration::zero())
    }

    /// Time elapsed since capture.
    pub fn time_since(&self) -> Duration {
        self.age_since(Utc::now())
    }
}
