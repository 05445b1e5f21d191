//! Capture and restore against live actors.
//!
//! Restoring runs four steps and stops at the first failure:
//! 1. look up the snapshot
//! 2. resolve its owner among the online actors
//! 3. save the owner's current inventory as a `Restoration` snapshot
//! 4. decode the snapshot and replace the owner's inventory wholesale
//!
//! Only step 4 touches the live inventory, so any earlier failure leaves it
//! exactly as it was. A failed safety capture aborts the restore.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::codec::{CodecError, ItemCodec};
use crate::reason::SnapshotReason;
use crate::snapshot::Snapshot;
use crate::store::{Store, StoreError};

pub const RESTORED_MESSAGE: &str = "Successfully restored the player's inventory to the snapshot.";
pub const OWNER_NOTICE: &str = "Your inventory has been restored to a previous state.";

/// A live actor whose inventory can be read and replaced.
pub trait InventoryHolder {
    type Item;

    fn owner_id(&self) -> Uuid;

    /// Current slots, empty slots as `None`.
    fn contents(&self) -> Vec<Option<Self::Item>>;

    /// Replace every slot with `slots`. No merging with the previous contents.
    fn set_contents(&mut self, slots: Vec<Option<Self::Item>>);

    /// Tell the actor something happened to them.
    fn notify(&mut self, message: &str);
}

/// Lookup of actors that are reachable right now.
pub trait ActorDirectory {
    type Holder: InventoryHolder;

    fn find_online(&mut self, owner_id: Uuid) -> Option<&mut Self::Holder>;
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Encode(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("Could not find the requested player snapshot.")]
    NotFound(i64),

    #[error("The player is not online, cannot restore snapshot.")]
    ActorUnavailable(Uuid),

    #[error("Could not save the player's current inventory, restore aborted: {0}")]
    SafetyCapture(#[source] CaptureError),

    #[error("The snapshot's inventory could not be read: {0}")]
    Decode(#[source] CodecError),

    #[error("Snapshot storage failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored_id: i64,
    pub owner_id: Uuid,
    /// Snapshot holding the inventory as it was right before the restore.
    pub safety_snapshot_id: i64,
}

impl fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(RESTORED_MESSAGE)
    }
}

/// Capture the holder's current inventory and persist it. Returns the new id.
pub fn record<C, H>(
    store: &Store,
    codec: &C,
    holder: &H,
    reason: SnapshotReason,
) -> Result<i64, CaptureError>
where
    C: ItemCodec,
    H: InventoryHolder<Item = C::Item>,
{
    let snapshot = Snapshot::capture(codec, holder.owner_id(), reason, &holder.contents())?;
    Ok(store.insert(&snapshot)?)
}

/// Restore snapshot `snapshot_id` onto its owner, saving their current state first.
pub fn restore<C, D>(
    store: &Store,
    codec: &C,
    directory: &mut D,
    snapshot_id: i64,
) -> Result<RestoreReport, RestoreError>
where
    C: ItemCodec,
    D: ActorDirectory,
    D::Holder: InventoryHolder<Item = C::Item>,
{
    let snapshot = store
        .find_by_id(snapshot_id)?
        .ok_or(RestoreError::NotFound(snapshot_id))?;

    let owner_id = snapshot.owner_id();
    let holder = directory
        .find_online(owner_id)
        .ok_or(RestoreError::ActorUnavailable(owner_id))?;

    let safety_snapshot_id = record(store, codec, &*holder, SnapshotReason::Restoration)
        .map_err(|e| {
            warn!(snapshot_id, owner = %owner_id, error = %e, "safety capture failed, restore aborted");
            RestoreError::SafetyCapture(e)
        })?;

    let slots = snapshot.item_stacks(codec).map_err(RestoreError::Decode)?;
    holder.set_contents(slots);
    holder.notify(OWNER_NOTICE);

    info!(snapshot_id, safety_snapshot_id, owner = %owner_id, "restored inventory");
    Ok(RestoreReport {
        restored_id: snapshot_id,
        owner_id,
        safety_snapshot_id,
    })
}
