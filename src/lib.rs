//! Inventory snapshots: capture an actor's inventory, keep a durable history
//! of captures, and restore one later without losing the state it replaces.

pub mod cli;
pub mod codec;
pub mod config;
pub mod platform;
pub mod reason;
pub mod report;
pub mod restore;
pub mod snapshot;
pub mod store;

pub use codec::{decode_inventory, encode_inventory, CodecError, ItemCodec, RawItemCodec};
pub use reason::SnapshotReason;
pub use restore::{record, restore, ActorDirectory, InventoryHolder, RestoreError, RestoreReport};
pub use snapshot::{Snapshot, UNSAVED_ID};
pub use store::{Store, StoreError, HISTORY_LIMIT};
