use std::collections::HashMap;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use invsnap::codec::ItemCodec;
use invsnap::{
    record, restore, ActorDirectory, InventoryHolder, RestoreError, Snapshot, SnapshotReason,
    Store, HISTORY_LIMIT,
};
use tempfile::TempDir;
use uuid::Uuid;

/// Stand-in for a game item: a material name and a stack size.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Stack {
    material: String,
    amount: u8,
}

fn stack(material: &str, amount: u8) -> Stack {
    Stack {
        material: material.to_string(),
        amount,
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed stack")]
struct MalformedStack;

struct StackCodec;

impl ItemCodec for StackCodec {
    type Item = Stack;
    type Error = MalformedStack;

    fn encode(&self, item: &Stack) -> Result<Vec<u8>, MalformedStack> {
        let mut bytes = vec![item.amount];
        bytes.extend_from_slice(item.material.as_bytes());
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Stack, MalformedStack> {
        let (&amount, material) = bytes.split_first().ok_or(MalformedStack)?;
        let material = String::from_utf8(material.to_vec()).map_err(|_| MalformedStack)?;
        Ok(Stack { material, amount })
    }
}

struct Player {
    id: Uuid,
    inventory: Vec<Option<Stack>>,
    messages: Vec<String>,
}

impl InventoryHolder for Player {
    type Item = Stack;

    fn owner_id(&self) -> Uuid {
        self.id
    }

    fn contents(&self) -> Vec<Option<Stack>> {
        self.inventory.clone()
    }

    fn set_contents(&mut self, slots: Vec<Option<Stack>>) {
        self.inventory = slots;
    }

    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

#[derive(Default)]
struct Server {
    online: HashMap<Uuid, Player>,
}

impl Server {
    fn join(&mut self, inventory: Vec<Option<Stack>>) -> Uuid {
        let id = Uuid::new_v4();
        self.online.insert(
            id,
            Player {
                id,
                inventory,
                messages: Vec::new(),
            },
        );
        id
    }
}

impl ActorDirectory for Server {
    type Holder = Player;

    fn find_online(&mut self, owner_id: Uuid) -> Option<&mut Player> {
        self.online.get_mut(&owner_id)
    }
}

fn survival_inventory() -> Vec<Option<Stack>> {
    let mut slots = vec![None; 41];
    slots[0] = Some(stack("diamond_sword", 1));
    slots[5] = Some(stack("bread", 12));
    slots[40] = Some(stack("shield", 1));
    slots
}

#[test]
fn captured_slots_survive_the_store() {
    let dir = TempDir::new().unwrap();
    let store = Store::initialize(dir.path()).unwrap();
    let mut server = Server::default();
    let id = server.join(survival_inventory());

    let snapshot_id = record(&store, &StackCodec, &server.online[&id], SnapshotReason::PlayerDeath).unwrap();
    let loaded = store.find_by_id(snapshot_id).unwrap().unwrap();
    let slots = loaded.item_stacks(&StackCodec).unwrap();

    assert_eq!(loaded.reason(), SnapshotReason::PlayerDeath);
    assert_eq!(slots.len(), 41);
    assert_eq!(slots, survival_inventory());
    let occupied: Vec<_> = slots
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_some())
        .map(|(slot, _)| slot)
        .collect();
    assert_eq!(occupied, vec![0, 5, 40]);
}

#[test]
fn history_returns_five_most_recent() {
    let dir = TempDir::new().unwrap();
    let store = Store::initialize(dir.path()).unwrap();
    let owner = Uuid::new_v4();
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();

    let mut ids = Vec::new();
    for minutes in 0..6 {
        let snapshot = Snapshot::new(
            owner,
            SnapshotReason::PlayerDeath,
            vec![1, 0, 0, 0, 0],
            base + Duration::minutes(minutes),
        );
        ids.push(store.insert(&snapshot).unwrap());
    }

    let history = store.find_recent_by_owner(owner).unwrap();

    assert_eq!(history.len(), HISTORY_LIMIT);
    let returned: Vec<_> = history.iter().map(Snapshot::id).collect();
    let expected: Vec<_> = ids.iter().rev().take(5).copied().collect();
    assert_eq!(returned, expected);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].created_at() > pair[1].created_at()));
}

#[test]
fn restore_with_unknown_id_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = Store::initialize(dir.path()).unwrap();
    let mut server = Server::default();
    let id = server.join(survival_inventory());

    let err = restore(&store, &StackCodec, &mut server, 9_999).unwrap_err();

    assert!(matches!(err, RestoreError::NotFound(9_999)));
    assert_eq!(server.online[&id].inventory, survival_inventory());
    assert!(store.find_recent_by_owner(id).unwrap().is_empty());
}

#[test]
fn restore_for_offline_owner_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = Store::initialize(dir.path()).unwrap();
    let mut server = Server::default();
    let id = server.join(survival_inventory());

    let snapshot_id = record(&store, &StackCodec, &server.online[&id], SnapshotReason::PlayerDeath).unwrap();
    let player = server.online.remove(&id).unwrap();

    let err = restore(&store, &StackCodec, &mut server, snapshot_id).unwrap_err();

    assert!(matches!(err, RestoreError::ActorUnavailable(owner) if owner == id));
    assert_eq!(player.inventory, survival_inventory());
    assert_eq!(store.find_recent_by_owner(id).unwrap().len(), 1);
}

#[test]
fn restore_after_death_brings_items_back() {
    let dir = TempDir::new().unwrap();
    let store = Store::initialize(dir.path()).unwrap();
    let mut server = Server::default();
    let id = server.join(survival_inventory());

    let death = record(&store, &StackCodec, &server.online[&id], SnapshotReason::PlayerDeath).unwrap();

    // respawned with a near-empty inventory
    let mut respawned = vec![None; 41];
    respawned[3] = Some(stack("dirt", 4));
    server.online.get_mut(&id).unwrap().inventory = respawned.clone();

    let report = restore(&store, &StackCodec, &mut server, death).unwrap();

    let player = &server.online[&id];
    assert_eq!(player.inventory, survival_inventory());
    assert_eq!(player.messages.len(), 1);
    assert_eq!(report.restored_id, death);
    assert_eq!(report.owner_id, id);
    assert_eq!(
        report.to_string(),
        "Successfully restored the player's inventory to the snapshot."
    );

    let safety = store.find_by_id(report.safety_snapshot_id).unwrap().unwrap();
    assert_eq!(safety.reason(), SnapshotReason::Restoration);
    assert_eq!(safety.item_stacks(&StackCodec).unwrap(), respawned);

    let history = store.find_recent_by_owner(id).unwrap();
    assert_eq!(history.len(), 2);
}

#[test]
fn concurrent_inserts_for_one_owner_all_land() {
    let dir = TempDir::new().unwrap();
    let store = Store::initialize(dir.path()).unwrap();
    let owner = Uuid::new_v4();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                let snapshot = Snapshot::capture(
                    &StackCodec,
                    owner,
                    SnapshotReason::PlayerDeath,
                    &[Some(stack("apple", 3))],
                )
                .unwrap();
                store.insert(&snapshot).unwrap()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert_eq!(store.find_recent_by_owner(owner).unwrap().len(), 4);
}
