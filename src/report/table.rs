//! Text rendering for snapshot listings.
//!
//! - History: one line per snapshot, newest first, with age and reason
//! - Details: owner, capture time, occupied slots and, when the caller
//!   can restore, a hint naming its restore command
//!
//! An inventory that fails to decode is reported inline instead of
//! aborting the whole render.

use chrono::{DateTime, Utc};

use crate::codec::ItemCodec;
use crate::snapshot::Snapshot;

use super::{format_duration, format_timestamp};

pub const NO_SNAPSHOTS: &str = "This player doesn't have any snapshots.";

const RULE_WIDTH: usize = 53;

pub fn render_history(snapshots: &[Snapshot], now: DateTime<Utc>) -> String {
    if snapshots.is_empty() {
        return format!("{NO_SNAPSHOTS}\n");
    }

    let mut output = String::from("The following snapshots were found:\n");
    for snapshot in snapshots {
        output.push_str(&format!(
            "  #{:<6} [{}] ({}) {} ago\n",
            snapshot.id(),
            format_timestamp(snapshot.created_at()),
            snapshot.reason().label(),
            format_duration(snapshot.age_since(now)),
        ));
    }
    output
}

/// Full view of one snapshot. `describe` turns a decoded item into a short label.
///
/// `restore_command` is the command the reader can run to restore it, if any.
pub fn render_details<C, F>(
    snapshot: &Snapshot,
    codec: &C,
    owner_name: &str,
    restore_command: Option<&str>,
    describe: F,
) -> String
where
    C: ItemCodec,
    F: Fn(&C::Item) -> String,
{
    let mut output = String::new();
    output.push_str(&"+".repeat(RULE_WIDTH));
    output.push('\n');
    output.push_str(&format!("{:<15} {owner_name}\n", "Player:"));
    output.push_str(&format!(
        "{:<15} {}\n",
        "Snapshot time:",
        format_timestamp(snapshot.created_at())
    ));
    output.push_str(&format!("{:<15} {}\n", "Reason:", snapshot.reason().label()));

    match snapshot.item_stacks(codec) {
        Ok(slots) => {
            let occupied: Vec<_> = slots
                .iter()
                .enumerate()
                .filter_map(|(slot, item)| item.as_ref().map(|item| (slot, item)))
                .collect();

            output.push_str(&format!(
                "{:<15} {} of {} slots occupied\n",
                "Items:",
                occupied.len(),
                slots.len()
            ));
            for (slot, item) in occupied {
                output.push_str(&format!("  [{slot:>3}] {}\n", describe(item)));
            }
        }
        Err(e) => {
            output.push_str(&format!("{:<15} unreadable ({e})\n", "Items:"));
        }
    }

    if let Some(command) = restore_command {
        output.push_str(&format!(
            "Restore player snapshot? run: {command} {}\n",
            snapshot.id()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_inventory, RawItemCodec};
    use crate::reason::SnapshotReason;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 3, 7).unwrap()
    }

    fn snapshot(inventory: Vec<u8>) -> Snapshot {
        Snapshot::persisted(12, Uuid::nil(), SnapshotReason::PlayerDeath, inventory, at())
    }

    #[test]
    fn empty_history() {
        assert_eq!(render_history(&[], at()), format!("{NO_SNAPSHOTS}\n"));
    }

    #[test]
    fn history_line_shows_time_reason_and_age() {
        let inventory = encode_inventory(&RawItemCodec, &[]).unwrap();
        let output = render_history(&[snapshot(inventory)], at() + Duration::seconds(90));

        assert!(output.starts_with("The following snapshots were found:\n"));
        assert!(output.contains("#12"));
        assert!(output.contains("[2024-5-1 9:3:7] (Player died) 1 minute 30 seconds ago"));
    }

    #[test]
    fn details_list_occupied_slots() {
        let slots = vec![Some(b"abc".to_vec()), None, Some(b"z".to_vec())];
        let inventory = encode_inventory(&RawItemCodec, &slots).unwrap();

        let output = render_details(
            &snapshot(inventory),
            &RawItemCodec,
            "Steve",
            Some("/invsnap restore"),
            |item| format!("{} bytes", item.len()),
        );

        assert!(output.contains("Player:         Steve"));
        assert!(output.contains("2 of 3 slots occupied"));
        assert!(output.contains("[  0] 3 bytes"));
        assert!(output.contains("[  2] 1 bytes"));
        assert!(output.contains("Restore player snapshot? run: /invsnap restore 12"));
    }

    #[test]
    fn details_without_restore_command_have_no_hint() {
        let inventory = encode_inventory(&RawItemCodec, &[Some(b"abc".to_vec())]).unwrap();
        let output = render_details(&snapshot(inventory), &RawItemCodec, "Steve", None, |item| {
            format!("{} bytes", item.len())
        });

        assert!(output.contains("1 of 1 slots occupied"));
        assert!(!output.contains("Restore player snapshot?"));
        assert!(!output.contains("restore 12"));
    }

    #[test]
    fn details_survive_corrupt_inventory() {
        let output = render_details(&snapshot(vec![1, 2]), &RawItemCodec, "Alex", None, |_| String::new());
        assert!(output.contains("unreadable"));
        assert!(output.contains("Snapshot time:  2024-5-1 9:3:7"));
    }
}
