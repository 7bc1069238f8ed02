use std::collections::HashMap;

use super::types::{ConnId, RoomName};

/// Hard cap on members per room. This relay only ever brokers a single
/// two-party negotiation per room.
pub const ROOM_CAPACITY: usize = 2;

/// Result of a join attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Member admitted (or already present); `count` is the room size after
    /// the join.
    Admitted { count: usize },
    /// Room already holds two other members.
    Full,
}

/// In-memory room membership table, the single source of truth while the
/// process runs. Rooms are created implicitly on first join and pruned as
/// soon as they empty, so no entry ever has zero members.
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<RoomName, Vec<ConnId>>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Add `conn` to `room`, creating the room if needed. Idempotent for a
    /// connection already in the room. Rejects a third distinct member.
    pub fn join(&mut self, room: &RoomName, conn: ConnId) -> JoinOutcome {
        let members = self.rooms.entry(room.clone()).or_default();
        if members.contains(&conn) {
            return JoinOutcome::Admitted {
                count: members.len(),
            };
        }
        if members.len() >= ROOM_CAPACITY {
            return JoinOutcome::Full;
        }
        members.push(conn);
        JoinOutcome::Admitted {
            count: members.len(),
        }
    }

    /// Remove `conn` from `room` if present, pruning the room when it
    /// empties. Returns whether the connection was actually a member.
    pub fn leave(&mut self, room: &RoomName, conn: ConnId) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let Some(pos) = members.iter().position(|m| *m == conn) else {
            return false;
        };
        members.remove(pos);
        if members.is_empty() {
            self.rooms.remove(room);
        }
        true
    }

    pub fn member_count(&self, room: &RoomName) -> usize {
        self.rooms.get(room).map_or(0, Vec::len)
    }

    /// Current members in join order (empty if the room does not exist).
    pub fn members(&self, room: &RoomName) -> Vec<ConnId> {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    /// Disconnect cleanup: removes `conn` from every room it appears in,
    /// pruning rooms that end up empty. Scans the whole table because a
    /// connection is not structurally limited to one room. Returns the
    /// affected room names.
    pub fn remove_from_all(&mut self, conn: ConnId) -> Vec<RoomName> {
        let mut affected = Vec::new();
        self.rooms.retain(|room, members| {
            if let Some(pos) = members.iter().position(|m| *m == conn) {
                members.remove(pos);
                affected.push(room.clone());
            }
            !members.is_empty()
        });
        affected
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(s: &str) -> ConnId {
        ConnId::from(s)
    }

    #[test]
    fn first_join_creates_room_with_count_one() {
        let mut table = RoomTable::new();
        let room = RoomName::from("r1");
        assert_eq!(table.join(&room, conn("conn_a")), JoinOutcome::Admitted {
            count: 1
        });
        assert_eq!(table.member_count(&room), 1);
        assert_eq!(table.room_count(), 1);
    }

    #[test]
    fn second_join_reports_count_two() {
        let mut table = RoomTable::new();
        let room = RoomName::from("r1");
        table.join(&room, conn("conn_a"));
        assert_eq!(table.join(&room, conn("conn_b")), JoinOutcome::Admitted {
            count: 2
        });
    }

    #[test]
    fn rejoin_is_idempotent() {
        let mut table = RoomTable::new();
        let room = RoomName::from("r1");
        table.join(&room, conn("conn_a"));
        assert_eq!(table.join(&room, conn("conn_a")), JoinOutcome::Admitted {
            count: 1
        });
        assert_eq!(table.member_count(&room), 1);
    }

    #[test]
    fn third_member_rejected_without_mutation() {
        let mut table = RoomTable::new();
        let room = RoomName::from("r1");
        table.join(&room, conn("conn_a"));
        table.join(&room, conn("conn_b"));
        assert_eq!(table.join(&room, conn("conn_c")), JoinOutcome::Full);
        assert_eq!(table.member_count(&room), 2);
        assert_eq!(table.members(&room), vec![conn("conn_a"), conn("conn_b")]);
    }

    #[test]
    fn existing_member_not_rejected_when_room_full() {
        let mut table = RoomTable::new();
        let room = RoomName::from("r1");
        table.join(&room, conn("conn_a"));
        table.join(&room, conn("conn_b"));
        assert_eq!(table.join(&room, conn("conn_b")), JoinOutcome::Admitted {
            count: 2
        });
    }

    #[test]
    fn leave_removes_member() {
        let mut table = RoomTable::new();
        let room = RoomName::from("r1");
        table.join(&room, conn("conn_a"));
        table.join(&room, conn("conn_b"));
        assert!(table.leave(&room, conn("conn_a")));
        assert_eq!(table.members(&room), vec![conn("conn_b")]);
    }

    #[test]
    fn leave_prunes_empty_room() {
        let mut table = RoomTable::new();
        let room = RoomName::from("r1");
        table.join(&room, conn("conn_a"));
        assert!(table.leave(&room, conn("conn_a")));
        assert_eq!(table.room_count(), 0);
        assert_eq!(table.member_count(&room), 0);
    }

    #[test]
    fn leave_non_member_is_noop() {
        let mut table = RoomTable::new();
        let room = RoomName::from("r1");
        table.join(&room, conn("conn_a"));
        assert!(!table.leave(&room, conn("conn_b")));
        assert_eq!(table.member_count(&room), 1);
    }

    #[test]
    fn leave_unknown_room_is_noop() {
        let mut table = RoomTable::new();
        assert!(!table.leave(&RoomName::from("nope"), conn("conn_a")));
    }

    #[test]
    fn member_count_zero_for_absent_room() {
        let table = RoomTable::new();
        assert_eq!(table.member_count(&RoomName::from("absent")), 0);
    }

    #[test]
    fn remove_from_all_covers_every_room() {
        let mut table = RoomTable::new();
        let r1 = RoomName::from("r1");
        let r2 = RoomName::from("r2");
        table.join(&r1, conn("conn_a"));
        table.join(&r1, conn("conn_b"));
        table.join(&r2, conn("conn_a"));

        let mut affected = table.remove_from_all(conn("conn_a"));
        affected.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(affected, vec![r1.clone(), r2.clone()]);

        // r1 keeps its remaining member, r2 is pruned
        assert_eq!(table.members(&r1), vec![conn("conn_b")]);
        assert_eq!(table.member_count(&r2), 0);
        assert_eq!(table.room_count(), 1);
    }

    #[test]
    fn remove_from_all_untouched_rooms_not_reported() {
        let mut table = RoomTable::new();
        let r1 = RoomName::from("r1");
        table.join(&r1, conn("conn_a"));
        assert!(table.remove_from_all(conn("conn_x")).is_empty());
        assert_eq!(table.member_count(&r1), 1);
    }

    #[test]
    fn member_cap_holds_under_many_joins() {
        let mut table = RoomTable::new();
        let room = RoomName::from("busy");
        let mut admitted = 0;
        for i in 0..50 {
            let id = ConnId::from(format!("conn_{:08x}", i).as_str());
            if let JoinOutcome::Admitted { .. } = table.join(&room, id) {
                admitted += 1;
            }
            assert!(table.member_count(&room) <= ROOM_CAPACITY);
        }
        assert_eq!(admitted, 2);
    }
}
