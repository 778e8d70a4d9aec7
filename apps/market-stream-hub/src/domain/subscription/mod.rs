//! Room Membership
//!
//! Tracks which client connections are interested in which symbols. Each
//! symbol is a "room"; a connection may sit in many rooms and a room may
//! hold many connections.
//!
//! # Design
//!
//! The table keeps both directions of the mapping:
//! - connection → symbols, for disconnect cleanup
//! - symbol → connections, for per-tick delivery
//!
//! A room's size doubles as its reference count, so joining an empty room
//! or emptying one is reported back as a [`SubscriptionChanges`] that the
//! caller can forward upstream.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

// =============================================================================
// Types
// =============================================================================

/// Unique identifier for a client connection.
pub type ConnectionId = u64;

/// A canonical symbol string.
pub type Symbol = String;

// =============================================================================
// Subscription Changes
// =============================================================================

/// Rooms that were opened or closed by a membership change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionChanges {
    /// Rooms that gained their first member.
    pub subscribe: HashSet<Symbol>,
    /// Rooms that lost their last member.
    pub unsubscribe: HashSet<Symbol>,
}

impl SubscriptionChanges {
    /// Check if there are any changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribe.is_empty() && self.unsubscribe.is_empty()
    }

    /// Create changes with only subscribes.
    #[must_use]
    pub fn subscribe_only(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            subscribe: symbols.into_iter().collect(),
            unsubscribe: HashSet::new(),
        }
    }

    /// Create changes with only unsubscribes.
    #[must_use]
    pub fn unsubscribe_only(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            subscribe: HashSet::new(),
            unsubscribe: symbols.into_iter().collect(),
        }
    }
}

// =============================================================================
// Room State
// =============================================================================

#[derive(Debug, Default)]
struct RoomState {
    connection_rooms: HashMap<ConnectionId, HashSet<Symbol>>,
    room_members: HashMap<Symbol, HashSet<ConnectionId>>,
}

impl RoomState {
    /// Returns `(newly_joined, room_opened)`.
    fn join(&mut self, conn: ConnectionId, symbol: &str) -> (bool, bool) {
        let rooms = self.connection_rooms.entry(conn).or_default();
        if !rooms.insert(symbol.to_string()) {
            return (false, false);
        }

        let members = self.room_members.entry(symbol.to_string()).or_default();
        members.insert(conn);
        (true, members.len() == 1)
    }

    /// Returns whether the room closed.
    fn leave(&mut self, conn: ConnectionId, symbol: &str) -> bool {
        let Some(rooms) = self.connection_rooms.get_mut(&conn) else {
            return false;
        };
        if !rooms.remove(symbol) {
            return false;
        }
        if rooms.is_empty() {
            self.connection_rooms.remove(&conn);
        }

        self.remove_member(conn, symbol)
    }

    fn disconnect(&mut self, conn: ConnectionId) -> Vec<Symbol> {
        let Some(rooms) = self.connection_rooms.remove(&conn) else {
            return vec![];
        };

        rooms
            .into_iter()
            .filter(|symbol| self.remove_member(conn, symbol))
            .collect()
    }

    fn remove_member(&mut self, conn: ConnectionId, symbol: &str) -> bool {
        let Some(members) = self.room_members.get_mut(symbol) else {
            return false;
        };
        members.remove(&conn);
        if members.is_empty() {
            self.room_members.remove(symbol);
            return true;
        }
        false
    }
}

// =============================================================================
// Room Table
// =============================================================================

/// Result of [`RoomTable::join`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinOutcome {
    /// False when the connection was already in the room.
    pub joined: bool,
    /// Upstream changes caused by the join.
    pub changes: SubscriptionChanges,
}

/// Thread-safe connection ↔ symbol membership table.
///
/// # Example
///
/// ```rust
/// use market_stream_hub::domain::subscription::RoomTable;
///
/// let rooms = RoomTable::new();
///
/// // First member opens the room
/// let outcome = rooms.join(1, "TCS.NS");
/// assert!(outcome.changes.subscribe.contains("TCS.NS"));
///
/// // Second member does not
/// let outcome = rooms.join(2, "TCS.NS");
/// assert!(outcome.changes.is_empty());
///
/// // Room closes once everyone has left
/// assert!(rooms.leave(1, "TCS.NS").is_empty());
/// assert!(rooms.leave(2, "TCS.NS").unsubscribe.contains("TCS.NS"));
/// ```
#[derive(Debug, Default)]
pub struct RoomTable {
    state: RwLock<RoomState>,
}

impl RoomTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `conn` to the room for `symbol`.
    pub fn join(&self, conn: ConnectionId, symbol: &str) -> JoinOutcome {
        let (joined, opened) = self.state.write().join(conn, symbol);
        let changes = if opened {
            SubscriptionChanges::subscribe_only([symbol.to_string()])
        } else {
            SubscriptionChanges::default()
        };
        JoinOutcome { joined, changes }
    }

    /// Remove `conn` from the room for `symbol`.
    pub fn leave(&self, conn: ConnectionId, symbol: &str) -> SubscriptionChanges {
        if self.state.write().leave(conn, symbol) {
            SubscriptionChanges::unsubscribe_only([symbol.to_string()])
        } else {
            SubscriptionChanges::default()
        }
    }

    /// Remove `conn` from every room.
    pub fn disconnect(&self, conn: ConnectionId) -> SubscriptionChanges {
        let closed = self.state.write().disconnect(conn);
        SubscriptionChanges::unsubscribe_only(closed)
    }

    /// Connections currently in the room for `symbol`.
    #[must_use]
    pub fn members(&self, symbol: &str) -> Vec<ConnectionId> {
        self.state
            .read()
            .room_members
            .get(symbol)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether `conn` is in the room for `symbol`.
    #[must_use]
    pub fn is_member(&self, conn: ConnectionId, symbol: &str) -> bool {
        self.state
            .read()
            .room_members
            .get(symbol)
            .is_some_and(|m| m.contains(&conn))
    }

    /// Rooms `conn` currently sits in.
    #[must_use]
    pub fn connection_symbols(&self, conn: ConnectionId) -> Vec<Symbol> {
        self.state
            .read()
            .connection_rooms
            .get(&conn)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All non-empty rooms.
    #[must_use]
    pub fn active_symbols(&self) -> Vec<Symbol> {
        self.state.read().room_members.keys().cloned().collect()
    }

    /// Current table size.
    #[must_use]
    pub fn stats(&self) -> RoomStats {
        let state = self.state.read();
        RoomStats {
            room_count: state.room_members.len(),
            connection_count: state.connection_rooms.len(),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Room table statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomStats {
    /// Number of non-empty rooms.
    pub room_count: usize,
    /// Number of connections in at least one room.
    pub connection_count: usize,
}

// =============================================================================
// Tests
// =============================================================================
