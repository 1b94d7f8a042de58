//! Room directory: volatile runtime projection of room membership.
//!
//! Rooms are born on first join and garbage-collected when their member set
//! empties; durable room records live in the external store. Mutation is
//! serialized per room (one async mutex per entry) so unrelated rooms
//! proceed concurrently; the outer map lock is only held to look up or
//! insert entries, never across a member-set mutation or a send.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::domain::{ConnectionId, MessagePusher, RoomId};

#[derive(Debug, Default)]
struct RoomEntry {
    members: BTreeSet<ConnectionId>,
    /// Cleared when the entry is garbage-collected. A join that raced the
    /// collection observes `false` and recreates the room (join wins).
    live: bool,
}

/// Summary of one room projection, for the observability surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomProjection {
    pub room_id: RoomId,
    pub member_count: usize,
}

/// Maps a room id to its set of member connections.
pub struct RoomDirectory {
    pusher: Arc<dyn MessagePusher>,
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<RoomEntry>>>>,
}

impl RoomDirectory {
    pub fn new(pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            pusher,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add `connection_id` to the room's member set, creating the room
    /// projection if absent. Idempotent.
    pub async fn join(&self, room_id: &RoomId, connection_id: ConnectionId) {
        loop {
            let entry = {
                let rooms = self.rooms.read().await;
                rooms.get(room_id).cloned()
            };
            let entry = match entry {
                Some(entry) => entry,
                None => {
                    let mut rooms = self.rooms.write().await;
                    rooms
                        .entry(room_id.clone())
                        .or_insert_with(|| {
                            Arc::new(Mutex::new(RoomEntry {
                                members: BTreeSet::new(),
                                live: true,
                            }))
                        })
                        .clone()
                }
            };

            let mut guard = entry.lock().await;
            if guard.live {
                guard.members.insert(connection_id);
                return;
            }
            // Entry was garbage-collected between lookup and lock; retry
            // against a fresh projection.
            drop(guard);
        }
    }

    /// Remove the membership; deletes the room projection once its member
    /// set empties. Idempotent.
    pub async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) {
        let entry = {
            let rooms = self.rooms.read().await;
            match rooms.get(room_id) {
                Some(entry) => entry.clone(),
                None => return,
            }
        };

        let now_empty = {
            let mut guard = entry.lock().await;
            guard.members.remove(connection_id);
            guard.members.is_empty()
        };
        if !now_empty {
            return;
        }

        // Re-check emptiness under the map write lock (map -> entry order,
        // same as join) so a concurrent join wins over the collection.
        let mut rooms = self.rooms.write().await;
        if let Some(current) = rooms.get(room_id) {
            if Arc::ptr_eq(current, &entry) {
                let mut guard = current.lock().await;
                if guard.members.is_empty() {
                    guard.live = false;
                    drop(guard);
                    rooms.remove(room_id);
                    tracing::debug!(room = %room_id, "room projection collected");
                }
            }
        }
    }

    /// Snapshot of the room's member set. Does not reflect changes made
    /// after the call returns.
    pub async fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let entry = {
            let rooms = self.rooms.read().await;
            match rooms.get(room_id) {
                Some(entry) => entry.clone(),
                None => return Vec::new(),
            }
        };
        let guard = entry.lock().await;
        guard.members.iter().copied().collect()
    }

    pub async fn is_member(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let entry = {
            let rooms = self.rooms.read().await;
            match rooms.get(room_id) {
                Some(entry) => entry.clone(),
                None => return false,
            }
        };
        let guard = entry.lock().await;
        guard.members.contains(connection_id)
    }

    /// Deliver `content` to every currently-joined connection in the room
    /// except the optionally excluded sender. Best-effort per connection: a
    /// failed delivery is logged and counted, never raised. Returns the
    /// number of successful deliveries.
    pub async fn broadcast(
        &self,
        room_id: &RoomId,
        content: &str,
        exclude: Option<&ConnectionId>,
    ) -> usize {
        let members = self.members_of(room_id).await;
        let mut delivered = 0;
        let mut failed = 0;
        for member in members {
            if Some(&member) == exclude {
                continue;
            }
            // The pusher's send is non-blocking (bounded queue, try_send),
            // so one stuck peer cannot delay the rest of the fan-out.
            match self.pusher.push_to(&member, content).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        room = %room_id,
                        connection = %member,
                        error = %e,
                        "broadcast delivery failed for one member"
                    );
                }
            }
        }
        if failed > 0 {
            tracing::debug!(room = %room_id, delivered, failed, "broadcast fan-out finished");
        }
        delivered
    }

    /// Snapshot of all live room projections.
    pub async fn snapshot(&self) -> Vec<RoomProjection> {
        let entries: Vec<(RoomId, Arc<Mutex<RoomEntry>>)> = {
            let rooms = self.rooms.read().await;
            rooms
                .iter()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect()
        };
        let mut projections = Vec::with_capacity(entries.len());
        for (room_id, entry) in entries {
            let guard = entry.lock().await;
            if guard.live {
                projections.push(RoomProjection {
                    room_id,
                    member_count: guard.members.len(),
                });
            }
        }
        projections.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        projections
    }

    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}
