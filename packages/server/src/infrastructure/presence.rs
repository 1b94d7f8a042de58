//! Presence & typing tracker: ephemeral per-(room, user) state.
//!
//! Each (room, user) pair carries two independent tracks: an online flag and
//! a typing flag with an expiry deadline. Typing deadlines sit in a min-heap
//! consumed by the periodic sweep; a refresh pushes a later deadline and the
//! earlier heap item is discarded lazily when popped. Entries are never
//! persisted and die on expiry or on the owning connection's disconnect.
//!
//! The tracker is pure state: methods report the transition that happened
//! (came online, started typing, ...) and the use-case layer broadcasts the
//! corresponding events, so broadcast volume is bounded to transitions.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use helpdesk_shared::time::Clock;

use crate::domain::{RoomId, UserId};

#[derive(Debug, Default)]
struct PresenceEntry {
    online: bool,
    /// Deadline (millis) until which the user counts as typing.
    typing_until: Option<i64>,
    last_seen: i64,
}

impl PresenceEntry {
    fn is_absent(&self) -> bool {
        !self.online && self.typing_until.is_none()
    }
}

/// Outcome of `mark_offline`: which transitions the caller must broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflineOutcome {
    pub was_online: bool,
    pub was_typing: bool,
}

struct Inner {
    entries: HashMap<(RoomId, UserId), PresenceEntry>,
    deadlines: BinaryHeap<Reverse<(i64, RoomId, UserId)>>,
}

pub struct PresenceTracker {
    clock: Arc<dyn Clock>,
    typing_deadline: Duration,
    inner: Mutex<Inner>,
}

impl PresenceTracker {
    pub fn new(clock: Arc<dyn Clock>, typing_deadline: Duration) -> Self {
        Self {
            clock,
            typing_deadline,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                deadlines: BinaryHeap::new(),
            }),
        }
    }

    /// Record or refresh a typing entry. Returns `true` only on the
    /// absent→typing transition, so rapid keystroke-driven refreshes do not
    /// cause repeated broadcasts.
    pub async fn set_typing(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        let now = self.clock.now_millis();
        let deadline = now + self.typing_deadline.as_millis() as i64;
        let mut inner = self.inner.lock().await;
        let entry = inner
            .entries
            .entry((room_id.clone(), user_id.clone()))
            .or_default();
        let started = entry.typing_until.is_none();
        entry.typing_until = Some(deadline);
        entry.last_seen = now;
        inner
            .deadlines
            .push(Reverse((deadline, room_id.clone(), user_id.clone())));
        started
    }

    /// Explicit clear (e.g. on message send). Returns `true` if the user was
    /// marked typing, in which case the caller broadcasts "stopped typing".
    pub async fn clear_typing(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        let mut inner = self.inner.lock().await;
        let key = (room_id.clone(), user_id.clone());
        let Some(entry) = inner.entries.get_mut(&key) else {
            return false;
        };
        let was_typing = entry.typing_until.take().is_some();
        if entry.is_absent() {
            inner.entries.remove(&key);
        }
        was_typing
    }

    /// Remove typing entries past their deadline. Returns the (room, user)
    /// pairs whose "stopped typing" must be broadcast. Deadlines superseded
    /// by a refresh or an explicit clear are skipped.
    pub async fn expire_stale(&self) -> Vec<(RoomId, UserId)> {
        let now = self.clock.now_millis();
        let mut expired = Vec::new();
        let mut inner = self.inner.lock().await;
        while let Some(Reverse((deadline, _, _))) = inner.deadlines.peek() {
            if *deadline > now {
                break;
            }
            let Some(Reverse((deadline, room_id, user_id))) = inner.deadlines.pop() else {
                break;
            };
            let key = (room_id, user_id);
            let remove = match inner.entries.get_mut(&key) {
                // Skip deadlines superseded by a refresh or explicit clear.
                Some(entry) if entry.typing_until == Some(deadline) => {
                    entry.typing_until = None;
                    entry.is_absent()
                }
                _ => continue,
            };
            if remove {
                inner.entries.remove(&key);
            }
            expired.push(key);
        }
        expired
    }

    /// Mark the user online in the room. Returns `true` on the first
    /// transition to online.
    pub async fn mark_online(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock().await;
        let entry = inner
            .entries
            .entry((room_id.clone(), user_id.clone()))
            .or_default();
        let came_online = !entry.online;
        entry.online = true;
        entry.last_seen = now;
        came_online
    }

    /// Drop the user's presence in the room entirely. Triggered by leave and
    /// by the disconnect cascade.
    pub async fn mark_offline(&self, room_id: &RoomId, user_id: &UserId) -> OfflineOutcome {
        let mut inner = self.inner.lock().await;
        let key = (room_id.clone(), user_id.clone());
        match inner.entries.remove(&key) {
            Some(entry) => OfflineOutcome {
                was_online: entry.online,
                was_typing: entry.typing_until.is_some(),
            },
            None => OfflineOutcome {
                was_online: false,
                was_typing: false,
            },
        }
    }

    pub async fn is_typing(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        let inner = self.inner.lock().await;
        inner
            .entries
            .get(&(room_id.clone(), user_id.clone()))
            .is_some_and(|entry| entry.typing_until.is_some())
    }

    pub async fn is_online(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        let inner = self.inner.lock().await;
        inner
            .entries
            .get(&(room_id.clone(), user_id.clone()))
            .is_some_and(|entry| entry.online)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_shared::time::FixedClock;

    const DEADLINE: Duration = Duration::from_secs(4);

    fn create_test_tracker() -> (PresenceTracker, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(1_000_000));
        (PresenceTracker::new(clock.clone(), DEADLINE), clock)
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_set_typing_reports_transition_only_once() {
        // given:
        let (tracker, _clock) = create_test_tracker();

        // when: rapid keystroke-driven refreshes
        let first = tracker.set_typing(&room("r"), &user("alice")).await;
        let second = tracker.set_typing(&room("r"), &user("alice")).await;
        let third = tracker.set_typing(&room("r"), &user("alice")).await;

        // then: only the first call is a transition
        assert!(first);
        assert!(!second);
        assert!(!third);
        assert!(tracker.is_typing(&room("r"), &user("alice")).await);
    }

    #[tokio::test]
    async fn test_clear_typing_reports_prior_state() {
        // given:
        let (tracker, _clock) = create_test_tracker();
        tracker.set_typing(&room("r"), &user("alice")).await;

        // when:
        let was_typing = tracker.clear_typing(&room("r"), &user("alice")).await;
        let again = tracker.clear_typing(&room("r"), &user("alice")).await;

        // then:
        assert!(was_typing);
        assert!(!again);
        assert!(!tracker.is_typing(&room("r"), &user("alice")).await);
    }

    #[tokio::test]
    async fn test_typing_does_not_expire_before_deadline() {
        // given:
        let (tracker, clock) = create_test_tracker();
        tracker.set_typing(&room("r"), &user("alice")).await;

        // when: just before the deadline
        clock.advance(DEADLINE.as_millis() as i64 - 1);
        let expired = tracker.expire_stale().await;

        // then:
        assert!(expired.is_empty());
        assert!(tracker.is_typing(&room("r"), &user("alice")).await);
    }

    #[tokio::test]
    async fn test_typing_expires_at_deadline() {
        // given:
        let (tracker, clock) = create_test_tracker();
        tracker.set_typing(&room("r"), &user("alice")).await;

        // when:
        clock.advance(DEADLINE.as_millis() as i64);
        let expired = tracker.expire_stale().await;

        // then:
        assert_eq!(expired, vec![(room("r"), user("alice"))]);
        assert!(!tracker.is_typing(&room("r"), &user("alice")).await);
    }

    #[tokio::test]
    async fn test_refresh_extends_the_deadline() {
        // given:
        let (tracker, clock) = create_test_tracker();
        tracker.set_typing(&room("r"), &user("alice")).await;

        // when: a refresh 2s in, then a sweep at the original deadline
        clock.advance(2_000);
        tracker.set_typing(&room("r"), &user("alice")).await;
        clock.advance(2_000);
        let expired = tracker.expire_stale().await;

        // then: the stale heap item is skipped, the entry survives
        assert!(expired.is_empty());
        assert!(tracker.is_typing(&room("r"), &user("alice")).await);

        // when: past the refreshed deadline
        clock.advance(2_000);
        let expired = tracker.expire_stale().await;

        // then:
        assert_eq!(expired.len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_clear_suppresses_later_expiry() {
        // given:
        let (tracker, clock) = create_test_tracker();
        tracker.set_typing(&room("r"), &user("alice")).await;
        tracker.clear_typing(&room("r"), &user("alice")).await;

        // when:
        clock.advance(DEADLINE.as_millis() as i64 + 1_000);
        let expired = tracker.expire_stale().await;

        // then: no double "stopped typing"
        assert!(expired.is_empty());
    }

    #[tokio::test]
    async fn test_online_and_typing_tracks_are_independent() {
        // given:
        let (tracker, clock) = create_test_tracker();
        tracker.mark_online(&room("r"), &user("alice")).await;
        tracker.set_typing(&room("r"), &user("alice")).await;

        // when: typing expires
        clock.advance(DEADLINE.as_millis() as i64);
        tracker.expire_stale().await;

        // then: still online, no longer typing
        assert!(tracker.is_online(&room("r"), &user("alice")).await);
        assert!(!tracker.is_typing(&room("r"), &user("alice")).await);
    }

    #[tokio::test]
    async fn test_mark_online_reports_first_transition_only() {
        // given:
        let (tracker, _clock) = create_test_tracker();

        // when:
        let first = tracker.mark_online(&room("r"), &user("alice")).await;
        let second = tracker.mark_online(&room("r"), &user("alice")).await;

        // then:
        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn test_mark_offline_drops_both_tracks() {
        // given:
        let (tracker, _clock) = create_test_tracker();
        tracker.mark_online(&room("r"), &user("alice")).await;
        tracker.set_typing(&room("r"), &user("alice")).await;

        // when:
        let outcome = tracker.mark_offline(&room("r"), &user("alice")).await;

        // then:
        assert_eq!(
            outcome,
            OfflineOutcome {
                was_online: true,
                was_typing: true
            }
        );
        assert!(!tracker.is_online(&room("r"), &user("alice")).await);
        assert!(!tracker.is_typing(&room("r"), &user("alice")).await);
    }

    #[tokio::test]
    async fn test_mark_offline_for_absent_user_is_a_no_op() {
        // given:
        let (tracker, _clock) = create_test_tracker();

        // when:
        let outcome = tracker.mark_offline(&room("r"), &user("ghost")).await;

        // then:
        assert_eq!(
            outcome,
            OfflineOutcome {
                was_online: false,
                was_typing: false
            }
        );
    }

    #[tokio::test]
    async fn test_presence_is_scoped_per_room() {
        // given:
        let (tracker, _clock) = create_test_tracker();
        tracker.set_typing(&room("r1"), &user("alice")).await;

        // then:
        assert!(tracker.is_typing(&room("r1"), &user("alice")).await);
        assert!(!tracker.is_typing(&room("r2"), &user("alice")).await);
    }
}
