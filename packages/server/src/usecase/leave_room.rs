//! UseCase: leave a room.
//!
//! Leaving a room the connection is not in is a no-op; the empty room is
//! collected by the directory. Presence transitions caused by the departure
//! are broadcast to the remaining members.

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomId};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::infrastructure::presence::PresenceTracker;
use crate::infrastructure::registry::ConnectionRegistry;
use crate::infrastructure::rooms::RoomDirectory;

use super::error::LeaveRoomError;

pub struct LeaveRoomUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomDirectory>,
    presence: Arc<PresenceTracker>,
}

impl LeaveRoomUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomDirectory>,
        presence: Arc<PresenceTracker>,
    ) -> Self {
        Self {
            registry,
            rooms,
            presence,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), LeaveRoomError> {
        let record = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or(LeaveRoomError::UnknownConnection)?;
        if !record.joined_rooms.contains(room_id) {
            return Ok(());
        }

        // Mirror of the join ordering: the per-connection view shrinks
        // before directory membership does.
        self.registry.note_left(connection_id, room_id).await;
        self.rooms.leave(room_id, connection_id).await;

        if let Some(user_id) = &record.user_id {
            let outcome = self.presence.mark_offline(room_id, user_id).await;
            if outcome.was_typing {
                let event = ServerEvent::PresenceTyping {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                    typing: false,
                };
                self.rooms.broadcast(room_id, &event.to_json(), None).await;
            }
            if outcome.was_online {
                let event = ServerEvent::PresenceOffline {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                };
                self.rooms.broadcast(room_id, &event.to_json(), None).await;
            }
        }

        tracing::info!(room = %room_id, connection = %connection_id, "left room");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessagePusher, UserId};
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;
    use helpdesk_shared::time::FixedClock;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixture {
        usecase: LeaveRoomUseCase,
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomDirectory>,
        presence: Arc<PresenceTracker>,
        pusher: Arc<WebSocketMessagePusher>,
    }

    fn create_fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(1_000_000));
        let registry = Arc::new(ConnectionRegistry::new(clock.clone()));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let rooms = Arc::new(RoomDirectory::new(pusher.clone()));
        let presence = Arc::new(PresenceTracker::new(clock, Duration::from_secs(4)));
        Fixture {
            usecase: LeaveRoomUseCase::new(registry.clone(), rooms.clone(), presence.clone()),
            registry,
            rooms,
            presence,
            pusher,
        }
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn join(f: &Fixture, user_id: &str) -> (ConnectionId, mpsc::Receiver<String>) {
        let conn = ConnectionId::generate();
        let (tx, rx) = mpsc::channel(8);
        f.registry
            .register(conn, Some(user(user_id)))
            .await
            .unwrap();
        f.pusher.register(conn, tx).await;
        f.rooms.join(&room("r1"), conn).await;
        f.registry.note_joined(&conn, room("r1")).await;
        f.presence.mark_online(&room("r1"), &user(user_id)).await;
        (conn, rx)
    }

    #[tokio::test]
    async fn test_leave_removes_membership_and_view() {
        // given:
        let f = create_fixture();
        let (conn, _rx) = join(&f, "alice").await;

        // when:
        let result = f.usecase.execute(&conn, &room("r1")).await;

        // then:
        assert_eq!(result, Ok(()));
        assert!(!f.rooms.is_member(&room("r1"), &conn).await);
        assert!(
            !f.registry
                .lookup(&conn)
                .await
                .unwrap()
                .joined_rooms
                .contains(&room("r1"))
        );
    }

    #[tokio::test]
    async fn test_leaving_a_room_not_joined_is_a_noop() {
        // given:
        let f = create_fixture();
        let (conn, _rx) = join(&f, "alice").await;

        // when:
        let result = f.usecase.execute(&conn, &room("other")).await;

        // then: still a member of the joined room
        assert_eq!(result, Ok(()));
        assert!(f.rooms.is_member(&room("r1"), &conn).await);
    }

    #[tokio::test]
    async fn test_unknown_connection_is_rejected() {
        // given:
        let f = create_fixture();
        let conn = ConnectionId::generate();

        // when:
        let result = f.usecase.execute(&conn, &room("r1")).await;

        // then:
        assert_eq!(result, Err(LeaveRoomError::UnknownConnection));
    }

    #[tokio::test]
    async fn test_remaining_member_sees_offline_broadcast() {
        // given: alice typing, bob watching
        let f = create_fixture();
        let (alice_conn, _rx_a) = join(&f, "alice").await;
        let (_bob_conn, mut rx_b) = join(&f, "bob").await;
        f.presence.set_typing(&room("r1"), &user("alice")).await;

        // when:
        f.usecase.execute(&alice_conn, &room("r1")).await.unwrap();

        // then: bob observes stopped-typing then offline
        let first = rx_b.recv().await.unwrap();
        assert!(first.contains(r#""type":"presence.typing""#));
        assert!(first.contains(r#""typing":false"#));
        let second = rx_b.recv().await.unwrap();
        assert!(second.contains(r#""type":"presence.offline""#));
    }

    #[tokio::test]
    async fn test_last_leave_collects_the_room() {
        // given:
        let f = create_fixture();
        let (conn, _rx) = join(&f, "alice").await;

        // when:
        f.usecase.execute(&conn, &room("r1")).await.unwrap();

        // then:
        assert_eq!(f.rooms.room_count().await, 0);
    }
}
