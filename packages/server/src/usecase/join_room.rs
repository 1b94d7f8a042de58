//! UseCase: join a room.
//!
//! Room access is authorized against the durable room record read from the
//! external store: only the room's customer or its assigned agent may join,
//! and only while the room is open. Guests (unauthenticated connections)
//! can never satisfy either role, so their joins are denied.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessageStore, RoomId, StorageError};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::infrastructure::presence::PresenceTracker;
use crate::infrastructure::registry::ConnectionRegistry;
use crate::infrastructure::rooms::RoomDirectory;

use super::error::JoinRoomError;

pub struct JoinRoomUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomDirectory>,
    presence: Arc<PresenceTracker>,
    store: Arc<dyn MessageStore>,
}

impl JoinRoomUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomDirectory>,
        presence: Arc<PresenceTracker>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            registry,
            rooms,
            presence,
            store,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), JoinRoomError> {
        let record = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or(JoinRoomError::UnknownConnection)?;
        let user_id = record.user_id.ok_or(JoinRoomError::Forbidden)?;

        let metadata = self
            .store
            .load_room_metadata(room_id)
            .await
            .map_err(|e| match e {
                StorageError::RoomNotFound(_) => JoinRoomError::RoomNotFound,
                StorageError::Unavailable(reason) => JoinRoomError::Storage(reason),
            })?;
        if !metadata.authorizes(&user_id) {
            tracing::warn!(room = %room_id, user = %user_id, "room join denied");
            return Err(JoinRoomError::Forbidden);
        }

        // Directory first, then the per-connection view: the registry's
        // joined-room set stays a subset of directory membership.
        self.rooms.join(room_id, *connection_id).await;
        self.registry.note_joined(connection_id, room_id.clone()).await;

        if self.presence.mark_online(room_id, &user_id).await {
            let event = ServerEvent::PresenceOnline {
                room_id: room_id.to_string(),
                user_id: user_id.to_string(),
            };
            self.rooms.broadcast(room_id, &event.to_json(), None).await;
        }

        tracing::info!(room = %room_id, user = %user_id, connection = %connection_id, "joined room");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessagePusher, RoomMetadata, RoomStatus, UserId};
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;
    use crate::infrastructure::store::InMemoryMessageStore;
    use helpdesk_shared::time::FixedClock;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixture {
        usecase: JoinRoomUseCase,
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomDirectory>,
        pusher: Arc<WebSocketMessagePusher>,
        store: Arc<InMemoryMessageStore>,
    }

    fn create_fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(1_000_000));
        let registry = Arc::new(ConnectionRegistry::new(clock.clone()));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let rooms = Arc::new(RoomDirectory::new(pusher.clone()));
        let presence = Arc::new(PresenceTracker::new(clock, Duration::from_secs(4)));
        let store = Arc::new(InMemoryMessageStore::new());
        Fixture {
            usecase: JoinRoomUseCase::new(
                registry.clone(),
                rooms.clone(),
                presence,
                store.clone(),
            ),
            registry,
            rooms,
            pusher,
            store,
        }
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn open_room() -> RoomMetadata {
        RoomMetadata {
            customer_id: user("alice"),
            assigned_agent_id: Some(user("bob")),
            status: RoomStatus::Open,
        }
    }

    async fn connect(f: &Fixture, user_id: Option<UserId>) -> ConnectionId {
        let conn = ConnectionId::generate();
        let (tx, rx) = mpsc::channel(8);
        std::mem::forget(rx);
        f.registry.register(conn, user_id).await.unwrap();
        f.pusher.register(conn, tx).await;
        conn
    }

    #[tokio::test]
    async fn test_customer_can_join_their_room() {
        // given:
        let f = create_fixture();
        f.store.seed_room(room("room-1"), open_room()).await;
        let conn = connect(&f, Some(user("alice"))).await;

        // when:
        let result = f.usecase.execute(&conn, &room("room-1")).await;

        // then:
        assert_eq!(result, Ok(()));
        assert!(f.rooms.is_member(&room("room-1"), &conn).await);
        assert!(
            f.registry
                .lookup(&conn)
                .await
                .unwrap()
                .joined_rooms
                .contains(&room("room-1"))
        );
    }

    #[tokio::test]
    async fn test_assigned_agent_can_join() {
        // given:
        let f = create_fixture();
        f.store.seed_room(room("room-1"), open_room()).await;
        let conn = connect(&f, Some(user("bob"))).await;

        // when:
        let result = f.usecase.execute(&conn, &room("room-1")).await;

        // then:
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_third_party_join_is_forbidden() {
        // given:
        let f = create_fixture();
        f.store.seed_room(room("room-1"), open_room()).await;
        let conn = connect(&f, Some(user("mallory"))).await;

        // when:
        let result = f.usecase.execute(&conn, &room("room-1")).await;

        // then:
        assert_eq!(result, Err(JoinRoomError::Forbidden));
        assert!(!f.rooms.is_member(&room("room-1"), &conn).await);
    }

    #[tokio::test]
    async fn test_guest_join_is_forbidden() {
        // given:
        let f = create_fixture();
        f.store.seed_room(room("room-1"), open_room()).await;
        let conn = connect(&f, None).await;

        // when:
        let result = f.usecase.execute(&conn, &room("room-1")).await;

        // then:
        assert_eq!(result, Err(JoinRoomError::Forbidden));
    }

    #[tokio::test]
    async fn test_join_unknown_room_fails() {
        // given:
        let f = create_fixture();
        let conn = connect(&f, Some(user("alice"))).await;

        // when:
        let result = f.usecase.execute(&conn, &room("missing")).await;

        // then:
        assert_eq!(result, Err(JoinRoomError::RoomNotFound));
    }

    #[tokio::test]
    async fn test_join_broadcasts_online_to_existing_members() {
        // given: bob is already in the room
        let f = create_fixture();
        f.store.seed_room(room("room-1"), open_room()).await;
        let bob_conn = ConnectionId::generate();
        let (tx_b, mut rx_b) = mpsc::channel(8);
        f.registry
            .register(bob_conn, Some(user("bob")))
            .await
            .unwrap();
        f.pusher.register(bob_conn, tx_b).await;
        f.usecase.execute(&bob_conn, &room("room-1")).await.unwrap();
        // drain bob's own online event
        let _ = rx_b.recv().await;

        // when: alice joins
        let alice_conn = connect(&f, Some(user("alice"))).await;
        f.usecase
            .execute(&alice_conn, &room("room-1"))
            .await
            .unwrap();

        // then: bob observes alice's presence.online
        let event = rx_b.recv().await.unwrap();
        assert!(event.contains(r#""type":"presence.online""#));
        assert!(event.contains(r#""userId":"alice""#));
    }

    #[tokio::test]
    async fn test_rejoining_does_not_rebroadcast_online() {
        // given: alice already joined
        let f = create_fixture();
        f.store.seed_room(room("room-1"), open_room()).await;
        let bob_conn = ConnectionId::generate();
        let (tx_b, mut rx_b) = mpsc::channel(8);
        f.registry
            .register(bob_conn, Some(user("bob")))
            .await
            .unwrap();
        f.pusher.register(bob_conn, tx_b).await;
        f.usecase.execute(&bob_conn, &room("room-1")).await.unwrap();
        let _ = rx_b.recv().await;
        let alice_conn = connect(&f, Some(user("alice"))).await;
        f.usecase
            .execute(&alice_conn, &room("room-1"))
            .await
            .unwrap();
        let _ = rx_b.recv().await;

        // when: alice joins again (idempotent)
        f.usecase
            .execute(&alice_conn, &room("room-1"))
            .await
            .unwrap();

        // then: no duplicate presence.online for bob
        assert!(rx_b.try_recv().is_err());
    }
}
