//! Room-based support chat gateway.
//!
//! Relays messages between customers and support agents connected over
//! WebSocket, with presence and typing indicators per room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin helpdesk-gateway
//! cargo run --bin helpdesk-gateway -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use helpdesk_gateway::{
    domain::{RoomId, RoomMetadata, RoomStatus, UserId},
    infrastructure::{
        auth::StaticTokenVerifier, message_pusher::WebSocketMessagePusher,
        notify::LogNotificationDispatcher, presence::PresenceTracker, registry::ConnectionRegistry,
        rooms::RoomDirectory, store::InMemoryMessageStore,
    },
    ui::{GatewayConfig, GatewayServer, state::AppState},
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        SendMessageUseCase, TypingUseCase,
    },
};
use helpdesk_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "helpdesk-gateway")]
#[command(about = "Realtime support chat gateway", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Typing indicator auto-expiry in milliseconds
    #[arg(long, default_value = "4000")]
    typing_deadline_ms: u64,

    /// Typing sweep period in milliseconds
    #[arg(long, default_value = "1000")]
    sweep_period_ms: u64,

    /// Inactivity window in seconds after which a connection is reaped
    #[arg(long, default_value = "45")]
    liveness_window_secs: u64,

    /// Reaper scan period in seconds
    #[arg(long, default_value = "10")]
    reap_period_secs: u64,

    /// Capacity of each connection's outbound event queue (at least 1)
    #[arg(long, default_value = "256", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    outbound_queue_capacity: usize,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Wiring order: clock, collaborator stand-ins, runtime components,
    // use cases, state, server.
    let clock = Arc::new(SystemClock);

    // In-memory stand-ins for the external store and token verifier,
    // seeded with a demo room and credentials.
    let store = Arc::new(InMemoryMessageStore::new());
    let room_id = RoomId::new("room-1").expect("demo room id is valid");
    let customer = UserId::new("alice").expect("demo user id is valid");
    let agent = UserId::new("bob").expect("demo user id is valid");
    store
        .seed_room(
            room_id.clone(),
            RoomMetadata {
                customer_id: customer.clone(),
                assigned_agent_id: Some(agent.clone()),
                status: RoomStatus::Open,
            },
        )
        .await;
    tracing::info!(room = %room_id, "seeded demo room (tokens: alice-token, bob-token)");
    let auth = Arc::new(
        StaticTokenVerifier::new()
            .with_token("alice-token", customer)
            .with_token("bob-token", agent),
    );
    let notifier = Arc::new(LogNotificationDispatcher::new());

    let registry = Arc::new(ConnectionRegistry::new(clock.clone()));
    let pusher = Arc::new(WebSocketMessagePusher::new());
    let rooms = Arc::new(RoomDirectory::new(pusher.clone()));
    let presence = Arc::new(PresenceTracker::new(
        clock.clone(),
        Duration::from_millis(args.typing_deadline_ms),
    ));

    let connect_usecase = Arc::new(ConnectSessionUseCase::new(
        registry.clone(),
        pusher.clone(),
    ));
    let disconnect_usecase = Arc::new(DisconnectSessionUseCase::new(
        registry.clone(),
        rooms.clone(),
        presence.clone(),
        pusher.clone(),
    ));
    let join_usecase = Arc::new(JoinRoomUseCase::new(
        registry.clone(),
        rooms.clone(),
        presence.clone(),
        store.clone(),
    ));
    let leave_usecase = Arc::new(LeaveRoomUseCase::new(
        registry.clone(),
        rooms.clone(),
        presence.clone(),
    ));
    let send_usecase = Arc::new(SendMessageUseCase::new(
        clock.clone(),
        registry.clone(),
        rooms.clone(),
        presence.clone(),
        pusher.clone(),
        store.clone(),
        notifier,
    ));
    let typing_usecase = Arc::new(TypingUseCase::new(
        registry.clone(),
        rooms.clone(),
        presence.clone(),
    ));

    let state = Arc::new(AppState {
        connect_usecase,
        disconnect_usecase,
        join_usecase,
        leave_usecase,
        send_usecase,
        typing_usecase,
        registry,
        rooms,
        pusher,
        auth,
        outbound_queue_capacity: args.outbound_queue_capacity,
    });

    let config = GatewayConfig {
        sweep_period: Duration::from_millis(args.sweep_period_ms),
        liveness_window: Duration::from_secs(args.liveness_window_secs),
        reap_period: Duration::from_secs(args.reap_period_secs),
    };

    let server = GatewayServer::new(state, config);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_outbound_queue_capacity_is_rejected() {
        // given/when: a zero-capacity queue would panic at the first connection
        let result = Args::try_parse_from(["helpdesk-gateway", "--outbound-queue-capacity", "0"]);

        // then:
        assert!(result.is_err());
    }

    #[test]
    fn test_default_outbound_queue_capacity() {
        // when:
        let args = Args::try_parse_from(["helpdesk-gateway"]).unwrap();

        // then:
        assert_eq!(args.outbound_queue_capacity, 256);
    }
}
