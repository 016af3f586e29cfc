//! Multi-threaded buzz arbitration races.
//!
//! The single-winner guarantee must hold under genuine parallelism, not
//! just interleaved sequential calls. These tests race real threads through
//! the compare-and-set.

use std::sync::{
    Arc, Barrier, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use buzzline_core::{
    BuzzArbiter, ClientCommand, OutboundAction, RoomCoordinator, ServerEvent,
    env::Environment,
    storage::{MemoryStorage, Storage},
};
use rand::{RngCore, SeedableRng, rngs::StdRng};

#[derive(Clone)]
struct TestEnv {
    rng: Arc<Mutex<StdRng>>,
}

impl TestEnv {
    fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))) }
    }
}

impl Environment for TestEnv {
    fn wall_clock_secs(&self) -> u64 {
        0
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap().fill_bytes(buffer);
    }
}

const HOST: u64 = 10;
const PLAYERS: u64 = 8;

fn live_room_with_players(
    coordinator: &RoomCoordinator<MemoryStorage, TestEnv>,
) -> (u128, Vec<u64>) {
    let actions = coordinator.handle_command(HOST, ClientCommand::CreateRoom { host_user_id: 1 });
    let (room_id, room_code) = actions
        .iter()
        .find_map(|a| match a {
            OutboundAction::Reply {
                event: ServerEvent::RoomCreated { room_id, room_code }, ..
            } => Some((*room_id, room_code.clone())),
            _ => None,
        })
        .unwrap();

    let connections: Vec<u64> = (0..PLAYERS).map(|i| 100 + i).collect();
    for (i, connection_id) in connections.iter().enumerate() {
        coordinator.handle_command(*connection_id, ClientCommand::JoinRoom {
            room_code: room_code.clone(),
            user_id: *connection_id,
            display_name: format!("player-{i}"),
        });
    }

    coordinator.handle_command(HOST, ClientCommand::ResetRound { room_id });

    (room_id, connections)
}

#[test]
fn concurrent_buzzes_produce_exactly_one_winner() {
    let storage = MemoryStorage::new();
    let coordinator = RoomCoordinator::new(storage.clone(), TestEnv::with_seed(3));
    let (room_id, connections) = live_room_with_players(&coordinator);

    let barrier = Arc::new(Barrier::new(connections.len()));
    let wins = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = connections
        .iter()
        .map(|&connection_id| {
            let coordinator = coordinator.clone();
            let barrier = Arc::clone(&barrier);
            let wins = Arc::clone(&wins);
            std::thread::spawn(move || {
                barrier.wait();
                let actions = coordinator.handle_command(connection_id, ClientCommand::Buzz);
                let won = actions.iter().any(|a| {
                    matches!(
                        a,
                        OutboundAction::Broadcast {
                            event: ServerEvent::PlayerBuzzed { .. },
                            ..
                        }
                    )
                });
                if won {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(wins.load(Ordering::SeqCst), 1, "exactly one buzz must win");

    let room = storage.room(room_id).unwrap().unwrap();
    assert!(room.buzz_locked);
    assert!(room.buzzed_player_name.is_some());
}

#[test]
fn repeated_rounds_each_have_one_winner() {
    let storage = MemoryStorage::new();
    let coordinator = RoomCoordinator::new(storage.clone(), TestEnv::with_seed(5));
    let (room_id, connections) = live_room_with_players(&coordinator);

    for round in 0..20 {
        let barrier = Arc::new(Barrier::new(connections.len()));
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = connections
            .iter()
            .map(|&connection_id| {
                let coordinator = coordinator.clone();
                let barrier = Arc::clone(&barrier);
                let wins = Arc::clone(&wins);
                std::thread::spawn(move || {
                    barrier.wait();
                    let actions = coordinator.handle_command(connection_id, ClientCommand::Buzz);
                    if !actions.is_empty() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1, "round {round} must have one winner");

        let room = storage.room(room_id).unwrap().unwrap();
        assert!(room.buzz_locked);

        coordinator.handle_command(HOST, ClientCommand::ResetRound { room_id });
    }
}

#[test]
fn racing_the_arbiter_directly_still_yields_one_success() {
    let storage = MemoryStorage::new();
    let coordinator = RoomCoordinator::new(storage.clone(), TestEnv::with_seed(9));
    let (room_id, connections) = live_room_with_players(&coordinator);

    let arbiter = BuzzArbiter::new(storage.clone());
    let barrier = Arc::new(Barrier::new(connections.len()));

    let handles: Vec<_> = connections
        .iter()
        .map(|&connection_id| {
            let arbiter = arbiter.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                arbiter.handle_buzz(connection_id).unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = outcomes.into_iter().flatten().collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].room_id, room_id);

    let room = storage.room(room_id).unwrap().unwrap();
    assert_eq!(room.buzzed_player_name.as_deref(), Some(winners[0].winner_name.as_str()));
}
