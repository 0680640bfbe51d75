use actix::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use tictactoe_server::errors::GameError;
use tictactoe_server::models::{GameStatus, Mark, Move, ServerFrame, ServerMessage};
use tictactoe_server::session::{Connection, JoinOutcome, Lobby};
use tictactoe_server::storage::MemoryStore;

/// Records what the lobby sends to one client.
#[derive(Default)]
struct Client {
    inbox: Vec<ServerMessage>,
}

impl Actor for Client {
    type Context = Context<Self>;
}

impl Handler<ServerFrame> for Client {
    type Result = ();

    fn handle(&mut self, msg: ServerFrame, _: &mut Self::Context) {
        self.inbox.push(msg.0);
    }
}

#[derive(Message)]
#[rtype(result = "Vec<ServerMessage>")]
struct TakeInbox;

impl Handler<TakeInbox> for Client {
    type Result = MessageResult<TakeInbox>;

    fn handle(&mut self, _: TakeInbox, _: &mut Self::Context) -> Self::Result {
        MessageResult(std::mem::take(&mut self.inbox))
    }
}

fn connect(lobby: &Lobby, username: &str) -> (Addr<Client>, Uuid) {
    let addr = Client::default().start();
    let id = Uuid::new_v4();
    lobby.register(
        username,
        Connection {
            id,
            outbox: addr.clone().recipient(),
        },
    );
    (addr, id)
}

async fn inbox(client: &Addr<Client>) -> Vec<ServerMessage> {
    client.send(TakeInbox).await.unwrap()
}

fn play(game_id: i64, username: &str, x: i64, y: i64) -> Move {
    Move {
        game_id,
        username: username.to_string(),
        x,
        y,
    }
}

#[actix_rt::test]
async fn full_game_between_alice_and_bob() {
    let lobby = Lobby::new(Arc::new(MemoryStore::new()));
    let (alice, alice_id) = connect(&lobby, "alice");
    let (bob, bob_id) = connect(&lobby, "bob");

    lobby.join_queue("alice", alice_id).unwrap();
    let game = match lobby.join_queue("bob", bob_id).unwrap() {
        JoinOutcome::Paired(game) => game,
        JoinOutcome::Waiting => panic!("bob should have been paired with alice"),
    };

    let alice_frames = inbox(&alice).await;
    let created: Vec<_> = alice_frames
        .iter()
        .filter(|m| m.message_type == "gameCreated")
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].message, "X");
    assert_eq!(inbox(&bob).await[0].message, "O");

    let err = lobby.submit_move(&play(game.id, "bob", 0, 0), bob_id).unwrap_err();
    assert_eq!(
        err,
        GameError::TurnViolation {
            username: "bob".into(),
            turn: Mark::X
        }
    );

    // alice takes the main diagonal while bob fills the top row's right side
    let plays = [
        ("alice", alice_id, 0, 0),
        ("bob", bob_id, 0, 1),
        ("alice", alice_id, 1, 1),
        ("bob", bob_id, 0, 2),
        ("alice", alice_id, 2, 2),
    ];
    for (user, conn, x, y) in plays {
        lobby.submit_move(&play(game.id, user, x, y), conn).unwrap();
    }

    let updates = inbox(&bob).await;
    assert_eq!(updates.len(), 5);
    let last: serde_json::Value = serde_json::from_str(&updates[4].message).unwrap();
    assert_eq!(last["status"], 2);
    assert_eq!(last["turn"], "X");
    assert_eq!(
        last["board"],
        serde_json::json!([["X", "O", "O"], ["", "X", ""], ["", "", "X"]])
    );
    assert_eq!(inbox(&alice).await.len(), 5);

    assert_eq!(lobby.snapshot(game.id).unwrap().status, GameStatus::Terminated);
    assert!(matches!(
        lobby.submit_move(&play(game.id, "bob", 2, 0), bob_id),
        Err(GameError::GameOver(_))
    ));
}

#[actix_rt::test]
async fn one_user_plays_two_games_on_two_connections() {
    let lobby = Lobby::new(Arc::new(MemoryStore::new()));
    let (alice_one, alice_one_id) = connect(&lobby, "alice");
    let (alice_two, alice_two_id) = connect(&lobby, "alice");
    let (_bob, bob_id) = connect(&lobby, "bob");
    let (_carol, carol_id) = connect(&lobby, "carol");

    lobby.join_queue("alice", alice_one_id).unwrap();
    let first = match lobby.join_queue("bob", bob_id).unwrap() {
        JoinOutcome::Paired(game) => game,
        JoinOutcome::Waiting => panic!("expected a game"),
    };
    lobby.join_queue("alice", alice_two_id).unwrap();
    let second = match lobby.join_queue("carol", carol_id).unwrap() {
        JoinOutcome::Paired(game) => game,
        JoinOutcome::Waiting => panic!("expected a game"),
    };
    assert_ne!(first.id, second.id);
    inbox(&alice_one).await;
    inbox(&alice_two).await;

    lobby.submit_move(&play(second.id, "alice", 1, 1), alice_two_id).unwrap();
    assert!(inbox(&alice_one).await.is_empty());
    assert_eq!(inbox(&alice_two).await.len(), 1);

    assert!(matches!(
        lobby.submit_move(&play(second.id, "carol", 0, 0), alice_one_id),
        Err(GameError::UnknownConnection(_))
    ));
    assert!(matches!(
        lobby.submit_move(&play(second.id, "alice", 0, 0), alice_one_id),
        Err(GameError::AlreadyInGame(id)) if id == first.id
    ));
}
