//! The event dispatcher: the single authority between connections and
//! engines.
//!
//! All shared state lives behind one async mutex, so commands, timer
//! callbacks, and disconnects are serialized per process (and therefore
//! per room). Nothing suspends while the lock is held: outbound events
//! are pushed onto per-connection queues and written by detached tasks,
//! so within a room, broadcast order is exactly command acceptance order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use parlor_games::{Engine, Winner};
use parlor_protocol::{
    encode_event, BoardStateView, ClientCommand, GameFamily, ServerEvent,
    Square, StateView, WinnerView,
};
use parlor_room::{color_set, min_players, Room, RoomManager};
use parlor_transport::{ConnectionId, ConnectionSender};

use crate::{Analytics, AnalyticsEvent, JoinLimiter, Leaderboard};

/// Delay before a disconnect is announced to the rest of the room.
const GRACE_NOTIFY_SECS: u64 = 2;

/// How long an empty room survives before deletion.
const ROOM_DELETE_SECS: u64 = 60;

/// What the dispatcher remembers about a connection after it joins.
#[derive(Debug, Clone)]
struct ClientCtx {
    room_id: String,
    name: String,
    color: String,
}

struct State {
    rooms: RoomManager,
    /// Running engines, keyed by room id. An entry exists only between
    /// game start and game over.
    engines: HashMap<String, Engine>,
    clients: HashMap<ConnectionId, ClientCtx>,
    /// Pending undo requests: room id -> requesting seat.
    undo_requests: HashMap<String, usize>,
    /// Armed boggle round timers, keyed by room id.
    round_timers: HashMap<String, tokio::task::AbortHandle>,
    limiter: JoinLimiter,
    leaderboard: Leaderboard,
    /// Currently open sockets (joined or not), for the health snapshot.
    connections: usize,
}

/// Cheap-clone handle to the dispatcher. One per process.
#[derive(Clone)]
pub struct Dispatcher {
    state: Arc<Mutex<State>>,
    analytics: Analytics,
}

impl Dispatcher {
    pub fn new(analytics: Analytics) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                rooms: RoomManager::new(),
                engines: HashMap::new(),
                clients: HashMap::new(),
                undo_requests: HashMap::new(),
                round_timers: HashMap::new(),
                limiter: JoinLimiter::default(),
                leaderboard: Leaderboard::new(),
                connections: 0,
            })),
            analytics,
        }
    }

    /// Counts a fresh socket for the health snapshot.
    pub async fn handle_connect(&self, conn_id: ConnectionId) {
        let mut state = self.state.lock().await;
        state.connections += 1;
        tracing::debug!(%conn_id, total = state.connections, "connected");
    }

    /// Routes one inbound command.
    pub async fn handle_command(
        &self,
        conn: &ConnectionSender,
        cmd: ClientCommand,
    ) {
        match cmd {
            ClientCommand::Ping => send_event(conn, &ServerEvent::Pong),
            ClientCommand::JoinGame {
                room_id,
                player_name,
                reconnect,
                game_type,
            } => {
                self.join_game(conn, room_id, player_name, reconnect, game_type)
                    .await
            }
            ClientCommand::StartGame => self.start_game(conn).await,
            ClientCommand::MakeMove {
                from,
                to,
                promotion,
            } => self.make_move(conn, from, to, promotion).await,
            ClientCommand::CdiPlay { card_ids } => {
                self.cdi_play(conn, card_ids).await
            }
            ClientCommand::CdiPass => self.cdi_pass(conn).await,
            ClientCommand::BoggleSubmit { word } => {
                self.boggle_submit(conn, word).await
            }
            ClientCommand::BoggleEnd => self.boggle_end(conn).await,
            ClientCommand::BingoCall => self.bingo_call(conn).await,
            ClientCommand::RequestUndo => self.request_undo(conn).await,
            ClientCommand::ApproveUndo => {
                self.answer_undo(conn, true).await
            }
            ClientCommand::DeclineUndo => {
                self.answer_undo(conn, false).await
            }
            ClientCommand::Resign => self.resign(conn).await,
        }
    }

    /// Cleans up after a dropped socket and arms the grace timers.
    pub async fn handle_disconnect(&self, conn_id: ConnectionId) {
        let mut state = self.state.lock().await;
        state.connections = state.connections.saturating_sub(1);
        state.clients.remove(&conn_id);

        let Some(departure) = state.rooms.leave(conn_id) else {
            return;
        };
        let room_id = departure.room_id.clone();

        if !departure.was_player {
            if let Some(room) = state.rooms.room(&room_id) {
                broadcast(room, &room_update(room));
            }
            return;
        }

        // Announce the loss only if the seat is still empty in 2 seconds;
        // page navigations reclaim it faster than that.
        {
            let dispatcher = self.clone();
            let room_id = room_id.clone();
            let name = departure.name.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(GRACE_NOTIFY_SECS))
                    .await;
                dispatcher.notify_if_still_gone(&room_id, &name).await;
            });
        }

        if departure.room_emptied {
            let dispatcher = self.clone();
            let id = room_id.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(ROOM_DELETE_SECS))
                    .await;
                dispatcher.delete_if_still_empty(&id).await;
            })
            .abort_handle();
            if let Some(room) = state.rooms.room_mut(&room_id) {
                room.cancel_delete_timer();
                room.delete_timer = Some(handle);
            }
        }
    }

    /// Health endpoint data: (rooms, open connections).
    pub async fn health_snapshot(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        (state.rooms.room_count(), state.connections)
    }

    /// Current leaderboard, one family or all.
    pub async fn leaderboard(
        &self,
        family: Option<&str>,
        limit: usize,
    ) -> Vec<crate::LeaderboardEntry> {
        self.state.lock().await.leaderboard.top(family, limit)
    }

    // -- command handlers ---------------------------------------------------

    async fn join_game(
        &self,
        conn: &ConnectionSender,
        room_id: Option<String>,
        player_name: String,
        reconnect: bool,
        game_type: Option<GameFamily>,
    ) {
        let name: String =
            player_name.trim().chars().take(30).collect();
        if name.is_empty() {
            return send_error(conn, "Name required");
        }

        let mut state = self.state.lock().await;
        if state.clients.contains_key(&conn.id()) {
            return send_error(conn, "Already in a room");
        }
        if !reconnect && !state.limiter.check(conn.ip()) {
            return send_error(
                conn,
                "Too many join attempts, try again later",
            );
        }

        let room_id = match room_id {
            Some(id) => id.trim().to_ascii_uppercase(),
            None => {
                let Some(family) = game_type else {
                    return send_error(conn, "Game type required");
                };
                state.rooms.create_room(family, &mut rand::rng())
            }
        };

        let outcome =
            match state.rooms.join_room(&room_id, conn.clone(), &name) {
                Ok(outcome) => outcome,
                Err(e) => return send_error(conn, &e.to_string()),
            };

        state.clients.insert(
            conn.id(),
            ClientCtx {
                room_id: room_id.clone(),
                name: name.clone(),
                color: outcome.color.clone(),
            },
        );

        send_event(
            conn,
            &ServerEvent::Joined {
                room_id: room_id.clone(),
                color: outcome.color,
                reconnected: outcome.reconnected,
            },
        );

        let State { rooms, engines, .. } = &mut *state;
        let room = rooms.room(&room_id).expect("room joined above");
        broadcast(room, &room_update(room));

        // Late joiners and reconnections get a personalized snapshot of
        // the running game.
        if let Some(engine) = engines.get(&room_id) {
            let seat = room.seat_by_name(&name);
            send_event(
                conn,
                &ServerEvent::GameState(view_for(room, engine, seat)),
            );
        }

        let family = room.family.tag();
        self.analytics.emit(AnalyticsEvent::new(
            "join",
            &room_id,
            family,
            Some(&name),
        ));
    }

    async fn start_game(&self, conn: &ConnectionSender) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let State {
            rooms,
            engines,
            round_timers,
            ..
        } = &mut *state;
        let Some(room) = rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        if room.seat_by_name(&ctx.name) != Some(0) {
            return send_error(conn, "Only the host can start the game");
        }
        if engines.contains_key(&ctx.room_id) {
            return send_error(conn, "Game already started");
        }
        if room.seats.len() < min_players(room.family) {
            return send_error(conn, "Not enough players");
        }

        let engine =
            Engine::start(room.family, room.seats.len(), &mut rand::rng());
        tracing::info!(
            room_id = %ctx.room_id,
            family = %room.family,
            players = room.seats.len(),
            "game started"
        );

        broadcast(room, &ServerEvent::GameStarted);
        broadcast_state(room, &engine);

        // Boggle rounds also end by themselves when the clock runs out.
        if let Engine::Boggle(game) = &engine {
            let dispatcher = self.clone();
            let room_id = ctx.room_id.clone();
            let secs = game.time_left() + 1;
            let handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                dispatcher.round_time_up(&room_id).await;
            })
            .abort_handle();
            round_timers.insert(ctx.room_id.clone(), handle);
        }

        let family = room.family.tag();
        engines.insert(ctx.room_id.clone(), engine);
        self.analytics.emit(AnalyticsEvent::new(
            "start",
            &ctx.room_id,
            family,
            None,
        ));
    }

    async fn make_move(
        &self,
        conn: &ConnectionSender,
        from: Square,
        to: Square,
        promotion: Option<char>,
    ) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let State {
            rooms,
            engines,
            undo_requests,
            ..
        } = &mut *state;
        let Some(room) = rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        let Some(engine) = engines.get_mut(&ctx.room_id) else {
            return send_invalid(conn, "Game not started");
        };

        let result = match engine {
            Engine::Chess(game) => {
                if ctx.color != turn_color(room.family, game.turn()) {
                    Err("Not your turn".to_string())
                } else {
                    game.make_move(from, to, promotion)
                        .map_err(|e| e.to_string())
                }
            }
            Engine::Xiangqi(game) => {
                if ctx.color != turn_color(room.family, game.turn()) {
                    Err("Not your turn".to_string())
                } else {
                    game.make_move(from, to).map_err(|e| e.to_string())
                }
            }
            _ => return send_error(conn, "Wrong command for this game"),
        };

        match result {
            Err(reason) => send_invalid(conn, &reason),
            Ok(()) => {
                // A new move invalidates any pending undo request.
                undo_requests.remove(&ctx.room_id);
                broadcast_state(room, engine);

                let over = engine.is_game_over();
                let winner = engine.winner();
                let reason = board_end_reason(engine);
                let family = room.family.tag();
                self.analytics.emit(AnalyticsEvent::new(
                    "move",
                    &ctx.room_id,
                    family,
                    Some(&ctx.name),
                ));
                if over {
                    state.finish_game(&ctx.room_id, reason, winner);
                    self.analytics.emit(AnalyticsEvent::new(
                        "end",
                        &ctx.room_id,
                        family,
                        None,
                    ));
                }
            }
        }
    }

    async fn cdi_play(&self, conn: &ConnectionSender, card_ids: Vec<u8>) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let State { rooms, engines, .. } = &mut *state;
        let Some(room) = rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        let Some(engine) = engines.get_mut(&ctx.room_id) else {
            return send_invalid(conn, "Game not started");
        };
        let Engine::ChorDaiDi(game) = engine else {
            return send_error(conn, "Wrong command for this game");
        };
        let Some(seat) = room.seat_by_name(&ctx.name) else {
            return send_invalid(conn, "Not your turn");
        };

        match game.play(seat, &card_ids) {
            Err(e) => send_invalid(conn, &e.to_string()),
            Ok(()) => {
                broadcast_state(room, engine);
                let over = engine.is_game_over();
                let winner = engine.winner();
                let family = room.family.tag();
                self.analytics.emit(AnalyticsEvent::new(
                    "move",
                    &ctx.room_id,
                    family,
                    Some(&ctx.name),
                ));
                if over {
                    state.finish_game(&ctx.room_id, "hand empty", winner);
                    self.analytics.emit(AnalyticsEvent::new(
                        "end",
                        &ctx.room_id,
                        family,
                        None,
                    ));
                }
            }
        }
    }

    async fn cdi_pass(&self, conn: &ConnectionSender) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let State { rooms, engines, .. } = &mut *state;
        let Some(room) = rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        let Some(Engine::ChorDaiDi(game)) = engines.get_mut(&ctx.room_id)
        else {
            return send_invalid(conn, "Game not started");
        };
        let Some(seat) = room.seat_by_name(&ctx.name) else {
            return send_invalid(conn, "Not your turn");
        };

        match game.pass(seat) {
            Err(e) => send_invalid(conn, &e.to_string()),
            Ok(()) => {
                let engine = engines.get(&ctx.room_id).expect("still here");
                broadcast_state(room, engine);
            }
        }
    }

    async fn boggle_submit(&self, conn: &ConnectionSender, word: String) {
        let shown = word.trim().to_ascii_uppercase();
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let State { rooms, engines, .. } = &mut *state;
        let Some(room) = rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        let Some(Engine::Boggle(game)) = engines.get_mut(&ctx.room_id)
        else {
            return send_invalid(conn, "Game not started");
        };
        let Some(seat) = room.seat_by_name(&ctx.name) else {
            return send_event(
                conn,
                &ServerEvent::BoggleReject {
                    word: shown,
                    reason: "Spectators cannot submit".to_string(),
                },
            );
        };

        match game.submit_word(seat, &word) {
            Ok(accepted) => {
                send_event(
                    conn,
                    &ServerEvent::BoggleAccept { word: accepted },
                );
                broadcast(
                    room,
                    &ServerEvent::BoggleCounts {
                        submission_counts: game.submission_counts(),
                    },
                );
            }
            Err(e) => send_event(
                conn,
                &ServerEvent::BoggleReject {
                    word: shown,
                    reason: e.to_string(),
                },
            ),
        }
    }

    async fn boggle_end(&self, conn: &ConnectionSender) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let Some(room) = state.rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        if room.seat_by_name(&ctx.name) != Some(0) {
            return send_error(conn, "Only the host can end the round");
        }
        let ended = state.end_boggle_round(&ctx.room_id);
        if !ended {
            send_invalid(conn, "Game not started");
        } else {
            self.analytics.emit(AnalyticsEvent::new(
                "end",
                &ctx.room_id,
                GameFamily::Boggle.tag(),
                None,
            ));
        }
    }

    /// Timer path for the end of a boggle round.
    async fn round_time_up(&self, room_id: &str) {
        let mut state = self.state.lock().await;
        if state.end_boggle_round(room_id) {
            tracing::info!(room_id, "boggle round timed out");
            self.analytics.emit(AnalyticsEvent::new(
                "end",
                room_id,
                GameFamily::Boggle.tag(),
                None,
            ));
        }
    }

    async fn bingo_call(&self, conn: &ConnectionSender) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let State { rooms, engines, .. } = &mut *state;
        let Some(room) = rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        let Some(Engine::Bingo(game)) = engines.get_mut(&ctx.room_id)
        else {
            return send_invalid(conn, "Game not started");
        };
        let Some(seat) = room.seat_by_name(&ctx.name) else {
            return send_invalid(conn, "Only the caller can call numbers");
        };

        match game.call_number(seat) {
            Err(e) => send_invalid(conn, &e.to_string()),
            Ok(number) => {
                tracing::debug!(
                    room_id = %ctx.room_id, number, "number called"
                );
                let engine = engines.get(&ctx.room_id).expect("still here");
                broadcast_state(room, engine);
                let over = engine.is_game_over();
                let winner = engine.winner();
                if over {
                    state.finish_game(&ctx.room_id, "bingo", winner);
                    self.analytics.emit(AnalyticsEvent::new(
                        "end",
                        &ctx.room_id,
                        GameFamily::Bingo.tag(),
                        None,
                    ));
                }
            }
        }
    }

    async fn request_undo(&self, conn: &ConnectionSender) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let State {
            rooms,
            engines,
            undo_requests,
            ..
        } = &mut *state;
        let Some(room) = rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        match engines.get(&ctx.room_id) {
            Some(Engine::Chess(_)) | Some(Engine::Xiangqi(_)) => {}
            Some(_) => {
                return send_error(conn, "Undo not supported for this game")
            }
            None => return send_invalid(conn, "Game not started"),
        }
        let Some(seat) = room.seat_by_name(&ctx.name) else {
            return send_error(conn, "Spectators cannot request undo");
        };

        undo_requests.insert(ctx.room_id.clone(), seat);
        if let Some(opponent) =
            room.seats.get(1 - seat).and_then(|s| s.conn.as_ref())
        {
            send_event(
                opponent,
                &ServerEvent::UndoRequested { from: ctx.name },
            );
        }
    }

    async fn answer_undo(&self, conn: &ConnectionSender, approve: bool) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let State {
            rooms,
            engines,
            undo_requests,
            ..
        } = &mut *state;
        let Some(room) = rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        let Some(&requester) = undo_requests.get(&ctx.room_id) else {
            return send_error(conn, "No undo request pending");
        };
        if room.seat_by_name(&ctx.name) != Some(1 - requester) {
            return send_error(conn, "Only the opponent can answer");
        }

        undo_requests.remove(&ctx.room_id);
        if approve {
            if let Some(engine) = engines.get_mut(&ctx.room_id) {
                if engine.undo() {
                    broadcast_state(room, engine);
                }
            }
        } else if let Some(requester_conn) =
            room.seats.get(requester).and_then(|s| s.conn.as_ref())
        {
            send_event(requester_conn, &ServerEvent::UndoDeclined);
        }
    }

    async fn resign(&self, conn: &ConnectionSender) {
        let mut state = self.state.lock().await;
        let Some(ctx) = state.clients.get(&conn.id()).cloned() else {
            return send_error(conn, "Join a room first");
        };
        let Some(room) = state.rooms.room(&ctx.room_id) else {
            return send_error(conn, "Room not found");
        };
        match state.engines.get(&ctx.room_id) {
            Some(Engine::Chess(_)) | Some(Engine::Xiangqi(_)) => {}
            Some(_) => {
                return send_error(
                    conn,
                    "Resign not supported for this game",
                )
            }
            None => return send_invalid(conn, "Game not started"),
        }
        let Some(seat) = room.seat_by_name(&ctx.name) else {
            return send_error(conn, "Spectators cannot resign");
        };

        let Some(opponent) = room.seats.get(1 - seat) else {
            return send_error(conn, "No opponent");
        };
        let winner = Winner::Color(match opponent.color.as_str() {
            "white" => "white",
            "red" => "red",
            _ => "black",
        });
        tracing::info!(
            room_id = %ctx.room_id, name = %ctx.name, "player resigned"
        );
        let family = room.family.tag();
        state.finish_game(&ctx.room_id, "resign", Some(winner));
        self.analytics.emit(AnalyticsEvent::new(
            "end",
            &ctx.room_id,
            family,
            None,
        ));
    }

    // -- timer callbacks ----------------------------------------------------

    /// 2 s after a player drops: if the seat is still empty, tell the room.
    async fn notify_if_still_gone(&self, room_id: &str, name: &str) {
        let state = self.state.lock().await;
        let Some(room) = state.rooms.room(room_id) else {
            return;
        };
        let still_gone = room
            .seat_by_name(name)
            .map(|i| room.seats[i].conn.is_none())
            .unwrap_or(false);
        if still_gone {
            broadcast(
                room,
                &ServerEvent::PlayerDisconnected {
                    player_name: name.to_string(),
                },
            );
            broadcast(room, &room_update(room));
        }
    }

    /// 60 s after the last seat dropped: delete the room unless someone
    /// came back.
    async fn delete_if_still_empty(&self, room_id: &str) {
        let mut state = self.state.lock().await;
        let still_empty = state
            .rooms
            .room(room_id)
            .map(|room| !room.has_live_seats())
            .unwrap_or(false);
        if still_empty {
            state.rooms.delete_room(room_id);
            state.engines.remove(room_id);
            state.undo_requests.remove(room_id);
            if let Some(timer) = state.round_timers.remove(room_id) {
                timer.abort();
            }
        }
    }
}

impl State {
    /// Ends a boggle round exactly once (host command or timer).
    /// Returns false when no boggle engine is attached to the room.
    fn end_boggle_round(&mut self, room_id: &str) -> bool {
        let Some(Engine::Boggle(game)) = self.engines.get_mut(room_id)
        else {
            return false;
        };
        game.end_round();
        let winner = game.winner().map(Winner::Seat);

        if let (Some(room), Some(engine)) =
            (self.rooms.room(room_id), self.engines.get(room_id))
        {
            broadcast_state(room, engine);
        }
        self.finish_game(room_id, "round over", winner);
        true
    }

    /// Game-over cleanup: broadcast, record wins, detach the engine.
    /// The room itself lingers for the grace window.
    fn finish_game(
        &mut self,
        room_id: &str,
        reason: &str,
        winner: Option<Winner>,
    ) {
        if self.engines.remove(room_id).is_none() {
            return;
        }
        self.undo_requests.remove(room_id);
        if let Some(timer) = self.round_timers.remove(room_id) {
            timer.abort();
        }
        let Some(room) = self.rooms.room(room_id) else {
            return;
        };

        let winner_names: Vec<String> = match &winner {
            Some(Winner::Color(color)) => room
                .seats
                .iter()
                .filter(|s| s.color == *color)
                .map(|s| s.name.clone())
                .collect(),
            Some(Winner::Seat(seat)) => room
                .seats
                .get(*seat)
                .map(|s| s.name.clone())
                .into_iter()
                .collect(),
            Some(Winner::Seats(seats)) => seats
                .iter()
                .filter_map(|&s| room.seats.get(s))
                .map(|s| s.name.clone())
                .collect(),
            Some(Winner::Draw) | None => Vec::new(),
        };

        broadcast(
            room,
            &ServerEvent::GameOver {
                winner: winner.map(winner_view),
                reason: reason.to_string(),
            },
        );
        tracing::info!(room_id, reason, "game over");

        let family = room.family.tag().to_string();
        for name in winner_names {
            self.leaderboard.record_win(&family, &name);
        }
    }
}

// ---------------------------------------------------------------------------
// Event plumbing
// ---------------------------------------------------------------------------

fn send_event(conn: &ConnectionSender, event: &ServerEvent) {
    match encode_event(event) {
        Ok(text) => conn.send(text),
        Err(e) => tracing::error!(error = %e, "event encode failed"),
    }
}

fn send_error(conn: &ConnectionSender, message: &str) {
    send_event(
        conn,
        &ServerEvent::Error {
            message: message.to_string(),
        },
    );
}

fn send_invalid(conn: &ConnectionSender, reason: &str) {
    send_event(
        conn,
        &ServerEvent::InvalidMove {
            reason: reason.to_string(),
        },
    );
}

fn broadcast(room: &Room, event: &ServerEvent) {
    match encode_event(event) {
        Ok(text) => {
            for conn in room.connections() {
                conn.send(text.clone());
            }
        }
        Err(e) => tracing::error!(error = %e, "event encode failed"),
    }
}

fn room_update(room: &Room) -> ServerEvent {
    ServerEvent::RoomUpdate {
        players: room.player_infos(),
        spectators: room.spectator_names(),
    }
}

/// The color whose turn it is, per the family's ordered color set
/// (`w` is the first color, `b` the second).
fn turn_color(family: GameFamily, turn: char) -> &'static str {
    let colors = color_set(family);
    if turn == 'w' {
        colors[0]
    } else {
        colors[1]
    }
}

/// Builds the `game_state` view one recipient should see. The card-table
/// engine shapes its own per-seat payload; board games are public.
fn view_for(room: &Room, engine: &Engine, seat: Option<usize>) -> StateView {
    match engine {
        Engine::Chess(game) => StateView::Board(BoardStateView {
            fen: game.fen(),
            turn: game.turn(),
            in_check: game.in_check(),
            is_game_over: game.is_game_over(),
            winner: game.winner().map(str::to_string),
            players: room.player_infos(),
        }),
        Engine::Xiangqi(game) => StateView::Board(BoardStateView {
            fen: game.fen(),
            turn: game.turn(),
            in_check: game.in_check(),
            is_game_over: game.is_game_over(),
            winner: game.winner().map(str::to_string),
            players: room.player_infos(),
        }),
        Engine::ChorDaiDi(game) => {
            StateView::CardTable(game.view(seat, room.player_infos()))
        }
        Engine::Boggle(game) => StateView::WordRound(game.view()),
        Engine::Bingo(game) => {
            StateView::NumberGrid(game.view(room.player_infos()))
        }
    }
}

/// Emits `game_state` to everyone in the room, personalized per seat.
fn broadcast_state(room: &Room, engine: &Engine) {
    for (seat, s) in room.seats.iter().enumerate() {
        if let Some(conn) = &s.conn {
            send_event(
                conn,
                &ServerEvent::GameState(view_for(room, engine, Some(seat))),
            );
        }
    }
    for spectator in &room.spectators {
        send_event(
            &spectator.conn,
            &ServerEvent::GameState(view_for(room, engine, None)),
        );
    }
}

fn winner_view(winner: Winner) -> WinnerView {
    match winner {
        Winner::Color(color) => WinnerView::Color(color.to_string()),
        Winner::Draw => WinnerView::Color("draw".to_string()),
        Winner::Seat(seat) => WinnerView::Seat(seat),
        Winner::Seats(seats) => WinnerView::Seats(seats),
    }
}

/// Human-readable `game_over` reason for the board games.
fn board_end_reason(engine: &Engine) -> &'static str {
    match engine {
        Engine::Chess(game) => {
            if game.winner() == Some("draw") {
                "stalemate"
            } else {
                "checkmate"
            }
        }
        Engine::Xiangqi(game) => {
            if game.in_check() {
                "checkmate"
            } else {
                "stalemate"
            }
        }
        _ => "game over",
    }
}
