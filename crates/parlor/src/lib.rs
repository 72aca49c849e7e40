//! # Parlor
//!
//! Realtime, server-authoritative host for five parlor games: chess,
//! xiangqi, big two, boggle, and bingo.
//!
//! Clients hold one WebSocket each and speak the JSON protocol from
//! `parlor-protocol`. The [`Dispatcher`] is the single authority: every
//! inbound command, timer, and disconnect is serialized through its lock,
//! validated against the sender's seat, dispatched to the room's engine,
//! and answered with broadcasts the engines themselves shape (private
//! hands never leave the engine except inside a per-seat payload).

mod analytics;
mod dispatcher;
mod error;
mod leaderboard;
mod ratelimit;
mod server;

pub use analytics::{Analytics, AnalyticsEvent};
pub use dispatcher::Dispatcher;
pub use error::ServerError;
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use ratelimit::JoinLimiter;
pub use server::{GameServer, ServerConfig};
