//! Circus Maximus - a worker-placement and bidding board game engine
//!
//! This crate provides the core game logic, including:
//! - Data-driven rules (locations, acts, events, markets) loadable from JSON
//! - Participant state: resources, workers, and the three influence tracks
//! - The round state machine: Bid, Deploy, Trade, Resolve, Cleanup
//! - Deterministic, seedable randomness for dice, coin flips, and shuffles
//! - Save/load of the complete engine state
//!
//! # Architecture
//!
//! The engine is platform-agnostic. It can be compiled to:
//! - Native Rust for bots, playtesting, and hosting
//! - WebAssembly for browser clients (feature `wasm`)
//!
//! # Modules
//!
//! - [`rules`]: Ruleset configuration and the standard content
//! - [`player`]: Resources, workers, and tracks
//! - [`market`]: Per-resource price queues
//! - [`board`]: Worker placement and location effects
//! - [`events`]: The event deck
//! - [`acts`]: Act display, bids, and act resolution
//! - [`phase`]: Phase sequence and turn order
//! - [`game`]: Shared game state, errors, and win checks
//! - [`engine`]: Orchestration, queries, and persistence
//! - [`bot`]: AI players

pub mod actions;
pub mod acts;
pub mod board;
pub mod bot;
pub mod engine;
pub mod events;
pub mod game;
pub mod market;
pub mod phase;
pub mod player;
pub mod rng;
pub mod rules;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{Action, GameEvent};
pub use acts::{ActResolver, Bid};
pub use board::Board;
pub use bot::{play_bot_turn, Bot, BotDifficulty};
pub use engine::{Engine, EngineStatus, GameView, PersistenceError, Seat};
pub use events::EventResolver;
pub use game::{GameError, GameState, Outcome, WinReason};
pub use market::{Market, Markets};
pub use phase::{Phase, PhaseMachine};
pub use player::{Player, PlayerId, Resource, ResourceHand, Track, Tracks};
pub use rng::GameRng;
pub use rules::{Ruleset, RulesError};
