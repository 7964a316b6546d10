//! Mutable game aggregate.
//!
//! `GameState` holds the participants, the turn/phase position, round-scoped
//! modifiers set by events, turn-scoped bonuses, market queues, the shared
//! supply, and the action history. Every track change goes through
//! [`GameState::move_track`] so bounds and event blocks are always applied.

use crate::actions::{Action, GameEvent};
use crate::phase::Phase;
use crate::player::{Player, PlayerId, Resource, ResourceHand, Track, Tracks};
use crate::rules::Ruleset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Game has not been initialized")]
    NotInitialized,

    #[error("Game is over")]
    GameOver,

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Cannot {action} during the {phase} phase")]
    InvalidPhase { action: String, phase: Phase },

    #[error("Already acted this turn")]
    AlreadyActed,

    #[error("Take an action or pass before ending the turn")]
    NoActionTaken,

    #[error("The first bidder must bid before passing")]
    FirstBidderMustBid,

    #[error("Unknown participant {0}")]
    UnknownPlayer(PlayerId),

    #[error("Unknown act {0}")]
    UnknownAct(String),

    #[error("Act {0} is not on display this round")]
    ActNotAvailable(String),

    #[error("Already bid on {0}")]
    DuplicateBid(String),

    #[error("Bid must be at least {min} coins")]
    BidTooLow { min: u32 },

    #[error("Cannot afford this")]
    CannotAfford,

    #[error("Unknown location {0}")]
    UnknownLocation(String),

    #[error("{0} is closed this round")]
    LocationDisabled(String),

    #[error("{0} is full")]
    LocationFull(String),

    #[error("Already at the worker limit for {0}")]
    LocationCapReached(String),

    #[error("No workers available")]
    NoWorkers,

    #[error("Missing resources for {0}")]
    MissingResources(String),

    #[error("The event deck is empty")]
    EmptyDeck,

    #[error("No {0} market")]
    UnknownMarket(Resource),

    #[error("The {0} market is sold out")]
    SoldOut(Resource),

    #[error("The {0} market is not open")]
    MarketClosed(Resource),

    #[error("Not queued at the {0} market")]
    NotQueued(Resource),

    #[error("Internal error: {0}")]
    Invariant(String),

    #[error("Game halted after an internal error")]
    Faulted,
}

impl GameError {
    /// Input rejections leave the game untouched and playable; invariant
    /// violations end the game instance
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GameError::Invariant(_) | GameError::Faulted)
    }
}

/// Why the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    /// Reached the threshold on a track
    TrackThreshold { track: Track },
    /// Highest track total after the last round
    RoundLimit,
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinReason::TrackThreshold { track } => write!(f, "{track} track"),
            WinReason::RoundLimit => f.write_str("round limit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: PlayerId,
    pub reason: WinReason,
}

/// One accepted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub round: u32,
    pub phase: Phase,
    pub turn: u32,
    pub player: PlayerId,
    pub action: Action,
}

/// The complete mutable game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// All participants, in seat order
    pub players: Vec<Player>,
    /// Active participant
    pub current_player: PlayerId,
    pub phase: Phase,
    /// Round number (starts at 1)
    pub round: u32,
    /// Turns taken in the whole game
    pub turn: u32,
    /// Set once the game is won
    pub outcome: Option<Outcome>,
    /// Whose turn comes next within the phase
    pub turn_order: Vec<PlayerId>,
    /// Participants who passed since the last non-pass action
    pub passed: BTreeSet<PlayerId>,
    /// The active participant already took their action
    pub acted_this_turn: bool,
    /// Tracks that cannot increase this round
    pub blocked_tracks: BTreeSet<Track>,
    /// Locations closed this round
    pub disabled_locations: BTreeSet<String>,
    pub worker_cost_modifier: i32,
    pub market_price_modifier: i32,
    /// Track amounts to revert when the participant's turn ends
    pub turn_bonuses: BTreeMap<PlayerId, Tracks>,
    /// FIFO buy queues, per market
    pub market_queues: BTreeMap<Resource, Vec<PlayerId>>,
    /// Market open during Trade
    pub current_market: Option<Resource>,
    /// Shared material supply
    pub supply: ResourceHand,
    pub worker_supply: u32,
    /// Upcoming event seen at the oracle, per participant
    pub peeked_events: BTreeMap<PlayerId, String>,
    /// Participant who bids first next round
    pub first_player_override: Option<PlayerId>,
    pub history: Vec<HistoryEntry>,
    /// Latest log line
    pub message: String,
    pub message_history: Vec<String>,
}

impl GameState {
    /// Seat the players with the configured starting position
    pub fn new(mut players: Vec<Player>, rules: &Ruleset) -> Self {
        let setup = &rules.setup;
        for player in &mut players {
            player.initialize(
                setup.starting_resources,
                setup.starting_workers,
                setup.starting_tracks,
            );
        }
        let current_player = players.first().map_or(0, |p| p.id);

        Self {
            players,
            current_player,
            phase: Phase::Bid,
            round: 1,
            turn: 0,
            outcome: None,
            turn_order: Vec::new(),
            passed: BTreeSet::new(),
            acted_this_turn: false,
            blocked_tracks: BTreeSet::new(),
            disabled_locations: BTreeSet::new(),
            worker_cost_modifier: 0,
            market_price_modifier: 0,
            turn_bonuses: BTreeMap::new(),
            market_queues: BTreeMap::new(),
            current_market: None,
            supply: setup.supply.materials(),
            worker_supply: setup.worker_supply,
            peeked_events: BTreeMap::new(),
            first_player_override: None,
            history: Vec::new(),
            message: String::new(),
            message_history: Vec::new(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::UnknownPlayer(id))
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Coins to deploy one worker this round
    pub fn deploy_cost(&self, rules: &Ruleset) -> u32 {
        (rules.limits.worker_deploy_cost as i32 + self.worker_cost_modifier).max(0) as u32
    }

    /// The track-update path: positive moves on a blocked track are
    /// cancelled and the result is clamped to the track's bounds.
    /// Returns the amount actually applied.
    pub fn move_track(
        &mut self,
        rules: &Ruleset,
        player: PlayerId,
        track: Track,
        delta: i32,
    ) -> Result<i32, GameError> {
        if delta > 0 && self.blocked_tracks.contains(&track) {
            return Ok(0);
        }
        let bounds = rules.tracks.bounds(track);
        let p = self.player_mut(player)?;
        let before = p.track(track);
        let after = bounds.clamp(before + delta);
        p.tracks.set(track, after);
        Ok(after - before)
    }

    /// Apply a track delta, reporting each move or block
    pub fn apply_tracks(
        &mut self,
        rules: &Ruleset,
        player: PlayerId,
        delta: &Tracks,
    ) -> Result<(Tracks, Vec<GameEvent>), GameError> {
        let mut applied = Tracks::default();
        let mut events = Vec::new();
        for (track, amount) in delta.entries() {
            if amount > 0 && self.blocked_tracks.contains(&track) {
                events.push(GameEvent::TrackBlocked { player, track });
                continue;
            }
            let moved = self.move_track(rules, player, track, amount)?;
            applied.add(track, moved);
            if moved != 0 {
                events.push(GameEvent::TrackMoved {
                    player,
                    track,
                    delta: moved,
                });
            }
        }
        Ok((applied, events))
    }

    /// Remember a turn-scoped bonus
    pub fn add_turn_bonus(&mut self, player: PlayerId, applied: &Tracks) {
        let entry = self.turn_bonuses.entry(player).or_default();
        for (track, amount) in applied.entries() {
            entry.add(track, amount);
        }
    }

    /// Undo a participant's turn-scoped bonuses
    pub fn revert_turn_bonuses(
        &mut self,
        rules: &Ruleset,
        player: PlayerId,
    ) -> Result<Option<GameEvent>, GameError> {
        let Some(bonus) = self.turn_bonuses.remove(&player) else {
            return Ok(None);
        };
        let p = self.player_mut(player)?;
        for (track, amount) in bonus.entries() {
            let bounds = rules.tracks.bounds(track);
            p.tracks.set(track, bounds.clamp(p.track(track) - amount));
        }
        if bonus.is_zero() {
            return Ok(None);
        }
        Ok(Some(GameEvent::BonusReverted {
            player,
            tracks: bonus,
        }))
    }

    /// Draw materials from the supply, bounded by what is left. Coins are
    /// not supply-limited and pass straight through.
    pub fn take_from_supply(&mut self, wanted: &ResourceHand) -> ResourceHand {
        let mut granted = ResourceHand::single(Resource::Coins, wanted.coins);
        for resource in Resource::MATERIALS {
            let taken = self.supply.take(resource, wanted.get(resource));
            granted.add(resource, taken);
        }
        granted
    }

    /// Return spent materials to the supply
    pub fn return_to_supply(&mut self, spent: &ResourceHand) {
        self.supply.add_hand(&spent.materials());
    }

    /// Add a participant to a market queue once
    pub fn enqueue_market(&mut self, player: PlayerId, resource: Resource) {
        let queue = self.market_queues.entry(resource).or_default();
        if !queue.contains(&player) {
            queue.push(player);
        }
    }

    /// Threshold win first (player order, then track order), then the
    /// round limit with a track-total and resource-total tiebreak
    pub fn check_winner(&self, rules: &Ruleset) -> Option<Outcome> {
        for player in &self.players {
            for track in Track::ALL {
                if player.track(track) >= rules.win.threshold {
                    return Some(Outcome {
                        winner: player.id,
                        reason: WinReason::TrackThreshold { track },
                    });
                }
            }
        }

        if self.round > rules.win.max_rounds {
            let mut best: Option<&Player> = None;
            for player in &self.players {
                let better = match best {
                    None => true,
                    Some(b) => {
                        (player.total_tracks(), player.total_resources())
                            > (b.total_tracks(), b.total_resources())
                    }
                };
                if better {
                    best = Some(player);
                }
            }
            return best.map(|p| Outcome {
                winner: p.id,
                reason: WinReason::RoundLimit,
            });
        }

        None
    }

    /// Append an event to the human-readable log
    pub fn log(&mut self, event: &GameEvent) {
        self.message = event.to_string();
        self.message_history.push(self.message.clone());
    }
}
