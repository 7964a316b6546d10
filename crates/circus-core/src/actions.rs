//! Actions participants submit and the events the engine reports back.
//!
//! Actions use an internally tagged JSON shape so a presentation layer can
//! submit e.g. `{"type":"bid","actId":"venatio","coins":2}` directly.

use crate::game::WinReason;
use crate::phase::Phase;
use crate::player::{PlayerId, Resource, ResourceHand, Track, Tracks};
use serde::{Deserialize, Serialize};
use std::fmt;

/// All possible actions a participant can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Wager coins on an act (Bid phase)
    #[serde(rename_all = "camelCase")]
    Bid { act_id: String, coins: u32 },
    /// Stop acting until someone else acts
    Pass,
    /// Deploy a worker (Deploy phase)
    #[serde(rename_all = "camelCase")]
    PlaceWorker { location_id: String },
    /// Buy one unit at the open market (Trade phase)
    #[serde(rename_all = "camelCase")]
    BuyResource { resource_type: Resource },
}

impl Action {
    /// Short name used in rejection messages
    pub fn name(&self) -> &'static str {
        match self {
            Action::Bid { .. } => "bid",
            Action::Pass => "pass",
            Action::PlaceWorker { .. } => "placeWorker",
            Action::BuyResource { .. } => "buyResource",
        }
    }

    /// Phase in which this action is accepted (`Pass` is accepted in every
    /// interactive phase, so it has none)
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Action::Bid { .. } => Some(Phase::Bid),
            Action::Pass => None,
            Action::PlaceWorker { .. } => Some(Phase::Deploy),
            Action::BuyResource { .. } => Some(Phase::Trade),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Action::Pass)
    }
}

/// Events that occur as a result of actions and phase transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Game set up for a roster
    GameStarted { players: usize },

    /// A new round began
    RoundStarted { round: u32 },

    /// A phase began
    PhaseStarted { phase: Phase, round: u32 },

    /// The active participant changed
    TurnStarted { player: PlayerId },

    /// A bid was recorded
    BidPlaced {
        player: PlayerId,
        act_id: String,
        coins: u32,
    },

    /// Participant passed
    Passed { player: PlayerId, phase: Phase },

    /// A worker was deployed
    WorkerPlaced {
        player: PlayerId,
        location_id: String,
        cost: u32,
    },

    /// Materials drawn from the supply
    ResourcesGained {
        player: PlayerId,
        resources: ResourceHand,
    },

    /// A coin flip failed and the worker died
    WorkerLost {
        player: PlayerId,
        location_id: String,
    },

    /// A track moved
    TrackMoved {
        player: PlayerId,
        track: Track,
        delta: i32,
    },

    /// A track increase was cancelled by an event
    TrackBlocked { player: PlayerId, track: Track },

    /// Participant will bid first next round
    FirstPlayerClaimed { player: PlayerId },

    /// A conversion location was used
    ResourcesConverted {
        player: PlayerId,
        cost: ResourceHand,
        reward: ResourceHand,
        workers: u32,
    },

    /// Participant saw the top event card (the card stays private)
    EventPeeked { player: PlayerId },

    /// Participant joined a market queue
    QueuedAtMarket { player: PlayerId, resource: Resource },

    /// A market started selling
    MarketOpened { resource: Resource },

    /// A unit was bought
    ResourceBought {
        player: PlayerId,
        resource: Resource,
        price: u32,
    },

    /// An event card was drawn and applied
    EventDrawn { event_id: String, name: String },

    /// An event changed a market's stock
    MarketStockChanged { resource: Resource, delta: i32 },

    /// An event tax was paid in coins
    CoinsPaid { player: PlayerId, coins: u32 },

    /// Materials lost to an event, returned to the supply
    ResourcesLost {
        player: PlayerId,
        resources: ResourceHand,
    },

    /// Coins received from an event or an act
    CoinsReceived { player: PlayerId, coins: u32 },

    /// One round of a dice competition
    DiceRolled {
        act_id: String,
        rolls: Vec<(PlayerId, u8)>,
    },

    /// An act was performed
    ActResolved {
        act_id: String,
        winner: Option<PlayerId>,
        qualifiers: Vec<PlayerId>,
    },

    /// Nobody could perform a selected act
    ActSkipped { act_id: String },

    /// Non-participation penalty for one resolved act
    PenaltyApplied {
        player: PlayerId,
        act_id: String,
        penalty: Tracks,
    },

    /// Cleanup upkeep and income
    UpkeepSettled {
        player: PlayerId,
        upkeep: u32,
        income: u32,
    },

    /// Cleanup refill of a market
    MarketRestocked { resource: Resource, added: usize },

    /// A turn-scoped bonus expired
    BonusReverted { player: PlayerId, tracks: Tracks },

    /// The game ended
    GameWon { winner: PlayerId, reason: WinReason },
}

fn seat(player: &PlayerId) -> String {
    format!("Player {}", player + 1)
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::GameStarted { players } => write!(f, "Game started with {players} players"),
            GameEvent::RoundStarted { round } => write!(f, "Round {round} begins"),
            GameEvent::PhaseStarted { phase, round } => {
                write!(f, "{phase} phase (round {round})")
            }
            GameEvent::TurnStarted { player } => write!(f, "{} to act", seat(player)),
            GameEvent::BidPlaced {
                player,
                act_id,
                coins,
            } => write!(f, "{} bid {coins} on {act_id}", seat(player)),
            GameEvent::Passed { player, .. } => write!(f, "{} passed", seat(player)),
            GameEvent::WorkerPlaced {
                player,
                location_id,
                cost,
            } => write!(f, "{} placed a worker at {location_id} for {cost}", seat(player)),
            GameEvent::ResourcesGained { player, resources } => {
                write!(f, "{} gained {resources}", seat(player))
            }
            GameEvent::WorkerLost {
                player,
                location_id,
            } => write!(f, "{} lost a worker at {location_id}", seat(player)),
            GameEvent::TrackMoved {
                player,
                track,
                delta,
            } => write!(f, "{} moved {delta:+} on {track}", seat(player)),
            GameEvent::TrackBlocked { player, track } => {
                write!(f, "{} cannot advance on {track} this round", seat(player))
            }
            GameEvent::FirstPlayerClaimed { player } => {
                write!(f, "{} will bid first next round", seat(player))
            }
            GameEvent::ResourcesConverted {
                player,
                cost,
                workers,
                ..
            } => write!(f, "{} paid {cost} for {workers} worker(s)", seat(player)),
            GameEvent::EventPeeked { player } => {
                write!(f, "{} consulted the oracle", seat(player))
            }
            GameEvent::QueuedAtMarket { player, resource } => {
                write!(f, "{} queued at the {resource} market", seat(player))
            }
            GameEvent::MarketOpened { resource } => write!(f, "The {resource} market opens"),
            GameEvent::ResourceBought {
                player,
                resource,
                price,
            } => write!(f, "{} bought {resource} for {price}", seat(player)),
            GameEvent::EventDrawn { name, .. } => write!(f, "Event: {name}"),
            GameEvent::MarketStockChanged { resource, delta } => {
                write!(f, "{resource} market stock {delta:+}")
            }
            GameEvent::CoinsPaid { player, coins } => {
                write!(f, "{} paid {coins} coins", seat(player))
            }
            GameEvent::ResourcesLost { player, resources } => {
                write!(f, "{} lost {resources}", seat(player))
            }
            GameEvent::CoinsReceived { player, coins } => {
                write!(f, "{} received {coins} coins", seat(player))
            }
            GameEvent::DiceRolled { act_id, rolls } => {
                let rolls: Vec<String> = rolls
                    .iter()
                    .map(|(p, r)| format!("{} rolled {r}", seat(p)))
                    .collect();
                write!(f, "{act_id}: {}", rolls.join(", "))
            }
            GameEvent::ActResolved { act_id, winner, .. } => match winner {
                Some(w) => write!(f, "{} won {act_id}", seat(w)),
                None => write!(f, "{act_id} performed"),
            },
            GameEvent::ActSkipped { act_id } => write!(f, "Nobody could perform {act_id}"),
            GameEvent::PenaltyApplied {
                player,
                act_id,
                penalty,
            } => write!(f, "{} missed {act_id}: {penalty}", seat(player)),
            GameEvent::UpkeepSettled {
                player,
                upkeep,
                income,
            } => write!(f, "{} paid {upkeep} upkeep, earned {income}", seat(player)),
            GameEvent::MarketRestocked { resource, added } => {
                write!(f, "{resource} market restocked with {added}")
            }
            GameEvent::BonusReverted { player, tracks } => {
                write!(f, "{} bonus expired ({tracks})", seat(player))
            }
            GameEvent::GameWon { winner, reason } => {
                write!(f, "{} wins ({reason})", seat(winner))
            }
        }
    }
}
