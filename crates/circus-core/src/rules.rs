//! Static game configuration.
//!
//! A `Ruleset` is loaded once (built in, or from JSON) and never mutated by
//! the engine. It describes:
//! - Setup values and the shared supply
//! - Victory-track bounds and win conditions
//! - Phase order and each phase's turn-order method
//! - Board locations and their effects
//! - Market price lists and restock tiers
//! - Act and event cards

use crate::phase::Phase;
use crate::player::{Bounds, Player, Resource, ResourceHand, Track, Tracks};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Problems found while loading or validating a ruleset
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Malformed ruleset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Player count range {min}-{max} is invalid")]
    PlayerCount { min: usize, max: usize },

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Phase {0:?} is not configured")]
    MissingPhase(Phase),

    #[error("Phase {0:?} is configured more than once")]
    DuplicatePhase(Phase),

    #[error("Phase {phase:?} cannot use turn order {method:?}")]
    IllegalTurnOrder {
        phase: Phase,
        method: TurnOrderMethod,
    },

    #[error("Location {location} references unconfigured market {resource}")]
    UnknownMarket { location: String, resource: Resource },

    #[error("Event {event} references unknown location {location}")]
    UnknownLocation { event: String, location: String },

    #[error("Bounds of the {0} track must contain the starting value and the win threshold")]
    TrackBounds(Track),

    #[error("Market for {0} has no restock tiers")]
    EmptyTiers(Resource),

    #[error("At least one execution act is required")]
    NoExecutionActs,

    #[error("Display of {display} acts exceeds the regular pool of {pool}")]
    DisplayTooLarge { display: usize, pool: usize },

    #[error("At least one event card is required")]
    NoEvents,
}

/// How the turn order of a phase is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrderMethod {
    /// Descending by a track value, ties by seat
    TrackLeader(Track),
    /// The queue of the market currently being resolved
    MarketQueue,
    /// First-bid order of the selected acts, then seat order
    BidOrder,
    /// Fully automatic phase
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRule {
    pub phase: Phase,
    pub turn_order: TurnOrderMethod,
}

/// Coin amount that is either fixed or derived from a participant's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinFormula {
    Flat(u32),
    /// One coin per unit of a resource held
    PerResourceUnit(Resource),
    /// Coins equal to a track value, never below `minimum`
    TrackValue { track: Track, minimum: i32 },
}

impl CoinFormula {
    /// Coins this formula yields for a participant
    pub fn amount(&self, player: &Player) -> u32 {
        match *self {
            CoinFormula::Flat(n) => n,
            CoinFormula::PerResourceUnit(resource) => player.resources.get(resource),
            CoinFormula::TrackValue { track, minimum } => {
                player.track(track).max(minimum).max(0) as u32
            }
        }
    }
}

/// Effect fired when a worker is placed on a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationEffect {
    /// Draw from the shared supply, bounded by what is left
    GainResource { resource: Resource, amount: u32 },
    /// 50/50: reward on success, the worker dies on failure
    CoinFlip { reward: ResourceHand },
    /// Turn-scoped track movement
    TrackMovement {
        tracks: Tracks,
        #[serde(default)]
        sets_first_player: bool,
    },
    /// Pay `cost`, receive `reward` plus newly minted workers
    ResourceConversion {
        cost: ResourceHand,
        reward: ResourceHand,
        #[serde(default)]
        mint_workers: u32,
    },
    /// Pay `cost` to see the top of the event deck
    Information { cost: ResourceHand },
    /// Join the buy queue of a market
    Market { resource: Resource },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDef {
    pub id: String,
    pub name: String,
    /// `None` means unlimited
    pub max_per_participant: Option<u32>,
    pub max_total: Option<u32>,
    pub effect: LocationEffect,
}

/// A performance card players bid on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActCard {
    pub id: String,
    pub name: String,
    /// Paid at resolution, separate from the bid
    #[serde(default)]
    pub coin_cost: u32,
    /// Materials a participant must hold at resolution
    #[serde(default)]
    pub resource_cost: ResourceHand,
    pub coin_reward: Option<CoinFormula>,
    #[serde(default)]
    pub tracks: Tracks,
    pub has_winner: bool,
    pub consumes_resources: bool,
    #[serde(default)]
    pub non_participant_penalty: Tracks,
}

impl ActCard {
    /// Full cost a participant must still hold at resolution
    pub fn qualifying_cost(&self) -> ResourceHand {
        ResourceHand {
            coins: self.coin_cost,
            ..self.resource_cost.materials()
        }
    }
}

/// Per-participant tax with a material-loss fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCost {
    pub coins: u32,
    /// Materials lost instead, when the coins cannot be paid
    #[serde(default)]
    pub resource_loss: u32,
}

/// Everything an event card can do, applied in field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventEffects {
    pub blocked_tracks: Vec<Track>,
    pub disabled_locations: Vec<String>,
    /// Units added to (positive) or removed from (negative) a market
    pub market_stock: BTreeMap<Resource, i32>,
    pub player_cost: Option<PlayerCost>,
    pub player_gain: Option<CoinFormula>,
    pub track_delta: Tracks,
    pub market_price_modifier: i32,
    pub worker_cost_modifier: i32,
    pub draw_another: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCard {
    pub id: String,
    pub name: String,
    pub effects: EventEffects,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRules {
    pub resource: Resource,
    /// Opening stock, one entry per unit
    pub starting_prices: Vec<u32>,
    /// Price tiers refilled at cleanup
    pub tiers: Vec<u32>,
    pub units_per_tier: usize,
    pub max_restock: usize,
    /// Tier used when events add or remove stock
    pub event_tier: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupRules {
    pub min_players: usize,
    pub max_players: usize,
    pub starting_resources: ResourceHand,
    pub starting_workers: u32,
    pub starting_tracks: Tracks,
    /// Shared material supply (coins ignored)
    pub supply: ResourceHand,
    pub worker_supply: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRules {
    pub empire: Bounds,
    pub population: Bounds,
    pub church: Bounds,
}

impl TrackRules {
    pub fn uniform(bounds: Bounds) -> Self {
        Self {
            empire: bounds,
            population: bounds,
            church: bounds,
        }
    }

    pub fn bounds(&self, track: Track) -> Bounds {
        match track {
            Track::Empire => self.empire,
            Track::Population => self.population,
            Track::Church => self.church,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRules {
    /// Reaching this on any track wins immediately
    pub threshold: i32,
    /// The game is scored once the round counter passes this
    pub max_rounds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub min_bid: u32,
    pub worker_deploy_cost: u32,
    /// Re-roll rounds allowed in a dice competition
    pub max_rerolls: u32,
    /// Highest bid amount offered by `valid_actions`
    pub max_enumerated_bid: u32,
}

/// Upkeep and income applied at cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyRules {
    pub feeding_cost_per_resource: u32,
    pub minimum_income: u32,
}

/// Complete, immutable game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    pub setup: SetupRules,
    pub tracks: TrackRules,
    pub phases: Vec<PhaseRule>,
    pub locations: Vec<LocationDef>,
    pub markets: Vec<MarketRules>,
    pub acts: Vec<ActCard>,
    pub execution_acts: Vec<ActCard>,
    pub events: Vec<EventCard>,
    /// Regular acts on display each round
    pub regular_per_round: usize,
    pub win: WinRules,
    pub limits: Limits,
    #[serde(default)]
    pub economy: Option<EconomyRules>,
}

impl Ruleset {
    /// Load and validate a ruleset from JSON
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let rules: Ruleset = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn location(&self, id: &str) -> Option<&LocationDef> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn market(&self, resource: Resource) -> Option<&MarketRules> {
        self.markets.iter().find(|m| m.resource == resource)
    }

    /// Look up a regular or execution act
    pub fn act(&self, id: &str) -> Option<&ActCard> {
        self.acts
            .iter()
            .chain(self.execution_acts.iter())
            .find(|a| a.id == id)
    }

    pub fn event(&self, id: &str) -> Option<&EventCard> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn phase_rule(&self, phase: Phase) -> Option<&PhaseRule> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Check cross references and numeric sanity
    pub fn validate(&self) -> Result<(), RulesError> {
        let setup = &self.setup;
        if setup.min_players == 0 || setup.min_players > setup.max_players {
            return Err(RulesError::PlayerCount {
                min: setup.min_players,
                max: setup.max_players,
            });
        }

        let mut ids = HashSet::new();
        let all_ids = self
            .locations
            .iter()
            .map(|l| &l.id)
            .chain(self.acts.iter().map(|a| &a.id))
            .chain(self.execution_acts.iter().map(|a| &a.id))
            .chain(self.events.iter().map(|e| &e.id));
        for id in all_ids {
            if !ids.insert(id.as_str()) {
                return Err(RulesError::DuplicateId(id.clone()));
            }
        }

        for phase in Phase::ALL {
            let mut matching = self.phases.iter().filter(|p| p.phase == phase);
            let rule = matching.next().ok_or(RulesError::MissingPhase(phase))?;
            if matching.next().is_some() {
                return Err(RulesError::DuplicatePhase(phase));
            }
            let legal = match phase {
                Phase::Bid | Phase::Deploy => {
                    matches!(rule.turn_order, TurnOrderMethod::TrackLeader(_))
                }
                Phase::Trade => rule.turn_order == TurnOrderMethod::MarketQueue,
                Phase::Resolve => matches!(
                    rule.turn_order,
                    TurnOrderMethod::BidOrder | TurnOrderMethod::None
                ),
                Phase::Cleanup => rule.turn_order == TurnOrderMethod::None,
            };
            if !legal {
                return Err(RulesError::IllegalTurnOrder {
                    phase,
                    method: rule.turn_order,
                });
            }
        }

        for location in &self.locations {
            if let LocationEffect::Market { resource } = location.effect {
                if self.market(resource).is_none() {
                    return Err(RulesError::UnknownMarket {
                        location: location.id.clone(),
                        resource,
                    });
                }
            }
        }

        for market in &self.markets {
            if market.tiers.is_empty() {
                return Err(RulesError::EmptyTiers(market.resource));
            }
        }

        for event in &self.events {
            for location in &event.effects.disabled_locations {
                if self.location(location).is_none() {
                    return Err(RulesError::UnknownLocation {
                        event: event.id.clone(),
                        location: location.clone(),
                    });
                }
            }
        }
        if self.events.is_empty() {
            return Err(RulesError::NoEvents);
        }

        for track in Track::ALL {
            let bounds = self.tracks.bounds(track);
            if !bounds.contains(setup.starting_tracks.get(track))
                || !bounds.contains(self.win.threshold)
            {
                return Err(RulesError::TrackBounds(track));
            }
        }

        if self.execution_acts.is_empty() {
            return Err(RulesError::NoExecutionActs);
        }
        if self.regular_per_round > self.acts.len() {
            return Err(RulesError::DisplayTooLarge {
                display: self.regular_per_round,
                pool: self.acts.len(),
            });
        }

        Ok(())
    }

    /// The built-in Circus Maximus rules
    pub fn standard() -> Self {
        Self {
            setup: SetupRules {
                min_players: 2,
                max_players: 4,
                starting_resources: ResourceHand::single(Resource::Coins, 15),
                starting_workers: 5,
                starting_tracks: Tracks::uniform(3),
                supply: ResourceHand::with_amounts(0, 50, 50, 50, 50),
                worker_supply: 20,
            },
            tracks: TrackRules::uniform(Bounds::new(-10, 15)),
            phases: vec![
                PhaseRule {
                    phase: Phase::Bid,
                    turn_order: TurnOrderMethod::TrackLeader(Track::Empire),
                },
                PhaseRule {
                    phase: Phase::Deploy,
                    turn_order: TurnOrderMethod::TrackLeader(Track::Population),
                },
                PhaseRule {
                    phase: Phase::Trade,
                    turn_order: TurnOrderMethod::MarketQueue,
                },
                PhaseRule {
                    phase: Phase::Resolve,
                    turn_order: TurnOrderMethod::BidOrder,
                },
                PhaseRule {
                    phase: Phase::Cleanup,
                    turn_order: TurnOrderMethod::None,
                },
            ],
            locations: standard_locations(),
            markets: vec![
                MarketRules {
                    resource: Resource::Mummers,
                    starting_prices: vec![1, 1, 2, 2, 3, 3, 4, 4],
                    tiers: vec![1, 2, 3, 4, 5],
                    units_per_tier: 2,
                    max_restock: 3,
                    event_tier: 3,
                },
                MarketRules {
                    resource: Resource::Animals,
                    starting_prices: vec![2, 2, 3, 3, 4, 4],
                    tiers: vec![1, 2, 3, 4, 5],
                    units_per_tier: 2,
                    max_restock: 3,
                    event_tier: 3,
                },
                MarketRules {
                    resource: Resource::Slaves,
                    starting_prices: vec![3, 3, 4, 4, 5],
                    tiers: vec![1, 2, 3, 4, 5],
                    units_per_tier: 2,
                    max_restock: 3,
                    event_tier: 3,
                },
            ],
            acts: standard_acts(),
            execution_acts: standard_execution_acts(),
            events: standard_events(),
            regular_per_round: 5,
            win: WinRules {
                threshold: 15,
                max_rounds: 10,
            },
            limits: Limits {
                min_bid: 1,
                worker_deploy_cost: 1,
                max_rerolls: 10,
                max_enumerated_bid: 3,
            },
            economy: Some(EconomyRules {
                feeding_cost_per_resource: 1,
                minimum_income: 3,
            }),
        }
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::standard()
    }
}

fn location(
    id: &str,
    name: &str,
    max_per_participant: Option<u32>,
    max_total: Option<u32>,
    effect: LocationEffect,
) -> LocationDef {
    LocationDef {
        id: id.to_string(),
        name: name.to_string(),
        max_per_participant,
        max_total,
        effect,
    }
}

fn standard_locations() -> Vec<LocationDef> {
    let coin_flip = |resource| LocationEffect::CoinFlip {
        reward: ResourceHand::single(resource, 2),
    };
    let movement = |track, sets_first_player| LocationEffect::TrackMovement {
        tracks: Tracks::single(track, 1),
        sets_first_player,
    };

    vec![
        location("port", "Port", Some(1), None, coin_flip(Resource::Mummers)),
        location("war", "War", Some(1), None, coin_flip(Resource::Slaves)),
        location("forest", "Forest", Some(1), None, coin_flip(Resource::Animals)),
        location(
            "prison",
            "Prison",
            None,
            Some(6),
            LocationEffect::GainResource {
                resource: Resource::Prisoners,
                amount: 1,
            },
        ),
        location(
            "town_square",
            "Town Square",
            Some(1),
            None,
            movement(Track::Population, false),
        ),
        location("palace", "Palace", Some(1), None, movement(Track::Empire, true)),
        location("pantheon", "Pantheon", Some(1), None, movement(Track::Church, false)),
        location(
            "guildhall",
            "Guildhall",
            Some(1),
            None,
            LocationEffect::ResourceConversion {
                cost: ResourceHand::with_amounts(5, 0, 0, 1, 0),
                reward: ResourceHand::new(),
                mint_workers: 1,
            },
        ),
        location(
            "oracle",
            "Oracle",
            Some(1),
            None,
            LocationEffect::Information {
                cost: ResourceHand::single(Resource::Animals, 1),
            },
        ),
        location(
            "mummers_market",
            "Mummers Market",
            Some(1),
            None,
            LocationEffect::Market {
                resource: Resource::Mummers,
            },
        ),
        location(
            "animals_market",
            "Animals Market",
            Some(1),
            None,
            LocationEffect::Market {
                resource: Resource::Animals,
            },
        ),
        location(
            "slaves_market",
            "Slaves Market",
            Some(1),
            None,
            LocationEffect::Market {
                resource: Resource::Slaves,
            },
        ),
    ]
}

/// Compact act constructor: (mummers, animals, slaves, prisoners) cost
#[allow(clippy::too_many_arguments)]
fn act(
    id: &str,
    name: &str,
    coin_cost: u32,
    cost: [u32; 4],
    tracks: Tracks,
    has_winner: bool,
    consumes_resources: bool,
    coin_reward: u32,
    penalty: Tracks,
) -> ActCard {
    ActCard {
        id: id.to_string(),
        name: name.to_string(),
        coin_cost,
        resource_cost: ResourceHand::with_amounts(0, cost[0], cost[1], cost[2], cost[3]),
        coin_reward: Some(CoinFormula::Flat(coin_reward)),
        tracks,
        has_winner,
        consumes_resources,
        non_participant_penalty: penalty,
    }
}

#[rustfmt::skip]
fn standard_acts() -> Vec<ActCard> {
    // Tracks::new(empire, population, church)
    vec![
        act("choral_performance", "Choral Performance", 0, [1, 0, 0, 0],
            Tracks::new(0, 1, 1), false, false, 2, Tracks::new(0, 0, -1)),
        act("religious_play", "Religious Play", 0, [2, 0, 0, 0],
            Tracks::new(1, 0, 2), true, false, 3, Tracks::new(0, 0, -1)),
        act("procession_martyrs", "Procession of Martyrs", 0, [1, 0, 1, 0],
            Tracks::new(0, -1, 3), false, true, 4, Tracks::new(0, 0, -2)),
        act("hymn_competition", "Hymn Competition", 0, [1, 0, 0, 0],
            Tracks::new(0, 0, 2), true, false, 2, Tracks::new(0, 0, -1)),
        act("sacred_music", "Sacred Music Festival", 1, [2, 0, 0, 0],
            Tracks::new(0, 1, 3), false, false, 4, Tracks::new(0, 0, -2)),
        act("gladiator_combat", "Gladiator Combat", 0, [0, 0, 2, 0],
            Tracks::new(1, 3, 0), true, true, 5, Tracks::new(0, -2, 0)),
        act("bestiarii_vs_beasts", "Bestiarii vs. Beasts", 0, [0, 1, 1, 0],
            Tracks::new(0, 3, -1), true, true, 6, Tracks::new(0, -2, 0)),
        act("venatio", "Venatio (Animal Hunt)", 0, [0, 2, 0, 0],
            Tracks::new(1, 2, 0), false, true, 4, Tracks::new(0, -1, 0)),
        act("animal_feeding", "Animal Feeding", 0, [0, 2, 0, 0],
            Tracks::new(0, 3, -1), false, true, 5, Tracks::new(0, -2, 0)),
        act("slave_battle", "Slave Battle Royale", 0, [0, 0, 3, 0],
            Tracks::new(1, 4, 0), true, true, 7, Tracks::new(0, -2, 0)),
        act("chariot_race", "Chariot Race", 0, [0, 2, 0, 0],
            Tracks::new(3, 2, 0), true, false, 6, Tracks::new(-1, 0, 0)),
        act("ludi_militaris", "Ludi Militaris (War Games)", 0, [0, 0, 2, 0],
            Tracks::new(4, 1, 0), true, true, 7, Tracks::new(-2, 0, 0)),
        act("triumph_parade", "Triumph Parade", 0, [2, 1, 0, 0],
            Tracks::new(3, 2, 0), false, false, 5, Tracks::new(-1, 0, 0)),
        act("cavalry_display", "Cavalry Display", 0, [0, 2, 0, 0],
            Tracks::new(2, 1, 0), false, false, 4, Tracks::new(-1, 0, 0)),
        act("naumachia", "Naumachia (Naval Battle)", 3, [0, 0, 3, 0],
            Tracks::new(4, 2, 0), true, true, 8, Tracks::new(-2, -1, 0)),
    ]
}

#[rustfmt::skip]
fn standard_execution_acts() -> Vec<ActCard> {
    vec![
        act("torture", "Public Torture", 0, [0, 0, 0, 1],
            Tracks::new(2, 0, 0), false, true, 3, Tracks::new(-1, 0, 0)),
        act("military_execution", "Military Execution", 0, [0, 0, 0, 1],
            Tracks::new(0, 2, 0), false, true, 3, Tracks::new(0, -1, 0)),
        act("crucifixion", "Crucifixion", 0, [0, 0, 0, 1],
            Tracks::new(0, 0, 2), false, true, 3, Tracks::new(0, 0, -1)),
    ]
}

fn event(id: &str, name: &str, effects: EventEffects) -> EventCard {
    EventCard {
        id: id.to_string(),
        name: name.to_string(),
        effects,
    }
}

fn stock(changes: &[(Resource, i32)]) -> BTreeMap<Resource, i32> {
    changes.iter().copied().collect()
}

fn blockade(track: Track, location: &str) -> EventEffects {
    EventEffects {
        blocked_tracks: vec![track],
        disabled_locations: vec![location.to_string()],
        ..Default::default()
    }
}

fn standard_events() -> Vec<EventCard> {
    vec![
        event(
            "plague_strikes",
            "The Plague Strikes",
            blockade(Track::Population, "town_square"),
        ),
        event(
            "new_lands_discovered",
            "New Lands Discovered",
            EventEffects {
                market_stock: stock(&[(Resource::Animals, 3)]),
                ..Default::default()
            },
        ),
        event(
            "animals_escape",
            "Animals Escape",
            EventEffects {
                market_stock: stock(&[(Resource::Animals, -3)]),
                ..Default::default()
            },
        ),
        event(
            "traveling_troop",
            "Traveling Troop",
            EventEffects {
                market_stock: stock(&[(Resource::Mummers, 3)]),
                ..Default::default()
            },
        ),
        event(
            "new_age",
            "New Age",
            EventEffects {
                draw_another: true,
                ..Default::default()
            },
        ),
        event(
            "caesar_leaves_for_war",
            "Caesar Leaves for War",
            blockade(Track::Empire, "palace"),
        ),
        event(
            "pirates_grow_brave",
            "Pirates Grow Brave",
            EventEffects {
                player_cost: Some(PlayerCost {
                    coins: 5,
                    resource_loss: 1,
                }),
                ..Default::default()
            },
        ),
        event(
            "slaves_revolt",
            "Slaves Revolt",
            EventEffects {
                market_stock: stock(&[(Resource::Slaves, -3)]),
                ..Default::default()
            },
        ),
        event(
            "jupiter_is_angry",
            "Jupiter is Angry",
            blockade(Track::Church, "pantheon"),
        ),
        event(
            "slave_ship_arrives",
            "Slave Ship Arrives",
            EventEffects {
                market_stock: stock(&[(Resource::Slaves, 3)]),
                ..Default::default()
            },
        ),
        event(
            "victory_celebration",
            "Victory Celebration",
            EventEffects {
                player_gain: Some(CoinFormula::Flat(2)),
                track_delta: Tracks::single(Track::Empire, 1),
                ..Default::default()
            },
        ),
        event(
            "festival_declared",
            "Festival Declared",
            EventEffects {
                market_stock: stock(&[(Resource::Mummers, 2)]),
                player_gain: Some(CoinFormula::Flat(1)),
                track_delta: Tracks::single(Track::Population, 1),
                ..Default::default()
            },
        ),
        event(
            "imperial_bounty",
            "Imperial Bounty",
            EventEffects {
                player_gain: Some(CoinFormula::TrackValue {
                    track: Track::Empire,
                    minimum: 1,
                }),
                ..Default::default()
            },
        ),
        event(
            "religious_offering",
            "Religious Offering",
            EventEffects {
                market_stock: stock(&[(Resource::Mummers, 2)]),
                track_delta: Tracks::single(Track::Church, 1),
                ..Default::default()
            },
        ),
        event(
            "economic_boom",
            "Economic Boom",
            EventEffects {
                market_stock: stock(&[
                    (Resource::Mummers, 2),
                    (Resource::Animals, 2),
                    (Resource::Slaves, 2),
                ]),
                player_gain: Some(CoinFormula::Flat(1)),
                ..Default::default()
            },
        ),
        event(
            "market_crash",
            "Market Crash",
            EventEffects {
                market_price_modifier: -1,
                ..Default::default()
            },
        ),
        event(
            "labor_shortage",
            "Labor Shortage",
            EventEffects {
                worker_cost_modifier: 1,
                ..Default::default()
            },
        ),
    ]
}
