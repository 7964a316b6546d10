//! Game orchestration.
//!
//! The `Engine` owns every component and exposes the only entry points:
//! initialize, execute an action, end the turn, query, save and load.
//!
//! Lifecycle: uninitialized -> active -> terminal. Rejected actions leave
//! the engine untouched. An internal invariant violation faults the engine;
//! every later call returns [`GameError::Faulted`].

use crate::actions::{Action, GameEvent};
use crate::acts::ActResolver;
use crate::board::Board;
use crate::events::EventResolver;
use crate::game::{GameError, GameState, HistoryEntry, Outcome};
use crate::market::Markets;
use crate::phase::{Phase, PhaseMachine};
use crate::player::{Player, PlayerId, PlayerSummary, Resource, Track};
use crate::rng::GameRng;
use crate::rules::{ActCard, EventCard, Ruleset, RulesError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

/// Version written into save blobs
pub const SAVE_VERSION: u32 = 1;

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Uninitialized,
    Active,
    Terminal,
}

/// Save/load failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Save data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u32 },

    #[error("Save data is inconsistent: {0}")]
    Incoherent(String),

    #[error("Nothing to save before the game is initialized")]
    NotInitialized,
}

/// One seat of the starting roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,
    pub is_bot: bool,
}

impl Seat {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_bot: false,
        }
    }

    pub fn bot(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_bot: true,
        }
    }
}

/// Public state of one market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketView {
    pub resource: Resource,
    pub prices: Vec<u32>,
    pub current_price: Option<u32>,
    /// Price after this round's modifier
    pub effective_price: Option<u32>,
    pub queue: Vec<PlayerId>,
    /// Currently selling (Trade phase)
    pub open: bool,
}

/// Read-only projection for presentation layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub status: EngineStatus,
    pub players: Vec<PlayerSummary>,
    /// Seat to act; `None` outside interactive phases and once the game ends
    pub current_player: Option<PlayerId>,
    pub phase: Phase,
    pub round: u32,
    pub turn: u32,
    pub outcome: Option<Outcome>,
    pub turn_order: Vec<PlayerId>,
    /// (location, participant, workers)
    pub board: Vec<(String, PlayerId, u32)>,
    pub markets: Vec<MarketView>,
    pub current_event: Option<EventCard>,
    pub chained_event: Option<EventCard>,
    pub execution_act: Option<ActCard>,
    /// Regular display followed by the execution act
    pub acts: Vec<ActCard>,
    pub selected_acts: Vec<String>,
    pub blocked_tracks: Vec<Track>,
    pub disabled_locations: Vec<String>,
    pub worker_cost_modifier: i32,
    pub market_price_modifier: i32,
    pub deploy_cost: u32,
    pub message: String,
    pub message_history: Vec<String>,
}

#[derive(Serialize)]
struct SaveOut<'a> {
    version: u32,
    engine: &'a Engine,
}

/// Owner of all game components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engine {
    pub rules: Ruleset,
    pub state: GameState,
    pub board: Board,
    pub markets: Markets,
    pub acts: ActResolver,
    pub events: EventResolver,
    pub phases: PhaseMachine,
    pub rng: GameRng,
    pub status: EngineStatus,
    /// Set by an invariant violation
    pub fault: Option<String>,
}

impl Engine {
    /// Build an engine over a validated ruleset; `seed` makes the game
    /// reproducible
    pub fn new(rules: Ruleset, seed: Option<u64>) -> Result<Self, RulesError> {
        rules.validate()?;
        let rng = match seed {
            Some(seed) => GameRng::seeded(seed),
            None => GameRng::from_entropy(),
        };
        Ok(Self {
            state: GameState::new(Vec::new(), &rules),
            board: Board::new(),
            markets: Markets::new(&rules.markets),
            acts: ActResolver::default(),
            events: EventResolver::default(),
            phases: PhaseMachine::new(&rules),
            rng,
            status: EngineStatus::Uninitialized,
            fault: None,
            rules,
        })
    }

    /// Standard rules with a fixed seed
    pub fn standard(seed: u64) -> Result<Self, RulesError> {
        Self::new(Ruleset::standard(), Some(seed))
    }

    fn ensure_healthy(&self) -> Result<(), GameError> {
        if self.fault.is_some() {
            return Err(GameError::Faulted);
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        self.ensure_healthy()?;
        match self.status {
            EngineStatus::Uninitialized => Err(GameError::NotInitialized),
            EngineStatus::Terminal => Err(GameError::GameOver),
            EngineStatus::Active => Ok(()),
        }
    }

    /// Record invariant violations; they end this game instance
    fn guard<T>(&mut self, result: Result<T, GameError>) -> Result<T, GameError> {
        match &result {
            Err(GameError::Invariant(reason)) => {
                error!(%reason, round = self.state.round, phase = %self.state.phase, "engine faulted");
                self.fault = Some(reason.clone());
            }
            Err(err) => debug!(%err, "rejected"),
            Ok(_) => {}
        }
        result
    }

    fn record(&mut self, events: &[GameEvent]) {
        for event in events {
            self.state.log(event);
        }
    }

    /// Set up a new game for a roster, draw the first event, and enter the
    /// first phase
    pub fn initialize(&mut self, roster: Vec<Seat>) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_healthy()?;
        let setup = &self.rules.setup;
        if roster.len() < setup.min_players || roster.len() > setup.max_players {
            return Err(GameError::InvalidRoster(format!(
                "{} players (need {}-{})",
                roster.len(),
                setup.min_players,
                setup.max_players
            )));
        }

        let players = roster
            .into_iter()
            .enumerate()
            .map(|(i, seat)| Player::new(i as PlayerId, seat.name, seat.is_bot))
            .collect();
        let result = self.start_game(players);
        let events = self.guard(result)?;
        self.record(&events);
        Ok(events)
    }

    fn start_game(&mut self, players: Vec<Player>) -> Result<Vec<GameEvent>, GameError> {
        self.state = GameState::new(players, &self.rules);
        self.board = Board::new();
        self.markets = Markets::new(&self.rules.markets);
        self.acts = ActResolver::new(&self.rules, &mut self.rng);
        self.events = EventResolver::new(&self.rules, &mut self.rng);
        self.phases = PhaseMachine::new(&self.rules);
        self.status = EngineStatus::Active;

        let mut events = vec![
            GameEvent::GameStarted {
                players: self.state.player_count(),
            },
            GameEvent::RoundStarted { round: 1 },
        ];
        events.extend(self.events.start_round(
            &self.rules,
            &mut self.state,
            &mut self.markets,
            &mut self.rng,
        )?);
        let first = self.phases.first()?;
        events.extend(
            self.phases
                .start_phase(&self.rules, &mut self.state, &self.acts, first)?,
        );
        self.check_win(&mut events);

        info!(players = self.state.player_count(), "game started");
        Ok(events)
    }

    /// Apply an action for the active participant
    pub fn execute_action(
        &mut self,
        player: PlayerId,
        action: Action,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_active()?;
        let result = self.apply_action(player, action);
        let events = self.guard(result)?;
        self.record(&events);
        Ok(events)
    }

    fn apply_action(&mut self, player: PlayerId, action: Action) -> Result<Vec<GameEvent>, GameError> {
        if self.state.get_player(player).is_none() {
            return Err(GameError::UnknownPlayer(player));
        }
        if player != self.state.current_player {
            return Err(GameError::NotYourTurn);
        }
        let phase = self.state.phase;
        if !phase.is_interactive() || action.phase().is_some_and(|p| p != phase) {
            return Err(GameError::InvalidPhase {
                action: action.name().to_string(),
                phase,
            });
        }
        if self.state.acted_this_turn {
            return Err(GameError::AlreadyActed);
        }

        let mut events = match &action {
            Action::Bid { act_id, coins } => vec![self.acts.place_bid(
                &self.rules,
                &mut self.state,
                player,
                act_id,
                *coins,
            )?],
            Action::Pass => {
                PhaseMachine::check_pass(&self.rules, &self.state, &self.acts, player)?;
                self.state.passed.insert(player);
                vec![GameEvent::Passed { player, phase }]
            }
            Action::PlaceWorker { location_id } => self.board.place_worker(
                &self.rules,
                &mut self.state,
                location_id,
                player,
                self.events.upcoming(),
                &mut self.rng,
            )?,
            Action::BuyResource { resource_type } => self.buy(player, *resource_type)?,
        };

        if !action.is_pass() {
            self.state.passed.clear();
        }
        self.state.acted_this_turn = true;
        self.state.history.push(HistoryEntry {
            round: self.state.round,
            phase,
            turn: self.state.turn,
            player,
            action,
        });
        self.check_win(&mut events);
        Ok(events)
    }

    fn buy(&mut self, player: PlayerId, resource: Resource) -> Result<Vec<GameEvent>, GameError> {
        if self.state.current_market != Some(resource) {
            return Err(GameError::MarketClosed(resource));
        }
        let queued = self
            .state
            .market_queues
            .get(&resource)
            .is_some_and(|q| q.contains(&player));
        if !queued {
            return Err(GameError::NotQueued(resource));
        }

        let modifier = self.state.market_price_modifier;
        let buyer = self.state.player_mut(player)?;
        let price = self.markets.buy(resource, buyer, modifier)?;
        Ok(vec![GameEvent::ResourceBought {
            player,
            resource,
            price,
        }])
    }

    fn check_win(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.outcome.is_some() {
            return;
        }
        if let Some(outcome) = self.state.check_winner(&self.rules) {
            info!(winner = outcome.winner, reason = %outcome.reason, "game over");
            self.state.outcome = Some(outcome);
            self.status = EngineStatus::Terminal;
            events.push(GameEvent::GameWon {
                winner: outcome.winner,
                reason: outcome.reason,
            });
        }
    }

    /// Finish the active participant's turn. Ends the phase when everyone
    /// has passed (or runs the batch work of an automatic phase), otherwise
    /// hands the turn to the next participant who has not passed.
    pub fn end_turn(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_active()?;
        let result = self.advance();
        let events = self.guard(result)?;
        self.record(&events);
        Ok(events)
    }

    fn advance(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let phase = self.state.phase;
        if phase.is_interactive()
            && !self.state.acted_this_turn
            && !PhaseMachine::should_end_phase(&self.state)
        {
            return Err(GameError::NoActionTaken);
        }

        let mut events = Vec::new();
        let departing = self.state.current_player;
        events.extend(self.state.revert_turn_bonuses(&self.rules, departing)?);
        self.state.acted_this_turn = false;
        self.state.turn += 1;

        if phase.is_interactive() {
            if !PhaseMachine::all_passed(&self.state) {
                if let Some(next) = PhaseMachine::next_participant(&self.state) {
                    self.state.current_player = next;
                    events.push(GameEvent::TurnStarted { player: next });
                    return Ok(events);
                }
            }
            if phase == Phase::Trade {
                if let Some(opened) = PhaseMachine::advance_market(&self.rules, &mut self.state) {
                    events.extend(opened);
                    return Ok(events);
                }
            }
            events.extend(self.enter_next_phase(phase)?);
        } else {
            events.extend(self.run_batch(phase)?);
        }

        self.check_win(&mut events);
        Ok(events)
    }

    /// Move on from `from`, skipping interactive phases nobody can act in
    fn enter_next_phase(&mut self, from: Phase) -> Result<Vec<GameEvent>, GameError> {
        let next = self.phases.next(from)?.ok_or_else(|| {
            GameError::Invariant(format!("no phase follows {from} within the round"))
        })?;
        let mut events = self
            .phases
            .start_phase(&self.rules, &mut self.state, &self.acts, next)?;
        if next.is_interactive() && PhaseMachine::should_end_phase(&self.state) {
            events.extend(self.enter_next_phase(next)?);
        }
        Ok(events)
    }

    fn run_batch(&mut self, phase: Phase) -> Result<Vec<GameEvent>, GameError> {
        match phase {
            Phase::Resolve => {
                let mut events = self
                    .acts
                    .resolve_all(&self.rules, &mut self.state, &mut self.rng)?;
                events.extend(self.enter_next_phase(phase)?);
                Ok(events)
            }
            Phase::Cleanup => self.cleanup(),
            interactive => Err(GameError::Invariant(format!(
                "{interactive} has no batch work"
            ))),
        }
    }

    /// Upkeep, worker return, restock, event rollover, next round
    fn cleanup(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();

        if let Some(economy) = self.rules.economy {
            for player in &mut self.state.players {
                let upkeep = economy.feeding_cost_per_resource * player.resources.materials_total();
                let income = player
                    .total_tracks()
                    .max(economy.minimum_income as i32)
                    .max(0) as u32;
                player.resources.coins = (player.resources.coins + income).saturating_sub(upkeep);
                events.push(GameEvent::UpkeepSettled {
                    player: player.id,
                    upkeep,
                    income,
                });
            }
        }

        for player in &mut self.state.players {
            player.workers.recall_all();
            player.bids.clear();
        }
        self.board.clear();
        self.state.market_queues.clear();
        self.state.current_market = None;
        self.state.turn_bonuses.clear();

        for (resource, added) in self.markets.restock_all(&self.rules.markets) {
            if added > 0 {
                events.push(GameEvent::MarketRestocked { resource, added });
            }
        }

        self.events.end_round(&mut self.state);
        self.state.round += 1;
        self.check_win(&mut events);
        if self.state.is_finished() {
            return Ok(events);
        }

        let round = self.state.round;
        info!(round, "round started");
        events.push(GameEvent::RoundStarted { round });
        self.acts.setup_round(&self.rules, &mut self.rng);
        events.extend(self.events.start_round(
            &self.rules,
            &mut self.state,
            &mut self.markets,
            &mut self.rng,
        )?);
        let first = self.phases.first()?;
        events.extend(
            self.phases
                .start_phase(&self.rules, &mut self.state, &self.acts, first)?,
        );
        Ok(events)
    }

    /// Drive Resolve and Cleanup until an interactive phase (or the end)
    pub fn run_automatic_phases(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();
        while self.status == EngineStatus::Active && !self.state.phase.is_interactive() {
            events.extend(self.end_turn()?);
        }
        Ok(events)
    }

    /// Legal actions for a participant right now
    pub fn valid_actions(&self, player: PlayerId) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.ensure_active().is_err()
            || player != self.state.current_player
            || self.state.acted_this_turn
        {
            return actions;
        }
        let Some(p) = self.state.get_player(player) else {
            return actions;
        };

        match self.state.phase {
            Phase::Bid => {
                let max_bid = self.rules.limits.max_enumerated_bid.min(p.resources.coins);
                for act_id in self.acts.available_acts() {
                    if p.has_bid_on(act_id) {
                        continue;
                    }
                    for coins in self.rules.limits.min_bid..=max_bid {
                        actions.push(Action::Bid {
                            act_id: act_id.to_string(),
                            coins,
                        });
                    }
                }
            }
            Phase::Deploy => {
                for location in &self.rules.locations {
                    let valid = self
                        .board
                        .validate_placement(
                            &self.rules,
                            &self.state,
                            &location.id,
                            player,
                            self.events.upcoming(),
                        )
                        .is_ok();
                    if valid {
                        actions.push(Action::PlaceWorker {
                            location_id: location.id.clone(),
                        });
                    }
                }
            }
            Phase::Trade => {
                if let Some(resource) = self.state.current_market {
                    let queued = self
                        .state
                        .market_queues
                        .get(&resource)
                        .is_some_and(|q| q.contains(&player));
                    let price = self
                        .markets
                        .get(resource)
                        .and_then(|m| m.effective_price(self.state.market_price_modifier));
                    if queued && price.is_some_and(|price| p.resources.coins >= price) {
                        actions.push(Action::BuyResource {
                            resource_type: resource,
                        });
                    }
                }
            }
            Phase::Resolve | Phase::Cleanup => return actions,
        }

        if PhaseMachine::check_pass(&self.rules, &self.state, &self.acts, player).is_ok() {
            actions.push(Action::Pass);
        }
        actions
    }

    /// The upcoming event a participant saw at the oracle this round
    pub fn peeked_event(&self, player: PlayerId) -> Option<&EventCard> {
        self.state
            .peeked_events
            .get(&player)
            .and_then(|id| self.rules.event(id))
    }

    pub fn is_finished(&self) -> bool {
        self.status == EngineStatus::Terminal
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.state.outcome.map(|o| o.winner)
    }

    /// Read-only projection of the whole game
    pub fn view(&self) -> GameView {
        let markets = self
            .markets
            .iter()
            .map(|m| MarketView {
                resource: m.resource,
                prices: m.prices.clone(),
                current_price: m.current_price(),
                effective_price: m.effective_price(self.state.market_price_modifier),
                queue: self
                    .state
                    .market_queues
                    .get(&m.resource)
                    .cloned()
                    .unwrap_or_default(),
                open: self.state.phase == Phase::Trade
                    && self.state.current_market == Some(m.resource),
            })
            .collect();
        let event = |id: &Option<String>| id.as_deref().and_then(|id| self.rules.event(id)).cloned();

        GameView {
            status: self.status,
            players: self.state.players.iter().map(Player::summary).collect(),
            current_player: (self.status == EngineStatus::Active
                && self.state.phase.is_interactive())
            .then_some(self.state.current_player),
            phase: self.state.phase,
            round: self.state.round,
            turn: self.state.turn,
            outcome: self.state.outcome,
            turn_order: self.state.turn_order.clone(),
            board: self.board.snapshot(),
            markets,
            current_event: event(&self.events.current),
            chained_event: event(&self.events.chained),
            execution_act: self
                .acts
                .execution
                .as_deref()
                .and_then(|id| self.rules.act(id))
                .cloned(),
            acts: self
                .acts
                .available_acts()
                .filter_map(|id| self.rules.act(id))
                .cloned()
                .collect(),
            selected_acts: self.acts.selected.clone(),
            blocked_tracks: self.state.blocked_tracks.iter().copied().collect(),
            disabled_locations: self.state.disabled_locations.iter().cloned().collect(),
            worker_cost_modifier: self.state.worker_cost_modifier,
            market_price_modifier: self.state.market_price_modifier,
            deploy_cost: self.state.deploy_cost(&self.rules),
            message: self.state.message.clone(),
            message_history: self.state.message_history.clone(),
        }
    }

    /// Serialize the whole engine into a versioned JSON blob
    pub fn save_game(&self) -> Result<String, PersistenceError> {
        if self.status == EngineStatus::Uninitialized {
            return Err(PersistenceError::NotInitialized);
        }
        Ok(serde_json::to_string(&SaveOut {
            version: SAVE_VERSION,
            engine: self,
        })?)
    }

    /// Rebuild an engine from a save blob
    pub fn load_game(blob: &str) -> Result<Self, PersistenceError> {
        let mut value: serde_json::Value = serde_json::from_str(blob)?;
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| PersistenceError::Incoherent("missing version".into()))?;
        if version != u64::from(SAVE_VERSION) {
            return Err(PersistenceError::UnsupportedVersion {
                found: version,
                expected: SAVE_VERSION,
            });
        }
        let engine = value
            .get_mut("engine")
            .map(serde_json::Value::take)
            .ok_or_else(|| PersistenceError::Incoherent("missing engine".into()))?;
        let engine: Engine = serde_json::from_value(engine)?;
        engine.check_coherence()?;
        Ok(engine)
    }

    /// Replace this engine with a saved one; on failure nothing changes
    pub fn restore(&mut self, blob: &str) -> Result<(), PersistenceError> {
        *self = Self::load_game(blob)?;
        Ok(())
    }

    fn check_coherence(&self) -> Result<(), PersistenceError> {
        let incoherent = |msg: String| Err(PersistenceError::Incoherent(msg));

        if let Err(err) = self.rules.validate() {
            return incoherent(format!("ruleset: {err}"));
        }
        let count = self.state.player_count();
        let setup = &self.rules.setup;
        if self.status != EngineStatus::Uninitialized
            && (count < setup.min_players || count > setup.max_players)
        {
            return incoherent(format!("{count} players"));
        }
        if self.state.players.iter().enumerate().any(|(i, p)| p.id as usize != i) {
            return incoherent("player ids out of seat order".into());
        }
        if count > 0 && self.state.current_player as usize >= count {
            return incoherent(format!("active player {}", self.state.current_player));
        }
        if self.phases.sequence != PhaseMachine::new(&self.rules).sequence {
            return incoherent("phase sequence differs from the ruleset".into());
        }
        if let Some(resource) = self
            .markets
            .markets
            .keys()
            .find(|r| self.rules.market(**r).is_none())
        {
            return incoherent(format!("unconfigured market {resource}"));
        }
        let acts = self
            .acts
            .reservoir
            .iter()
            .chain(&self.acts.regular)
            .chain(&self.acts.selected)
            .chain(self.acts.execution.iter());
        for id in acts {
            if self.rules.act(id).is_none() {
                return incoherent(format!("unknown act {id}"));
            }
        }
        let events = self
            .events
            .deck
            .iter()
            .chain(&self.events.discard)
            .chain(self.events.current.iter())
            .chain(self.events.chained.iter());
        for id in events {
            if self.rules.event(id).is_none() {
                return incoherent(format!("unknown event {id}"));
            }
        }
        Ok(())
    }
}
