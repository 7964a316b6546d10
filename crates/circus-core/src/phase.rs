//! Phase sequencing and turn order.
//!
//! A round runs Bid, Deploy, Trade, Resolve, Cleanup. The first three are
//! interactive: they end once everyone in the turn order has passed since
//! the last non-pass action. Resolve and Cleanup are automatic.
//!
//! Trade is split by market: only the market currently being resolved is
//! open, and its queue is the turn order. When its queue has passed, the
//! next non-empty market opens with a fresh pass set.

use crate::acts::ActResolver;
use crate::actions::GameEvent;
use crate::game::{GameError, GameState};
use crate::player::{PlayerId, Resource, Track};
use crate::rules::{Ruleset, TurnOrderMethod};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The five phases of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Bid coins on acts
    Bid,
    /// Place workers at locations
    Deploy,
    /// Buy from markets in queue order
    Trade,
    /// Perform the selected acts
    Resolve,
    /// Upkeep, restock, next event
    Cleanup,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Bid,
        Phase::Deploy,
        Phase::Trade,
        Phase::Resolve,
        Phase::Cleanup,
    ];

    /// Whether the phase waits for participants to pass
    pub fn is_interactive(&self) -> bool {
        matches!(self, Phase::Bid | Phase::Deploy | Phase::Trade)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Bid => "Bid",
            Phase::Deploy => "Deploy",
            Phase::Trade => "Trade",
            Phase::Resolve => "Resolve",
            Phase::Cleanup => "Cleanup",
        };
        f.write_str(name)
    }
}

/// Orders the phases of a round and decides whose turn it is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMachine {
    /// Phase order within a round
    pub sequence: Vec<Phase>,
}

impl PhaseMachine {
    pub fn new(rules: &Ruleset) -> Self {
        Self {
            sequence: rules.phases.iter().map(|p| p.phase).collect(),
        }
    }

    /// Opening phase of every round
    pub fn first(&self) -> Result<Phase, GameError> {
        self.sequence
            .first()
            .copied()
            .ok_or_else(|| GameError::Invariant("no phases configured".into()))
    }

    /// Phase after `phase`, or `None` when the round is over
    pub fn next(&self, phase: Phase) -> Result<Option<Phase>, GameError> {
        let index = self
            .sequence
            .iter()
            .position(|&p| p == phase)
            .ok_or_else(|| GameError::Invariant(format!("phase {phase} is not in the sequence")))?;
        Ok(self.sequence.get(index + 1).copied())
    }

    pub fn turn_order_method(rules: &Ruleset, phase: Phase) -> Result<TurnOrderMethod, GameError> {
        rules
            .phase_rule(phase)
            .map(|r| r.turn_order)
            .ok_or_else(|| GameError::Invariant(format!("phase {phase} has no turn order")))
    }

    /// Seats sorted by a track, descending, ties kept in seat order
    pub fn track_order(state: &GameState, track: Track) -> Vec<PlayerId> {
        let mut seats: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
        seats.sort_by_key(|&id| {
            std::cmp::Reverse(state.get_player(id).map(|p| p.track(track)).unwrap_or(i32::MIN))
        });
        seats
    }

    /// Turn order for a phase
    pub fn turn_order(
        rules: &Ruleset,
        state: &GameState,
        acts: &ActResolver,
        phase: Phase,
    ) -> Result<Vec<PlayerId>, GameError> {
        let order = match Self::turn_order_method(rules, phase)? {
            TurnOrderMethod::TrackLeader(track) => {
                let mut order = Self::track_order(state, track);
                if phase == Phase::Bid {
                    if let Some(first) = state.first_player_override {
                        order.retain(|&p| p != first);
                        order.insert(0, first);
                    }
                }
                order
            }
            TurnOrderMethod::MarketQueue => state
                .current_market
                .and_then(|r| state.market_queues.get(&r))
                .cloned()
                .unwrap_or_default(),
            TurnOrderMethod::BidOrder => {
                let mut order = acts.bid_order();
                for player in &state.players {
                    if !order.contains(&player.id) {
                        order.push(player.id);
                    }
                }
                order
            }
            TurnOrderMethod::None => Vec::new(),
        };
        Ok(order)
    }

    /// Enter a phase: reset pass tracking, compute the turn order, and hand
    /// the turn to the first participant in it
    pub fn start_phase(
        &self,
        rules: &Ruleset,
        state: &mut GameState,
        acts: &ActResolver,
        phase: Phase,
    ) -> Result<Vec<GameEvent>, GameError> {
        let mut events = vec![GameEvent::PhaseStarted {
            phase,
            round: state.round,
        }];

        state.phase = phase;
        state.passed.clear();
        state.acted_this_turn = false;

        if phase == Phase::Trade {
            state.current_market = Self::first_open_market(rules, state, None);
            if let Some(resource) = state.current_market {
                events.push(GameEvent::MarketOpened { resource });
            }
        }

        state.turn_order = Self::turn_order(rules, state, acts, phase)?;
        if phase == Phase::Bid {
            state.first_player_override = None;
        }
        if let Some(&first) = state.turn_order.first() {
            state.current_player = first;
            if phase.is_interactive() {
                events.push(GameEvent::TurnStarted { player: first });
            }
        }

        debug!(%phase, round = state.round, order = ?state.turn_order, "phase started");
        Ok(events)
    }

    /// Everyone in the current turn order has passed
    pub fn all_passed(state: &GameState) -> bool {
        state.turn_order.iter().all(|p| state.passed.contains(p))
    }

    /// Whether the current phase is over
    pub fn should_end_phase(state: &GameState) -> bool {
        !state.phase.is_interactive() || Self::all_passed(state)
    }

    /// Next non-empty market after `after` in configured order
    fn first_open_market(
        rules: &Ruleset,
        state: &GameState,
        after: Option<Resource>,
    ) -> Option<Resource> {
        let start = match after {
            Some(current) => rules
                .markets
                .iter()
                .position(|m| m.resource == current)
                .map_or(rules.markets.len(), |i| i + 1),
            None => 0,
        };
        rules.markets[start.min(rules.markets.len())..]
            .iter()
            .map(|m| m.resource)
            .find(|r| state.market_queues.get(r).is_some_and(|q| !q.is_empty()))
    }

    /// Open the next market of the Trade phase. Returns `None` when no
    /// queued market is left and the phase should end.
    pub fn advance_market(rules: &Ruleset, state: &mut GameState) -> Option<Vec<GameEvent>> {
        let next = Self::first_open_market(rules, state, state.current_market);
        state.current_market = next;
        let resource = next?;

        state.turn_order = state.market_queues.get(&resource).cloned().unwrap_or_default();
        state.passed.clear();
        state.acted_this_turn = false;
        let mut events = vec![GameEvent::MarketOpened { resource }];
        if let Some(&first) = state.turn_order.first() {
            state.current_player = first;
            events.push(GameEvent::TurnStarted { player: first });
        }
        Some(events)
    }

    /// Next participant after the current one who has not passed
    pub fn next_participant(state: &GameState) -> Option<PlayerId> {
        let order = &state.turn_order;
        let start = order
            .iter()
            .position(|&p| p == state.current_player)
            .unwrap_or(order.len().saturating_sub(1));
        (1..=order.len())
            .map(|offset| order[(start + offset) % order.len()])
            .find(|p| !state.passed.contains(p))
    }

    /// The opening bidder may not pass before placing a bid, unless they
    /// have nothing they could bid on
    pub fn check_pass(
        rules: &Ruleset,
        state: &GameState,
        acts: &ActResolver,
        player: PlayerId,
    ) -> Result<(), GameError> {
        if state.phase != Phase::Bid || state.turn_order.first() != Some(&player) {
            return Ok(());
        }
        let bidder = state
            .get_player(player)
            .ok_or(GameError::UnknownPlayer(player))?;
        let has_bid = !bidder.bids.is_empty();
        let can_bid = bidder.resources.coins >= rules.limits.min_bid
            && acts.available_acts().any(|id| !bidder.has_bid_on(id));
        if !has_bid && can_bid {
            return Err(GameError::FirstBidderMustBid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Player, Tracks};
    use crate::rules::Ruleset;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn setup(count: u8) -> (Ruleset, GameState, ActResolver) {
        let rules = Ruleset::standard();
        let players = (0..count)
            .map(|i| Player::new(i, format!("P{i}"), false))
            .collect();
        let state = GameState::new(players, &rules);
        let mut rng = StdRng::seed_from_u64(1);
        let acts = ActResolver::new(&rules, &mut rng);
        (rules, state, acts)
    }

    #[test]
    fn test_track_order_is_stable_descending() {
        let (_, mut state, _) = setup(4);
        state.players[2].tracks = Tracks::new(5, 0, 0);
        state.players[3].tracks = Tracks::new(5, 0, 0);
        state.players[0].tracks = Tracks::new(1, 0, 0);
        state.players[1].tracks = Tracks::new(4, 0, 0);

        assert_eq!(
            PhaseMachine::track_order(&state, Track::Empire),
            vec![2, 3, 1, 0]
        );
    }

    #[test]
    fn test_first_player_override_leads_bid_once() {
        let (rules, mut state, acts) = setup(3);
        let machine = PhaseMachine::new(&rules);
        state.first_player_override = Some(2);

        machine.start_phase(&rules, &mut state, &acts, Phase::Bid).unwrap();
        assert_eq!(state.turn_order[0], 2);
        assert_eq!(state.current_player, 2);
        assert_eq!(state.first_player_override, None);
    }

    #[test]
    fn test_missing_turn_order_is_invariant() {
        let (mut rules, state, acts) = setup(2);
        rules.phases.retain(|p| p.phase != Phase::Deploy);
        let err = PhaseMachine::turn_order(&rules, &state, &acts, Phase::Deploy).unwrap_err();
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_next_phase_and_round_end() {
        let (rules, _, _) = setup(2);
        let machine = PhaseMachine::new(&rules);
        assert_eq!(machine.first().unwrap(), Phase::Bid);
        assert_eq!(machine.next(Phase::Trade).unwrap(), Some(Phase::Resolve));
        assert_eq!(machine.next(Phase::Cleanup).unwrap(), None);
    }

    #[test]
    fn test_next_participant_skips_passed() {
        let (_, mut state, _) = setup(4);
        state.turn_order = vec![0, 1, 2, 3];
        state.current_player = 0;
        state.passed.insert(1);
        state.passed.insert(2);
        assert_eq!(PhaseMachine::next_participant(&state), Some(3));

        state.current_player = 3;
        assert_eq!(PhaseMachine::next_participant(&state), Some(0));

        state.passed.extend([0, 3]);
        assert_eq!(PhaseMachine::next_participant(&state), None);
        assert!(PhaseMachine::all_passed(&state));
    }

    #[test]
    fn test_trade_visits_markets_in_order() {
        let (rules, mut state, acts) = setup(3);
        let machine = PhaseMachine::new(&rules);
        state.market_queues.insert(Resource::Slaves, vec![2, 0]);
        state.market_queues.insert(Resource::Mummers, vec![1]);

        machine.start_phase(&rules, &mut state, &acts, Phase::Trade).unwrap();
        assert_eq!(state.current_market, Some(Resource::Mummers));
        assert_eq!(state.turn_order, vec![1]);

        let events = PhaseMachine::advance_market(&rules, &mut state).unwrap();
        assert!(events.contains(&GameEvent::MarketOpened {
            resource: Resource::Slaves
        }));
        assert_eq!(state.turn_order, vec![2, 0]);
        assert_eq!(state.current_player, 2);

        assert!(PhaseMachine::advance_market(&rules, &mut state).is_none());
        assert_eq!(state.current_market, None);
    }

    #[test]
    fn test_trade_with_no_queues_ends_immediately() {
        let (rules, mut state, acts) = setup(2);
        let machine = PhaseMachine::new(&rules);
        machine.start_phase(&rules, &mut state, &acts, Phase::Trade).unwrap();
        assert!(state.turn_order.is_empty());
        assert!(PhaseMachine::should_end_phase(&state));
    }

    #[test]
    fn test_first_bidder_cannot_pass_before_bidding() {
        let (rules, mut state, acts) = setup(2);
        for player in &mut state.players {
            player.resources.coins = 5;
        }
        let machine = PhaseMachine::new(&rules);
        machine.start_phase(&rules, &mut state, &acts, Phase::Bid).unwrap();
        let first = state.turn_order[0];
        let second = state.turn_order[1];

        assert_eq!(
            PhaseMachine::check_pass(&rules, &state, &acts, first),
            Err(GameError::FirstBidderMustBid)
        );
        assert!(PhaseMachine::check_pass(&rules, &state, &acts, second).is_ok());

        // Broke first bidder is allowed to pass
        state.players[first as usize].resources.coins = 0;
        assert!(PhaseMachine::check_pass(&rules, &state, &acts, first).is_ok());
    }
}
