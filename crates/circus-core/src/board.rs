//! Worker placement.
//!
//! The board tracks how many workers each participant has on each location.
//! A placement is validated in full before anything changes; the slot is
//! then occupied, the location's effect fires, and only after that is the
//! deployment cost paid. A failed coin flip vacates the slot, kills the
//! worker, and waives the cost.

use crate::actions::GameEvent;
use crate::game::{GameError, GameState};
use crate::player::{PlayerId, Resource, ResourceHand};
use crate::rng::coin_flip;
use crate::rules::{LocationDef, LocationEffect, Ruleset};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// What happened to the worker after its location's effect fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Worker stays and the deployment cost is paid
    Stays,
    /// Worker died; slot vacated and cost waived
    Died,
}

/// Worker occupancy per location per participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub occupancy: BTreeMap<String, BTreeMap<PlayerId, u32>>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workers `player` has at a location
    pub fn workers_at(&self, location_id: &str, player: PlayerId) -> u32 {
        self.occupancy
            .get(location_id)
            .and_then(|m| m.get(&player))
            .copied()
            .unwrap_or(0)
    }

    /// All workers at a location
    pub fn total_at(&self, location_id: &str) -> u32 {
        self.occupancy
            .get(location_id)
            .map_or(0, |m| m.values().sum())
    }

    fn occupy(&mut self, location_id: &str, player: PlayerId) {
        *self
            .occupancy
            .entry(location_id.to_string())
            .or_default()
            .entry(player)
            .or_insert(0) += 1;
    }

    fn vacate(&mut self, location_id: &str, player: PlayerId) {
        if let Some(slots) = self.occupancy.get_mut(location_id) {
            if let Some(count) = slots.get_mut(&player) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    slots.remove(&player);
                }
            }
            if slots.is_empty() {
                self.occupancy.remove(location_id);
            }
        }
    }

    /// Remove every worker (cleanup)
    pub fn clear(&mut self) {
        self.occupancy.clear();
    }

    /// Check a placement without changing anything
    pub fn validate_placement<'r>(
        &self,
        rules: &'r Ruleset,
        state: &GameState,
        location_id: &str,
        player: PlayerId,
        upcoming_event: Option<&str>,
    ) -> Result<&'r LocationDef, GameError> {
        let location = rules
            .location(location_id)
            .ok_or_else(|| GameError::UnknownLocation(location_id.to_string()))?;
        if state.disabled_locations.contains(location_id) {
            return Err(GameError::LocationDisabled(location.name.clone()));
        }

        let p = state
            .get_player(player)
            .ok_or(GameError::UnknownPlayer(player))?;
        if p.workers.available == 0 {
            return Err(GameError::NoWorkers);
        }
        if let Some(cap) = location.max_per_participant {
            if self.workers_at(location_id, player) >= cap {
                return Err(GameError::LocationCapReached(location.name.clone()));
            }
        }
        if let Some(cap) = location.max_total {
            if self.total_at(location_id) >= cap {
                return Err(GameError::LocationFull(location.name.clone()));
            }
        }

        let mut needed = ResourceHand::single(Resource::Coins, state.deploy_cost(rules));
        match &location.effect {
            LocationEffect::ResourceConversion { cost, .. } => needed.add_hand(cost),
            LocationEffect::Information { cost } => {
                if upcoming_event.is_none() {
                    return Err(GameError::EmptyDeck);
                }
                needed.add_hand(cost);
            }
            LocationEffect::Market { resource } => {
                if rules.market(*resource).is_none() {
                    return Err(GameError::UnknownMarket(*resource));
                }
            }
            LocationEffect::GainResource { .. }
            | LocationEffect::CoinFlip { .. }
            | LocationEffect::TrackMovement { .. } => {}
        }

        if p.resources.coins < needed.coins {
            return Err(GameError::CannotAfford);
        }
        if !p.resources.can_afford(&needed) {
            return Err(GameError::MissingResources(location.name.clone()));
        }
        Ok(location)
    }

    /// Place a worker and fire the location's effect
    pub fn place_worker<R: Rng + ?Sized>(
        &mut self,
        rules: &Ruleset,
        state: &mut GameState,
        location_id: &str,
        player: PlayerId,
        upcoming_event: Option<&str>,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let location = self.validate_placement(rules, state, location_id, player, upcoming_event)?;

        self.occupy(location_id, player);
        let mut events = Vec::new();
        let effect = self.apply_effect(rules, state, location, player, upcoming_event, rng, &mut events);
        let placement = match effect {
            Ok(placement) => placement,
            Err(err) => {
                self.vacate(location_id, player);
                return Err(err);
            }
        };

        match placement {
            Placement::Stays => {
                let cost = state.deploy_cost(rules);
                let p = state.player_mut(player)?;
                p.resources.coins = p.resources.coins.saturating_sub(cost);
                p.workers.place();
                events.insert(
                    0,
                    GameEvent::WorkerPlaced {
                        player,
                        location_id: location_id.to_string(),
                        cost,
                    },
                );
            }
            Placement::Died => {
                state.player_mut(player)?.workers.lose();
                state.worker_supply += 1;
                self.vacate(location_id, player);
                events.push(GameEvent::WorkerLost {
                    player,
                    location_id: location_id.to_string(),
                });
            }
        }

        debug!(player, location = location_id, ?placement, "worker placement");
        Ok(events)
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_effect<R: Rng + ?Sized>(
        &self,
        rules: &Ruleset,
        state: &mut GameState,
        location: &LocationDef,
        player: PlayerId,
        upcoming_event: Option<&str>,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Result<Placement, GameError> {
        match &location.effect {
            LocationEffect::GainResource { resource, amount } => {
                let granted = state.take_from_supply(&ResourceHand::single(*resource, *amount));
                state.player_mut(player)?.resources.add_hand(&granted);
                events.push(GameEvent::ResourcesGained {
                    player,
                    resources: granted,
                });
            }

            LocationEffect::CoinFlip { reward } => {
                if !coin_flip(rng) {
                    return Ok(Placement::Died);
                }
                let granted = state.take_from_supply(reward);
                state.player_mut(player)?.resources.add_hand(&granted);
                events.push(GameEvent::ResourcesGained {
                    player,
                    resources: granted,
                });
            }

            LocationEffect::TrackMovement {
                tracks,
                sets_first_player,
            } => {
                let (applied, moved) = state.apply_tracks(rules, player, tracks)?;
                state.add_turn_bonus(player, &applied);
                events.extend(moved);

                if *sets_first_player {
                    let leads = {
                        let p = state
                            .get_player(player)
                            .ok_or(GameError::UnknownPlayer(player))?;
                        tracks
                            .entries()
                            .all(|(track, _)| p.is_leader_on(track, &state.players))
                    };
                    if leads {
                        state.first_player_override = Some(player);
                        events.push(GameEvent::FirstPlayerClaimed { player });
                    }
                }
            }

            LocationEffect::ResourceConversion {
                cost,
                reward,
                mint_workers,
            } => {
                let p = state.player_mut(player)?;
                if !p.resources.try_subtract(cost) {
                    return Err(GameError::MissingResources(location.name.clone()));
                }
                state.return_to_supply(cost);

                let granted = state.take_from_supply(reward);
                let minted = (*mint_workers).min(state.worker_supply);
                state.worker_supply -= minted;
                let p = state.player_mut(player)?;
                p.resources.add_hand(&granted);
                p.workers.recruit(minted);
                events.push(GameEvent::ResourcesConverted {
                    player,
                    cost: *cost,
                    reward: granted,
                    workers: minted,
                });
            }

            LocationEffect::Information { cost } => {
                let event_id = upcoming_event.ok_or(GameError::EmptyDeck)?;
                let p = state.player_mut(player)?;
                if !p.resources.try_subtract(cost) {
                    return Err(GameError::MissingResources(location.name.clone()));
                }
                state.return_to_supply(cost);
                state.peeked_events.insert(player, event_id.to_string());
                events.push(GameEvent::EventPeeked { player });
            }

            LocationEffect::Market { resource } => {
                state.enqueue_market(player, *resource);
                events.push(GameEvent::QueuedAtMarket {
                    player,
                    resource: *resource,
                });
            }
        }
        Ok(Placement::Stays)
    }

    /// Occupancy as (location, participant, count) for presentation
    pub fn snapshot(&self) -> Vec<(String, PlayerId, u32)> {
        self.occupancy
            .iter()
            .flat_map(|(loc, slots)| slots.iter().map(move |(p, n)| (loc.clone(), *p, *n)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Player, Track, Tracks};
    use rand::rngs::mock::StepRng;

    fn setup(count: u8) -> (Ruleset, GameState, Board) {
        let rules = Ruleset::standard();
        let players = (0..count)
            .map(|i| Player::new(i, format!("P{i}"), false))
            .collect();
        (rules.clone(), GameState::new(players, &rules), Board::new())
    }

    fn heads() -> StepRng {
        StepRng::new(0, 0)
    }

    fn tails() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_coin_flip_success_keeps_worker() {
        let (rules, mut state, mut board) = setup(2);
        board
            .place_worker(&rules, &mut state, "port", 0, None, &mut heads())
            .unwrap();

        let p = &state.players[0];
        assert_eq!(p.resources.mummers, 2);
        assert_eq!(p.resources.coins, 14);
        assert_eq!(p.workers.placed, 1);
        assert_eq!(p.workers.total(), 5);
        assert_eq!(board.workers_at("port", 0), 1);
        assert_eq!(state.supply.mummers, 48);
    }

    #[test]
    fn test_coin_flip_failure_kills_worker() {
        let (rules, mut state, mut board) = setup(2);
        let events = board
            .place_worker(&rules, &mut state, "war", 0, None, &mut tails())
            .unwrap();

        let p = &state.players[0];
        assert_eq!(p.resources.slaves, 0);
        assert_eq!(p.resources.coins, 15);
        assert_eq!(p.workers.total(), 4);
        assert_eq!(p.workers.placed, 0);
        assert_eq!(board.workers_at("war", 0), 0);
        assert_eq!(state.worker_supply, 21);
        assert!(matches!(events.last(), Some(GameEvent::WorkerLost { .. })));
    }

    #[test]
    fn test_per_participant_cap() {
        let (rules, mut state, mut board) = setup(2);
        board
            .place_worker(&rules, &mut state, "palace", 0, None, &mut heads())
            .unwrap();
        let err = board
            .place_worker(&rules, &mut state, "palace", 0, None, &mut heads())
            .unwrap_err();
        assert!(matches!(err, GameError::LocationCapReached(_)));
        assert_eq!(state.players[0].workers.placed, 1);
    }

    #[test]
    fn test_prison_total_cap() {
        let (rules, mut state, mut board) = setup(2);
        state.players[0].workers.available = 10;
        for _ in 0..6 {
            board
                .place_worker(&rules, &mut state, "prison", 0, None, &mut heads())
                .unwrap();
        }
        assert_eq!(state.players[0].resources.prisoners, 6);
        let err = board
            .place_worker(&rules, &mut state, "prison", 1, None, &mut heads())
            .unwrap_err();
        assert!(matches!(err, GameError::LocationFull(_)));
    }

    #[test]
    fn test_disabled_location_rejected() {
        let (rules, mut state, mut board) = setup(2);
        state.disabled_locations.insert("palace".into());
        let before = state.clone();
        let err = board
            .place_worker(&rules, &mut state, "palace", 0, None, &mut heads())
            .unwrap_err();
        assert!(matches!(err, GameError::LocationDisabled(_)));
        assert_eq!(state, before);
        assert!(board.occupancy.is_empty());
    }

    #[test]
    fn test_track_movement_is_turn_scoped_and_claims_first_player() {
        let (rules, mut state, mut board) = setup(2);
        board
            .place_worker(&rules, &mut state, "palace", 1, None, &mut heads())
            .unwrap();
        assert_eq!(state.players[1].tracks.empire, 4);
        assert_eq!(state.turn_bonuses[&1], Tracks::single(Track::Empire, 1));
        assert_eq!(state.first_player_override, Some(1));
    }

    #[test]
    fn test_guildhall_converts_into_worker() {
        let (rules, mut state, mut board) = setup(2);
        let err = board
            .place_worker(&rules, &mut state, "guildhall", 0, None, &mut heads())
            .unwrap_err();
        assert!(matches!(err, GameError::MissingResources(_)));
        assert!(board.occupancy.is_empty());

        state.players[0].resources.slaves = 1;
        board
            .place_worker(&rules, &mut state, "guildhall", 0, None, &mut heads())
            .unwrap();
        let p = &state.players[0];
        // 5 for the conversion, 1 to deploy
        assert_eq!(p.resources.coins, 9);
        assert_eq!(p.resources.slaves, 0);
        assert_eq!(p.workers.total(), 6);
        assert_eq!(state.worker_supply, 19);
        assert_eq!(state.supply.slaves, 51);
    }

    #[test]
    fn test_oracle_peeks_without_drawing() {
        let (rules, mut state, mut board) = setup(2);
        state.players[0].resources.animals = 1;
        let err = board
            .place_worker(&rules, &mut state, "oracle", 0, None, &mut heads())
            .unwrap_err();
        assert_eq!(err, GameError::EmptyDeck);

        board
            .place_worker(&rules, &mut state, "oracle", 0, Some("market_crash"), &mut heads())
            .unwrap();
        assert_eq!(state.peeked_events[&0], "market_crash");
        assert_eq!(state.players[0].resources.animals, 0);
    }

    #[test]
    fn test_market_location_enqueues() {
        let (rules, mut state, mut board) = setup(2);
        board
            .place_worker(&rules, &mut state, "slaves_market", 1, None, &mut heads())
            .unwrap();
        board
            .place_worker(&rules, &mut state, "slaves_market", 0, None, &mut heads())
            .unwrap();
        assert_eq!(state.market_queues[&Resource::Slaves], vec![1, 0]);
    }

    #[test]
    fn test_deploy_cost_modifier() {
        let (rules, mut state, mut board) = setup(2);
        state.worker_cost_modifier = 1;
        state.players[0].resources.coins = 1;
        let err = board
            .place_worker(&rules, &mut state, "prison", 0, None, &mut heads())
            .unwrap_err();
        assert_eq!(err, GameError::CannotAfford);

        state.players[0].resources.coins = 2;
        board
            .place_worker(&rules, &mut state, "prison", 0, None, &mut heads())
            .unwrap();
        assert_eq!(state.players[0].resources.coins, 0);
    }
}
