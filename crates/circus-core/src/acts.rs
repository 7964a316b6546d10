//! Act display, bidding, and resolution.
//!
//! Each round shows a rotating display of regular acts plus one randomly
//! drawn execution act. A bid is an entry commitment: it costs coins at bid
//! time and marks the act for resolution, but does not decide who wins.
//!
//! At resolution, bidders who still hold the act's cost qualify. A
//! single-winner act with several qualifiers is settled by a dice
//! competition; ties re-roll among the tied participants only.

use crate::actions::GameEvent;
use crate::game::{GameError, GameState};
use crate::player::{PendingBid, PlayerId};
use crate::rng::roll_die;
use crate::rules::{ActCard, Ruleset};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, info};

/// A recorded bid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub player: PlayerId,
    pub act_id: String,
    pub coins: u32,
}

/// Result of a dice competition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Competition {
    pub winner: PlayerId,
    /// Every roll round, in order
    pub rounds: Vec<Vec<(PlayerId, u8)>>,
    /// The re-roll limit was hit and the first tied seat won
    pub fallback: bool,
}

/// Roll until one contender holds the strict maximum. Ties re-roll among
/// the tied contenders only, at most `max_rerolls` times; after that the
/// first contender (seat order) of the last tied group wins.
pub fn dice_competition<R: Rng + ?Sized>(
    contenders: &[PlayerId],
    max_rerolls: u32,
    rng: &mut R,
) -> Option<Competition> {
    let mut tied: Vec<PlayerId> = contenders.to_vec();
    tied.sort_unstable();
    tied.dedup();
    let mut rounds = Vec::new();

    for _ in 0..=max_rerolls {
        let rolls: Vec<(PlayerId, u8)> = tied.iter().map(|&p| (p, roll_die(rng))).collect();
        let best = rolls.iter().map(|&(_, r)| r).max()?;
        tied = rolls
            .iter()
            .filter(|&&(_, r)| r == best)
            .map(|&(p, _)| p)
            .collect();
        rounds.push(rolls);
        if let [winner] = tied[..] {
            return Some(Competition {
                winner,
                rounds,
                fallback: false,
            });
        }
    }

    tied.first().map(|&winner| Competition {
        winner,
        rounds,
        fallback: true,
    })
}

/// What happened when one act was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActOutcome {
    pub act_id: String,
    pub qualifiers: Vec<PlayerId>,
    pub winner: Option<PlayerId>,
}

/// Act pool, this round's display, and the round's bids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActResolver {
    /// Regular acts waiting to be displayed, front first
    pub reservoir: VecDeque<String>,
    /// Regular acts on display
    pub regular: Vec<String>,
    /// The round's execution act
    pub execution: Option<String>,
    /// Acts with at least one bid, in first-bid order
    pub selected: Vec<String>,
    pub bids: Vec<Bid>,
    /// Acts that had a qualifier this round
    pub resolved: Vec<String>,
}

impl ActResolver {
    /// Shuffle the regular acts and lay out the first display
    pub fn new<R: Rng + ?Sized>(rules: &Ruleset, rng: &mut R) -> Self {
        let mut pool: Vec<String> = rules.acts.iter().map(|a| a.id.clone()).collect();
        pool.shuffle(rng);
        let mut acts = Self {
            reservoir: pool.into(),
            ..Default::default()
        };
        acts.setup_round(rules, rng);
        acts
    }

    /// Rotate the display: performed acts go to the back of the reservoir,
    /// the rest stay, and the display is topped up from the front
    pub fn setup_round<R: Rng + ?Sized>(&mut self, rules: &Ruleset, rng: &mut R) {
        let resolved = std::mem::take(&mut self.resolved);
        let (gone, kept): (Vec<String>, Vec<String>) = std::mem::take(&mut self.regular)
            .into_iter()
            .partition(|id| resolved.contains(id));
        self.regular = kept;
        self.reservoir.extend(gone);
        while self.regular.len() < rules.regular_per_round {
            match self.reservoir.pop_front() {
                Some(id) => self.regular.push(id),
                None => break,
            }
        }

        self.execution = rules
            .execution_acts
            .choose(rng)
            .map(|a| a.id.clone());
        self.selected.clear();
        self.bids.clear();
    }

    /// Every act that can be bid on this round
    pub fn available_acts(&self) -> impl Iterator<Item = &str> + '_ {
        self.regular
            .iter()
            .map(String::as_str)
            .chain(self.execution.as_deref())
    }

    pub fn is_available(&self, act_id: &str) -> bool {
        self.available_acts().any(|id| id == act_id)
    }

    /// Participants in order of their first bid
    pub fn bid_order(&self) -> Vec<PlayerId> {
        let mut order = Vec::new();
        for bid in &self.bids {
            if !order.contains(&bid.player) {
                order.push(bid.player);
            }
        }
        order
    }

    /// Record a bid: coins are spent now and the act is marked for resolution
    pub fn place_bid(
        &mut self,
        rules: &Ruleset,
        state: &mut GameState,
        player: PlayerId,
        act_id: &str,
        coins: u32,
    ) -> Result<GameEvent, GameError> {
        if rules.act(act_id).is_none() {
            return Err(GameError::UnknownAct(act_id.to_string()));
        }
        if !self.is_available(act_id) {
            return Err(GameError::ActNotAvailable(act_id.to_string()));
        }
        if coins < rules.limits.min_bid {
            return Err(GameError::BidTooLow {
                min: rules.limits.min_bid,
            });
        }
        let p = state.player_mut(player)?;
        if p.has_bid_on(act_id) {
            return Err(GameError::DuplicateBid(act_id.to_string()));
        }
        if p.resources.coins < coins {
            return Err(GameError::CannotAfford);
        }

        p.resources.coins -= coins;
        p.bids.push(PendingBid {
            act_id: act_id.to_string(),
            coins,
        });
        self.bids.push(Bid {
            player,
            act_id: act_id.to_string(),
            coins,
        });
        if !self.selected.iter().any(|id| id == act_id) {
            self.selected.push(act_id.to_string());
        }

        Ok(GameEvent::BidPlaced {
            player,
            act_id: act_id.to_string(),
            coins,
        })
    }

    /// Bidders on an act, in seat order
    fn bidders(&self, act_id: &str) -> Vec<PlayerId> {
        let set: BTreeSet<PlayerId> = self
            .bids
            .iter()
            .filter(|b| b.act_id == act_id)
            .map(|b| b.player)
            .collect();
        set.into_iter().collect()
    }

    /// Resolve one act
    pub fn resolve_act<R: Rng + ?Sized>(
        &mut self,
        rules: &Ruleset,
        state: &mut GameState,
        act_id: &str,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Result<ActOutcome, GameError> {
        let act: &ActCard = rules
            .act(act_id)
            .ok_or_else(|| GameError::Invariant(format!("selected act {act_id} is not in the ruleset")))?;
        let cost = act.qualifying_cost();

        let qualifiers: Vec<PlayerId> = self
            .bidders(act_id)
            .into_iter()
            .filter(|&p| {
                state
                    .get_player(p)
                    .is_some_and(|p| p.resources.can_afford(&cost))
            })
            .collect();

        if qualifiers.is_empty() {
            events.push(GameEvent::ActSkipped {
                act_id: act_id.to_string(),
            });
            return Ok(ActOutcome {
                act_id: act_id.to_string(),
                qualifiers,
                winner: None,
            });
        }

        let winner = if !act.has_winner {
            None
        } else if let [only] = qualifiers[..] {
            Some(only)
        } else {
            let competition = dice_competition(&qualifiers, rules.limits.max_rerolls, rng)
                .ok_or_else(|| GameError::Invariant(format!("no winner for {act_id}")))?;
            for rolls in &competition.rounds {
                events.push(GameEvent::DiceRolled {
                    act_id: act_id.to_string(),
                    rolls: rolls.clone(),
                });
            }
            if competition.fallback {
                debug!(act = act_id, "re-roll limit reached");
            }
            Some(competition.winner)
        };

        for &id in &qualifiers {
            let p = state.player_mut(id)?;
            p.resources.coins -= act.coin_cost.min(p.resources.coins);
        }

        let rewarded: Vec<PlayerId> = match winner {
            Some(w) => vec![w],
            None => qualifiers.clone(),
        };
        for &id in &rewarded {
            let (_, moved) = state.apply_tracks(rules, id, &act.tracks)?;
            events.extend(moved);
            if act.consumes_resources {
                let consumed = act.resource_cost.materials();
                if state.player_mut(id)?.resources.try_subtract(&consumed) {
                    state.return_to_supply(&consumed);
                }
            }
        }

        if let Some(formula) = act.coin_reward {
            for &id in &qualifiers {
                let p = state.player_mut(id)?;
                let coins = formula.amount(p);
                p.resources.coins += coins;
                if coins > 0 {
                    events.push(GameEvent::CoinsReceived { player: id, coins });
                }
            }
        }

        events.push(GameEvent::ActResolved {
            act_id: act_id.to_string(),
            winner,
            qualifiers: qualifiers.clone(),
        });
        self.resolved.push(act_id.to_string());
        info!(act = act_id, ?winner, ?qualifiers, "act resolved");

        Ok(ActOutcome {
            act_id: act_id.to_string(),
            qualifiers,
            winner,
        })
    }

    /// Resolve every selected act (the execution act always runs last if
    /// nobody bid on it earlier), then apply non-participation penalties
    pub fn resolve_all<R: Rng + ?Sized>(
        &mut self,
        rules: &Ruleset,
        state: &mut GameState,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let mut order = self.selected.clone();
        if let Some(execution) = &self.execution {
            if !order.contains(execution) {
                order.push(execution.clone());
            }
        }

        let mut events = Vec::new();
        let mut performed = Vec::new();
        for act_id in &order {
            let outcome = self.resolve_act(rules, state, act_id, rng, &mut events)?;
            if !outcome.qualifiers.is_empty() {
                performed.push(outcome);
            }
        }

        let took_part: BTreeSet<PlayerId> = performed
            .iter()
            .flat_map(|o| o.qualifiers.iter().copied())
            .collect();
        let absent: Vec<PlayerId> = state
            .players
            .iter()
            .map(|p| p.id)
            .filter(|id| !took_part.contains(id))
            .collect();

        for id in absent {
            for outcome in &performed {
                let Some(act) = rules.act(&outcome.act_id) else {
                    continue;
                };
                if act.non_participant_penalty.is_zero() {
                    continue;
                }
                let (_, moved) = state.apply_tracks(rules, id, &act.non_participant_penalty)?;
                events.extend(moved);
                events.push(GameEvent::PenaltyApplied {
                    player: id,
                    act_id: act.id.clone(),
                    penalty: act.non_participant_penalty,
                });
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Player, ResourceHand, Track, Tracks};
    use crate::rules::CoinFormula;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(count: u8) -> (Ruleset, GameState, ActResolver, StdRng) {
        let rules = Ruleset::standard();
        let players = (0..count)
            .map(|i| Player::new(i, format!("P{i}"), false))
            .collect();
        let state = GameState::new(players, &rules);
        let mut rng = StdRng::seed_from_u64(3);
        let acts = ActResolver::new(&rules, &mut rng);
        (rules, state, acts, rng)
    }

    /// Put a specific act on display
    fn show(acts: &mut ActResolver, id: &str) {
        if !acts.is_available(id) {
            acts.regular.push(id.to_string());
        }
    }

    #[test]
    fn test_new_display() {
        let (rules, _, acts, _) = setup(2);
        assert_eq!(acts.regular.len(), 5);
        assert_eq!(acts.reservoir.len(), 10);
        let execution = acts.execution.as_deref().unwrap();
        assert!(rules.execution_acts.iter().any(|a| a.id == execution));
        assert_eq!(acts.available_acts().count(), 6);
    }

    #[test]
    fn test_rotation_keeps_unperformed_acts() {
        let (rules, _, mut acts, mut rng) = setup(2);
        let performed = acts.regular[1].clone();
        let kept: Vec<String> = acts
            .regular
            .iter()
            .filter(|id| **id != performed)
            .cloned()
            .collect();
        acts.resolved.push(performed.clone());

        acts.setup_round(&rules, &mut rng);
        assert_eq!(acts.regular.len(), 5);
        assert_eq!(&acts.regular[..4], &kept[..]);
        assert_eq!(acts.reservoir.back(), Some(&performed));
    }

    #[test]
    fn test_place_bid_validation() {
        let (rules, mut state, mut acts, _) = setup(2);
        let id = acts.regular[0].clone();

        assert_eq!(
            acts.place_bid(&rules, &mut state, 0, &id, 0),
            Err(GameError::BidTooLow { min: 1 })
        );
        assert_eq!(
            acts.place_bid(&rules, &mut state, 0, &id, 16),
            Err(GameError::CannotAfford)
        );
        assert!(matches!(
            acts.place_bid(&rules, &mut state, 0, "nope", 1),
            Err(GameError::UnknownAct(_))
        ));

        acts.place_bid(&rules, &mut state, 0, &id, 2).unwrap();
        assert_eq!(state.players[0].resources.coins, 13);
        assert_eq!(acts.selected, vec![id.clone()]);
        assert_eq!(
            acts.place_bid(&rules, &mut state, 0, &id, 1),
            Err(GameError::DuplicateBid(id.clone()))
        );
        assert_eq!(state.players[0].resources.coins, 13);
    }

    #[test]
    fn test_bid_order_is_first_bid_order() {
        let (rules, mut state, mut acts, _) = setup(3);
        let a = acts.regular[0].clone();
        let b = acts.regular[1].clone();
        acts.place_bid(&rules, &mut state, 2, &a, 1).unwrap();
        acts.place_bid(&rules, &mut state, 0, &b, 1).unwrap();
        acts.place_bid(&rules, &mut state, 2, &b, 1).unwrap();
        assert_eq!(acts.bid_order(), vec![2, 0]);
        assert_eq!(acts.selected, vec![a, b]);
    }

    #[test]
    fn test_dice_competition_unique_winner() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let result = dice_competition(&[0, 1, 2, 3], 10, &mut rng).unwrap();
            assert!(result.winner < 4);
            let last = result.rounds.last().unwrap();
            let best = last.iter().map(|(_, r)| *r).max().unwrap();
            if !result.fallback {
                assert_eq!(last.iter().filter(|(_, r)| *r == best).count(), 1);
            }
        }
    }

    #[test]
    fn test_dice_competition_fallback_after_limit() {
        // Constant stream: every roll ties
        let mut rng = StepRng::new(0, 0);
        let result = dice_competition(&[3, 1], 10, &mut rng).unwrap();
        assert!(result.fallback);
        assert_eq!(result.winner, 1);
        assert_eq!(result.rounds.len(), 11);
    }

    #[test]
    fn test_winner_takes_tracks_everyone_takes_coins() {
        let (rules, mut state, mut acts, _) = setup(2);
        show(&mut acts, "gladiator_combat");
        for id in 0..2 {
            state.players[id as usize].resources.slaves = 2;
            acts.place_bid(&rules, &mut state, id, "gladiator_combat", 1).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(5);
        let mut events = Vec::new();
        let outcome = acts
            .resolve_act(&rules, &mut state, "gladiator_combat", &mut rng, &mut events)
            .unwrap();
        let winner = outcome.winner.unwrap();
        let loser = 1 - winner;

        let w = &state.players[winner as usize];
        let l = &state.players[loser as usize];
        assert_eq!(w.tracks, Tracks::new(4, 6, 3));
        assert_eq!(l.tracks, Tracks::uniform(3));
        // Winner's slaves are consumed, loser keeps theirs
        assert_eq!(w.resources.slaves, 0);
        assert_eq!(l.resources.slaves, 2);
        assert_eq!(w.resources.coins, 19);
        assert_eq!(l.resources.coins, 19);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::DiceRolled { .. })));
    }

    #[test]
    fn test_shared_act_rewards_all_qualifiers() {
        let (rules, mut state, mut acts, mut rng) = setup(3);
        show(&mut acts, "sacred_music");
        for id in 0..3 {
            acts.place_bid(&rules, &mut state, id, "sacred_music", 1).unwrap();
        }
        state.players[0].resources.mummers = 2;
        state.players[1].resources.mummers = 2;
        // Player 2 holds no mummers and is filtered out

        let mut events = Vec::new();
        let outcome = acts
            .resolve_act(&rules, &mut state, "sacred_music", &mut rng, &mut events)
            .unwrap();
        assert_eq!(outcome.qualifiers, vec![0, 1]);
        assert_eq!(outcome.winner, None);
        for id in 0..2 {
            let p = &state.players[id];
            assert_eq!(p.tracks, Tracks::new(3, 4, 6));
            // 15 - 1 bid - 1 cost + 4 reward; mummers are returned
            assert_eq!(p.resources.coins, 17);
            assert_eq!(p.resources.mummers, 2);
        }
        assert_eq!(state.players[2].resources.coins, 14);
    }

    #[test]
    fn test_penalty_for_absent_participants_once_per_act() {
        let (rules, mut state, mut acts, mut rng) = setup(3);
        acts.execution = None;
        show(&mut acts, "choral_performance");
        show(&mut acts, "venatio");
        state.players[0].resources = ResourceHand::with_amounts(10, 1, 2, 0, 0);
        acts.place_bid(&rules, &mut state, 0, "choral_performance", 1).unwrap();
        acts.place_bid(&rules, &mut state, 0, "venatio", 1).unwrap();
        // Player 1 bids but cannot perform; still counts as absent
        acts.place_bid(&rules, &mut state, 1, "venatio", 1).unwrap();

        let events = acts.resolve_all(&rules, &mut state, &mut rng).unwrap();
        let penalties = events
            .iter()
            .filter(|e| matches!(e, GameEvent::PenaltyApplied { .. }))
            .count();
        assert_eq!(penalties, 4);
        for id in 1..3 {
            assert_eq!(state.players[id].tracks, Tracks::new(3, 2, 2));
        }
        assert_eq!(state.players[0].track(Track::Church), 4);
    }

    #[test]
    fn test_per_unit_reward_formula() {
        let (mut rules, mut state, mut acts, mut rng) = setup(2);
        let act = rules.acts.iter_mut().find(|a| a.id == "venatio").unwrap();
        act.coin_reward = Some(CoinFormula::PerResourceUnit(crate::player::Resource::Prisoners));
        show(&mut acts, "venatio");
        state.players[0].resources.animals = 2;
        state.players[0].resources.prisoners = 3;
        acts.place_bid(&rules, &mut state, 0, "venatio", 1).unwrap();

        let mut events = Vec::new();
        acts.resolve_act(&rules, &mut state, "venatio", &mut rng, &mut events)
            .unwrap();
        assert_eq!(state.players[0].resources.coins, 17);
    }
}
