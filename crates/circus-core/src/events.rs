//! Event deck and effect resolution.
//!
//! One event is drawn at the start of every round and applied at once. The
//! deck is reshuffled from the discard pile when it runs out. A chaining
//! event shuffles the discard back in and resolves one more card; that card
//! never chains again.

use crate::actions::GameEvent;
use crate::game::{GameError, GameState};
use crate::market::Markets;
use crate::player::{Resource, ResourceHand};
use crate::rules::{EventCard, Ruleset};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Event deck, discard pile, and this round's cards (all by id)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResolver {
    /// Top of the deck is the first entry
    pub deck: Vec<String>,
    pub discard: Vec<String>,
    /// Card drawn for this round
    pub current: Option<String>,
    /// Card drawn by a chaining event this round
    pub chained: Option<String>,
}

impl EventResolver {
    /// Shuffled deck of every configured event
    pub fn new<R: Rng + ?Sized>(rules: &Ruleset, rng: &mut R) -> Self {
        let mut deck: Vec<String> = rules.events.iter().map(|e| e.id.clone()).collect();
        deck.shuffle(rng);
        Self {
            deck,
            ..Default::default()
        }
    }

    /// Next card to be drawn, if the deck has one
    pub fn upcoming(&self) -> Option<&str> {
        self.deck.first().map(String::as_str)
    }

    fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.deck.append(&mut self.discard);
        self.deck.shuffle(rng);
    }

    /// Draw the top card, reshuffling the discard pile if the deck is empty
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        if self.deck.is_empty() {
            self.reshuffle(rng);
        }
        if self.deck.is_empty() {
            None
        } else {
            Some(self.deck.remove(0))
        }
    }

    /// Draw and apply this round's event
    pub fn start_round<R: Rng + ?Sized>(
        &mut self,
        rules: &Ruleset,
        state: &mut GameState,
        markets: &mut Markets,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        state.peeked_events.clear();
        let Some(id) = self.draw(rng) else {
            return Ok(Vec::new());
        };
        self.current = Some(id.clone());
        let card = rules
            .event(&id)
            .ok_or_else(|| GameError::Invariant(format!("event {id} is not in the ruleset")))?;
        self.resolve(rules, card, state, markets, rng, true)
    }

    /// Apply a card's effects in order
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        rules: &Ruleset,
        card: &EventCard,
        state: &mut GameState,
        markets: &mut Markets,
        rng: &mut R,
        allow_chain: bool,
    ) -> Result<Vec<GameEvent>, GameError> {
        info!(event = %card.id, round = state.round, "event drawn");
        let effects = &card.effects;
        let mut events = vec![GameEvent::EventDrawn {
            event_id: card.id.clone(),
            name: card.name.clone(),
        }];

        state.blocked_tracks.extend(effects.blocked_tracks.iter().copied());
        state
            .disabled_locations
            .extend(effects.disabled_locations.iter().cloned());

        for (&resource, &delta) in &effects.market_stock {
            let (Some(market), Some(market_rules)) =
                (markets.get_mut(resource), rules.market(resource))
            else {
                continue;
            };
            let changed = if delta >= 0 {
                market.add_units(delta as usize, market_rules.event_tier);
                delta
            } else {
                let removed = market.remove_units(delta.unsigned_abs() as usize, market_rules.event_tier);
                state.supply.add(resource, removed as u32);
                -(removed as i32)
            };
            if changed != 0 {
                events.push(GameEvent::MarketStockChanged {
                    resource,
                    delta: changed,
                });
            }
        }

        if let Some(cost) = effects.player_cost {
            for index in 0..state.players.len() {
                let player = &mut state.players[index];
                let id = player.id;
                if player.resources.coins >= cost.coins {
                    player.resources.coins -= cost.coins;
                    events.push(GameEvent::CoinsPaid {
                        player: id,
                        coins: cost.coins,
                    });
                    continue;
                }
                let mut lost = ResourceHand::new();
                for _ in 0..cost.resource_loss {
                    let held = Resource::MATERIALS
                        .into_iter()
                        .find(|&r| player.resources.get(r) > 0);
                    match held {
                        Some(resource) => lost.add(resource, player.resources.take(resource, 1)),
                        None => break,
                    }
                }
                if !lost.is_empty() {
                    state.return_to_supply(&lost);
                    events.push(GameEvent::ResourcesLost {
                        player: id,
                        resources: lost,
                    });
                }
            }
        }

        if let Some(gain) = effects.player_gain {
            for player in &mut state.players {
                let coins = gain.amount(player);
                player.resources.coins += coins;
                if coins > 0 {
                    events.push(GameEvent::CoinsReceived {
                        player: player.id,
                        coins,
                    });
                }
            }
        }

        if !effects.track_delta.is_zero() {
            let ids: Vec<_> = state.players.iter().map(|p| p.id).collect();
            for id in ids {
                let (_, moved) = state.apply_tracks(rules, id, &effects.track_delta)?;
                events.extend(moved);
            }
        }

        state.market_price_modifier += effects.market_price_modifier;
        state.worker_cost_modifier += effects.worker_cost_modifier;

        if effects.draw_another && allow_chain {
            self.reshuffle(rng);
            if let Some(id) = self.draw(rng) {
                let chained = rules
                    .event(&id)
                    .ok_or_else(|| GameError::Invariant(format!("event {id} is not in the ruleset")))?;
                self.chained = Some(id);
                events.extend(self.resolve(rules, chained, state, markets, rng, false)?);
            }
        }

        Ok(events)
    }

    /// Discard this round's cards and clear round-scoped modifiers
    pub fn end_round(&mut self, state: &mut GameState) {
        self.discard.extend(self.current.take());
        self.discard.extend(self.chained.take());
        state.blocked_tracks.clear();
        state.disabled_locations.clear();
        state.market_price_modifier = 0;
        state.worker_cost_modifier = 0;
    }
}
