//! AI players for Circus Maximus.
//!
//! - Easy: random valid moves
//! - Medium: bids on acts it can qualify for, deploys toward the materials
//!   those acts need, and buys when the price is right

use crate::actions::Action;
use crate::engine::Engine;
use crate::game::GameError;
use crate::phase::Phase;
use crate::player::{Player, PlayerId, Resource};
use crate::rules::{ActCard, LocationEffect};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    Medium,
}

/// A bot player that can decide on actions
pub struct Bot {
    pub player_id: PlayerId,
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, difficulty: BotDifficulty) -> Self {
        Self {
            player_id,
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            player_id,
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose an action from the valid actions
    pub fn choose_action(&mut self, game: &Engine) -> Option<Action> {
        let valid_actions = game.valid_actions(self.player_id);
        if valid_actions.is_empty() {
            return None;
        }

        match self.difficulty {
            BotDifficulty::Easy => self.choose_easy(&valid_actions),
            BotDifficulty::Medium => self.choose_medium(game, &valid_actions),
        }
    }

    /// Easy: Just pick a random valid action
    fn choose_easy(&mut self, actions: &[Action]) -> Option<Action> {
        actions.choose(&mut self.rng).cloned()
    }

    fn choose_medium(&mut self, game: &Engine, actions: &[Action]) -> Option<Action> {
        let player = game.state.get_player(self.player_id)?;
        let choice = match game.state.phase {
            Phase::Bid => self.medium_bid(game, player, actions),
            Phase::Deploy => self.medium_deploy(game, player, actions),
            Phase::Trade => Self::medium_trade(game, player, actions),
            Phase::Resolve | Phase::Cleanup => None,
        };

        choice
            .or_else(|| actions.iter().find(|a| a.is_pass()).cloned())
            .or_else(|| actions.choose(&mut self.rng).cloned())
    }

    /// Acts this player could qualify for with what it holds now
    fn act_score(act: &ActCard, player: &Player) -> Option<i32> {
        if !player.resources.can_afford(&act.qualifying_cost()) {
            return None;
        }
        let reward = match act.coin_reward {
            Some(formula) => formula.amount(player) as i32,
            None => 0,
        };
        Some(act.tracks.sum() * 2 + reward - act.coin_cost as i32)
    }

    /// Minimum bid on the best act it can qualify for; a second bid only
    /// when flush with coins
    fn medium_bid(&mut self, game: &Engine, player: &Player, actions: &[Action]) -> Option<Action> {
        let min_bid = game.rules.limits.min_bid;
        let can_pass = actions.contains(&Action::Pass);
        if can_pass
            && (player.bids.len() >= 2 || (player.bids.len() == 1 && player.resources.coins < 8))
        {
            return Some(Action::Pass);
        }

        let best = actions
            .iter()
            .filter_map(|action| match action {
                Action::Bid { act_id, coins } if *coins == min_bid => {
                    let act = game.rules.act(act_id)?;
                    Some((action, Self::act_score(act, player)?))
                }
                _ => None,
            })
            .max_by_key(|(_, score)| *score);

        match best {
            Some((action, _)) => Some(action.clone()),
            // Opening bidder with nothing to qualify for still has to bid
            None if !can_pass => actions
                .iter()
                .filter(|a| matches!(a, Action::Bid { coins, .. } if *coins == min_bid))
                .choose(&mut self.rng)
                .cloned(),
            None => None,
        }
    }

    /// First material the bot lacks for an act on display
    fn wanted_material(game: &Engine, player: &Player) -> Option<Resource> {
        game.acts
            .available_acts()
            .filter_map(|id| game.rules.act(id))
            .filter_map(|act| {
                let cost = act.resource_cost;
                Resource::MATERIALS
                    .into_iter()
                    .find(|&r| player.resources.get(r) < cost.get(r))
            })
            .next()
    }

    fn medium_deploy(&mut self, game: &Engine, player: &Player, actions: &[Action]) -> Option<Action> {
        // Keep a worker back only when broke
        if player.resources.coins < 2 && actions.contains(&Action::Pass) {
            return Some(Action::Pass);
        }
        let wanted = Self::wanted_material(game, player);

        let mut scored: Vec<(&Action, i32)> = actions
            .iter()
            .filter_map(|action| {
                let Action::PlaceWorker { location_id } = action else {
                    return None;
                };
                let location = game.rules.location(location_id)?;
                let score = match &location.effect {
                    LocationEffect::Market { resource } if Some(*resource) == wanted => 6,
                    LocationEffect::CoinFlip { reward }
                        if wanted.is_some_and(|r| reward.get(r) > 0) =>
                    {
                        5
                    }
                    LocationEffect::TrackMovement {
                        sets_first_player, ..
                    } => {
                        if *sets_first_player {
                            4
                        } else {
                            3
                        }
                    }
                    LocationEffect::GainResource { .. } => 3,
                    LocationEffect::ResourceConversion { mint_workers, .. } if *mint_workers > 0 => {
                        if player.workers.total() < 6 {
                            4
                        } else {
                            0
                        }
                    }
                    LocationEffect::Information { .. } => 1,
                    _ => 2,
                };
                Some((action, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        let top_score = scored.first()?.1;
        let top: Vec<_> = scored.iter().filter(|(_, s)| *s == top_score).collect();
        top.choose(&mut self.rng).map(|(a, _)| (*a).clone())
    }

    /// Buy while the price stays within a third of the purse
    fn medium_trade(game: &Engine, player: &Player, actions: &[Action]) -> Option<Action> {
        let buy = actions
            .iter()
            .find(|a| matches!(a, Action::BuyResource { .. }))?;
        let price = game
            .state
            .current_market
            .and_then(|r| game.markets.get(r))
            .and_then(|m| m.effective_price(game.state.market_price_modifier))?;
        (price * 3 <= player.resources.coins).then(|| buy.clone())
    }
}

/// Play one bot turn for whoever is active: act, then end the turn. Runs
/// automatic phases first.
pub fn play_bot_turn(
    game: &mut Engine,
    bot: &mut Bot,
) -> Result<Option<Action>, GameError> {
    game.run_automatic_phases()?;
    if game.is_finished() || game.state.current_player != bot.player_id {
        return Ok(None);
    }
    let action = bot.choose_action(game);
    if let Some(action) = &action {
        game.execute_action(bot.player_id, action.clone())?;
    }
    if !game.is_finished() {
        game.end_turn()?;
    }
    Ok(action)
}
