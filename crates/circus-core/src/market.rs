//! Supply/demand markets.
//!
//! Each market is an ascending list of unit prices. Buying pops the cheapest
//! unit, so prices rise as a market is drained; cleanup restocks the upper
//! tiers first.

use crate::game::GameError;
use crate::player::{Player, Resource};
use crate::rules::MarketRules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stock of one resource, sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub resource: Resource,
    pub prices: Vec<u32>,
}

impl Market {
    /// Open a market with its configured starting stock
    pub fn new(rules: &MarketRules) -> Self {
        let mut prices = rules.starting_prices.clone();
        prices.sort_unstable();
        Self {
            resource: rules.resource,
            prices,
        }
    }

    /// Cheapest listed price, or `None` when sold out
    pub fn current_price(&self) -> Option<u32> {
        self.prices.first().copied()
    }

    /// What a buyer actually pays under a price modifier
    pub fn effective_price(&self, modifier: i32) -> Option<u32> {
        self.current_price()
            .map(|price| (price as i32 + modifier).max(1) as u32)
    }

    pub fn stock(&self) -> usize {
        self.prices.len()
    }

    pub fn is_sold_out(&self) -> bool {
        self.prices.is_empty()
    }

    /// Buy one unit for `player`, returning the price paid
    pub fn buy(&mut self, player: &mut Player, modifier: i32) -> Result<u32, GameError> {
        let price = self
            .effective_price(modifier)
            .ok_or(GameError::SoldOut(self.resource))?;
        if player.resources.coins < price {
            return Err(GameError::CannotAfford);
        }

        player.resources.coins -= price;
        player.resources.add(self.resource, 1);
        self.prices.remove(0);
        Ok(price)
    }

    fn count_at(&self, price: u32) -> usize {
        self.prices.iter().filter(|&&p| p == price).count()
    }

    fn insert_sorted(&mut self, price: u32) {
        let at = self.prices.partition_point(|&p| p <= price);
        self.prices.insert(at, price);
    }

    /// Cleanup refill: top tiers first, each up to `units_per_tier`,
    /// never more than `max_restock` units in one call
    pub fn restock(&mut self, rules: &MarketRules) -> usize {
        let mut tiers = rules.tiers.clone();
        tiers.sort_unstable_by(|a, b| b.cmp(a));

        let mut added = 0;
        for tier in tiers {
            while added < rules.max_restock && self.count_at(tier) < rules.units_per_tier {
                self.insert_sorted(tier);
                added += 1;
            }
            if added >= rules.max_restock {
                break;
            }
        }
        added
    }

    /// Event stock added at a fixed tier
    pub fn add_units(&mut self, count: usize, tier: u32) {
        for _ in 0..count {
            self.insert_sorted(tier);
        }
    }

    /// Event stock removed, nearest to `tier` first (ties take the cheaper
    /// unit); returns how many were actually removed
    pub fn remove_units(&mut self, count: usize, tier: u32) -> usize {
        let mut removed = 0;
        while removed < count {
            let nearest = self
                .prices
                .iter()
                .enumerate()
                .min_by_key(|(_, &p)| (p.abs_diff(tier), p))
                .map(|(i, _)| i);
            match nearest {
                Some(index) => {
                    self.prices.remove(index);
                    removed += 1;
                }
                None => break,
            }
        }
        removed
    }
}

/// All markets, keyed by resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markets {
    pub markets: BTreeMap<Resource, Market>,
}

impl Markets {
    pub fn new(rules: &[MarketRules]) -> Self {
        Self {
            markets: rules
                .iter()
                .map(|r| (r.resource, Market::new(r)))
                .collect(),
        }
    }

    pub fn get(&self, resource: Resource) -> Option<&Market> {
        self.markets.get(&resource)
    }

    pub fn get_mut(&mut self, resource: Resource) -> Option<&mut Market> {
        self.markets.get_mut(&resource)
    }

    /// Buy from one market
    pub fn buy(
        &mut self,
        resource: Resource,
        player: &mut Player,
        modifier: i32,
    ) -> Result<u32, GameError> {
        self.get_mut(resource)
            .ok_or(GameError::UnknownMarket(resource))?
            .buy(player, modifier)
    }

    /// Restock every configured market, returning units added per market
    pub fn restock_all(&mut self, rules: &[MarketRules]) -> Vec<(Resource, usize)> {
        rules
            .iter()
            .filter_map(|r| {
                self.get_mut(r.resource)
                    .map(|market| (r.resource, market.restock(r)))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Ruleset;

    fn slaves_rules() -> MarketRules {
        Ruleset::standard()
            .market(Resource::Slaves)
            .cloned()
            .unwrap()
    }

    fn buyer(coins: u32) -> Player {
        let mut player = Player::new(0, "Buyer".into(), false);
        player.resources.coins = coins;
        player
    }

    #[test]
    fn test_buy_pops_cheapest() {
        let mut market = Market::new(&slaves_rules());
        let mut player = buyer(10);

        let paid = market.buy(&mut player, 0).unwrap();
        assert_eq!(paid, 3);
        assert_eq!(player.resources.slaves, 1);
        assert_eq!(player.resources.coins, 7);
        assert_eq!(market.prices, vec![3, 4, 4, 5]);
    }

    #[test]
    fn test_price_modifier_floors_at_one() {
        let mut market = Market::new(&Ruleset::standard().markets[0]);
        let mut player = buyer(5);

        // Mummers start at 1; a crash cannot make them free
        assert_eq!(market.buy(&mut player, -1).unwrap(), 1);
        assert_eq!(player.resources.coins, 4);
    }

    #[test]
    fn test_buy_rejects_without_mutation() {
        let mut market = Market::new(&slaves_rules());
        let mut poor = buyer(2);
        assert_eq!(market.buy(&mut poor, 0), Err(GameError::CannotAfford));
        assert_eq!(market.stock(), 5);
        assert_eq!(poor.resources.coins, 2);

        market.prices.clear();
        let mut rich = buyer(20);
        assert_eq!(
            market.buy(&mut rich, 0),
            Err(GameError::SoldOut(Resource::Slaves))
        );
    }

    #[test]
    fn test_restock_fills_top_tiers_first() {
        let rules = slaves_rules();
        let mut market = Market::new(&rules);
        market.prices.clear();

        let added = market.restock(&rules);
        assert_eq!(added, 3);
        // Tier 5 gets two units, tier 4 gets the last one
        assert_eq!(market.prices, vec![4, 5, 5]);

        market.restock(&rules);
        assert_eq!(market.prices, vec![3, 3, 4, 4, 5, 5]);
    }

    #[test]
    fn test_restock_respects_tier_cap() {
        let rules = slaves_rules();
        let mut market = Market::new(&rules);
        market.prices = vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5];
        assert_eq!(market.restock(&rules), 0);
    }

    #[test]
    fn test_event_add_and_remove_near_middle_tier() {
        let mut market = Market::new(&slaves_rules());
        market.add_units(2, 3);
        assert_eq!(market.prices, vec![3, 3, 3, 3, 4, 4, 5]);

        let mut sparse = Market {
            resource: Resource::Animals,
            prices: vec![1, 2, 4, 5],
        };
        // 2 and 4 are both one away from 3; the cheaper goes first
        assert_eq!(sparse.remove_units(1, 3), 1);
        assert_eq!(sparse.prices, vec![1, 4, 5]);
        assert_eq!(sparse.remove_units(5, 3), 3);
        assert!(sparse.is_sold_out());
    }

    #[test]
    fn test_markets_restock_all() {
        let rules = Ruleset::standard();
        let mut markets = Markets::new(&rules.markets);
        let added = markets.restock_all(&rules.markets);
        assert_eq!(added.len(), 3);
        assert!(added.iter().all(|(_, n)| *n <= 3));
    }
}
