//! Participant state and resource management.
//!
//! This module contains:
//! - Resource and victory-track identifiers
//! - `ResourceHand` for coin and material counts
//! - `WorkerPool` for deployable workers split into available/placed
//! - `Tracks` for the three victory counters (also used for deltas)
//! - `Player`, a single seat at the table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant identifier (seat index, 0-3 for a 4-player game)
pub type PlayerId = u8;

/// Countable resources a participant can hold.
///
/// Workers are not listed here: they live in a [`WorkerPool`] because they
/// move between an available and a placed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Sestertii, spent on bids, deployment, and markets
    Coins,
    /// Performers
    Mummers,
    /// Beasts for the arena
    Animals,
    /// Fighters for the arena
    Slaves,
    /// Used by the execution acts
    Prisoners,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Coins,
        Resource::Mummers,
        Resource::Animals,
        Resource::Slaves,
        Resource::Prisoners,
    ];

    /// Raw materials (everything except coins), in fallback-loss order
    pub const MATERIALS: [Resource; 4] = [
        Resource::Mummers,
        Resource::Animals,
        Resource::Slaves,
        Resource::Prisoners,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Coins => "coins",
            Resource::Mummers => "mummers",
            Resource::Animals => "animals",
            Resource::Slaves => "slaves",
            Resource::Prisoners => "prisoners",
        }
    }

    pub fn is_material(&self) -> bool {
        !matches!(self, Resource::Coins)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three victory tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Empire,
    Population,
    Church,
}

impl Track {
    /// All tracks, in win-evaluation order
    pub const ALL: [Track; 3] = [Track::Empire, Track::Population, Track::Church];

    pub fn name(&self) -> &'static str {
        match self {
            Track::Empire => "Empire",
            Track::Population => "Population",
            Track::Church => "Church",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A hand of coins and materials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceHand {
    pub coins: u32,
    pub mummers: u32,
    pub animals: u32,
    pub slaves: u32,
    pub prisoners: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(coins: u32, mummers: u32, animals: u32, slaves: u32, prisoners: u32) -> Self {
        Self {
            coins,
            mummers,
            animals,
            slaves,
            prisoners,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total of everything in the hand, coins included
    pub fn total(&self) -> u32 {
        self.coins + self.materials_total()
    }

    /// Total materials (coins excluded)
    pub fn materials_total(&self) -> u32 {
        self.mummers + self.animals + self.slaves + self.prisoners
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Coins => self.coins,
            Resource::Mummers => self.mummers,
            Resource::Animals => self.animals,
            Resource::Slaves => self.slaves,
            Resource::Prisoners => self.prisoners,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Coins => self.coins = count,
            Resource::Mummers => self.mummers = count,
            Resource::Animals => self.animals = count,
            Resource::Slaves => self.slaves = count,
            Resource::Prisoners => self.prisoners = count,
        }
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        self.set(resource, self.get(resource) + amount);
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Check if the hand covers a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|&r| self.get(r) >= cost.get(r))
    }

    /// Remove up to `amount` of a resource, returning how much was removed
    pub fn take(&mut self, resource: Resource, amount: u32) -> u32 {
        let taken = self.get(resource).min(amount);
        self.set(resource, self.get(resource) - taken);
        taken
    }

    /// Try to subtract a cost, returning false (and changing nothing) if insufficient
    pub fn try_subtract(&mut self, cost: &ResourceHand) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for resource in Resource::ALL {
            self.set(resource, self.get(resource) - cost.get(resource));
        }
        true
    }

    /// The material part of this hand (coins zeroed)
    pub fn materials(&self) -> ResourceHand {
        ResourceHand {
            coins: 0,
            ..*self
        }
    }

    /// Non-zero entries, in `Resource::ALL` order
    pub fn entries(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, n)| *n > 0)
    }
}

impl fmt::Display for ResourceHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.entries().map(|(r, n)| format!("{n} {r}")).collect();
        if parts.is_empty() {
            f.write_str("nothing")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Deployable workers, split into available and placed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPool {
    pub available: u32,
    pub placed: u32,
}

impl WorkerPool {
    pub fn new(available: u32) -> Self {
        Self {
            available,
            placed: 0,
        }
    }

    /// Workers owned by the participant, wherever they are
    pub fn total(&self) -> u32 {
        self.available + self.placed
    }

    /// Move one worker from available to placed
    pub fn place(&mut self) -> bool {
        if self.available == 0 {
            return false;
        }
        self.available -= 1;
        self.placed += 1;
        true
    }

    /// Permanently remove an available worker (it goes back to the supply)
    pub fn lose(&mut self) -> bool {
        if self.available == 0 {
            return false;
        }
        self.available -= 1;
        true
    }

    /// Add newly minted workers to the available pool
    pub fn recruit(&mut self, count: u32) {
        self.available += count;
    }

    /// Return every placed worker to the available pool
    pub fn recall_all(&mut self) {
        self.available += self.placed;
        self.placed = 0;
    }
}

/// Values (or deltas) on the three victory tracks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tracks {
    pub empire: i32,
    pub population: i32,
    pub church: i32,
}

impl Tracks {
    pub fn new(empire: i32, population: i32, church: i32) -> Self {
        Self {
            empire,
            population,
            church,
        }
    }

    /// Same value on every track
    pub fn uniform(value: i32) -> Self {
        Self::new(value, value, value)
    }

    /// A delta touching a single track
    pub fn single(track: Track, amount: i32) -> Self {
        let mut tracks = Self::default();
        tracks.set(track, amount);
        tracks
    }

    pub fn get(&self, track: Track) -> i32 {
        match track {
            Track::Empire => self.empire,
            Track::Population => self.population,
            Track::Church => self.church,
        }
    }

    pub fn set(&mut self, track: Track, value: i32) {
        match track {
            Track::Empire => self.empire = value,
            Track::Population => self.population = value,
            Track::Church => self.church = value,
        }
    }

    pub fn add(&mut self, track: Track, delta: i32) {
        self.set(track, self.get(track) + delta);
    }

    pub fn sum(&self) -> i32 {
        self.empire + self.population + self.church
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Non-zero entries, in `Track::ALL` order
    pub fn entries(&self) -> impl Iterator<Item = (Track, i32)> + '_ {
        Track::ALL
            .into_iter()
            .map(|t| (t, self.get(t)))
            .filter(|(_, v)| *v != 0)
    }
}

impl fmt::Display for Tracks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.entries().map(|(t, v)| format!("{v:+} {t}")).collect();
        if parts.is_empty() {
            f.write_str("no track change")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Inclusive bounds for a victory track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: i32,
    pub max: i32,
}

impl Bounds {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// A bid recorded on the participant for the current round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBid {
    pub act_id: String,
    pub coins: u32,
}

/// A single participant's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Seat index
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Whether an automated participant sits here
    pub is_bot: bool,
    /// Coins and materials
    pub resources: ResourceHand,
    /// Deployable workers
    pub workers: WorkerPool,
    /// Victory track positions
    pub tracks: Tracks,
    /// Bids placed this round
    pub bids: Vec<PendingBid>,
}

impl Player {
    /// Create a participant with an empty stock
    pub fn new(id: PlayerId, name: String, is_bot: bool) -> Self {
        Self {
            id,
            name,
            is_bot,
            resources: ResourceHand::new(),
            workers: WorkerPool::default(),
            tracks: Tracks::default(),
            bids: Vec::new(),
        }
    }

    /// Reset to the starting position of a new game
    pub fn initialize(&mut self, resources: ResourceHand, workers: u32, tracks: Tracks) {
        self.resources = resources;
        self.workers = WorkerPool::new(workers);
        self.tracks = tracks;
        self.bids.clear();
    }

    pub fn track(&self, track: Track) -> i32 {
        self.tracks.get(track)
    }

    /// Sum of the three tracks (round-limit scoring)
    pub fn total_tracks(&self) -> i32 {
        self.tracks.sum()
    }

    /// Everything the participant owns, for the round-limit tiebreaker
    pub fn total_resources(&self) -> u32 {
        self.resources.total() + self.workers.total()
    }

    pub fn has_bid_on(&self, act_id: &str) -> bool {
        self.bids.iter().any(|b| b.act_id == act_id)
    }

    /// Whether this participant is at least level with everyone on a track
    pub fn is_leader_on(&self, track: Track, all: &[Player]) -> bool {
        let mine = self.track(track);
        all.iter().all(|p| p.id == self.id || p.track(track) <= mine)
    }

    /// Public summary for presentation layers
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            is_bot: self.is_bot,
            resources: self.resources,
            workers: self.workers,
            tracks: self.tracks,
            total_tracks: self.total_tracks(),
            bids: self.bids.clone(),
        }
    }
}

/// Read-only projection of a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub is_bot: bool,
    pub resources: ResourceHand,
    pub workers: WorkerPool,
    pub tracks: Tracks,
    pub total_tracks: i32,
    pub bids: Vec<PendingBid>,
}
