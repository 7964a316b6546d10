//! Playtest results.

use circus_core::{PlayerId, Track, WinReason};
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of one bot game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameReport {
    pub game: usize,
    pub seed: u64,
    pub winner: Option<PlayerId>,
    pub reason: Option<WinReason>,
    /// Last round played
    pub rounds: u32,
    pub turns: u32,
    /// Track sum per seat at the end
    pub track_totals: Vec<i32>,
    /// Hit the safety cap before anyone won
    pub aborted: bool,
}

/// Aggregates across all games
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub games: usize,
    pub finished: usize,
    pub aborted: usize,
    pub wins_per_seat: Vec<usize>,
    pub average_rounds: f64,
    pub track_victories: usize,
    pub round_limit_victories: usize,
    pub wins_by_track: BTreeMap<Track, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaytestReport {
    pub summary: Summary,
    pub games: Vec<GameReport>,
}

impl PlaytestReport {
    pub fn new(players: usize, games: Vec<GameReport>) -> Self {
        let mut wins_per_seat = vec![0; players];
        let mut wins_by_track = BTreeMap::new();
        let mut track_victories = 0;
        let mut round_limit_victories = 0;

        for game in &games {
            if let Some(seat) = game.winner.and_then(|w| wins_per_seat.get_mut(w as usize)) {
                *seat += 1;
            }
            match game.reason {
                Some(WinReason::TrackThreshold { track }) => {
                    track_victories += 1;
                    *wins_by_track.entry(track).or_insert(0) += 1;
                }
                Some(WinReason::RoundLimit) => round_limit_victories += 1,
                None => {}
            }
        }

        let aborted = games.iter().filter(|g| g.aborted).count();
        let average_rounds = if games.is_empty() {
            0.0
        } else {
            games.iter().map(|g| f64::from(g.rounds)).sum::<f64>() / games.len() as f64
        };

        Self {
            summary: Summary {
                games: games.len(),
                finished: games.len() - aborted,
                aborted,
                wins_per_seat,
                average_rounds,
                track_victories,
                round_limit_victories,
                wins_by_track,
            },
            games,
        }
    }
}
