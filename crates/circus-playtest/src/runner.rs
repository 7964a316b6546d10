//! Bot-vs-bot game runner.

use circus_core::{
    play_bot_turn, Bot, BotDifficulty, Engine, GameError, Ruleset, RulesError, Seat,
};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::report::{GameReport, PlaytestReport};

#[derive(Debug, Error)]
pub enum PlaytestError {
    #[error("Invalid rules: {0}")]
    Rules(#[from] RulesError),

    #[error("Game {game} failed: {source}")]
    Game {
        game: usize,
        #[source]
        source: GameError,
    },

    #[error("Invalid setting {key}={value}")]
    Config { key: &'static str, value: String },
}

/// Runner settings, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaytestConfig {
    pub games: usize,
    pub players: usize,
    pub seed: u64,
    pub difficulty: BotDifficulty,
    /// Turns after which a game is abandoned
    pub max_turns: u32,
}

impl Default for PlaytestConfig {
    fn default() -> Self {
        Self {
            games: 100,
            players: 4,
            seed: 1,
            difficulty: BotDifficulty::Medium,
            max_turns: 5_000,
        }
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, PlaytestError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| PlaytestError::Config { key, value }),
        Err(_) => Ok(default),
    }
}

impl PlaytestConfig {
    pub fn from_env() -> Result<Self, PlaytestError> {
        let defaults = Self::default();
        let difficulty = match std::env::var("PLAYTEST_DIFFICULTY") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "easy" => BotDifficulty::Easy,
                "medium" => BotDifficulty::Medium,
                _ => {
                    return Err(PlaytestError::Config {
                        key: "PLAYTEST_DIFFICULTY",
                        value,
                    })
                }
            },
            Err(_) => defaults.difficulty,
        };

        Ok(Self {
            games: env_or("PLAYTEST_GAMES", defaults.games)?,
            players: env_or("PLAYTEST_PLAYERS", defaults.players)?,
            seed: env_or("PLAYTEST_SEED", defaults.seed)?,
            difficulty,
            max_turns: env_or("PLAYTEST_MAX_TURNS", defaults.max_turns)?,
        })
    }
}

/// Play one seeded game to the end (or the safety cap)
pub fn run_game(
    rules: &Ruleset,
    config: &PlaytestConfig,
    game: usize,
) -> Result<GameReport, PlaytestError> {
    let seed = config.seed.wrapping_add(game as u64);
    let fail = |source| PlaytestError::Game { game, source };

    let mut engine = Engine::new(rules.clone(), Some(seed))?;
    let roster = (0..config.players)
        .map(|i| Seat::bot(format!("Bot {}", i + 1)))
        .collect();
    engine.initialize(roster).map_err(fail)?;

    let mut bots: Vec<Bot> = (0..config.players)
        .map(|i| Bot::with_seed(i as u8, config.difficulty, seed.rotate_left(8) ^ i as u64))
        .collect();

    let mut turns = 0;
    while !engine.is_finished() && turns < config.max_turns {
        let current = engine.state.current_player as usize;
        let bot = bots.get_mut(current).ok_or_else(|| {
            fail(GameError::Invariant(format!("no bot for seat {current}")))
        })?;
        play_bot_turn(&mut engine, bot).map_err(fail)?;
        turns += 1;
    }

    let aborted = !engine.is_finished();
    if aborted {
        warn!(game, seed, turns, round = engine.state.round, "game hit the turn cap");
    }
    let outcome = engine.state.outcome;
    debug!(game, ?outcome, rounds = engine.state.round, "game finished");

    Ok(GameReport {
        game,
        seed,
        winner: outcome.map(|o| o.winner),
        reason: outcome.map(|o| o.reason),
        rounds: engine.state.round,
        turns,
        track_totals: engine.state.players.iter().map(|p| p.total_tracks()).collect(),
        aborted,
    })
}

/// Play every configured game
pub fn run_all(rules: &Ruleset, config: &PlaytestConfig) -> Result<PlaytestReport, PlaytestError> {
    info!(
        games = config.games,
        players = config.players,
        difficulty = ?config.difficulty,
        "starting playtest"
    );
    let games = (0..config.games)
        .map(|game| run_game(rules, config, game))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PlaytestReport::new(config.players, games))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(games: usize, players: usize) -> PlaytestConfig {
        PlaytestConfig {
            games,
            players,
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn test_games_finish_and_are_reproducible() {
        let rules = Ruleset::standard();
        let cfg = config(3, 3);
        let first = run_all(&rules, &cfg).unwrap();
        let second = run_all(&rules, &cfg).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.summary.games, 3);
        assert_eq!(first.summary.aborted, 0);
        assert_eq!(first.summary.wins_per_seat.iter().sum::<usize>(), 3);
    }

    #[test]
    fn test_turn_cap_aborts_game() {
        let cfg = PlaytestConfig {
            max_turns: 3,
            ..config(1, 2)
        };
        let report = run_game(&Ruleset::standard(), &cfg, 0).unwrap();
        assert!(report.aborted);
        assert_eq!(report.winner, None);
        assert_eq!(report.turns, 3);
    }

    #[test]
    fn test_bad_roster_is_reported() {
        let err = run_game(&Ruleset::standard(), &config(1, 7), 0).unwrap_err();
        assert!(matches!(
            err,
            PlaytestError::Game {
                source: GameError::InvalidRoster(_),
                ..
            }
        ));
    }
}
