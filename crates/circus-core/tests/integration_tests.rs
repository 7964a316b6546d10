//! Integration tests for the Circus Maximus engine.
//!
//! These drive whole rounds through the public engine API.

use circus_core::rules::{ActCard, CoinFormula, EventCard, EventEffects};
use circus_core::*;
use pretty_assertions::assert_eq;

fn calm_event(id: &str) -> EventCard {
    EventCard {
        id: id.to_string(),
        name: "Quiet Days".to_string(),
        effects: EventEffects::default(),
    }
}

/// Standard rules with an event deck that changes nothing
fn quiet_rules() -> Ruleset {
    let mut rules = Ruleset::standard();
    rules.events = vec![calm_event("calm_a"), calm_event("calm_b")];
    rules
}

fn start(rules: Ruleset, players: usize, seed: u64) -> Engine {
    let mut engine = Engine::new(rules, Some(seed)).unwrap();
    let roster = (0..players).map(|i| Seat::human(format!("Player {i}"))).collect();
    engine.initialize(roster).unwrap();
    engine
}

/// Active participant passes when allowed, otherwise takes the first valid
/// action; then the turn ends
fn step(engine: &mut Engine) {
    let player = engine.state.current_player;
    let actions = engine.valid_actions(player);
    let action = if actions.contains(&Action::Pass) {
        Action::Pass
    } else {
        actions[0].clone()
    };
    engine.execute_action(player, action).unwrap();
    engine.end_turn().unwrap();
}

fn advance_to(engine: &mut Engine, phase: Phase) {
    for _ in 0..200 {
        if engine.state.phase == phase || engine.is_finished() {
            return;
        }
        if engine.state.phase.is_interactive() {
            step(engine);
        } else {
            engine.end_turn().unwrap();
        }
    }
    panic!("never reached {phase}");
}

fn act_and_end(engine: &mut Engine, player: PlayerId, action: Action) -> Vec<GameEvent> {
    let mut events = engine.execute_action(player, action).unwrap();
    events.extend(engine.end_turn().unwrap());
    events
}

fn place(location: &str) -> Action {
    Action::PlaceWorker {
        location_id: location.to_string(),
    }
}

#[test]
fn test_sole_qualifier_wins_and_absentee_is_penalized() {
    let mut rules = quiet_rules();
    rules.setup.starting_resources = ResourceHand::single(Resource::Coins, 5);
    rules.acts = vec![ActCard {
        id: "duel".to_string(),
        name: "Duel".to_string(),
        coin_cost: 0,
        resource_cost: ResourceHand::single(Resource::Slaves, 1),
        coin_reward: Some(CoinFormula::Flat(3)),
        tracks: Tracks::new(1, 0, 0),
        has_winner: true,
        consumes_resources: false,
        non_participant_penalty: Tracks::new(0, 0, -1),
    }];
    rules.execution_acts = vec![ActCard {
        id: "spectacle".to_string(),
        name: "Spectacle".to_string(),
        coin_cost: 0,
        resource_cost: ResourceHand::single(Resource::Prisoners, 1),
        coin_reward: None,
        tracks: Tracks::default(),
        has_winner: false,
        consumes_resources: true,
        non_participant_penalty: Tracks::default(),
    }];
    rules.regular_per_round = 1;

    let mut engine = start(rules, 2, 1);
    engine.state.players[0].resources.slaves = 1;
    let bid = || Action::Bid {
        act_id: "duel".to_string(),
        coins: 1,
    };

    act_and_end(&mut engine, 0, bid());
    act_and_end(&mut engine, 1, bid());
    act_and_end(&mut engine, 0, Action::Pass);
    act_and_end(&mut engine, 1, Action::Pass);
    assert_eq!(engine.state.phase, Phase::Deploy);
    advance_to(&mut engine, Phase::Resolve);

    let events = engine.end_turn().unwrap();
    assert!(events.contains(&GameEvent::ActResolved {
        act_id: "duel".to_string(),
        winner: Some(0),
        qualifiers: vec![0],
    }));
    assert!(events.contains(&GameEvent::PenaltyApplied {
        player: 1,
        act_id: "duel".to_string(),
        penalty: Tracks::new(0, 0, -1),
    }));
    assert!(!events
        .iter()
        .any(|e| matches!(e, GameEvent::DiceRolled { .. })));

    let a = &engine.state.players[0];
    let b = &engine.state.players[1];
    assert_eq!(a.resources.coins, 7);
    assert_eq!(a.tracks, Tracks::new(4, 3, 3));
    assert_eq!(a.resources.slaves, 1);
    assert_eq!(b.resources.coins, 4);
    assert_eq!(b.tracks, Tracks::new(3, 3, 2));
    assert_eq!(engine.state.phase, Phase::Cleanup);
}

#[test]
fn test_bid_after_a_pass_reopens_the_table() {
    let mut engine = start(quiet_rules(), 3, 14);
    let order = engine.state.turn_order.clone();
    let (opener, second, third) = (order[0], order[1], order[2]);
    let bid = |act: usize| Action::Bid {
        act_id: engine.acts.regular[act].clone(),
        coins: 1,
    };
    let (first_bid, second_bid) = (bid(0), bid(1));

    assert_eq!(engine.state.current_player, opener);
    act_and_end(&mut engine, opener, first_bid);
    act_and_end(&mut engine, second, Action::Pass);
    act_and_end(&mut engine, third, second_bid);
    assert!(engine.state.passed.is_empty());

    assert_eq!(engine.state.current_player, opener);
    act_and_end(&mut engine, opener, Action::Pass);
    assert_eq!(engine.state.current_player, second);
    act_and_end(&mut engine, second, Action::Pass);
    assert_eq!(engine.state.current_player, third);
    assert_eq!(engine.state.phase, Phase::Bid);

    act_and_end(&mut engine, third, Action::Pass);
    assert_eq!(engine.state.phase, Phase::Deploy);
}

#[test]
fn test_turn_bonus_lasts_only_for_the_turn() {
    let mut engine = start(quiet_rules(), 2, 2);
    advance_to(&mut engine, Phase::Deploy);
    let player = engine.state.current_player;

    engine.execute_action(player, place("pantheon")).unwrap();
    assert_eq!(engine.state.players[player as usize].tracks.church, 4);
    assert_eq!(engine.view().players[player as usize].tracks.church, 4);

    let events = engine.end_turn().unwrap();
    assert_eq!(engine.state.players[player as usize].tracks.church, 3);
    assert!(events.contains(&GameEvent::BonusReverted {
        player,
        tracks: Tracks::single(Track::Church, 1),
    }));
}

#[test]
fn test_palace_claims_next_round_opening_bid() {
    let mut engine = start(quiet_rules(), 2, 3);
    advance_to(&mut engine, Phase::Deploy);
    assert_eq!(engine.state.current_player, 0);

    act_and_end(&mut engine, 0, Action::Pass);
    let events = act_and_end(&mut engine, 1, place("palace"));
    assert!(events.contains(&GameEvent::FirstPlayerClaimed { player: 1 }));

    advance_to(&mut engine, Phase::Resolve);
    engine.run_automatic_phases().unwrap();
    assert_eq!(engine.state.round, 2);
    assert_eq!(engine.state.phase, Phase::Bid);
    assert_eq!(engine.state.current_player, 1);
    assert_eq!(engine.state.first_player_override, None);
}

#[test]
fn test_oracle_reveals_upcoming_event() {
    let mut engine = start(quiet_rules(), 2, 4);
    advance_to(&mut engine, Phase::Deploy);
    let player = engine.state.current_player;
    assert_eq!(engine.peeked_event(player), None);

    engine.state.players[player as usize].resources.animals = 1;
    let upcoming = engine.events.upcoming().map(str::to_string);
    engine.execute_action(player, place("oracle")).unwrap();

    assert_eq!(
        engine.peeked_event(player).map(|card| card.id.clone()),
        upcoming
    );
    assert_eq!(engine.state.players[player as usize].resources.animals, 0);
    assert_eq!(engine.peeked_event(1 - player), None);
}

#[test]
fn test_trade_visits_markets_in_order() {
    let mut engine = start(quiet_rules(), 2, 5);
    advance_to(&mut engine, Phase::Deploy);

    act_and_end(&mut engine, 0, place("slaves_market"));
    act_and_end(&mut engine, 1, place("mummers_market"));
    act_and_end(&mut engine, 0, Action::Pass);
    act_and_end(&mut engine, 1, Action::Pass);

    assert_eq!(engine.state.phase, Phase::Trade);
    assert_eq!(engine.state.current_market, Some(Resource::Mummers));
    assert_eq!(engine.state.current_player, 1);
    assert_eq!(
        engine.execute_action(
            1,
            Action::BuyResource {
                resource_type: Resource::Slaves
            }
        ),
        Err(GameError::MarketClosed(Resource::Slaves))
    );

    let events = act_and_end(
        &mut engine,
        1,
        Action::BuyResource {
            resource_type: Resource::Mummers,
        },
    );
    assert!(events.contains(&GameEvent::ResourceBought {
        player: 1,
        resource: Resource::Mummers,
        price: 1,
    }));
    assert_eq!(engine.state.players[1].resources.mummers, 1);

    act_and_end(&mut engine, 1, Action::Pass);
    assert_eq!(engine.state.current_market, Some(Resource::Slaves));
    assert_eq!(engine.state.current_player, 0);

    act_and_end(
        &mut engine,
        0,
        Action::BuyResource {
            resource_type: Resource::Slaves,
        },
    );
    act_and_end(&mut engine, 0, Action::Pass);
    assert_eq!(engine.state.phase, Phase::Resolve);
    assert_eq!(engine.state.players[0].resources.slaves, 1);
    assert_eq!(engine.markets.get(Resource::Slaves).unwrap().stock(), 4);
}

#[test]
fn test_empty_trade_is_skipped() {
    let mut engine = start(quiet_rules(), 3, 6);
    advance_to(&mut engine, Phase::Deploy);
    while engine.state.phase == Phase::Deploy {
        step(&mut engine);
    }
    assert_eq!(engine.state.phase, Phase::Resolve);
}

#[test]
fn test_rejected_actions_change_nothing() {
    let mut engine = start(quiet_rules(), 3, 7);
    advance_to(&mut engine, Phase::Deploy);
    let player = engine.state.current_player;
    let other = (player + 1) % 3;
    let before = engine.clone();

    let attempts = [
        (other, place("port")),
        (player, place("colosseum")),
        (player, place("oracle")),
        (
            player,
            Action::Bid {
                act_id: engine.acts.regular[0].clone(),
                coins: 1,
            },
        ),
        (
            player,
            Action::BuyResource {
                resource_type: Resource::Animals,
            },
        ),
    ];
    for (who, action) in attempts {
        let err = engine.execute_action(who, action).unwrap_err();
        assert!(err.is_rejection(), "{err}");
    }
    assert_eq!(engine.end_turn(), Err(GameError::NoActionTaken));
    assert_eq!(engine, before);
}

#[test]
fn test_threshold_wins_mid_round() {
    let mut engine = start(quiet_rules(), 2, 8);
    advance_to(&mut engine, Phase::Deploy);
    let player = engine.state.current_player;
    engine.state.players[player as usize].tracks.church = 14;

    let events = engine.execute_action(player, place("pantheon")).unwrap();
    assert!(events.contains(&GameEvent::GameWon {
        winner: player,
        reason: WinReason::TrackThreshold {
            track: Track::Church
        },
    }));
    assert!(engine.is_finished());
    assert_eq!(engine.winner(), Some(player));
    assert_eq!(engine.end_turn(), Err(GameError::GameOver));
    assert!(engine.valid_actions(player).is_empty());
}

#[test]
fn test_round_limit_scores_track_totals() {
    let mut rules = quiet_rules();
    rules.win.max_rounds = 1;
    let mut engine = start(rules, 2, 9);
    engine.state.players[1].tracks = Tracks::new(3, 4, 3);

    advance_to(&mut engine, Phase::Cleanup);
    engine.run_automatic_phases().unwrap();
    assert_eq!(
        engine.state.outcome,
        Some(Outcome {
            winner: 1,
            reason: WinReason::RoundLimit
        })
    );
}

#[test]
fn test_round_limit_tie_broken_by_resources() {
    let mut rules = quiet_rules();
    rules.win.max_rounds = 1;
    let mut engine = start(rules, 2, 10);
    engine.state.players[1].resources.animals = 2;

    advance_to(&mut engine, Phase::Cleanup);
    engine.run_automatic_phases().unwrap();
    assert_eq!(engine.winner(), Some(1));
    // Opening bid (1) plus upkeep (2) against 9 income
    assert_eq!(engine.state.players[0].resources.coins, 23);
    assert_eq!(engine.state.players[1].resources.coins, 22);
}

#[test]
fn test_save_load_replays_identically() {
    let mut original = Engine::standard(11).unwrap();
    original
        .initialize(vec![Seat::bot("A"), Seat::bot("B"), Seat::bot("C")])
        .unwrap();
    let mut bots: Vec<Bot> = (0..3)
        .map(|i| Bot::with_seed(i, BotDifficulty::Medium, 100 + u64::from(i)))
        .collect();
    for _ in 0..25 {
        let current = original.state.current_player as usize;
        play_bot_turn(&mut original, &mut bots[current]).unwrap();
    }

    let blob = original.save_game().unwrap();
    let mut restored = Engine::load_game(&blob).unwrap();
    assert_eq!(restored, original);

    let mut bots_a: Vec<Bot> = (0..3)
        .map(|i| Bot::with_seed(i, BotDifficulty::Easy, 7 + u64::from(i)))
        .collect();
    let mut bots_b: Vec<Bot> = (0..3)
        .map(|i| Bot::with_seed(i, BotDifficulty::Easy, 7 + u64::from(i)))
        .collect();
    for _ in 0..60 {
        if original.is_finished() {
            break;
        }
        let a = original.state.current_player as usize;
        let b = restored.state.current_player as usize;
        play_bot_turn(&mut original, &mut bots_a[a]).unwrap();
        play_bot_turn(&mut restored, &mut bots_b[b]).unwrap();
    }
    assert_eq!(restored, original);
}

#[test]
fn test_restore_into_running_engine() {
    let mut engine = start(quiet_rules(), 2, 12);
    let blob = engine.save_game().unwrap();
    advance_to(&mut engine, Phase::Deploy);

    engine.restore(&blob).unwrap();
    assert_eq!(engine.state.phase, Phase::Bid);
    assert_eq!(engine.state.turn, 0);
}

#[test]
fn test_bot_games_finish_for_every_table_size() {
    for players in 2..=4u8 {
        let mut engine = Engine::standard(u64::from(players) * 31).unwrap();
        let roster = (0..players).map(|i| Seat::bot(format!("Bot {i}"))).collect();
        engine.initialize(roster).unwrap();
        let mut bots: Vec<Bot> = (0..players)
            .map(|i| Bot::with_seed(i, BotDifficulty::Medium, u64::from(i)))
            .collect();

        let mut turns = 0;
        while !engine.is_finished() && turns < 20_000 {
            let current = engine.state.current_player as usize;
            play_bot_turn(&mut engine, &mut bots[current]).unwrap();
            turns += 1;
        }
        assert!(engine.is_finished(), "{players}-player game stalled");
        assert!(engine.state.round <= engine.rules.win.max_rounds + 1);
        assert!(engine.fault.is_none());
    }
}

#[test]
fn test_ruleset_json_round_trip_drives_a_game() {
    let json = serde_json::to_string(&quiet_rules()).unwrap();
    let rules = Ruleset::from_json(&json).unwrap();
    let mut engine = start(rules, 2, 13);
    advance_to(&mut engine, Phase::Deploy);
    assert_eq!(engine.state.round, 1);
}
