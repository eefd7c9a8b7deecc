//! New-player bonus lifecycle.

use fyndr_core::{
    config::SimConfig,
    engine::{InitialPopulation, SimEngine},
    event::{BonusLabel, JoinSource, SimEvent},
    types::PerArchetype,
};
use std::collections::{BTreeMap, BTreeSet};

/// Viral recruits every day, nobody churns, everybody plays, and only the
/// new-player bonus is switched on so the label tracks it exactly.
fn onboarding_config() -> SimConfig {
    SimConfig {
        viral_spread_frequency_days: 1,
        churn_probability_whale: 0.0,
        churn_probability_grinder: 0.0,
        churn_probability_casual: 0.0,
        play_probability: PerArchetype::new(1.0, 1.0, 1.0),
        new_player_bonus: 1.0,
        ..SimConfig::default_test().without_bonuses()
    }
}

#[test]
fn new_player_bonus_expires_on_day_eight() {
    let mut engine = SimEngine::build(onboarding_config(), InitialPopulation::default(), 8).unwrap();

    let mut day_one_recruits = BTreeSet::new();
    let mut labels_by_day: Vec<(u64, BonusLabel)> = Vec::new();
    for _ in 0..10 {
        for event in engine.tick().unwrap() {
            match event {
                SimEvent::PlayerJoined { day: 1, player_id, source: JoinSource::Viral, .. } => {
                    day_one_recruits.insert(player_id);
                }
                SimEvent::ScanRecorded { day, scanner_id, bonus_label, .. }
                    if day_one_recruits.contains(&scanner_id) =>
                {
                    labels_by_day.push((day, bonus_label));
                }
                _ => {}
            }
        }
    }

    assert!(!day_one_recruits.is_empty(), "Expected viral recruits on day 1");
    for (day, label) in &labels_by_day {
        let expected = if *day <= 7 { BonusLabel::NewPlayer } else { BonusLabel::Base };
        assert_eq!(*label, expected, "Day-1 recruit scanned on day {day} with {label:?}");
    }
    assert!(labels_by_day.iter().any(|(d, _)| *d == 7), "Expected recruit scans on day 7");
    assert!(labels_by_day.iter().any(|(d, _)| *d == 8), "Expected recruit scans on day 8");

    for id in &day_one_recruits {
        let player = engine.store().player(*id).unwrap();
        assert!(!player.is_new_player, "Player {id} still flagged new after 10 days");
        assert_eq!(player.new_player_bonus_remaining, 0);
    }
}

#[test]
fn seeded_players_never_get_the_new_player_bonus() {
    let mut engine = SimEngine::build(onboarding_config(), InitialPopulation::default(), 9).unwrap();
    let seeded = engine.store().players().len() as u64;

    for _ in 0..3 {
        for event in engine.tick().unwrap() {
            if let SimEvent::ScanRecorded { scanner_id, bonus_label, .. } = event {
                if scanner_id <= seeded {
                    assert_eq!(bonus_label, BonusLabel::Base, "Seeded player {scanner_id} got a bonus");
                }
            }
        }
    }
}

#[test]
fn recruits_start_with_free_packs_in_hand() {
    let mut engine = SimEngine::build(onboarding_config(), InitialPopulation::default(), 10).unwrap();
    let events = engine.tick().unwrap();

    // Packs bought and stickers placed on the join day move the hand count.
    let mut bought: BTreeMap<u64, u32> = BTreeMap::new();
    let mut placed: BTreeMap<u64, u32> = BTreeMap::new();
    for event in &events {
        match event {
            SimEvent::PackPurchased { player_id, packs, .. } => {
                *bought.entry(*player_id).or_default() += packs;
            }
            SimEvent::StickerPlaced { owner_id, .. } => {
                *placed.entry(*owner_id).or_default() += 1;
            }
            _ => {}
        }
    }

    let config = engine.config().clone();
    let recruits: Vec<_> = engine.store().players().iter().filter(|p| p.join_day == 1).collect();
    assert!(!recruits.is_empty());
    for p in recruits {
        assert!(p.is_new_player);
        assert_eq!(p.new_player_bonus_remaining, config.new_player_bonus_days - 1);
        let packs = config.new_player_free_packs + bought.get(&p.id).copied().unwrap_or(0);
        let in_hand = packs * config.stickers_per_pack - placed.get(&p.id).copied().unwrap_or(0);
        assert_eq!(p.stickers_owned, in_hand, "Recruit {} hand count", p.id);
    }
}
