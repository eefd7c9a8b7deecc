//! Scan reward calculation.
//!
//! One canonical scoring rule. Every applicable bonus contributes an
//! additive fraction; the sum scales both sides of the scan:
//!
//!   scanner = scanner_base × level × value × (1 + Σ)
//!   owner   = owner_base   × level × value × diminishing × (1 + Σ)
//!
//! The label is the highest-priority bonus that applied. It is for
//! analytics only and never changes the amounts.

use crate::{
    config::SimConfig,
    error::Rejection,
    event::BonusLabel,
    player::Player,
    season::DayContext,
    sticker::Sticker,
    store::SimStore,
    types::{Location, PlayerId, StickerId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanReward {
    pub scanner_points:         f64,
    pub owner_points:           f64,
    pub bonus_label:            BonusLabel,
    /// Sum of every applied bonus fraction.
    pub bonus_fraction:         f64,
    pub diminishing_multiplier: f64,
    pub level_multiplier:       f64,
}

/// A scan that went through, with the level-ups it caused.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub reward:        ScanReward,
    pub owner_id:      PlayerId,
    pub sticker_level: u32,
    /// (player, new level) for the scanner and owner, in that order.
    pub level_ups:     Vec<(PlayerId, u32)>,
}

/// Whether the sticker is hot enough today to pay the social bonus.
fn sneeze_eligible(sticker: &Sticker, config: &SimConfig) -> bool {
    sticker.scans_today >= config.social_sneeze_threshold
        && sticker.sneeze_awards_today < config.social_sneeze_cap
}

/// Bonus fractions in label priority order. Inapplicable bonuses are 0.
fn bonus_fractions(
    scanner: &Player,
    sticker: &Sticker,
    scan_location: &Location,
    ctx: &DayContext,
    config: &SimConfig,
) -> [(BonusLabel, f64); 8] {
    let apply = |cond: bool, bonus: f64| if cond { bonus } else { 0.0 };

    let far_from_last = scanner
        .last_scan_locations
        .get(&sticker.id)
        .is_some_and(|prev| prev.distance_meters(scan_location) > config.geo_diversity_radius);

    [
        (BonusLabel::Unique, apply(sticker.unique_scans_today == 0, config.unique_scanner_bonus)),
        (BonusLabel::GeoDiversity, apply(far_from_last, config.geo_diversity_bonus)),
        (
            BonusLabel::VenueVariety,
            apply(
                !scanner.venues_visited_this_week.contains(&sticker.venue_category),
                config.venue_variety_bonus,
            ),
        ),
        (
            BonusLabel::NewPlayer,
            apply(
                scanner.is_new_player && scanner.new_player_bonus_remaining > 0,
                config.new_player_bonus,
            ),
        ),
        (
            BonusLabel::Streak,
            apply(scanner.consecutive_days_active >= config.streak_bonus_days, config.streak_bonus),
        ),
        (
            BonusLabel::Comeback,
            apply(
                scanner.days_since_last_activity >= config.comeback_bonus_days,
                config.comeback_bonus,
            ),
        ),
        (BonusLabel::Event, apply(ctx.event_active, config.event_bonus)),
        (BonusLabel::Sneeze, apply(sneeze_eligible(sticker, config), config.social_sneeze_bonus)),
    ]
}

/// Pure reward computation. Reads state, mutates nothing.
pub fn compute_scan_reward(
    scanner: &Player,
    sticker: &Sticker,
    scan_location: &Location,
    ctx: &DayContext,
    config: &SimConfig,
) -> ScanReward {
    let level_multiplier = config.level_multiplier(sticker.level);
    let value = sticker.value_multiplier(config);
    let diminishing_multiplier = sticker.diminishing_multiplier(config);

    let fractions = bonus_fractions(scanner, sticker, scan_location, ctx, config);
    let bonus_fraction: f64 = fractions.iter().map(|(_, f)| f).sum();
    let bonus_label = fractions
        .iter()
        .find(|(_, f)| *f > 0.0)
        .map_or(BonusLabel::Base, |(label, _)| *label);

    let scale = level_multiplier * value * (1.0 + bonus_fraction);
    ScanReward {
        scanner_points: config.scanner_base_points * scale,
        owner_points: config.owner_base_points * diminishing_multiplier * scale,
        bonus_label,
        bonus_fraction,
        diminishing_multiplier,
        level_multiplier,
    }
}

/// Validate a scan, compute its reward and apply every side effect.
/// A rejection leaves the store untouched.
pub fn simulate_scan(
    store: &mut SimStore,
    scanner_id: PlayerId,
    sticker_id: StickerId,
    scan_location: Location,
    ctx: &DayContext,
    config: &SimConfig,
) -> Result<ScanOutcome, Rejection> {
    let scanner = store.player(scanner_id).ok_or(Rejection::UnknownPlayer(scanner_id))?;
    let sticker = store.sticker(sticker_id).ok_or(Rejection::UnknownSticker(sticker_id))?;
    if !scanner.is_active {
        return Err(Rejection::InactivePlayer(scanner_id));
    }
    if !sticker.is_active {
        return Err(Rejection::InactiveSticker(sticker_id));
    }
    if let Some(last) = scanner.last_scan_times.get(&sticker_id) {
        let days_since = ctx.day.saturating_sub(*last);
        let cooldown_days = config.cooldown_days();
        if (days_since as f64) < cooldown_days {
            return Err(Rejection::Cooldown {
                player_id: scanner_id,
                sticker_id,
                days_since,
                cooldown_days,
            });
        }
    }

    let reward = compute_scan_reward(scanner, sticker, &scan_location, ctx, config);
    let sneezed = sneeze_eligible(sticker, config);
    let owner_id = sticker.owner_id;
    let sticker_level = sticker.level;
    let venue = sticker.venue_category.clone();

    if let Some(sticker) = store.sticker_mut(sticker_id) {
        sticker.scans_today += 1;
        sticker.total_scans += 1;
        if sticker.unique_scans_today == 0 {
            sticker.unique_scans_today = 1;
        }
        if sneezed {
            sticker.sneeze_awards_today += 1;
        }
        sticker.daily_earnings += reward.owner_points;
        sticker.total_earnings += reward.owner_points;
        sticker.current_value = sticker.base_value;
    }

    let mut level_ups = Vec::new();
    if let Some(scanner) = store.player_mut(scanner_id) {
        scanner.last_scan_locations.insert(sticker_id, scan_location);
        scanner.last_scan_times.insert(sticker_id, ctx.day);
        scanner.venues_visited_this_week.insert(venue);
        scanner.days_since_last_activity = 0;
        scanner.scans_today += 1;
        scanner.total_scans += 1;
        if let Some(level) = scanner.earn(reward.scanner_points, ctx.day, config) {
            level_ups.push((scanner_id, level));
        }
    }
    if let Some(owner) = store.player_mut(owner_id) {
        if let Some(level) = owner.earn(reward.owner_points, ctx.day, config) {
            level_ups.push((owner_id, level));
        }
    }
    store.ledger.total_scans += 1;
    store.ledger.points_awarded += reward.scanner_points + reward.owner_points;

    Ok(ScanOutcome { reward, owner_id, sticker_level, level_ups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Archetype;

    fn fixtures(cfg: &SimConfig) -> (Player, Sticker, DayContext) {
        let scanner = Player::new(1, Archetype::Grinder, 0, false, cfg);
        let sticker = Sticker::new(1, 2, Location::new(40.5, -73.5), "park".into(), 1, 0);
        (scanner, sticker, DayContext { day: 5, event_active: false })
    }

    #[test]
    fn first_scan_of_day_is_labelled_unique() {
        let cfg = SimConfig::default();
        let (scanner, sticker, ctx) = fixtures(&cfg);
        let reward = compute_scan_reward(&scanner, &sticker, &sticker.location, &ctx, &cfg);
        assert_eq!(reward.bonus_label, BonusLabel::Unique);
        // unique 1.0 + venue 1.0 (park not yet visited this week)
        assert!((reward.bonus_fraction - 2.0).abs() < 1e-12);
        assert!((reward.scanner_points - 3.0).abs() < 1e-12);
        assert!((reward.owner_points - 6.0).abs() < 1e-12);
    }

    #[test]
    fn label_never_changes_magnitude() {
        let cfg = SimConfig::default();
        let (mut scanner, mut sticker, ctx) = fixtures(&cfg);
        sticker.unique_scans_today = 1;
        scanner.venues_visited_this_week.insert("park".into());
        scanner.consecutive_days_active = 10;
        let streak = compute_scan_reward(&scanner, &sticker, &sticker.location, &ctx, &cfg);
        assert_eq!(streak.bonus_label, BonusLabel::Streak);

        let event_cfg = SimConfig { streak_bonus: 0.0, event_bonus: 0.5, ..cfg };
        let event_ctx = DayContext { event_active: true, ..ctx };
        let event = compute_scan_reward(&scanner, &sticker, &sticker.location, &event_ctx, &event_cfg);
        assert_eq!(event.bonus_label, BonusLabel::Event);
        assert_eq!(streak.scanner_points, event.scanner_points);
    }

    #[test]
    fn no_bonuses_means_base_times_level() {
        let cfg = SimConfig::default().without_bonuses();
        let (scanner, mut sticker, ctx) = fixtures(&cfg);
        sticker.level = 3;
        let reward = compute_scan_reward(&scanner, &sticker, &sticker.location, &ctx, &cfg);
        assert_eq!(reward.bonus_label, BonusLabel::Base);
        assert_eq!(reward.scanner_points, cfg.scanner_base_points * 1.10);
    }

    #[test]
    fn owner_points_never_increase_with_more_scans() {
        let cfg = SimConfig::default().without_bonuses();
        let (scanner, mut sticker, ctx) = fixtures(&cfg);
        let mut last = f64::INFINITY;
        for n in 0..12 {
            sticker.scans_today = n;
            let owner = compute_scan_reward(&scanner, &sticker, &sticker.location, &ctx, &cfg).owner_points;
            assert!(owner <= last, "owner points rose at {n} scans: {owner} > {last}");
            last = owner;
        }
    }

    #[test]
    fn sneeze_pays_once_per_day_at_threshold() {
        let cfg = SimConfig {
            social_sneeze_bonus: 2.0,
            ..SimConfig::default().without_bonuses()
        };
        let (scanner, mut sticker, ctx) = fixtures(&cfg);
        sticker.scans_today = 2;
        let cold = compute_scan_reward(&scanner, &sticker, &sticker.location, &ctx, &cfg);
        assert_eq!(cold.bonus_label, BonusLabel::Base);

        sticker.scans_today = 3;
        let hot = compute_scan_reward(&scanner, &sticker, &sticker.location, &ctx, &cfg);
        assert_eq!(hot.bonus_label, BonusLabel::Sneeze);
        assert_eq!(hot.scanner_points, 3.0);

        sticker.sneeze_awards_today = 1;
        let spent = compute_scan_reward(&scanner, &sticker, &sticker.location, &ctx, &cfg);
        assert_eq!(spent.bonus_label, BonusLabel::Base);
    }

    #[test]
    fn geo_diversity_needs_a_previous_distant_scan() {
        let cfg = SimConfig::default().without_bonuses();
        let cfg = SimConfig { geo_diversity_bonus: 1.0, ..cfg };
        let (mut scanner, sticker, ctx) = fixtures(&cfg);
        let here = sticker.location;
        assert_eq!(
            compute_scan_reward(&scanner, &sticker, &here, &ctx, &cfg).bonus_label,
            BonusLabel::Base
        );
        // 0.01° ≈ 1110 m, beyond the 500 m radius.
        scanner.last_scan_locations.insert(sticker.id, Location::new(here.lat + 0.01, here.lng));
        assert_eq!(
            compute_scan_reward(&scanner, &sticker, &here, &ctx, &cfg).bonus_label,
            BonusLabel::GeoDiversity
        );
    }
}
