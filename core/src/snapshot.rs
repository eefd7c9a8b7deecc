//! Daily aggregation and end-of-run summary.
//!
//! Both functions are pure: they read the store and the day's tally and
//! return a fresh value. Calling them twice on unchanged state yields
//! identical output.

use crate::{
    config::SimConfig,
    event::{Currency, JoinSource, SimEvent},
    store::SimStore,
    types::{Archetype, Day, PerArchetype},
};
use serde::{Deserialize, Serialize};

/// Counts bucketed from one day's events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayTally {
    pub new_players:      u64,
    pub viral_recruits:   u64,
    pub organic_recruits: u64,
    pub churned:          u64,
    pub revenue:          f64,
    pub points_earned:    f64,
    pub scans:            u64,
    pub stickers_placed:  u64,
    pub level_ups:        u64,
    pub cash_purchases:   u64,
    pub point_purchases:  u64,
}

impl DayTally {
    pub fn from_events(events: &[SimEvent]) -> Self {
        let mut tally = Self::default();
        for event in events {
            match event {
                SimEvent::PlayerJoined { source, .. } => {
                    tally.new_players += 1;
                    match source {
                        JoinSource::Viral   => tally.viral_recruits += 1,
                        JoinSource::Organic => tally.organic_recruits += 1,
                        JoinSource::Seed    => {}
                    }
                }
                SimEvent::PlayerChurned { .. } => tally.churned += 1,
                SimEvent::PackPurchased { currency: Currency::Cash, amount, .. } => {
                    tally.cash_purchases += 1;
                    tally.revenue += amount;
                }
                SimEvent::PackPurchased { currency: Currency::Points, .. } => {
                    tally.point_purchases += 1;
                }
                SimEvent::StickerPlaced { .. } => tally.stickers_placed += 1,
                SimEvent::ScanRecorded { scanner_points, owner_points, .. } => {
                    tally.scans += 1;
                    tally.points_earned += scanner_points + owner_points;
                }
                SimEvent::LevelUp { .. } => tally.level_ups += 1,
                SimEvent::DayStarted { .. } | SimEvent::DayCompleted { .. } => {}
            }
        }
        tally
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub day: Day,

    // Population
    pub active_players:       u64,
    pub total_players_ever:   u64,
    pub new_players_today:    u64,
    pub viral_recruits_today: u64,
    pub organic_recruits_today: u64,
    pub churned_today:        u64,
    pub churned_total:        u64,
    pub active_by_archetype:  PerArchetype<u64>,

    // Economy
    pub revenue_today:          f64,
    pub total_revenue:          f64,
    pub points_earned_today:    f64,
    pub scans_today:            u64,
    pub stickers_placed_today:  u64,
    pub active_stickers:        u64,
    pub purchases_by_archetype: PerArchetype<u64>,
    pub cash_purchases:         u64,
    pub point_purchases:        u64,

    // Engagement
    pub average_level:            f64,
    pub average_consecutive_days: f64,
    pub retention_rate:           f64,

    // Reach
    pub population_penetration: f64,
    pub max_possible_players:   u64,
    pub cap_reached:            bool,
    pub event_active:           bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSummary {
    pub days_simulated: Day,

    pub total_revenue:        f64,
    /// Over every player ever created, churned included.
    pub revenue_by_archetype: PerArchetype<f64>,
    /// Points held by active players.
    pub total_points:         f64,
    pub total_scans:          u64,

    pub active_players:     u64,
    pub total_players_ever: u64,
    pub retention_rate:     f64,
    pub churn_rate:         f64,
    pub active_stickers:    u64,

    pub total_purchases:        u64,
    pub purchases_by_archetype: PerArchetype<u64>,
    pub cash_purchases:         u64,
    pub point_purchases:        u64,

    pub avg_revenue_per_player: f64,
    pub avg_points_per_scan:    f64,
    pub average_level:          f64,
    pub population_penetration: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

/// (active count, mean level, mean streak) over active players.
fn active_averages(store: &SimStore) -> (u64, f64, f64) {
    let (mut n, mut levels, mut streaks) = (0u64, 0.0, 0.0);
    for p in store.players().iter().filter(|p| p.is_active) {
        n += 1;
        levels += f64::from(p.level);
        streaks += p.consecutive_days_active as f64;
    }
    (n, ratio(levels, n as f64), ratio(streaks, n as f64))
}

/// Build the snapshot for `day` from the store and that day's tally.
pub fn aggregate(
    store: &SimStore,
    tally: &DayTally,
    day: Day,
    event_active: bool,
    config: &SimConfig,
) -> DailySnapshot {
    let ledger = &store.ledger;
    let (active, average_level, average_consecutive_days) = active_averages(store);

    let mut active_by_archetype = PerArchetype::<u64>::default();
    for p in store.players().iter().filter(|p| p.is_active) {
        *active_by_archetype.get_mut(p.archetype) += 1;
    }
    let max_possible_players = config.max_possible_players();

    DailySnapshot {
        day,
        active_players: active,
        total_players_ever: ledger.total_players_ever,
        new_players_today: tally.new_players,
        viral_recruits_today: tally.viral_recruits,
        organic_recruits_today: tally.organic_recruits,
        churned_today: tally.churned,
        churned_total: ledger.churned_total,
        active_by_archetype,
        revenue_today: tally.revenue,
        total_revenue: ledger.total_revenue,
        points_earned_today: tally.points_earned,
        scans_today: tally.scans,
        stickers_placed_today: tally.stickers_placed,
        active_stickers: store.active_sticker_count(),
        purchases_by_archetype: ledger.purchases,
        cash_purchases: ledger.cash_purchases,
        point_purchases: ledger.point_purchases,
        average_level,
        average_consecutive_days,
        retention_rate: ratio(active as f64, ledger.total_players_ever as f64),
        population_penetration: ratio(active as f64, config.total_population as f64),
        max_possible_players,
        cap_reached: active >= max_possible_players,
        event_active,
    }
}

/// Final run summary after `days` simulated days.
pub fn summarize(store: &SimStore, days: Day, config: &SimConfig) -> SimSummary {
    let ledger = &store.ledger;
    let (active, average_level, _) = active_averages(store);
    let total_points = store
        .players()
        .iter()
        .filter(|p| p.is_active)
        .map(|p| p.total_points)
        .sum();
    let ever = ledger.total_players_ever as f64;

    SimSummary {
        days_simulated: days,
        total_revenue: ledger.total_revenue,
        revenue_by_archetype: ledger.revenue_by_archetype,
        total_points,
        total_scans: ledger.total_scans,
        active_players: active,
        total_players_ever: ledger.total_players_ever,
        retention_rate: ratio(active as f64, ever),
        churn_rate: ratio(ledger.churned_total as f64, ever),
        active_stickers: store.active_sticker_count(),
        total_purchases: ledger.purchases.total(),
        purchases_by_archetype: ledger.purchases,
        cash_purchases: ledger.cash_purchases,
        point_purchases: ledger.point_purchases,
        avg_revenue_per_player: ratio(ledger.total_revenue, ever),
        avg_points_per_scan: ratio(ledger.points_awarded, ledger.total_scans as f64),
        average_level,
        population_penetration: ratio(active as f64, config.total_population as f64),
    }
}

impl SimSummary {
    /// Field-wise mean of several runs' summaries. None for an empty slice.
    /// Counts are rounded to the nearest whole value.
    pub fn average(runs: &[SimSummary]) -> Option<SimSummary> {
        let first = runs.first()?;
        let n = runs.len() as f64;
        let mean_f = |f: fn(&SimSummary) -> f64| runs.iter().map(f).sum::<f64>() / n;
        let mean_u = |f: fn(&SimSummary) -> u64| {
            (runs.iter().map(|r| f(r) as f64).sum::<f64>() / n).round() as u64
        };
        let per_archetype_f = |f: fn(&SimSummary) -> PerArchetype<f64>| {
            let mut out = PerArchetype::<f64>::default();
            for a in Archetype::ALL {
                *out.get_mut(a) = runs.iter().map(|r| *f(r).get(a)).sum::<f64>() / n;
            }
            out
        };
        let per_archetype_u = |f: fn(&SimSummary) -> PerArchetype<u64>| {
            let mut out = PerArchetype::<u64>::default();
            for a in Archetype::ALL {
                *out.get_mut(a) =
                    (runs.iter().map(|r| *f(r).get(a) as f64).sum::<f64>() / n).round() as u64;
            }
            out
        };

        Some(SimSummary {
            days_simulated: first.days_simulated,
            total_revenue: mean_f(|r| r.total_revenue),
            revenue_by_archetype: per_archetype_f(|r| r.revenue_by_archetype),
            total_points: mean_f(|r| r.total_points),
            total_scans: mean_u(|r| r.total_scans),
            active_players: mean_u(|r| r.active_players),
            total_players_ever: mean_u(|r| r.total_players_ever),
            retention_rate: mean_f(|r| r.retention_rate),
            churn_rate: mean_f(|r| r.churn_rate),
            active_stickers: mean_u(|r| r.active_stickers),
            total_purchases: mean_u(|r| r.total_purchases),
            purchases_by_archetype: per_archetype_u(|r| r.purchases_by_archetype),
            cash_purchases: mean_u(|r| r.cash_purchases),
            point_purchases: mean_u(|r| r.point_purchases),
            avg_revenue_per_player: mean_f(|r| r.avg_revenue_per_player),
            avg_points_per_scan: mean_f(|r| r.avg_points_per_scan),
            average_level: mean_f(|r| r.average_level),
            population_penetration: mean_f(|r| r.population_penetration),
        })
    }
}
