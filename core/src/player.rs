//! Player entity.

use crate::{
    config::SimConfig,
    types::{Archetype, Day, Location, PlayerId, StickerId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id:        PlayerId,
    pub archetype: Archetype,
    pub join_day:  Day,

    // Progression
    pub level:             u32,
    /// Lifetime experience. Spending points never reduces it.
    pub xp:                f64,
    pub last_level_up_day: Option<Day>,

    // Economy
    pub total_points:    f64,
    pub daily_points:    f64,
    pub weekly_points:   f64,
    pub money_spent:     f64,
    /// Unplaced stickers in hand.
    pub stickers_owned:  u32,
    pub stickers_placed: u32,
    pub purchases:       u32,

    // Engagement
    pub is_active:                bool,
    pub churn_day:                Option<Day>,
    /// Fixed at creation from the archetype; never re-evaluated.
    pub churn_probability:        f64,
    pub consecutive_days_active:  u64,
    pub max_consecutive_days:     u64,
    pub total_days_active:        u64,
    pub days_since_last_activity: u64,
    pub scans_today:              u32,
    pub total_scans:              u64,
    pub last_scan_times:          BTreeMap<StickerId, Day>,
    pub last_scan_locations:      BTreeMap<StickerId, Location>,
    pub venues_visited_this_week: BTreeSet<String>,

    // Onboarding
    pub is_new_player:              bool,
    pub new_player_bonus_remaining: u32,
}

impl Player {
    pub fn new(id: PlayerId, archetype: Archetype, join_day: Day, is_new: bool, config: &SimConfig) -> Self {
        let bonus_days = if is_new { config.new_player_bonus_days } else { 0 };
        Self {
            id,
            archetype,
            join_day,
            level: 1,
            xp: 0.0,
            last_level_up_day: None,
            total_points: 0.0,
            daily_points: 0.0,
            weekly_points: 0.0,
            money_spent: 0.0,
            stickers_owned: 0,
            stickers_placed: 0,
            purchases: 0,
            is_active: true,
            churn_day: None,
            churn_probability: config.churn_probability(archetype),
            consecutive_days_active: 0,
            max_consecutive_days: 0,
            total_days_active: 0,
            days_since_last_activity: 0,
            scans_today: 0,
            total_scans: 0,
            last_scan_times: BTreeMap::new(),
            last_scan_locations: BTreeMap::new(),
            venues_visited_this_week: BTreeSet::new(),
            is_new_player: is_new && bonus_days > 0,
            new_player_bonus_remaining: bonus_days,
        }
    }

    /// Credit earned points and apply any level-ups they unlock.
    /// Returns the new level when at least one level was gained.
    pub fn earn(&mut self, points: f64, day: Day, config: &SimConfig) -> Option<u32> {
        self.total_points += points;
        self.daily_points += points;
        self.weekly_points += points;
        self.xp += points;

        let start = self.level;
        while self.level < config.max_level && self.xp >= config.xp_threshold(self.level) {
            self.level += 1;
        }
        if self.level > start {
            self.last_level_up_day = Some(day);
            Some(self.level)
        } else {
            None
        }
    }

    pub fn leveled_up_within(&self, day: Day, window: u64) -> bool {
        self.last_level_up_day
            .is_some_and(|d| day.saturating_sub(d) <= window)
    }

    /// Mark a play day: streak counters advance.
    pub fn record_play_day(&mut self) {
        self.total_days_active += 1;
        self.consecutive_days_active += 1;
        self.max_consecutive_days = self.max_consecutive_days.max(self.consecutive_days_active);
    }

    pub fn record_idle_day(&mut self) {
        self.consecutive_days_active = 0;
    }

    /// Spend one onboarding day. The flag drops once the last day is used.
    pub fn advance_onboarding(&mut self) {
        if self.is_new_player && self.new_player_bonus_remaining > 0 {
            self.new_player_bonus_remaining -= 1;
            if self.new_player_bonus_remaining == 0 {
                self.is_new_player = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earn_crosses_several_thresholds_at_once() {
        let cfg = SimConfig::default();
        let mut p = Player::new(1, Archetype::Grinder, 0, false, &cfg);
        assert_eq!(p.earn(99.0, 3, &cfg), None);
        // 100 → level 2, 125 → level 3, 155 → level 4
        assert_eq!(p.earn(60.0, 4, &cfg), Some(4));
        assert_eq!(p.last_level_up_day, Some(4));
        assert!(p.leveled_up_within(7, 3));
        assert!(!p.leveled_up_within(8, 3));
    }

    #[test]
    fn spending_points_keeps_xp() {
        let cfg = SimConfig::default();
        let mut p = Player::new(1, Archetype::Casual, 0, false, &cfg);
        p.earn(120.0, 1, &cfg);
        p.total_points -= 100.0;
        assert_eq!(p.xp, 120.0);
        assert_eq!(p.level, 2);
    }

    #[test]
    fn onboarding_runs_out_after_bonus_days() {
        let cfg = SimConfig::default();
        let mut p = Player::new(1, Archetype::Casual, 5, true, &cfg);
        for _ in 0..6 {
            p.advance_onboarding();
        }
        assert!(p.is_new_player);
        p.advance_onboarding();
        assert!(!p.is_new_player);
        assert_eq!(p.new_player_bonus_remaining, 0);

        let seeded = Player::new(2, Archetype::Casual, 0, false, &cfg);
        assert!(!seeded.is_new_player);
    }

    #[test]
    fn streak_resets_on_idle_day() {
        let cfg = SimConfig::default();
        let mut p = Player::new(1, Archetype::Whale, 0, false, &cfg);
        p.record_play_day();
        p.record_play_day();
        p.record_idle_day();
        p.record_play_day();
        assert_eq!(p.consecutive_days_active, 1);
        assert_eq!(p.max_consecutive_days, 2);
        assert_eq!(p.total_days_active, 3);
    }
}
