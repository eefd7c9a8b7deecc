//! Behavior subsystem: one policy per archetype, run for every active
//! player once per day in creation order.
//!
//! Each player first rolls a play day. Idle days break the streak. On a
//! play day the archetype policy buys, places and scans:
//!
//!   whale   weekly cash packs + wallet top-up, moderate scanning
//!   grinder heavy scanning, reinvests points after level-ups and weekly
//!   casual  light scanning, weekly points reinvestment, rare cash pack
//!
//! Onboarding days are spent whether or not the player played.
//! Execution: every day, last.

use crate::{
    config::SimConfig,
    error::SimResult,
    event::{Currency, SimEvent},
    reward::simulate_scan,
    rng::SubsystemRng,
    season::DayContext,
    store::SimStore,
    subsystem::SimSubsystem,
    types::{Archetype, Day, Location, PlayerId},
};

/// Max stickers placed after a purchase, by trigger.
const WHALE_CASH_PLACEMENT_CAP: u32 = 6;
const WHALE_TOPUP_PLACEMENT_CAP: u32 = 8;
const GRINDER_PLACEMENT_CAP: u32 = 6;
const CASUAL_REINVEST_PLACEMENT_CAP: u32 = 4;
const CASUAL_CASH_PLACEMENTS: u32 = 2;

const WEEK: Day = 7;

pub struct BehaviorSubsystem {
    config: SimConfig,
}

impl BehaviorSubsystem {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    fn whale_day(
        &self,
        store: &mut SimStore,
        player_id: PlayerId,
        ctx: &DayContext,
        rng: &mut SubsystemRng,
        events: &mut Vec<SimEvent>,
    ) {
        let cfg = &self.config;
        let day = ctx.day;

        if day % WEEK == 0 {
            if rng.chance(cfg.whale_weekly_purchase_probability) {
                let packs = rng.range_inclusive(1, cfg.whale_packs_max);
                let cap = (2 * packs).min(WHALE_CASH_PLACEMENT_CAP);
                self.buy_with_cash(store, player_id, Archetype::Whale, packs, cap, day, rng, events);
            }

            let dollars = rng.uniform(cfg.wallet_topup_min, cfg.wallet_topup_max);
            match store.topup_for_packs(player_id, dollars, cfg) {
                Ok(packs) => {
                    events.push(SimEvent::PackPurchased {
                        day,
                        player_id,
                        archetype: Archetype::Whale,
                        currency: Currency::Cash,
                        packs,
                        amount: dollars,
                    });
                    let cap = (2 * packs).min(WHALE_TOPUP_PLACEMENT_CAP);
                    events.extend(place_from_hand(store, player_id, cap, day, cfg, rng));
                }
                Err(rejection) => log::trace!("day={day} behavior: top-up skipped: {rejection}"),
            }
        }

        self.scan_round(store, player_id, Archetype::Whale, ctx, rng, events);
    }

    fn grinder_day(
        &self,
        store: &mut SimStore,
        player_id: PlayerId,
        ctx: &DayContext,
        rng: &mut SubsystemRng,
        events: &mut Vec<SimEvent>,
    ) {
        let cfg = &self.config;
        let day = ctx.day;

        self.scan_round(store, player_id, Archetype::Grinder, ctx, rng, events);

        let Some(player) = store.player(player_id) else { return };
        let price = cfg.pack_price_points;
        if player.total_points < price {
            return;
        }
        let spend = if player.leveled_up_within(day, cfg.grinder_levelup_window_days) {
            // Fresh level: sink the whole balance into stickers of that level.
            player.total_points
        } else if day % WEEK == 0 {
            (player.total_points * cfg.grinder_reinvest_fraction).floor().max(price)
        } else {
            return;
        };

        let packs = (spend / price).floor() as u32;
        self.reinvest(store, player_id, Archetype::Grinder, packs, GRINDER_PLACEMENT_CAP, day, rng, events);
    }

    fn casual_day(
        &self,
        store: &mut SimStore,
        player_id: PlayerId,
        ctx: &DayContext,
        rng: &mut SubsystemRng,
        events: &mut Vec<SimEvent>,
    ) {
        let cfg = &self.config;
        let day = ctx.day;

        self.scan_round(store, player_id, Archetype::Casual, ctx, rng, events);

        if day % WEEK == 0 {
            let balance = store.player(player_id).map_or(0.0, |p| p.total_points);
            if balance >= cfg.pack_price_points {
                let spend = (balance * cfg.casual_reinvest_fraction).floor().max(cfg.pack_price_points);
                let packs = (spend / cfg.pack_price_points).floor() as u32;
                self.reinvest(
                    store,
                    player_id,
                    Archetype::Casual,
                    packs,
                    CASUAL_REINVEST_PLACEMENT_CAP,
                    day,
                    rng,
                    events,
                );
            }
        }

        if day % cfg.casual_purchase_interval_days == 0
            && rng.chance(cfg.casual_purchase_probability)
        {
            self.buy_with_cash(store, player_id, Archetype::Casual, 1, CASUAL_CASH_PLACEMENTS, day, rng, events);
        }
    }

    /// Buy `packs` with cash and place up to `placement_cap` of them.
    #[allow(clippy::too_many_arguments)]
    fn buy_with_cash(
        &self,
        store: &mut SimStore,
        player_id: PlayerId,
        archetype: Archetype,
        packs: u32,
        placement_cap: u32,
        day: Day,
        rng: &mut SubsystemRng,
        events: &mut Vec<SimEvent>,
    ) {
        match store.purchase_with_cash(player_id, packs, &self.config) {
            Ok(amount) => {
                events.push(SimEvent::PackPurchased {
                    day,
                    player_id,
                    archetype,
                    currency: Currency::Cash,
                    packs,
                    amount,
                });
                events.extend(place_from_hand(store, player_id, placement_cap, day, &self.config, rng));
            }
            Err(rejection) => log::trace!("day={day} behavior: cash purchase skipped: {rejection}"),
        }
    }

    /// Spend points on `packs` packs and place up to `2 × packs` (capped).
    #[allow(clippy::too_many_arguments)]
    fn reinvest(
        &self,
        store: &mut SimStore,
        player_id: PlayerId,
        archetype: Archetype,
        packs: u32,
        placement_cap: u32,
        day: Day,
        rng: &mut SubsystemRng,
        events: &mut Vec<SimEvent>,
    ) {
        if packs == 0 {
            return;
        }
        match store.purchase_with_points(player_id, packs, &self.config) {
            Ok(amount) => {
                events.push(SimEvent::PackPurchased {
                    day,
                    player_id,
                    archetype,
                    currency: Currency::Points,
                    packs,
                    amount,
                });
                let cap = (2 * packs).min(placement_cap);
                events.extend(place_from_hand(store, player_id, cap, day, &self.config, rng));
            }
            Err(rejection) => log::trace!("day={day} behavior: reinvestment skipped: {rejection}"),
        }
    }

    /// Attempt today's scans. Targets are drawn uniformly from the map;
    /// drawing one of the player's own stickers wastes the attempt.
    fn scan_round(
        &self,
        store: &mut SimStore,
        player_id: PlayerId,
        archetype: Archetype,
        ctx: &DayContext,
        rng: &mut SubsystemRng,
        events: &mut Vec<SimEvent>,
    ) {
        let range = self.config.scan_range(archetype);
        let attempts = rng.range_inclusive(range.min, range.max);
        let jitter = self.config.scan_jitter_degrees;

        for _ in 0..attempts {
            let Some(&sticker_id) = rng.pick(store.scannable()) else { break };
            let Some(sticker) = store.sticker(sticker_id) else { continue };
            if sticker.owner_id == player_id {
                continue;
            }
            let scan_location = Location::new(
                sticker.location.lat + rng.uniform(-jitter, jitter),
                sticker.location.lng + rng.uniform(-jitter, jitter),
            );

            match simulate_scan(store, player_id, sticker_id, scan_location, ctx, &self.config) {
                Ok(outcome) => {
                    events.push(SimEvent::ScanRecorded {
                        day: ctx.day,
                        scanner_id: player_id,
                        sticker_id,
                        owner_id: outcome.owner_id,
                        sticker_level: outcome.sticker_level,
                        scanner_points: outcome.reward.scanner_points,
                        owner_points: outcome.reward.owner_points,
                        bonus_label: outcome.reward.bonus_label,
                    });
                    events.extend(outcome.level_ups.into_iter().map(|(player_id, level)| {
                        SimEvent::LevelUp { day: ctx.day, player_id, level }
                    }));
                }
                Err(rejection) => {
                    log::trace!("day={} behavior: scan skipped: {rejection}", ctx.day);
                }
            }
        }
    }
}

/// Place up to `max` stickers from the owner's hand at random spots in
/// the configured bounds. Returns one StickerPlaced per placement.
pub fn place_from_hand(
    store: &mut SimStore,
    owner_id: PlayerId,
    max: u32,
    day: Day,
    config: &SimConfig,
    rng: &mut SubsystemRng,
) -> Vec<SimEvent> {
    let in_hand = store.player(owner_id).map_or(0, |p| p.stickers_owned);
    let b = config.bounds;

    let mut events = Vec::new();
    for _ in 0..max.min(in_hand) {
        let location = Location::new(
            rng.uniform(b.lat_min, b.lat_max),
            rng.uniform(b.lng_min, b.lng_max),
        );
        let venue_category = rng.pick(&config.venue_categories).cloned().unwrap_or_default();
        match store.place_sticker(owner_id, location, venue_category.clone(), day) {
            Ok(sticker_id) => {
                let level = store.sticker(sticker_id).map_or(1, |s| s.level);
                events.push(SimEvent::StickerPlaced { day, sticker_id, owner_id, venue_category, level });
            }
            Err(rejection) => {
                log::trace!("day={day} placement skipped: {rejection}");
                break;
            }
        }
    }
    events
}

impl SimSubsystem for BehaviorSubsystem {
    fn name(&self) -> &'static str { "behavior" }

    fn update(
        &mut self,
        ctx: &DayContext,
        _events_in: &[SimEvent],
        store: &mut SimStore,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        let mut players_active = 0u32;

        for player_id in store.active_player_ids() {
            let Some(archetype) = store.player(player_id).map(|p| p.archetype) else { continue };
            let plays = rng.chance(*self.config.play_probability.get(archetype));

            if let Some(player) = store.player_mut(player_id) {
                if plays {
                    player.record_play_day();
                } else {
                    player.record_idle_day();
                }
            }

            if plays {
                players_active += 1;
                match archetype {
                    Archetype::Whale   => self.whale_day(store, player_id, ctx, rng, &mut events),
                    Archetype::Grinder => self.grinder_day(store, player_id, ctx, rng, &mut events),
                    Archetype::Casual  => self.casual_day(store, player_id, ctx, rng, &mut events),
                }
            }

            if let Some(player) = store.player_mut(player_id) {
                player.advance_onboarding();
            }
        }

        log::debug!(
            "day={} behavior: {players_active} players played, {} events",
            ctx.day,
            events.len()
        );
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_day(
        behavior: &mut BehaviorSubsystem,
        store: &mut SimStore,
        day: Day,
        rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        let ctx = DayContext { day, event_active: false };
        behavior.update(&ctx, &[], store, rng).unwrap()
    }

    #[test]
    fn own_stickers_are_never_scanned() {
        let cfg = SimConfig::default_test();
        let mut store = SimStore::new();
        let id = store.add_player(Archetype::Grinder, 0, false, &cfg);
        store.grant_stickers(id, 4).unwrap();
        let mut rng = SubsystemRng::new(11, 3);
        place_from_hand(&mut store, id, 4, 0, &cfg, &mut rng);

        let mut behavior = BehaviorSubsystem::new(cfg);
        let events = run_day(&mut behavior, &mut store, 1, &mut rng);
        assert!(
            !events.iter().any(|e| matches!(e, SimEvent::ScanRecorded { .. })),
            "a lone player has nothing to scan"
        );
    }

    #[test]
    fn placements_stay_inside_bounds() {
        let cfg = SimConfig::default_test();
        let mut store = SimStore::new();
        let id = store.add_player(Archetype::Whale, 0, false, &cfg);
        store.grant_stickers(id, 50).unwrap();
        let mut rng = SubsystemRng::new(5, 3);

        let events = place_from_hand(&mut store, id, 60, 0, &cfg, &mut rng);
        assert_eq!(events.len(), 50, "placement is limited by inventory");
        for sticker in store.stickers() {
            assert!(cfg.bounds.contains(&sticker.location), "{:?} out of bounds", sticker.location);
            assert!(cfg.venue_categories.contains(&sticker.venue_category));
        }
    }

    #[test]
    fn idle_day_breaks_streak() {
        let mut cfg = SimConfig::default_test();
        cfg.play_probability.casual = 0.0;
        let mut store = SimStore::new();
        let id = store.add_player(Archetype::Casual, 0, false, &cfg);
        if let Some(p) = store.player_mut(id) {
            p.consecutive_days_active = 5;
        }
        let mut behavior = BehaviorSubsystem::new(cfg);
        let mut rng = SubsystemRng::new(5, 3);
        run_day(&mut behavior, &mut store, 1, &mut rng);
        let player = store.player(id).unwrap();
        assert_eq!(player.consecutive_days_active, 0);
        assert_eq!(player.total_days_active, 0);
    }

    #[test]
    fn whale_buys_on_week_boundary() {
        let mut cfg = SimConfig::default_test();
        cfg.whale_weekly_purchase_probability = 1.0;
        let mut store = SimStore::new();
        let id = store.add_player(Archetype::Whale, 0, false, &cfg);
        let mut behavior = BehaviorSubsystem::new(cfg.clone());
        let mut rng = SubsystemRng::new(5, 3);

        let events = run_day(&mut behavior, &mut store, 7, &mut rng);
        let purchases = events
            .iter()
            .filter(|e| matches!(e, SimEvent::PackPurchased { currency: Currency::Cash, .. }))
            .count();
        assert_eq!(purchases, 2, "pack purchase plus wallet top-up");
        let whale = store.player(id).unwrap();
        assert!(whale.money_spent >= cfg.pack_price_dollars + cfg.wallet_topup_min);
        assert!(whale.stickers_placed > 0);
    }

    fn point_purchases(events: &[SimEvent]) -> Vec<(u32, f64)> {
        events
            .iter()
            .filter_map(|e| match e {
                SimEvent::PackPurchased { currency: Currency::Points, packs, amount, .. } => {
                    Some((*packs, *amount))
                }
                _ => None,
            })
            .collect()
    }

    fn funded_grinder(cfg: &SimConfig, points: f64, leveled_on: Option<Day>) -> (SimStore, PlayerId) {
        let mut store = SimStore::new();
        let id = store.add_player(Archetype::Grinder, 0, false, cfg);
        if let Some(p) = store.player_mut(id) {
            p.total_points = points;
            p.last_level_up_day = leveled_on;
        }
        (store, id)
    }

    #[test]
    fn grinder_sinks_whole_balance_after_level_up() {
        let mut cfg = SimConfig::default_test();
        cfg.play_probability.grinder = 1.0;
        let mut behavior = BehaviorSubsystem::new(cfg.clone());
        let mut rng = SubsystemRng::new(5, 3);

        // Day 3 is mid-week; only the level-up window triggers spending.
        let (mut store, id) = funded_grinder(&cfg, 3_000.0, Some(1));
        let events = run_day(&mut behavior, &mut store, 3, &mut rng);
        assert_eq!(point_purchases(&events), vec![(10, 3_000.0)]);
        let grinder = store.player(id).unwrap();
        assert_eq!(grinder.total_points, 0.0);
        assert_eq!(grinder.stickers_placed, GRINDER_PLACEMENT_CAP);

        // Outside the window nothing is bought mid-week.
        let (mut store, id) = funded_grinder(&cfg, 3_000.0, None);
        let events = run_day(&mut behavior, &mut store, 3, &mut rng);
        assert!(point_purchases(&events).is_empty());
        assert_eq!(store.player(id).unwrap().total_points, 3_000.0);
    }

    #[test]
    fn grinder_reinvests_a_fraction_on_week_boundary() {
        let mut cfg = SimConfig::default_test();
        cfg.play_probability.grinder = 1.0;
        let mut behavior = BehaviorSubsystem::new(cfg.clone());
        let mut rng = SubsystemRng::new(6, 3);

        // 10% of 3000 is one pack.
        let (mut store, id) = funded_grinder(&cfg, 3_000.0, None);
        let events = run_day(&mut behavior, &mut store, 7, &mut rng);
        assert_eq!(point_purchases(&events), vec![(1, 300.0)]);
        assert_eq!(store.player(id).unwrap().total_points, 2_700.0);

        // A small balance still buys one pack when it covers the price.
        let (mut store, id) = funded_grinder(&cfg, 400.0, None);
        let events = run_day(&mut behavior, &mut store, 14, &mut rng);
        assert_eq!(point_purchases(&events), vec![(1, 300.0)]);
        assert_eq!(store.player(id).unwrap().total_points, 100.0);
    }

    #[test]
    fn casual_cash_pack_only_on_purchase_interval() {
        let mut cfg = SimConfig::default_test();
        cfg.play_probability.casual = 1.0;
        cfg.casual_purchase_probability = 1.0;
        let mut store = SimStore::new();
        let id = store.add_player(Archetype::Casual, 0, false, &cfg);
        let mut behavior = BehaviorSubsystem::new(cfg.clone());
        let mut rng = SubsystemRng::new(7, 3);

        for day in [1, 7, 14, 27] {
            let events = run_day(&mut behavior, &mut store, day, &mut rng);
            assert!(
                !events.iter().any(|e| matches!(e, SimEvent::PackPurchased { .. })),
                "day {day}: casual bought off-interval"
            );
        }

        let events = run_day(&mut behavior, &mut store, cfg.casual_purchase_interval_days, &mut rng);
        let cash: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::PackPurchased { currency: Currency::Cash, packs, amount, .. } => Some((*packs, *amount)),
                _ => None,
            })
            .collect();
        assert_eq!(cash, vec![(1, cfg.pack_price_dollars)]);
        let placed = events.iter().filter(|e| matches!(e, SimEvent::StickerPlaced { .. })).count();
        assert_eq!(placed as u32, CASUAL_CASH_PLACEMENTS);
        assert_eq!(store.player(id).unwrap().money_spent, cfg.pack_price_dollars);
        assert_eq!(store.ledger.total_revenue, cfg.pack_price_dollars);
    }

    #[test]
    fn rejected_purchases_are_skipped_not_fatal() {
        let cfg = SimConfig::default_test();
        let mut store = SimStore::new();
        let broke = store.add_player(Archetype::Grinder, 0, false, &cfg);
        let gone = store.add_player(Archetype::Casual, 0, false, &cfg);
        store.churn_player(gone, 1).unwrap();
        let behavior = BehaviorSubsystem::new(cfg);
        let mut rng = SubsystemRng::new(8, 3);
        let mut events = Vec::new();

        behavior.reinvest(&mut store, broke, Archetype::Grinder, 2, GRINDER_PLACEMENT_CAP, 7, &mut rng, &mut events);
        behavior.buy_with_cash(&mut store, gone, Archetype::Casual, 1, CASUAL_CASH_PLACEMENTS, 7, &mut rng, &mut events);

        assert!(events.is_empty());
        assert_eq!(store.ledger.point_purchases + store.ledger.cash_purchases, 0);
    }
}

