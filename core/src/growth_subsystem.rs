//! Growth subsystem: viral and organic recruitment under a population cap.
//!
//! This subsystem:
//!   1. Recruits `floor(active × viral_spread_percentage)` players on
//!      every viral boundary
//!   2. Recruits organically on every organic boundary once the map holds
//!      enough stickers, scaled by sticker density
//!   3. Doubles both during seasonal events, then clamps viral first and
//!      organic second to the remaining capacity
//!
//! New recruits are flagged as new players and get their free packs.
//! Execution: every day, first.

use crate::{
    config::SimConfig,
    error::SimResult,
    event::{JoinSource, SimEvent},
    rng::SubsystemRng,
    season::DayContext,
    store::SimStore,
    subsystem::SimSubsystem,
    types::{Archetype, Day},
};

pub struct GrowthSubsystem {
    config: SimConfig,
    pub viral_total:   u64,
    pub organic_total: u64,
}

/// Recruit counts decided for one day, already clamped to capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrowthPlan {
    pub viral:   u64,
    pub organic: u64,
}

impl GrowthSubsystem {
    pub fn new(config: SimConfig) -> Self {
        Self { config, viral_total: 0, organic_total: 0 }
    }

    /// Decide today's recruits. Draws from `rng` only on organic days that
    /// clear the sticker threshold.
    pub fn plan(&self, ctx: &DayContext, store: &SimStore, rng: &mut SubsystemRng) -> GrowthPlan {
        let cfg = &self.config;
        let day = ctx.day;
        let active = store.active_player_count();
        let mut remaining = cfg.max_possible_players().saturating_sub(active);
        let boost = if ctx.event_active { cfg.event_growth_multiplier } else { 1.0 };

        let mut plan = GrowthPlan::default();

        if day % cfg.viral_spread_frequency_days == 0 {
            let raw = (active as f64 * cfg.viral_spread_percentage).floor();
            plan.viral = ((raw * boost).floor() as u64).min(remaining);
            remaining -= plan.viral;
        }

        let stickers = store.active_sticker_count();
        if day % cfg.organic_growth_interval_days == 0
            && stickers >= cfg.organic_growth_tags_threshold
        {
            let rate = rng.uniform(cfg.organic_growth_rate_min, cfg.organic_growth_rate_max);
            let density = (stickers as f64 / cfg.organic_growth_tags_threshold as f64)
                .min(cfg.organic_growth_density_cap);
            let raw = (cfg.total_population as f64 * rate * density).floor();
            plan.organic = ((raw * boost).floor() as u64).min(remaining);
        }

        plan
    }

    fn recruit(
        &self,
        store: &mut SimStore,
        day: Day,
        source: JoinSource,
        count: u64,
        rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        let ratios = self.config.new_player_type_ratios;
        let choices = [
            (Archetype::Whale, ratios.whale),
            (Archetype::Grinder, ratios.grinder),
            (Archetype::Casual, ratios.casual),
        ];
        let free_stickers = self.config.new_player_free_packs * self.config.stickers_per_pack;

        let mut events = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let archetype = rng.weighted(&choices).unwrap_or(Archetype::Casual);
            let player_id = store.add_player(archetype, day, true, &self.config);
            if let Err(rejection) = store.grant_stickers(player_id, free_stickers) {
                log::trace!("day={day} growth: free packs skipped: {rejection}");
            }
            events.push(SimEvent::PlayerJoined { day, player_id, archetype, source });
        }
        events
    }
}

impl SimSubsystem for GrowthSubsystem {
    fn name(&self) -> &'static str { "growth" }

    fn update(
        &mut self,
        ctx: &DayContext,
        _events_in: &[SimEvent],
        store: &mut SimStore,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let day = ctx.day;
        let plan = self.plan(ctx, store, rng);
        if plan == GrowthPlan::default() {
            return Ok(Vec::new());
        }

        let mut events = self.recruit(store, day, JoinSource::Viral, plan.viral, rng);
        events.extend(self.recruit(store, day, JoinSource::Organic, plan.organic, rng));
        self.viral_total += plan.viral;
        self.organic_total += plan.organic;

        log::info!(
            "day={day} growth: +{} viral, +{} organic ({} active, cap {})",
            plan.viral,
            plan.organic,
            store.active_player_count(),
            self.config.max_possible_players()
        );
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
