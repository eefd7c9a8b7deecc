//! The simulation engine: the daily loop of the FYNDR economy.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   0. Engine: reset per-day counters, apply sticker decay
//!   1. Growth subsystem    (viral + organic recruitment)
//!   2. Churn subsystem     (daily attrition, before behavior)
//!   3. Behavior subsystem  (play-day roll, purchases, placements, scans)
//!   4. Engine: weekly reset on `day % 7 == 0`
//!   5. Engine: aggregate the day into a DailySnapshot
//!
//! RULES:
//!   - Subsystems execute in registration order, every day.
//!   - No subsystem calls another subsystem's functions directly.
//!   - All randomness flows through the RngBank.
//!   - Every state change a subsystem makes is reported as a SimEvent.

use crate::{
    behavior_subsystem::{place_from_hand, BehaviorSubsystem},
    churn_subsystem::ChurnSubsystem,
    clock::SimClock,
    config::SimConfig,
    error::{SimError, SimResult},
    event::{JoinSource, SimEvent},
    growth_subsystem::GrowthSubsystem,
    rng::{RngBank, SubsystemSlot},
    season::DayContext,
    snapshot::{aggregate, summarize, DailySnapshot, DayTally, SimSummary},
    store::SimStore,
    subsystem::SimSubsystem,
    types::{Archetype, PerArchetype},
};
use serde::{Deserialize, Serialize};

/// Players seeded on day 0, per archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialPopulation {
    pub whale:   u64,
    pub grinder: u64,
    pub casual:  u64,
}

impl InitialPopulation {
    pub fn new(whale: u64, grinder: u64, casual: u64) -> Self {
        Self { whale, grinder, casual }
    }

    pub fn total(&self) -> u64 {
        self.whale + self.grinder + self.casual
    }

    fn as_counts(&self) -> PerArchetype<u64> {
        PerArchetype::new(self.whale, self.grinder, self.casual)
    }
}

impl Default for InitialPopulation {
    fn default() -> Self {
        Self::new(10, 50, 100)
    }
}

pub struct SimEngine {
    pub clock:    SimClock,
    pub rng_bank: RngBank,
    config:       SimConfig,
    subsystems:   Vec<(SubsystemSlot, Box<dyn SimSubsystem>)>,
    store:        SimStore,
    snapshots:    Vec<DailySnapshot>,
    seed_events:  Vec<SimEvent>,
}

impl SimEngine {
    /// Bare engine with no subsystems and no population.
    /// Validates the config; use build() for a wired run.
    pub fn new(config: SimConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            clock:       SimClock::new(),
            rng_bank:    RngBank::new(seed),
            config,
            subsystems:  Vec::new(),
            store:       SimStore::new(),
            snapshots:   Vec::new(),
            seed_events: Vec::new(),
        })
    }

    /// Build a fully wired engine with all subsystems registered and the
    /// initial population seeded on day 0.
    pub fn build(config: SimConfig, population: InitialPopulation, seed: u64) -> SimResult<Self> {
        let mut engine = SimEngine::new(config, seed)?;
        let cap = engine.config.max_possible_players();
        if population.total() > cap {
            return Err(SimError::invalid(
                "initial_population",
                format!("{} seeded players exceed the cap of {cap}", population.total()),
            ));
        }

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(
            SubsystemSlot::Growth,
            Box::new(GrowthSubsystem::new(engine.config.clone())),
        );
        engine.register(SubsystemSlot::Churn, Box::new(ChurnSubsystem::new()));
        engine.register(
            SubsystemSlot::Behavior,
            Box::new(BehaviorSubsystem::new(engine.config.clone())),
        );

        engine.seed_population(population)?;
        Ok(engine)
    }

    /// Small-locale engine with the default seeded population.
    /// Used by tests and tooling.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        Self::build(SimConfig::default_test(), InitialPopulation::default(), seed)
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, slot: SubsystemSlot, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push((slot, subsystem));
    }

    /// Day 0: create the seeded players and place their free stickers.
    fn seed_population(&mut self, population: InitialPopulation) -> SimResult<()> {
        let counts = population.as_counts();
        let rng = self.rng_bank.for_subsystem(SubsystemSlot::Seeding);

        for archetype in Archetype::ALL {
            for _ in 0..*counts.get(archetype) {
                let player_id = self.store.add_player(archetype, 0, false, &self.config);
                self.seed_events.push(SimEvent::PlayerJoined {
                    day: 0,
                    player_id,
                    archetype,
                    source: JoinSource::Seed,
                });
                let stickers = self.config.initial_stickers_per_player;
                self.store.grant_stickers(player_id, stickers)?;
                self.seed_events
                    .extend(place_from_hand(&mut self.store, player_id, stickers, 0, &self.config, rng));
            }
        }

        log::info!(
            "day=0 seeding: {} players, {} stickers placed",
            population.total(),
            self.store.active_sticker_count()
        );
        Ok(())
    }

    /// Advance one day. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        let day = self.clock.advance();
        let ctx = DayContext::for_day(day, &self.config);
        let mut day_events = vec![SimEvent::DayStarted { day, event_active: ctx.event_active }];

        self.store.begin_day(&self.config);

        // Each subsystem sees all events emitted so far this day.
        for (slot, subsystem) in &mut self.subsystems {
            let rng = self.rng_bank.for_subsystem(*slot);
            let new_events = subsystem.update(&ctx, &day_events, &mut self.store, rng)?;
            day_events.extend(new_events);
        }

        if self.clock.is_week_boundary() {
            self.store.begin_week();
        }

        let tally = DayTally::from_events(&day_events);
        let snapshot = aggregate(&self.store, &tally, day, ctx.event_active, &self.config);
        log::debug!(
            "day={day} engine: {} active, {} scans, ${:.2} revenue{}",
            snapshot.active_players,
            snapshot.scans_today,
            snapshot.revenue_today,
            if ctx.event_active { " (event)" } else { "" }
        );
        self.snapshots.push(snapshot);

        day_events.push(SimEvent::DayCompleted { day });
        Ok(day_events)
    }

    /// Run n days in a loop and summarize the whole run so far.
    pub fn run(&mut self, days: u64) -> SimResult<SimSummary> {
        for _ in 0..days {
            self.tick()?;
        }
        let summary = self.summary();
        log::info!(
            "day={} engine: run complete, {} active of {} ever, ${:.2} revenue",
            self.clock.current_day,
            summary.active_players,
            summary.total_players_ever,
            summary.total_revenue
        );
        Ok(summary)
    }

    /// Summary of the days simulated so far.
    pub fn summary(&self) -> SimSummary {
        summarize(&self.store, self.clock.current_day, &self.config)
    }

    pub fn snapshots(&self) -> &[DailySnapshot] {
        &self.snapshots
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Events emitted while seeding day 0.
    pub fn seed_events(&self) -> &[SimEvent] {
        &self.seed_events
    }

    /// Find a registered subsystem by concrete type.
    /// Used by tests and tooling to read subsystem counters.
    pub fn subsystem<T: SimSubsystem + 'static>(&self) -> Option<&T> {
        self.subsystems
            .iter()
            .find_map(|(_, sub)| sub.as_any().downcast_ref::<T>())
    }
}
