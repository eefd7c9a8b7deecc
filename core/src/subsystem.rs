//! Subsystem trait and registry.
//!
//! RULE: Every daily stage implements SimSubsystem.
//! The engine calls update() on each registered subsystem
//! in registration order, every day.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    season::DayContext,
    store::SimStore,
};
use std::any::Any;

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per day by the engine.
    ///
    /// - `ctx`:       the day number and whether a seasonal event is running
    /// - `events_in`: events emitted by earlier subsystems this day
    /// - `store`:     the run's entities; mutated only through its methods
    /// - `rng`:       this subsystem's persistent deterministic stream
    ///
    /// Returns the events to append to the day's log.
    fn update(
        &mut self,
        ctx: &DayContext,
        events_in: &[SimEvent],
        store: &mut SimStore,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>>;

    /// For downcasting in tests and tooling only.
    /// Production sim code never uses this.
    fn as_any(&self) -> &dyn Any;
}
