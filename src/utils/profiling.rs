use std::time::{Duration, Instant};

use log::{info, log_enabled, trace, Level};

/// Per-phase wall time accumulated over many steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfiler {
    pub process_time: Duration,
    pub neighbor_time: Duration,
    pub contact_time: Duration,
    pub internal_force_time: Duration,
    pub integration_time: Duration,
    pub total_time: Duration,

    pub steps: u64,
    pub rebuilds: u64,
    pub contact_count: usize,
}

impl StepProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) {
        let total_us = self.total_time.as_micros() as f32;
        if total_us < 1.0 || self.steps == 0 {
            return;
        }
        let share = |d: Duration| d.as_micros() as f32 / total_us * 100.0;

        info!(
            "profile: {} steps, {:.2} ms total, {:.1} µs/step, {} rebuilds, {} contacts",
            self.steps,
            self.total_time.as_secs_f32() * 1000.0,
            total_us / self.steps as f32,
            self.rebuilds,
            self.contact_count
        );
        info!(
            "  process {:.1}%  neighbors {:.1}%  contacts {:.1}%  internal {:.1}%  integration {:.1}%",
            share(self.process_time),
            share(self.neighbor_time),
            share(self.contact_time),
            share(self.internal_force_time),
            share(self.integration_time)
        );
    }
}

/// Step phases tracked by [`StepProfiler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Process,
    Neighbors,
    Contacts,
    InternalForces,
    Integration,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Process => "process",
            Phase::Neighbors => "neighbors",
            Phase::Contacts => "contacts",
            Phase::InternalForces => "forces::internal",
            Phase::Integration => "integrator",
        }
    }
}

impl StepProfiler {
    pub fn phase_time(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Process => self.process_time,
            Phase::Neighbors => self.neighbor_time,
            Phase::Contacts => self.contact_time,
            Phase::InternalForces => self.internal_force_time,
            Phase::Integration => self.integration_time,
        }
    }

    fn phase_time_mut(&mut self, phase: Phase) -> &mut Duration {
        match phase {
            Phase::Process => &mut self.process_time,
            Phase::Neighbors => &mut self.neighbor_time,
            Phase::Contacts => &mut self.contact_time,
            Phase::InternalForces => &mut self.internal_force_time,
            Phase::Integration => &mut self.integration_time,
        }
    }
}

/// Guard that adds its lifetime to one phase of a [`StepProfiler`] and
/// traces the phase boundaries.
pub struct PhaseTimer<'a> {
    phase: Phase,
    start: Instant,
    profiler: &'a mut StepProfiler,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(profiler: &'a mut StepProfiler, phase: Phase) -> Self {
        if log_enabled!(Level::Trace) {
            trace!("start {}", phase.label());
        }
        Self {
            phase,
            start: Instant::now(),
            profiler,
        }
    }
}

impl<'a> Drop for PhaseTimer<'a> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        *self.profiler.phase_time_mut(self.phase) += elapsed;
        if log_enabled!(Level::Trace) {
            trace!("end {} ({} µs)", self.phase.label(), elapsed.as_micros());
        }
    }
}
