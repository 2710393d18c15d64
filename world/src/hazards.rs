//! Health processes: passive hazard drain, critical faults and healing.

use voxel_rover_core::{Event, HealthCause};

use crate::{
    query,
    scheduler::{Job, Purpose},
    World,
};

impl World {
    /// Corrodes the rover once according to the surface it stands on.
    pub(crate) fn apply_passive_drain(&mut self, out_events: &mut Vec<Event>) {
        let surface = query::current_surface(self);
        let Some(kind) = surface else {
            tracing::warn!(position = %self.unit.position, "status requested without a surface");
            return;
        };
        let drain = self.config.hazard_drain(surface);
        self.adjust_health(-drain, HealthCause::Hazard(kind), out_events);
    }

    pub(crate) fn raise_fault(&mut self, out_events: &mut Vec<Event>) {
        if self.unit.fault_active {
            return;
        }
        self.unit.fault_active = true;
        self.scheduler
            .schedule_every(Job::FaultDrain, self.config.fault_period());
        tracing::info!("critical fault raised");
        out_events.push(Event::FaultRaised);
    }

    pub(crate) fn clear_fault(&mut self, out_events: &mut Vec<Event>) {
        if !self.unit.fault_active {
            return;
        }
        self.unit.fault_active = false;
        let _ = self.scheduler.cancel(Purpose::FaultDrain);
        tracing::info!("critical fault cleared");
        out_events.push(Event::FaultCleared);
    }

    pub(crate) fn drain_fault(&mut self, out_events: &mut Vec<Event>) {
        let drain = self.config.fault_drain;
        self.adjust_health(-drain, HealthCause::Fault, out_events);
    }

    /// Starts a repair cycle; a cycle already running is restarted with a
    /// full step budget.
    pub(crate) fn start_healing(&mut self, out_events: &mut Vec<Event>) {
        self.healing_ticks_left = self.config.healing_max_ticks;
        self.scheduler
            .schedule_every(Job::HealStep, self.config.healing_period());
        out_events.push(Event::HealingStarted);
    }

    pub(crate) fn heal_step(&mut self, out_events: &mut Vec<Event>) {
        let max_health = self.config.max_health;
        if self.unit.health >= max_health || self.healing_ticks_left == 0 {
            self.finish_healing(out_events);
            return;
        }

        let amount = self
            .config
            .healing_amount
            .min(max_health - self.unit.health);
        self.adjust_health(amount, HealthCause::Healing, out_events);
        self.healing_ticks_left -= 1;

        if self.healing_ticks_left == 0 || self.unit.health >= max_health {
            self.finish_healing(out_events);
        }
    }

    fn finish_healing(&mut self, out_events: &mut Vec<Event>) {
        self.healing_ticks_left = 0;
        let _ = self.scheduler.cancel(Purpose::Healing);
        tracing::debug!(health = self.unit.health, "healing finished");
        out_events.push(Event::HealingFinished);
    }
}
