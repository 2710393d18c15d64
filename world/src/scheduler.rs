//! Virtual-time task scheduler owned by the world.
//!
//! Tasks are either one-shot or periodic and carry the [`Job`] the world runs
//! when they fall due. Tasks are grouped by [`Purpose`] so a whole process can
//! be cancelled at once. Due tasks are released in due-time order; ties go to
//! the task that was scheduled first.

use std::time::Duration;

use voxel_rover_core::Coordinate;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Process a scheduled task belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Purpose {
    Autonomy,
    FaultDrain,
    Healing,
    PendingMove,
}

/// Work performed when a task falls due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Job {
    AutonomyTick,
    FaultDrain,
    HealStep,
    CommitMove { destination: Coordinate },
}

impl Job {
    pub(crate) const fn purpose(self) -> Purpose {
        match self {
            Self::AutonomyTick => Purpose::Autonomy,
            Self::FaultDrain => Purpose::FaultDrain,
            Self::HealStep => Purpose::Healing,
            Self::CommitMove { .. } => Purpose::PendingMove,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Task {
    job: Job,
    due: Duration,
    period: Option<Duration>,
    sequence: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    now: Duration,
    tasks: Vec<Task>,
    next_sequence: u64,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Simulated time elapsed since the scheduler was created.
    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    /// Runs `job` once after `delay`.
    pub(crate) fn schedule_once(&mut self, job: Job, delay: Duration) {
        let sequence = self.take_sequence();
        self.tasks.push(Task {
            job,
            due: self.now.saturating_add(delay),
            period: None,
            sequence,
        });
    }

    /// Starts a fresh periodic process, replacing any task with the same purpose.
    pub(crate) fn schedule_every(&mut self, job: Job, period: Duration) {
        let _ = self.cancel(job.purpose());
        let period = period.max(MIN_PERIOD);
        let sequence = self.take_sequence();
        self.tasks.push(Task {
            job,
            due: self.now.saturating_add(period),
            period: Some(period),
            sequence,
        });
    }

    /// Drops every task with the provided purpose, returning how many were removed.
    pub(crate) fn cancel(&mut self, purpose: Purpose) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.job.purpose() != purpose);
        before - self.tasks.len()
    }

    pub(crate) fn is_active(&self, purpose: Purpose) -> bool {
        self.count(purpose) > 0
    }

    pub(crate) fn count(&self, purpose: Purpose) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.job.purpose() == purpose)
            .count()
    }

    /// Earliest due time among tasks with the provided purpose.
    pub(crate) fn next_due(&self, purpose: Purpose) -> Option<Duration> {
        self.tasks
            .iter()
            .filter(|task| task.job.purpose() == purpose)
            .map(|task| task.due)
            .min()
    }

    /// Releases the earliest task due no later than `until`.
    ///
    /// The clock jumps to the task's due time. Periodic tasks are re-armed one
    /// period later and queue behind anything already due at that instant.
    pub(crate) fn pop_due(&mut self, until: Duration) -> Option<Job> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due <= until)
            .min_by_key(|(_, task)| (task.due, task.sequence))
            .map(|(index, _)| index)?;

        let task = self.tasks[index];
        self.now = self.now.max(task.due);

        match task.period {
            Some(period) => {
                let sequence = self.take_sequence();
                let slot = &mut self.tasks[index];
                slot.due = task.due.saturating_add(period);
                slot.sequence = sequence;
            }
            None => {
                let _ = self.tasks.swap_remove(index);
            }
        }

        Some(task.job)
    }

    /// Moves the clock forward to `until` once every due task was released.
    pub(crate) fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler, until: Duration) -> Vec<Job> {
        let mut jobs = Vec::new();
        while let Some(job) = scheduler.pop_due(until) {
            jobs.push(job);
        }
        scheduler.settle(until);
        jobs
    }

    #[test]
    fn one_shot_fires_once_at_due_time() {
        let mut scheduler = Scheduler::new();
        let destination = Coordinate::new(1, 2, 3);
        scheduler.schedule_once(Job::CommitMove { destination }, Duration::from_secs(5));

        assert!(drain(&mut scheduler, Duration::from_secs(4)).is_empty());
        assert_eq!(
            drain(&mut scheduler, Duration::from_secs(5)),
            vec![Job::CommitMove { destination }]
        );
        assert!(drain(&mut scheduler, Duration::from_secs(60)).is_empty());
        assert_eq!(scheduler.now(), Duration::from_secs(60));
    }

    #[test]
    fn periodic_task_fires_every_period() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(Job::FaultDrain, Duration::from_secs(1));

        let jobs = drain(&mut scheduler, Duration::from_millis(3_500));
        assert_eq!(jobs, vec![Job::FaultDrain; 3]);
        assert_eq!(scheduler.count(Purpose::FaultDrain), 1);
    }

    #[test]
    fn rescheduling_a_process_restarts_its_phase() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(Job::AutonomyTick, Duration::from_secs(1));
        let _ = drain(&mut scheduler, Duration::from_millis(1_500));

        scheduler.schedule_every(Job::AutonomyTick, Duration::from_secs(1));
        assert_eq!(scheduler.count(Purpose::Autonomy), 1);
        assert!(drain(&mut scheduler, Duration::from_millis(2_400)).is_empty());
        assert_eq!(
            drain(&mut scheduler, Duration::from_millis(2_500)),
            vec![Job::AutonomyTick]
        );
    }

    #[test]
    fn next_due_tracks_the_rearmed_period() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.next_due(Purpose::Autonomy), None);

        scheduler.schedule_every(Job::AutonomyTick, Duration::from_secs(2));
        scheduler.schedule_once(
            Job::CommitMove {
                destination: Coordinate::new(0, 1, 0),
            },
            Duration::from_secs(1),
        );
        assert_eq!(
            scheduler.next_due(Purpose::Autonomy),
            Some(Duration::from_secs(2))
        );

        let _ = drain(&mut scheduler, Duration::from_secs(2));
        assert_eq!(
            scheduler.next_due(Purpose::Autonomy),
            Some(Duration::from_secs(4))
        );
    }

    #[test]
    fn cancel_removes_only_matching_purpose() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(Job::HealStep, Duration::from_secs(1));
        scheduler.schedule_every(Job::FaultDrain, Duration::from_secs(1));

        assert_eq!(scheduler.cancel(Purpose::Healing), 1);
        assert!(!scheduler.is_active(Purpose::Healing));
        assert!(scheduler.is_active(Purpose::FaultDrain));
    }

    #[test]
    fn ties_release_in_scheduling_order() {
        let mut scheduler = Scheduler::new();
        let first = Coordinate::new(0, 1, 0);
        let second = Coordinate::new(5, 1, 5);
        scheduler.schedule_once(
            Job::CommitMove { destination: first },
            Duration::from_secs(2),
        );
        scheduler.schedule_every(Job::HealStep, Duration::from_secs(1));
        scheduler.schedule_once(
            Job::CommitMove {
                destination: second,
            },
            Duration::from_secs(2),
        );

        let jobs = drain(&mut scheduler, Duration::from_secs(2));
        assert_eq!(
            jobs,
            vec![
                Job::HealStep,
                Job::CommitMove { destination: first },
                Job::CommitMove {
                    destination: second
                },
                Job::HealStep,
            ]
        );
    }
}
