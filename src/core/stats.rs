/// Point-in-time counters of a [`Scheduler`](super::Scheduler).
///
/// All fields are read under one lock, so they are mutually consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Slots in the result table (tasks submitted since the last reset).
    pub submitted: usize,
    /// Tasks executing now.
    pub running: usize,
    /// Tasks waiting for admission.
    pub queued: usize,
    /// Highest `running` value observed so far.
    pub peak_running: usize,
    /// Slots holding a value.
    pub fulfilled: usize,
    /// Slots holding an error.
    pub rejected: usize,
}

impl SchedulerStats {
    /// Slots in a terminal state.
    pub fn settled(&self) -> usize {
        self.fulfilled + self.rejected
    }

    /// Slots still `Pending` (queued or running).
    pub fn pending(&self) -> usize {
        self.submitted.saturating_sub(self.settled())
    }
}
