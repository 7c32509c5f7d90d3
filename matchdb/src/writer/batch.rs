//! Per-worker batch state machine.
//!
//! A worker feeds every event it observes into its [`Batch`] and carries out
//! the returned [`Step`]: flush these rows, reset the idle timer, stop. Keeping
//! the decisions here, free of channels and clocks, lets the size-flush and
//! timeout-flush rules be tested on their own.

use tictactoe::Outcome;

/// Something a worker observed while waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// A job was dequeued.
    Job(Outcome),
    /// The idle timer fired.
    IdleTimeout,
    /// The queue is closed and empty.
    Closed,
}

/// What the worker must do in response to an event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Step {
    /// Rows to hand to the sink in one insert.
    pub flush: Option<Vec<Outcome>>,
    /// Restart the idle timer from now.
    pub reset_timer: bool,
    /// The worker is done once this step is carried out.
    pub finished: bool,
}

/// Jobs accumulated by one worker, bounded by the batch size.
#[derive(Debug)]
pub struct Batch {
    rows: Vec<Outcome>,
    capacity: usize,
}

impl Batch {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            rows: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn handle(&mut self, event: BatchEvent) -> Step {
        match event {
            BatchEvent::Job(job) => {
                self.rows.push(job);
                if self.rows.len() >= self.capacity {
                    Step {
                        flush: self.take(),
                        reset_timer: true,
                        finished: false,
                    }
                } else {
                    Step::default()
                }
            }
            BatchEvent::IdleTimeout => Step {
                flush: self.take(),
                reset_timer: true,
                finished: false,
            },
            BatchEvent::Closed => Step {
                flush: self.take(),
                reset_timer: false,
                finished: true,
            },
        }
    }

    /// Hand over the accumulated rows, leaving an empty batch behind.
    fn take(&mut self) -> Option<Vec<Outcome>> {
        if self.rows.is_empty() {
            return None;
        }
        Some(std::mem::replace(
            &mut self.rows,
            Vec::with_capacity(self.capacity),
        ))
    }
}
