//! Deferred work for a single-threaded, host-driven engine.
//!
//! The engine never sleeps and never spawns. Follow-up steps are queued on a
//! [`Scheduler`] whose clock only moves when the host calls into it, which
//! keeps every ordering decision deterministic. There is no cancellation:
//! tasks that may have been superseded check a [`Latch`] generation when
//! they finally run.

use std::time::Duration;

use smallvec::SmallVec;

#[derive(Debug, Clone)]
struct Scheduled<T> {
  due:  Duration,
  seq:  u64,
  task: T,
}

/// Queue of tasks keyed by a virtual due time.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
  now:      Duration,
  next_seq: u64,
  queue:    SmallVec<[Scheduled<T>; 4]>,
}

impl<T> Default for Scheduler<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Scheduler<T> {
  pub fn new() -> Self {
    Self {
      now:      Duration::ZERO,
      next_seq: 0,
      queue:    SmallVec::new(),
    }
  }

  /// Current virtual time.
  pub fn now(&self) -> Duration {
    self.now
  }

  pub fn pending(&self) -> usize {
    self.queue.len()
  }

  pub fn is_idle(&self) -> bool {
    self.queue.is_empty()
  }

  /// Queue `task` to run once `delay` has elapsed from now. A zero delay
  /// runs on the next advance, after everything already due at this time.
  pub fn schedule(&mut self, delay: Duration, task: T) {
    let seq = self.next_seq;
    self.next_seq = self.next_seq.wrapping_add(1);
    self.queue.push(Scheduled {
      due: self.now + delay,
      seq,
      task,
    });
  }

  /// Time left until the earliest queued task is due.
  pub fn next_due_in(&self) -> Option<Duration> {
    self
      .queue
      .iter()
      .map(|entry| entry.due.saturating_sub(self.now))
      .min()
  }

  /// Remove the earliest task due at or before `until`, moving the clock to
  /// its due time. Ties run in scheduling order.
  pub fn pop_due(&mut self, until: Duration) -> Option<T> {
    let position = self
      .queue
      .iter()
      .enumerate()
      .filter(|(_, entry)| entry.due <= until)
      .min_by_key(|(_, entry)| (entry.due, entry.seq))
      .map(|(position, _)| position)?;
    let entry = self.queue.remove(position);
    self.now = self.now.max(entry.due);
    Some(entry.task)
  }

  /// Move the clock to `until` without running anything.
  pub fn settle(&mut self, until: Duration) {
    self.now = self.now.max(until);
  }
}

/// Boolean flag whose release only counts for the latest engagement.
///
/// Every [`Latch::engage`] returns a generation. A deferred release carrying
/// an older generation is ignored, so overlapping engage/release pairs leave
/// the flag in the state written last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latch {
  engaged:    bool,
  generation: u64,
}

impl Latch {
  pub fn is_engaged(&self) -> bool {
    self.engaged
  }

  pub fn engage(&mut self) -> u64 {
    self.generation = self.generation.wrapping_add(1);
    self.engaged = true;
    self.generation
  }

  /// Release the flag if `generation` is still the latest engagement.
  pub fn release(&mut self, generation: u64) -> bool {
    if self.engaged && generation == self.generation {
      self.engaged = false;
      true
    } else {
      false
    }
  }

  /// Drop the flag and invalidate any pending release.
  pub fn reset(&mut self) {
    self.generation = self.generation.wrapping_add(1);
    self.engaged = false;
  }
}
