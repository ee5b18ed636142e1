use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_std::channel::{bounded, Receiver, Sender};
use async_std::prelude::*;
use async_std::task;
use tide::log;

use crate::models::Reason;
use crate::poller;
use crate::state::State;


/// Single-fire flag. Firing closes the underlying channel, so every waiter
/// wakes and only the first `fire` reports `true`.
#[derive(Debug, Clone)]
pub struct Latch {
  tx: Sender<()>,
  rx: Receiver<()>,
}

impl Latch {
  pub fn new() -> Self {
    let (tx, rx) = bounded(1);
    Latch { tx, rx }
  }

  pub fn fire(&self) -> bool {
    self.tx.close()
  }

  pub fn is_fired(&self) -> bool {
    self.tx.is_closed()
  }

  pub async fn wait(&self) {
    // nothing is ever sent, recv only returns once closed
    let _ = self.rx.recv().await;
  }
}

impl Default for Latch {
  fn default() -> Self {
    Self::new()
  }
}

/// Join barrier for spawned work. Every task holds a clone of the guard
/// sender; draining drops the original and waits for the channel to close.
#[derive(Debug)]
pub struct TaskGroup {
  guard: Mutex<Option<Sender<()>>>,
  done: Receiver<()>,
  active: Arc<AtomicUsize>,
}

impl TaskGroup {
  pub fn new() -> Self {
    let (tx, rx) = bounded(1);
    TaskGroup {
      guard: Mutex::new(Some(tx)),
      done: rx,
      active: Arc::new(AtomicUsize::new(0)),
    }
  }

  /// Spawns a tracked task. Returns false once draining has started.
  pub fn spawn<F>(&self, work: F) -> bool
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let guard = match self.guard.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
      Some(tx) => tx.clone(),
      None => return false,
    };
    let active = self.active.clone();
    active.fetch_add(1, Ordering::SeqCst);
    task::spawn(async move {
      work.await;
      active.fetch_sub(1, Ordering::SeqCst);
      drop(guard);
    });
    true
  }

  pub fn active(&self) -> usize {
    self.active.load(Ordering::SeqCst)
  }

  /// Refuses new work and waits for every tracked task to finish.
  pub async fn drain(&self) {
    let guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner).take();
    drop(guard);
    let _ = self.done.recv().await;
  }
}

impl Default for TaskGroup {
  fn default() -> Self {
    Self::new()
  }
}

/// Owns the two ways a run can end and the barrier for in-flight work.
#[derive(Debug, Default)]
pub struct Coordinator {
  completed: Latch,
  cancelled: Latch,
  tasks: TaskGroup,
}

impl Coordinator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Marks the target as found. Only the first caller gets `true`.
  pub fn complete(&self) -> bool {
    self.completed.fire()
  }

  /// External stop request.
  pub fn cancel(&self) -> bool {
    self.cancelled.fire()
  }

  pub fn reason(&self) -> Option<Reason> {
    if self.completed.is_fired() {
      Some(Reason::Completed)
    } else if self.cancelled.is_fired() {
      Some(Reason::Cancelled)
    } else {
      None
    }
  }

  /// Resolves as soon as either flag fires.
  pub async fn triggered(&self) -> Reason {
    let completed = async {
      self.completed.wait().await;
      Reason::Completed
    };
    let cancelled = async {
      self.cancelled.wait().await;
      Reason::Cancelled
    };
    completed.race(cancelled).await
  }

  pub fn spawn<F>(&self, work: F) -> bool
  where
    F: Future<Output = ()> + Send + 'static,
  {
    self.tasks.spawn(work)
  }

  pub fn in_flight(&self) -> usize {
    self.tasks.active()
  }

  pub async fn drain(&self) {
    self.tasks.drain().await
  }
}

/// Runs the poller until a flag fires, then waits for in-flight attempts and
/// their notifications before handing back the reason.
pub async fn run(state: State) -> Reason {
  let reason = poller::run(state.clone()).await;
  log::info!(
    "stopped scheduling ({:?}), waiting on {} in-flight task(s)",
    reason,
    state.coordinator.in_flight()
  );
  state.coordinator.drain().await;
  log::info!("all work drained, shutting down");
  reason
}
