//! Lifetime-scope policies governing where a built instance is cached and
//! whether a resolve returns the cached value or triggers a new build.

use crate::context::ResolutionContext;
use crate::key::Instance;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

/// Scope policy selected at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
  /// No caching: every resolve builds a fresh instance.
  Transient,
  /// One instance per registration, shared by the whole container hierarchy.
  Singleton,
  /// One instance per calling thread. Slots are keyed by thread id and live
  /// as long as the registration does, even after their thread exits.
  PerThread,
  /// One instance per resolve call tree.
  PerResolve,
  /// A bounded recycling pool; instances are handed back via `checkin`.
  Pooled { capacity: usize },
  /// The container holds a weak back-reference to an instance it does not own
  /// and never disposes.
  External,
}

impl Lifetime {
  /// Whether first-build races must be serialized by the registration's
  /// build lock.
  pub(crate) fn serializes_build(self) -> bool {
    matches!(self, Lifetime::Singleton | Lifetime::Pooled { .. })
  }

  /// Whether the instance is published to its slot right after construction,
  /// before member directives run. This is what lets two dependents in one
  /// object graph share a node that participates in a member-injection cycle.
  pub(crate) fn stores_early(self) -> bool {
    matches!(self, Lifetime::PerResolve)
  }
}

/// A scope policy's storage behavior.
///
/// A manager instance belongs to exactly one registration; the `Box` the
/// registration holds enforces that ownership. Replacing a registration drops
/// the manager, which drops whatever instance its slot still owns.
pub trait LifetimeManager: Send + Sync {
  /// Returns the cached instance for this scope, or `None` when unbuilt.
  ///
  /// `ctx` is `None` when probed outside a resolve call (registration-time
  /// priming); only per-resolve slots need it.
  fn value(&self, ctx: Option<&ResolutionContext<'_>>) -> Option<Instance>;

  /// Publishes a freshly built instance into the scope slot.
  fn store(&self, ctx: Option<&ResolutionContext<'_>>, instance: Instance);

  fn scope(&self) -> Lifetime;

  /// Whether a new build may proceed. Only the pooled policy ever says no.
  fn may_build(&self) -> bool {
    true
  }

  /// Hands an instance back for reuse. Returns `false` if the policy does not
  /// recycle, or the pool was full and the instance was dropped instead.
  fn checkin(&self, instance: Instance) -> bool {
    drop(instance);
    false
  }
}

/// Builds the manager backing a [`Lifetime`] policy.
pub(crate) fn manager_for(lifetime: Lifetime) -> Box<dyn LifetimeManager> {
  match lifetime {
    Lifetime::Transient => Box::new(TransientLifetime),
    Lifetime::Singleton => Box::new(SingletonLifetime { cell: OnceCell::new() }),
    Lifetime::PerThread => Box::new(PerThreadLifetime { slots: Mutex::new(HashMap::new()) }),
    Lifetime::PerResolve => Box::new(PerResolveLifetime),
    Lifetime::Pooled { capacity } => Box::new(PooledLifetime {
      capacity,
      idle: Mutex::new(Vec::new()),
      built: AtomicUsize::new(0),
    }),
    Lifetime::External => Box::new(ExternalLifetime { probe: RwLock::new(None) }),
  }
}

struct TransientLifetime;

impl LifetimeManager for TransientLifetime {
  fn value(&self, _ctx: Option<&ResolutionContext<'_>>) -> Option<Instance> {
    None
  }

  fn store(&self, _ctx: Option<&ResolutionContext<'_>>, _instance: Instance) {}

  fn scope(&self) -> Lifetime {
    Lifetime::Transient
  }
}

struct SingletonLifetime {
  cell: OnceCell<Instance>,
}

impl LifetimeManager for SingletonLifetime {
  fn value(&self, _ctx: Option<&ResolutionContext<'_>>) -> Option<Instance> {
    self.cell.get().cloned()
  }

  fn store(&self, _ctx: Option<&ResolutionContext<'_>>, instance: Instance) {
    // Unbuilt -> Built is irreversible; a second store is a no-op.
    let _ = self.cell.set(instance);
  }

  fn scope(&self) -> Lifetime {
    Lifetime::Singleton
  }
}

struct PerThreadLifetime {
  slots: Mutex<HashMap<ThreadId, Instance>>,
}

impl LifetimeManager for PerThreadLifetime {
  fn value(&self, _ctx: Option<&ResolutionContext<'_>>) -> Option<Instance> {
    self.slots.lock().get(&thread::current().id()).cloned()
  }

  fn store(&self, _ctx: Option<&ResolutionContext<'_>>, instance: Instance) {
    self.slots.lock().insert(thread::current().id(), instance);
  }

  fn scope(&self) -> Lifetime {
    Lifetime::PerThread
  }
}

struct PerResolveLifetime;

impl LifetimeManager for PerResolveLifetime {
  fn value(&self, ctx: Option<&ResolutionContext<'_>>) -> Option<Instance> {
    let ctx = ctx?;
    ctx.per_resolve_get(ctx.key())
  }

  fn store(&self, ctx: Option<&ResolutionContext<'_>>, instance: Instance) {
    if let Some(ctx) = ctx {
      ctx.per_resolve_store(ctx.key().clone(), instance);
    }
  }

  fn scope(&self) -> Lifetime {
    Lifetime::PerResolve
  }
}

struct PooledLifetime {
  capacity: usize,
  idle: Mutex<Vec<Instance>>,
  /// Instances currently alive, idle or checked out.
  built: AtomicUsize,
}

impl LifetimeManager for PooledLifetime {
  fn value(&self, _ctx: Option<&ResolutionContext<'_>>) -> Option<Instance> {
    self.idle.lock().pop()
  }

  fn store(&self, _ctx: Option<&ResolutionContext<'_>>, _instance: Instance) {
    // The fresh instance is handed to the caller, not stashed; it only enters
    // the idle pool through `checkin`.
    self.built.fetch_add(1, Ordering::SeqCst);
  }

  fn scope(&self) -> Lifetime {
    Lifetime::Pooled { capacity: self.capacity }
  }

  fn may_build(&self) -> bool {
    self.built.load(Ordering::SeqCst) < self.capacity
  }

  fn checkin(&self, instance: Instance) -> bool {
    let mut idle = self.idle.lock();
    if idle.len() < self.capacity {
      idle.push(instance);
      true
    } else {
      // Evicted: the instance is disposed by drop and its build slot freed.
      // A surplus checkin with no matching build leaves the count untouched.
      drop(idle);
      drop(instance);
      let _ = self
        .built
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |alive| alive.checked_sub(1));
      false
    }
  }
}

type ProbeFn = Box<dyn Fn() -> Option<Instance> + Send + Sync>;

/// Holds a weak, typed probe installed by `register_external`. Until the probe
/// is installed (or once the watched instance is dropped) the slot reads as
/// unbuilt. Teardown never disposes the watched instance.
pub(crate) struct ExternalLifetime {
  probe: RwLock<Option<ProbeFn>>,
}

impl ExternalLifetime {
  pub(crate) fn watching(probe: ProbeFn) -> Self {
    Self { probe: RwLock::new(Some(probe)) }
  }
}

impl LifetimeManager for ExternalLifetime {
  fn value(&self, _ctx: Option<&ResolutionContext<'_>>) -> Option<Instance> {
    self.probe.read().as_ref().and_then(|probe| probe())
  }

  fn store(&self, _ctx: Option<&ResolutionContext<'_>>, instance: Instance) {
    // The container does not own externally controlled instances; dropping the
    // erased handle here releases our reference immediately.
    drop(instance);
  }

  fn scope(&self) -> Lifetime {
    Lifetime::External
  }
}
