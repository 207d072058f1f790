//! Per-Owner Method Memoization
//!
//! A method is declared once but called on many owners. Each owner gets its
//! own cache scope, created on its first call and released once the owner
//! has been dropped. The owner map holds only weak references, so a memo
//! never keeps an owner alive.
//!
//! Scopes of dropped owners are released when a new owner arrives, and on
//! every 256th call otherwise. Run a [`Sweep`] for prompt release when
//! calls are rare.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::cache::{Clock, SystemClock};
use crate::config::{resolve_with_globals, CacheConfig, MemoOptions};
use crate::memo::{MemoScope, MemoStats, Sweep, SweepReport};

/// Calls between passes that drop the scopes of dead owners.
const PRUNE_INTERVAL: u64 = 256;

/// Owner identity: the address of the owner's shared allocation.
type OwnerId = usize;

fn owner_id<O>(owner: &Arc<O>) -> OwnerId {
    Arc::as_ptr(owner) as *const () as usize
}

struct OwnerSlot<O, V> {
    owner: Weak<O>,
    scope: Arc<MemoScope<V>>,
}

impl<O, V> OwnerSlot<O, V> {
    fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

fn prune_dead<O, V>(scopes: &mut HashMap<OwnerId, OwnerSlot<O, V>>) -> usize {
    let before = scopes.len();
    scopes.retain(|_, slot| slot.is_alive());
    before - scopes.len()
}

// == Method Memo ==
/// Memoization for a method, isolated per owning instance.
///
/// The wrapped function receives the owner and the argument tuple. Owners
/// are passed as `&Arc<O>` so the memo can track them weakly. While a slot
/// holds a `Weak<O>` the owner's allocation cannot be reused, so a new owner
/// never inherits a dead owner's results.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use memorize::{MemoOptions, MethodMemo};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// let greet = MethodMemo::new(
///     |g: &Greeter, (name,): (String,)| format!("{}, {}!", g.greeting, name),
///     MemoOptions::new(),
/// );
///
/// let en = Arc::new(Greeter { greeting: "Hello".into() });
/// let fr = Arc::new(Greeter { greeting: "Bonjour".into() });
/// assert_eq!(greet.call(&en, ("Ada".into(),)), "Hello, Ada!");
/// assert_eq!(greet.call(&fr, ("Ada".into(),)), "Bonjour, Ada!");
/// assert_eq!(greet.scope_count(), 2);
/// ```
pub struct MethodMemo<O, A, V, F> {
    func: F,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    scopes: Mutex<HashMap<OwnerId, OwnerSlot<O, V>>>,
    lookups: AtomicU64,
    _args: PhantomData<fn(A)>,
}

impl<O, A, V: Clone, F> MethodMemo<O, A, V, F> {
    // == Constructor ==
    /// Binds the memo to the unwrapped method.
    ///
    /// `options` are merged over the process-wide defaults once, here.
    pub fn new(func: F, options: MemoOptions) -> Self
    where
        F: Fn(&O, A) -> V,
    {
        Self::from_parts(func, resolve_with_globals(&options))
    }

    /// Binds the memo to a fallible method; only `Ok` results are cached.
    pub fn new_try<E>(func: F, options: MemoOptions) -> Self
    where
        F: Fn(&O, A) -> Result<V, E>,
    {
        Self::from_parts(func, resolve_with_globals(&options))
    }

    fn from_parts(func: F, config: CacheConfig) -> Self {
        Self {
            func,
            config,
            clock: Arc::new(SystemClock),
            scopes: Mutex::new(HashMap::new()),
            lookups: AtomicU64::new(0),
            _args: PhantomData,
        }
    }

    /// Uses `clock` for every scope created from now on.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Settings every owner scope is built with.
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    // == Scope Lookup ==
    fn scope_for(&self, owner: &Arc<O>) -> Arc<MemoScope<V>> {
        let id = owner_id(owner);
        let mut scopes = self.scopes.lock();

        let tick = self.lookups.fetch_add(1, Ordering::Relaxed) + 1;
        if tick % PRUNE_INTERVAL == 0 {
            let released = prune_dead(&mut scopes);
            if released > 0 {
                debug!(released, "released memo scopes of dropped owners");
            }
        }

        if let Some(slot) = scopes.get(&id) {
            if slot.is_alive() {
                return Arc::clone(&slot.scope);
            }
        }

        // New owner: reclaim scopes of dropped owners before adding one
        let released = prune_dead(&mut scopes);
        if released > 0 {
            debug!(released, "released memo scopes of dropped owners");
        }

        let scope = Arc::new(MemoScope::with_clock(self.config, Arc::clone(&self.clock)));
        scopes.insert(
            id,
            OwnerSlot {
                owner: Arc::downgrade(owner),
                scope: Arc::clone(&scope),
            },
        );
        debug!(owners = scopes.len(), "created memo scope");
        scope
    }

    fn existing_scope(&self, owner: &Arc<O>) -> Option<Arc<MemoScope<V>>> {
        self.scopes
            .lock()
            .get(&owner_id(owner))
            .filter(|slot| slot.is_alive())
            .map(|slot| Arc::clone(&slot.scope))
    }

    // == Maintenance ==
    /// Drops the cached results of one owner. Returns whether it had any scope.
    pub fn invalidate(&self, owner: &Arc<O>) -> bool {
        self.scopes.lock().remove(&owner_id(owner)).is_some()
    }

    /// Drops every owner scope.
    pub fn clear(&self) {
        self.scopes.lock().clear();
    }

    /// Releases the scopes of owners that have been dropped.
    pub fn release_dead_scopes(&self) -> usize {
        prune_dead(&mut self.scopes.lock())
    }

    /// Number of scopes whose owner is still alive.
    pub fn scope_count(&self) -> usize {
        self.scopes
            .lock()
            .values()
            .filter(|slot| slot.is_alive())
            .count()
    }

    /// Counters for one owner, if it has called through this memo.
    pub fn stats_for(&self, owner: &Arc<O>) -> Option<MemoStats> {
        self.existing_scope(owner).map(|scope| scope.stats())
    }

    /// Counters summed over every live owner.
    pub fn stats(&self) -> MemoStats {
        let live: Vec<Arc<MemoScope<V>>> = self
            .scopes
            .lock()
            .values()
            .filter(|slot| slot.is_alive())
            .map(|slot| Arc::clone(&slot.scope))
            .collect();

        let mut total = MemoStats::default();
        for scope in live {
            total.merge(&scope.stats());
        }
        total
    }
}

impl<O, A, V, F> MethodMemo<O, A, V, F>
where
    A: Serialize,
    V: Clone,
    F: Fn(&O, A) -> V,
{
    // == Call ==
    /// Calls the method on `owner`, reusing the owner's cached result for
    /// equal arguments.
    pub fn call(&self, owner: &Arc<O>, args: A) -> V {
        let scope = self.scope_for(owner);
        scope.get_or_compute(args, |args| (self.func)(&**owner, args))
    }
}

impl<O, A, V, F> MethodMemo<O, A, V, F>
where
    A: Serialize,
    V: Clone,
{
    // == Try Call ==
    /// Fallible counterpart of [`call`](Self::call); errors are returned
    /// unchanged and never cached.
    pub fn try_call<E>(&self, owner: &Arc<O>, args: A) -> Result<V, E>
    where
        F: Fn(&O, A) -> Result<V, E>,
    {
        let scope = self.scope_for(owner);
        scope.try_get_or_compute(args, |args| (self.func)(&**owner, args))
    }
}

impl<O, A, V, F> Sweep for MethodMemo<O, A, V, F>
where
    O: Send + Sync,
    V: Clone + Send,
    F: Send + Sync,
{
    fn sweep(&self) -> SweepReport {
        let released_scopes = self.release_dead_scopes();
        let live: Vec<Arc<MemoScope<V>>> = self
            .scopes
            .lock()
            .values()
            .map(|slot| Arc::clone(&slot.scope))
            .collect();

        SweepReport {
            expired: live.iter().map(|scope| scope.cleanup_expired()).sum(),
            released_scopes,
        }
    }
}

impl<O, A, V, F> fmt::Debug for MethodMemo<O, A, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodMemo")
            .field("config", &self.config)
            .field("scopes", &self.scopes.lock().len())
            .finish_non_exhaustive()
    }
}
