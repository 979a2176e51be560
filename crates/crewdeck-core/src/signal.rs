//! Payload-free refresh broadcasting.
//!
//! The bus carries exactly one message: "state changed, re-read a
//! snapshot". Listeners get no payload, so a listener that missed three
//! signals and one that missed one do the same work: take a fresh snapshot
//! and recompute. That makes signals safe to coalesce and drop.
//!
//! Dispatch runs listener callbacks *outside* the registry lock, so a
//! callback may freely subscribe, unsubscribe, or emit again without
//! deadlocking. Changes made during a dispatch take effect from the next
//! emit onward.

use std::sync::{Arc, Mutex, PoisonError, Weak};

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    listeners: Vec<(u64, Handler)>,
    next_id: u64,
    batch_depth: u32,
    pending: bool,
}

/// Cloneable handle to one shared refresh channel.
#[derive(Clone, Default)]
pub struct RefreshBus {
    registry: Arc<Mutex<Registry>>,
}

impl RefreshBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for refresh signals.
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut reg = self.lock();
            let id = reg.next_id;
            reg.next_id += 1;
            reg.listeners.push((id, Arc::new(handler)));
            id
        };
        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    /// Signal every current listener once.
    ///
    /// Inside a [`coalesce`](Self::coalesce) scope the signal is deferred
    /// and merged with any others raised in the same scope.
    pub fn emit(&self) {
        let handlers: Vec<Handler> = {
            let mut reg = self.lock();
            if reg.batch_depth > 0 {
                reg.pending = true;
                return;
            }
            reg.listeners.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        for handler in handlers {
            handler();
        }
    }

    /// Run `f` with signal delivery deferred; at most one signal is emitted
    /// when the outermost coalescing scope ends, and only if anything was
    /// emitted inside. Scopes nest, and the deferred signal survives a
    /// panic in `f`.
    pub fn coalesce<R>(&self, f: impl FnOnce() -> R) -> R {
        self.lock().batch_depth += 1;
        let _guard = CoalesceGuard { bus: self.clone() };
        f()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

struct CoalesceGuard {
    bus: RefreshBus,
}

impl Drop for CoalesceGuard {
    fn drop(&mut self) {
        let flush = {
            let mut reg = self.bus.lock();
            reg.batch_depth = reg.batch_depth.saturating_sub(1);
            if reg.batch_depth == 0 && reg.pending {
                reg.pending = false;
                true
            } else {
                false
            }
        };
        if flush {
            self.bus.emit();
        }
    }
}

/// Keeps one listener registered; dropping it unsubscribes.
#[must_use = "dropping the subscription immediately unsubscribes"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut reg = registry.lock().unwrap_or_else(PoisonError::into_inner);
            reg.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(bus: &RefreshBus) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = bus.subscribe({
            let hits = Arc::clone(&hits);
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });
        (hits, sub)
    }

    #[test]
    fn emit_reaches_every_listener() {
        let bus = RefreshBus::new();
        let (a, _sub_a) = counting(&bus);
        let (b, _sub_b) = counting(&bus);

        bus.emit();
        bus.emit();

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = RefreshBus::new();
        let (hits, sub) = counting(&bus);

        bus.emit();
        drop(sub);
        bus.emit();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn coalesce_merges_many_emits_into_one() {
        let bus = RefreshBus::new();
        let (hits, _sub) = counting(&bus);

        bus.coalesce(|| {
            bus.emit();
            bus.emit();
            bus.emit();
        });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn coalesce_without_emit_signals_nothing() {
        let bus = RefreshBus::new();
        let (hits, _sub) = counting(&bus);

        bus.coalesce(|| {});

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn nested_coalesce_flushes_once_at_the_outermost_scope() {
        let bus = RefreshBus::new();
        let (hits, _sub) = counting(&bus);

        bus.coalesce(|| {
            bus.emit();
            bus.coalesce(|| {
                bus.emit();
            });
            assert_eq!(hits.load(Ordering::SeqCst), 0);
        });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_emit_without_deadlocking() {
        let bus = RefreshBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let _sub = bus.subscribe({
            let bus = bus.clone();
            let hits = Arc::clone(&hits);
            move || {
                // Re-entrant emit; one level only, gated by the counter.
                if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                    bus.emit();
                }
            }
        });

        bus.emit();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn pending_signal_survives_a_panicking_scope() {
        let bus = RefreshBus::new();
        let (hits, _sub) = counting(&bus);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            bus.coalesce(|| {
                bus.emit();
                panic!("boom");
            });
        }));

        assert!(result.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
