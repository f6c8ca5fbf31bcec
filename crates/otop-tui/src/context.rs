//! Cross-panel selection contexts and the workflow-scoped bus.
//!
//! A [`Context`] is a closed sum: panels discriminate on the variant and no
//! other module can add one. The [`Bus`] fans a context out synchronously
//! to every handler subscribed to its [`ContextKind`], in registration
//! order, on the emitting thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use otop_db::Session;

// ─── Context Sum ────────────────────────────────────────────────────────────

/// Variant tag the bus keys subscriptions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    /// A session row was selected.
    Session,
    /// A SQL statement was selected.
    Sql,
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Sql => f.write_str("sql"),
        }
    }
}

/// Payload of [`Context::Session`]: the selected session row.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCtx {
    /// The selected session.
    pub session: Session,
}

/// Payload of [`Context::Sql`]: the selected statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCtx {
    /// SQL id of the statement.
    pub sql_id: String,
    /// Statement text.
    pub sql_text: String,
}

/// A cross-panel selection event.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// A session row was selected.
    Session(SessionCtx),
    /// A SQL statement was selected.
    Sql(SqlCtx),
}

impl Context {
    /// The variant tag.
    #[must_use]
    pub const fn kind(&self) -> ContextKind {
        match self {
            Self::Session(_) => ContextKind::Session,
            Self::Sql(_) => ContextKind::Sql,
        }
    }
}

/// Typed access to one variant's payload, used by the typed subscribe
/// facade so call sites never spell out the tag.
pub trait ContextPayload {
    /// The tag of the variant this payload belongs to.
    const KIND: ContextKind;

    /// Downcast a context to this payload; `None` on variant mismatch.
    fn from_context(ctx: &Context) -> Option<&Self>;
}

impl ContextPayload for SessionCtx {
    const KIND: ContextKind = ContextKind::Session;

    fn from_context(ctx: &Context) -> Option<&Self> {
        match ctx {
            Context::Session(payload) => Some(payload),
            Context::Sql(_) => None,
        }
    }
}

impl ContextPayload for SqlCtx {
    const KIND: ContextKind = ContextKind::Sql;

    fn from_context(ctx: &Context) -> Option<&Self> {
        match ctx {
            Context::Sql(payload) => Some(payload),
            Context::Session(_) => None,
        }
    }
}

// ─── Bus ────────────────────────────────────────────────────────────────────

type Handler = Arc<dyn Fn(&Context) + Send + Sync>;

struct SubEntry {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    subs: RwLock<HashMap<ContextKind, Vec<SubEntry>>>,
    next_id: AtomicU64,
}

/// Workflow-scoped synchronous pub/sub.
///
/// Handlers run on the thread that calls [`Bus::emit`]; a handler that
/// needs to touch panel render state from a worker must route through the
/// UI queue itself. Dispatch iterates a snapshot taken under the read
/// lock, so handlers are free to subscribe or unsubscribe mid-emit without
/// deadlocking or perturbing the in-flight fan-out.
///
/// A handler must not emit a kind it is itself subscribed to: the
/// subscribed panel is locked for the duration of its handler and the
/// nested dispatch would self-deadlock.
#[derive(Clone, Default)]
pub struct Bus {
    inner: Arc<BusInner>,
}

/// Handle to one bus registration. [`Subscription::cancel`] removes
/// exactly that registration; a second cancel is a no-op.
pub struct Subscription {
    inner: Weak<BusInner>,
    kind: ContextKind,
    id: u64,
}

impl Subscription {
    /// The kind this subscription listens to.
    #[must_use]
    pub const fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Remove the registration from the bus. Idempotent; harmless after
    /// the bus itself is gone.
    pub fn cancel(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut subs = inner.subs.write().expect("bus lock poisoned");
        if let Some(entries) = subs.get_mut(&self.kind) {
            entries.retain(|e| e.id != self.id);
        }
    }
}

impl Bus {
    /// A bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for contexts of `kind`. Handlers for one kind
    /// are dispatched in registration order.
    pub fn subscribe(
        &self,
        kind: ContextKind,
        handler: impl Fn(&Context) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subs = self.inner.subs.write().expect("bus lock poisoned");
        subs.entry(kind).or_default().push(SubEntry {
            id,
            handler: Arc::new(handler),
        });
        Subscription {
            inner: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Typed facade over [`Bus::subscribe`]: the kind is derived from the
    /// payload type and the wrapper downcasts before calling `handler`.
    /// A mismatched variant is silently ignored.
    pub fn subscribe_to<T, F>(&self, handler: F) -> Subscription
    where
        T: ContextPayload,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe(T::KIND, move |ctx| {
            if let Some(payload) = T::from_context(ctx) {
                handler(payload);
            }
        })
    }

    /// Dispatch `ctx` to every handler subscribed to its kind,
    /// synchronously and in registration order. Returns after the last
    /// handler returns.
    pub fn emit(&self, ctx: &Context) {
        let snapshot: Vec<Handler> = {
            let subs = self.inner.subs.read().expect("bus lock poisoned");
            subs.get(&ctx.kind())
                .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
                .unwrap_or_default()
        };
        for handler in snapshot {
            handler(ctx);
        }
    }

    /// Number of live registrations for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: ContextKind) -> usize {
        let subs = self.inner.subs.read().expect("bus lock poisoned");
        subs.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn sql_ctx(id: &str) -> Context {
        Context::Sql(SqlCtx {
            sql_id: id.to_string(),
            sql_text: String::new(),
        })
    }

    #[test]
    fn emit_reaches_subscribers_in_registration_order() {
        let bus = Bus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            let _sub = bus.subscribe(ContextKind::Sql, move |_| {
                log.lock().unwrap().push(tag);
            });
        }
        bus.emit(&sql_ctx("abc"));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn emit_only_matching_kind() {
        let bus = Bus::new();
        let hits = Arc::new(Mutex::new(0));
        let hits2 = Arc::clone(&hits);
        let _sub = bus.subscribe(ContextKind::Session, move |_| {
            *hits2.lock().unwrap() += 1;
        });
        bus.emit(&sql_ctx("abc"));
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn cancel_stops_dispatch_and_is_idempotent() {
        let bus = Bus::new();
        let hits = Arc::new(Mutex::new(0));
        let hits2 = Arc::clone(&hits);
        let sub = bus.subscribe(ContextKind::Sql, move |_| {
            *hits2.lock().unwrap() += 1;
        });

        bus.emit(&sql_ctx("a"));
        sub.cancel();
        sub.cancel();
        bus.emit(&sql_ctx("b"));

        assert_eq!(*hits.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(ContextKind::Sql), 0);
    }

    #[test]
    fn resubscribing_gets_a_fresh_registration() {
        let bus = Bus::new();
        let first = bus.subscribe(ContextKind::Sql, |_| {});
        first.cancel();
        let second = bus.subscribe(ContextKind::Sql, |_| {});
        // Cancelling the stale handle again must not remove the new one.
        first.cancel();
        assert_eq!(bus.subscriber_count(ContextKind::Sql), 1);
        second.cancel();
        assert_eq!(bus.subscriber_count(ContextKind::Sql), 0);
    }

    #[test]
    fn handler_unsubscribing_itself_completes_current_emit() {
        let bus = Bus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(Mutex::new(0));

        let slot2 = Arc::clone(&slot);
        let hits2 = Arc::clone(&hits);
        let sub = bus.subscribe(ContextKind::Sql, move |_| {
            *hits2.lock().unwrap() += 1;
            if let Some(sub) = slot2.lock().unwrap().take() {
                sub.cancel();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        let tail_hits = Arc::new(Mutex::new(0));
        let tail_hits2 = Arc::clone(&tail_hits);
        let _tail = bus.subscribe(ContextKind::Sql, move |_| {
            *tail_hits2.lock().unwrap() += 1;
        });

        bus.emit(&sql_ctx("a"));
        bus.emit(&sql_ctx("b"));

        // The self-cancelling handler saw only the first emit; the later
        // registration saw both, including the remainder of the first.
        assert_eq!(*hits.lock().unwrap(), 1);
        assert_eq!(*tail_hits.lock().unwrap(), 2);
    }

    #[test]
    fn typed_subscribe_downcasts() {
        let bus = Bus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let _sub = bus.subscribe_to::<SqlCtx, _>(move |ctx| {
            seen2.lock().unwrap().push(ctx.sql_id.clone());
        });

        bus.emit(&sql_ctx("9babjv8yq8ru3"));
        bus.emit(&Context::Session(SessionCtx {
            session: Session::default(),
        }));

        assert_eq!(*seen.lock().unwrap(), vec!["9babjv8yq8ru3".to_string()]);
    }

    #[test]
    fn emit_from_another_thread_runs_there() {
        let bus = Bus::new();
        let thread_name = Arc::new(Mutex::new(String::new()));
        let thread_name2 = Arc::clone(&thread_name);
        let _sub = bus.subscribe(ContextKind::Sql, move |_| {
            *thread_name2.lock().unwrap() = std::thread::current()
                .name()
                .unwrap_or_default()
                .to_string();
        });

        let bus2 = bus.clone();
        std::thread::Builder::new()
            .name("emitter".to_string())
            .spawn(move || bus2.emit(&sql_ctx("x")))
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(*thread_name.lock().unwrap(), "emitter");
    }

    #[test]
    fn context_kind_display() {
        assert_eq!(ContextKind::Session.to_string(), "session");
        assert_eq!(ContextKind::Sql.to_string(), "sql");
    }
}
