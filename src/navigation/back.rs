//! Prioritized back-button dispatch.
//!
//! Independent UI scopes (the shell, modals, context menus, detail sheets)
//! register a handler with a priority. A back event walks the handlers from
//! highest to lowest priority, equal priorities in registration order, and
//! stops at the first handler that returns `true` (consumed). A handler that
//! is not currently relevant returns `false` so lower priorities still run.
//!
//! The dispatcher is a cheap `Clone` handle injected into whoever needs it;
//! there is no global registry. Registration returns a [`BackHandlerGuard`]
//! that unregisters on drop, tying a handler's lifetime to its scope.

use crate::navigation::shell::ShellNavigator;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Conventional priorities. Higher runs first.
pub mod back_priority {
    pub const CONTEXT_MENU: i32 = 200;
    pub const MODAL: i32 = 100;
    pub const DETAIL_SHEET: i32 = 50;
    pub const SHELL: i32 = 15;
}

type Handler = Rc<RefCell<dyn FnMut() -> bool>>;

struct Entry {
    id: String,
    priority: i32,
    /// Registration order, kept across re-registration.
    seq: u64,
    /// Identity of this particular registration.
    token: u64,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    entries: Vec<Entry>,
    next_seq: u64,
    next_token: u64,
    dispatching: bool,
}

impl Registry {
    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
    }

    fn contains_token(&self, token: u64) -> bool {
        self.entries.iter().any(|e| e.token == token)
    }

    /// Detach matching entries. Callers drop them after releasing the
    /// borrow, since a handler may own guards that unregister on drop.
    fn take_where(&mut self, remove: impl Fn(&Entry) -> bool) -> Vec<Entry> {
        let (removed, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| remove(e));
        self.entries = kept;
        removed
    }
}

/// Result of one back event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackOutcome {
    /// The handler with this id consumed the event.
    Consumed(String),
    /// Every handler declined; the host should apply its default (e.g. exit).
    Unhandled,
    /// Dispatch was requested from inside a handler and ignored.
    Reentrant,
}

impl BackOutcome {
    pub fn is_consumed(&self) -> bool {
        matches!(self, BackOutcome::Consumed(_))
    }
}

/// Handle to a shared back-handler chain.
#[derive(Clone, Default)]
pub struct BackDispatcher {
    inner: Rc<RefCell<Registry>>,
}

impl fmt::Debug for BackDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackDispatcher")
            .field("handlers", &self.ids())
            .finish()
    }
}

impl BackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `id`.
    ///
    /// Registering an id that already exists replaces its priority and
    /// handler but keeps its original place among equal priorities. Guards
    /// from the earlier registration become inert.
    pub fn register<F>(&self, id: impl Into<String>, priority: i32, handler: F) -> BackHandlerGuard
    where
        F: FnMut() -> bool + 'static,
    {
        let id = id.into();
        let handler: Handler = Rc::new(RefCell::new(handler));
        let mut registry = self.inner.borrow_mut();
        let token = registry.next_token;
        registry.next_token += 1;

        let mut replaced = None;
        if let Some(entry) = registry.entries.iter_mut().find(|e| e.id == id) {
            tracing::debug!(id = %id, from = entry.priority, to = priority, "Back handler re-registered");
            entry.priority = priority;
            entry.token = token;
            replaced = Some(std::mem::replace(&mut entry.handler, handler));
        } else {
            let seq = registry.next_seq;
            registry.next_seq += 1;
            registry.entries.push(Entry {
                id: id.clone(),
                priority,
                seq,
                token,
                handler,
            });
        }
        registry.sort();
        drop(registry);
        drop(replaced);

        BackHandlerGuard {
            registry: Rc::downgrade(&self.inner),
            id,
            token,
        }
    }

    /// Remove the handler for `id`. Returns false if none was registered.
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.inner.borrow_mut().take_where(|e| e.id == id);
        !removed.is_empty()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.inner.borrow().entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Handler ids in dispatch order.
    pub fn ids(&self) -> Vec<String> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }

    /// Deliver one back event.
    ///
    /// Handlers may register or unregister others while running; a handler
    /// removed before its turn is skipped. Each handler runs at most once per
    /// event.
    pub fn dispatch(&self) -> BackOutcome {
        let chain: Vec<(String, u64, Handler)> = {
            let mut registry = self.inner.borrow_mut();
            if registry.dispatching {
                tracing::debug!("Back dispatch requested from a back handler, ignoring");
                return BackOutcome::Reentrant;
            }
            registry.dispatching = true;
            registry
                .entries
                .iter()
                .map(|e| (e.id.clone(), e.token, Rc::clone(&e.handler)))
                .collect()
        };
        let _reset = DispatchReset(&self.inner);

        for (id, token, handler) in chain {
            if !self.inner.borrow().contains_token(token) {
                continue;
            }
            let consumed = {
                let mut handler = handler.borrow_mut();
                (*handler)()
            };
            if consumed {
                tracing::debug!(handler = %id, "Back event consumed");
                return BackOutcome::Consumed(id);
            }
        }
        tracing::debug!("Back event not consumed");
        BackOutcome::Unhandled
    }
}

struct DispatchReset<'a>(&'a Rc<RefCell<Registry>>);

impl Drop for DispatchReset<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().dispatching = false;
    }
}

/// Unregisters its handler when dropped.
#[must_use = "dropping the guard unregisters the handler immediately"]
pub struct BackHandlerGuard {
    registry: Weak<RefCell<Registry>>,
    id: String,
    token: u64,
}

impl BackHandlerGuard {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Keep the handler registered past the guard's scope.
    pub fn keep(self) {
        std::mem::forget(self);
    }
}

impl fmt::Debug for BackHandlerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackHandlerGuard")
            .field("id", &self.id)
            .field("token", &self.token)
            .finish()
    }
}

impl Drop for BackHandlerGuard {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = match registry.try_borrow_mut() {
            Ok(mut registry) => registry.take_where(|e| e.token == self.token),
            Err(_) => {
                tracing::warn!(id = %self.id, "Back handler guard dropped while the registry is borrowed; handler left registered");
                return;
            }
        };
        drop(removed);
    }
}

/// Back handler that pops the shell navigator one level. Consumes the event
/// only if the navigator actually moved, so at the root the event falls
/// through to lower priorities (or the host).
pub fn shell_back_handler(navigator: Rc<RefCell<ShellNavigator>>) -> impl FnMut() -> bool {
    move || match navigator.try_borrow_mut() {
        Ok(mut nav) => nav.navigate_back().moved(),
        Err(_) => {
            tracing::warn!("Shell navigator busy, back event not handled by shell");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str, consume: bool) -> impl FnMut() -> bool {
        let log = Rc::clone(log);
        move || {
            log.borrow_mut().push(name);
            consume
        }
    }

    #[test]
    fn declined_handler_falls_through() {
        let back = BackDispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _modal = back.register("modal", back_priority::MODAL, recorder(&log, "modal", false));
        let _shell = back.register("shell", back_priority::SHELL, recorder(&log, "shell", true));

        assert_eq!(back.dispatch(), BackOutcome::Consumed("shell".into()));
        assert_eq!(*log.borrow(), vec!["modal", "shell"]);
    }

    #[test]
    fn consumed_stops_propagation() {
        let back = BackDispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _shell = back.register("shell", back_priority::SHELL, recorder(&log, "shell", true));
        let _menu = back.register("menu", back_priority::CONTEXT_MENU, recorder(&log, "menu", true));

        assert!(back.dispatch().is_consumed());
        assert_eq!(*log.borrow(), vec!["menu"]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let back = BackDispatcher::new();
        let _a = back.register("a", 50, || false);
        let _b = back.register("b", 50, || false);
        let _c = back.register("c", 90, || false);
        assert_eq!(back.ids(), vec!["c", "a", "b"]);

        // Re-registering keeps the slot.
        let _a2 = back.register("a", 50, || true);
        assert_eq!(back.ids(), vec!["c", "a", "b"]);
        assert_eq!(back.dispatch(), BackOutcome::Consumed("a".into()));
    }

    #[test]
    fn guard_unregisters_on_drop_and_is_idempotent() {
        let back = BackDispatcher::new();
        {
            let _guard = back.register("sheet", back_priority::DETAIL_SHEET, || true);
            assert_eq!(back.len(), 1);
        }
        assert!(back.is_empty());
        assert_eq!(back.dispatch(), BackOutcome::Unhandled);

        let guard = back.register("sheet", back_priority::DETAIL_SHEET, || true);
        assert!(back.unregister("sheet"));
        assert!(!back.unregister("sheet"));
        drop(guard);
        assert!(back.is_empty());
    }

    #[test]
    fn stale_guard_does_not_remove_newer_registration() {
        let back = BackDispatcher::new();
        let old = back.register("modal", back_priority::MODAL, || false);
        let _new = back.register("modal", back_priority::MODAL, || true);
        drop(old);
        assert!(back.is_registered("modal"));
    }

    #[test]
    fn reentrant_dispatch_is_ignored() {
        let back = BackDispatcher::new();
        let inner = back.clone();
        let nested = Rc::new(RefCell::new(None));
        let seen = Rc::clone(&nested);
        let _h = back.register("nested", 10, move || {
            *seen.borrow_mut() = Some(inner.dispatch());
            true
        });
        assert!(back.dispatch().is_consumed());
        assert_eq!(*nested.borrow(), Some(BackOutcome::Reentrant));
        // Flag is reset afterwards.
        assert!(back.dispatch().is_consumed());
    }

    #[test]
    fn dropping_a_handler_releases_the_guards_it_owns() {
        let back = BackDispatcher::new();
        let scrim = back.register("scrim", back_priority::MODAL - 1, || true);
        let modal = back.register("modal", back_priority::MODAL, move || {
            let _owned = &scrim;
            false
        });
        assert_eq!(back.len(), 2);

        // Removing the modal drops its closure and with it the scrim guard.
        drop(modal);
        assert!(!back.is_registered("modal"));
        assert!(!back.is_registered("scrim"));

        let scrim = back.register("scrim", 10, || true);
        let _sheet = back.register("sheet", 20, move || {
            let _owned = &scrim;
            false
        });
        assert!(back.unregister("sheet"));
        assert!(back.is_empty());

        // Re-registering replaces the old closure the same way.
        let scrim = back.register("scrim", 10, || true);
        let _first = back.register("sheet", 20, move || {
            let _owned = &scrim;
            false
        });
        let _second = back.register("sheet", 20, || false);
        assert_eq!(back.ids(), vec!["sheet"]);
    }

    #[test]
    fn handler_can_unregister_a_later_one() {
        let back = BackDispatcher::new();
        let calls = Rc::new(Cell::new(0));
        let remover = back.clone();
        let _first = back.register("first", 100, move || {
            remover.unregister("second");
            false
        });
        let counted = Rc::clone(&calls);
        let _second = back.register("second", 10, move || {
            counted.set(counted.get() + 1);
            true
        });
        assert_eq!(back.dispatch(), BackOutcome::Unhandled);
        assert_eq!(calls.get(), 0);
    }
}
