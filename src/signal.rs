//! Synchronous, single-producer multi-consumer event dispatch.
//!
//! A [`Signal`] is the kernel's only form of inter-component communication:
//! the [`crate::polymer::Polymer`] fires one whenever an element's covering
//! state changes, a walker moves, or the total propensity changes, and
//! external collaborators (or, internally, a `Genome`'s child `Transcript`)
//! subscribe with a closure. There is no event loop — `fire` calls every
//! registered handler in registration order, synchronously, from the stack
//! frame that caused the event.

/// A multi-subscriber notifier carrying payload `A`.
///
/// `A` is cloned once per handler so each subscriber gets its own owned
/// copy; for zero-cost signals use `A = ()`.
pub struct Signal<A = ()> {
    handlers: Vec<Box<dyn FnMut(A)>>,
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<A: Clone> Signal<A> {
    /// Create a signal with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Handlers are invoked in registration order.
    pub fn connect<F>(&mut self, handler: F)
    where
        F: FnMut(A) + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Invoke every registered handler with a clone of `args`, in order.
    ///
    /// Re-entrant firing (a handler that fires this same signal again) is
    /// not supported: the borrow checker will reject it, since `fire`
    /// already holds `&mut self`.
    pub fn fire(&mut self, args: A) {
        for handler in self.handlers.iter_mut() {
            handler(args.clone());
        }
    }

    /// Number of currently registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_fires_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut signal: Signal<u32> = Signal::new();

        let log1 = log.clone();
        signal.connect(move |n| log1.borrow_mut().push(("a", n)));
        let log2 = log.clone();
        signal.connect(move |n| log2.borrow_mut().push(("b", n)));

        signal.fire(7);

        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_no_subscribers_is_a_no_op() {
        let mut signal: Signal<()> = Signal::new();
        assert!(signal.is_empty());
        signal.fire(());
    }

    #[test]
    fn test_each_handler_gets_an_independent_clone() {
        let mut signal: Signal<String> = Signal::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen1 = seen.clone();
        signal.connect(move |s: String| seen1.borrow_mut().push(s));
        signal.fire("promoter1".to_string());
        assert_eq!(seen.borrow()[0], "promoter1");
    }
}
