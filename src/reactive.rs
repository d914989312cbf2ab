//! Reactive directive properties
//!
//! [`Prop<T>`] is the explicit replacement for runtime property-write
//! interception: a settable field type that performs the real assignment
//! first, then notifies subscribers. The write itself can never be rejected;
//! binding dispatch is a side channel.
//!
//! Props are cheap-clone handles over shared single-threaded state, so a
//! timer callback can capture a clone of the same counter its directive owns.

use std::cell::RefCell;
use std::rc::Rc;

type Sink<T> = Rc<dyn Fn(&T)>;

struct Inner<T> {
    value: T,
    sinks: Vec<Sink<T>>,
}

/// A settable, observable property value.
pub struct Prop<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Prop<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prop")
            .field("value", &self.inner.borrow().value)
            .finish()
    }
}

impl<T: 'static> Prop<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                sinks: Vec::new(),
            })),
        }
    }

    /// Read via a closure without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Assign a new value, then notify every subscriber.
    pub fn set(&self, value: T) {
        {
            self.inner.borrow_mut().value = value;
        }
        self.notify();
    }

    /// Mutate in place, then notify every subscriber.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            f(&mut self.inner.borrow_mut().value);
        }
        self.notify();
    }

    /// Register a sink called after every write.
    ///
    /// Sinks may read the prop but must not write back into it; a write from
    /// inside a sink would re-enter the shared cell.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) {
        self.inner.borrow_mut().sinks.push(Rc::new(f));
    }

    fn notify(&self) {
        // snapshot so sinks may read the prop re-entrantly
        let sinks: Vec<Sink<T>> = self.inner.borrow().sinks.clone();
        let inner = self.inner.borrow();
        for sink in &sinks {
            sink(&inner.value);
        }
    }
}

impl<T: Clone + 'static> Prop<T> {
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }
}

impl<T: Default + 'static> Default for Prop<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_and_get() {
        let prop = Prop::new(1);
        prop.set(5);
        assert_eq!(prop.get(), 5);
    }

    #[test]
    fn assignment_happens_before_notification() {
        let prop = Prop::new(0);
        let seen = Rc::new(Cell::new(-1));
        let observer = prop.clone();
        let s = Rc::clone(&seen);
        prop.subscribe(move |_| s.set(observer.get()));

        prop.set(7);
        assert_eq!(seen.get(), 7, "sink must observe the already-assigned value");
    }

    #[test]
    fn every_write_notifies_even_when_unchanged() {
        let prop = Prop::new(3);
        let fired = Rc::new(Cell::new(0));
        let f = Rc::clone(&fired);
        prop.subscribe(move |_| f.set(f.get() + 1));

        prop.set(3);
        prop.set(3);
        assert_eq!(fired.get(), 2, "dedup is the detector's job, not the prop's");
    }

    #[test]
    fn clones_share_state_and_sinks() {
        let prop = Prop::new(0);
        let handle = prop.clone();
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        prop.subscribe(move |v| s.set(*v));

        handle.update(|v| *v += 41);
        assert_eq!(prop.get(), 41);
        assert_eq!(seen.get(), 41);
    }
}
