//! Shared instances under construction, across threads.
//!
//! A thread asking for a shared binding that another thread is building
//! blocks in the binding's `OnceCell` until the builder is done. If that
//! builder is itself blocked on something the asking thread is building,
//! neither returns. The per-request chain cannot see such a cycle because
//! it is split between two requests, so the container keeps a wait-for
//! graph here: which thread builds which identifier, and which identifier
//! each blocked thread waits on.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::key::DependencyKey;

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    state: Mutex<WaitGraph>,
}

#[derive(Debug, Default)]
struct WaitGraph {
    builders: HashMap<DependencyKey, ThreadId>,
    waiting: HashMap<ThreadId, DependencyKey>,
}

impl InFlight {
    /// Registers the current thread as waiting on `key`.
    ///
    /// Fails with the identifiers that lead back to this thread when the
    /// wait could never end: `key` is built by a thread that (transitively)
    /// waits on an identifier this thread is building.
    pub fn wait_for(&self, key: &DependencyKey) -> Result<WaitGuard<'_>, Vec<DependencyKey>> {
        let me = thread::current().id();
        let mut graph = self.state.lock();

        let mut path = Vec::new();
        let mut current = key.clone();
        for _ in 0..=graph.waiting.len() {
            let Some(&builder) = graph.builders.get(&current) else {
                break;
            };
            if builder == me {
                return Err(path);
            }
            let Some(awaited) = graph.waiting.get(&builder).cloned() else {
                break;
            };
            path.push(awaited.clone());
            current = awaited;
        }

        graph.waiting.insert(me, key.clone());
        Ok(WaitGuard {
            in_flight: self,
            thread: me,
            key: key.clone(),
        })
    }

    /// Marks the current thread as the builder of `key` until the guard drops.
    pub fn build(&self, key: &DependencyKey) -> BuildGuard<'_> {
        let me = thread::current().id();
        let mut graph = self.state.lock();
        graph.waiting.remove(&me);
        graph.builders.insert(key.clone(), me);
        BuildGuard {
            in_flight: self,
            key: key.clone(),
        }
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        let graph = self.state.lock();
        graph.builders.is_empty() && graph.waiting.is_empty()
    }
}

#[derive(Debug)]
pub(crate) struct WaitGuard<'a> {
    in_flight: &'a InFlight,
    thread: ThreadId,
    key: DependencyKey,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        let mut graph = self.in_flight.state.lock();
        if graph.waiting.get(&self.thread) == Some(&self.key) {
            graph.waiting.remove(&self.thread);
        }
    }
}

#[derive(Debug)]
pub(crate) struct BuildGuard<'a> {
    in_flight: &'a InFlight,
    key: DependencyKey,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.state.lock().builders.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    struct Left;
    struct Right;

    #[test]
    fn waiting_on_own_build_is_a_cycle() {
        let in_flight = InFlight::default();
        let key = DependencyKey::of::<Left>();

        let _building = in_flight.build(&key);
        assert_eq!(in_flight.wait_for(&key).err(), Some(Vec::new()));
    }

    #[test]
    fn waiting_on_an_independent_builder_is_allowed() {
        let in_flight = Arc::new(InFlight::default());
        let built = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let builder = {
            let (in_flight, built, release) = (in_flight.clone(), built.clone(), release.clone());
            thread::spawn(move || {
                let _building = in_flight.build(&DependencyKey::of::<Left>());
                built.wait();
                release.wait();
            })
        };

        built.wait();
        assert!(in_flight.wait_for(&DependencyKey::of::<Left>()).is_ok());
        release.wait();
        builder.join().unwrap();
        assert!(in_flight.is_idle());
    }

    #[test]
    fn split_cycle_is_reported_to_the_second_waiter() {
        let in_flight = Arc::new(InFlight::default());
        let waiting = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let other = {
            let (in_flight, waiting, release) = (in_flight.clone(), waiting.clone(), release.clone());
            thread::spawn(move || {
                let _building = in_flight.build(&DependencyKey::of::<Right>());
                waiting.wait();
                let _waiting = in_flight.wait_for(&DependencyKey::of::<Left>()).unwrap();
                waiting.wait();
                release.wait();
            })
        };

        let _building = in_flight.build(&DependencyKey::of::<Left>());
        waiting.wait();
        waiting.wait();
        let path = in_flight.wait_for(&DependencyKey::of::<Right>()).unwrap_err();
        assert_eq!(path, vec![DependencyKey::of::<Left>()]);

        release.wait();
        other.join().unwrap();
    }
}
