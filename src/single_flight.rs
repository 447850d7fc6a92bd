//! Collapse concurrent identical requests into one shared future.
//!
//! The first caller for a key starts the work; later callers for the same
//! key await the same [`Shared`] future and receive clones of its output.
//! The map keeps only a [`WeakShared`] handle, so the work stays alive
//! exactly as long as at least one caller is still waiting on it. When the
//! last waiter is dropped the work is dropped with it, its map entry is
//! removed, and the next caller starts a fresh flight.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use parking_lot::Mutex;

type Flight<T> = Shared<BoxFuture<'static, T>>;

pub struct SingleFlight<T> {
    next_id: AtomicU64,
    flights: Mutex<HashMap<String, (u64, WeakShared<BoxFuture<'static, T>>)>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            flights: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key`, or join the flight already running for it.
    ///
    /// `work` is only invoked when no live flight exists for `key`.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (id, flight) = self.join_or_start(key, work);
        let mut waiter = Waiter {
            owner: self,
            key,
            id,
            flight: Some(flight),
        };
        let output = match waiter.flight.as_mut() {
            Some(flight) => flight.await,
            None => unreachable!("waiter starts with a flight"),
        };
        waiter.flight = None;

        let mut flights = self.flights.lock();
        if flights.get(key).is_some_and(|(current, _)| *current == id) {
            flights.remove(key);
        }
        output
    }

    /// Number of keys with a flight that still has waiters.
    pub fn in_flight(&self) -> usize {
        self.flights
            .lock()
            .values()
            .filter(|(_, weak)| weak.upgrade().is_some())
            .count()
    }

    fn join_or_start<F, Fut>(&self, key: &str, work: F) -> (u64, Flight<T>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut flights = self.flights.lock();
        if let Some((id, weak)) = flights.get(key) {
            if let Some(flight) = weak.upgrade() {
                tracing::debug!(key, "joining in-flight request");
                return (*id, flight);
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let flight = work().boxed().shared();
        match flight.downgrade() {
            Some(weak) => {
                flights.insert(key.to_string(), (id, weak));
            }
            None => {
                flights.remove(key);
            }
        }
        (id, flight)
    }

    /// Drop the entry for `key` if it still belongs to flight `id` and no
    /// waiter is left on it.
    fn forget_abandoned(&self, key: &str, id: u64) {
        let live = {
            let mut flights = self.flights.lock();
            match flights.get(key) {
                Some((current, weak)) if *current == id => {
                    let live = weak.upgrade();
                    if live.is_none() {
                        flights.remove(key);
                    }
                    live
                }
                _ => None,
            }
        };
        // A surviving handle is released outside the lock.
        drop(live);
    }
}

/// One caller's hold on a flight. Dropping it before the flight finishes
/// (a cancelled caller) cleans up the map entry once the last waiter is gone.
struct Waiter<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    owner: &'a SingleFlight<T>,
    key: &'a str,
    id: u64,
    flight: Option<Flight<T>>,
}

impl<T> Drop for Waiter<'_, T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.flight.take().is_some() {
            self.owner.forget_abandoned(self.key, self.id);
        }
    }
}
