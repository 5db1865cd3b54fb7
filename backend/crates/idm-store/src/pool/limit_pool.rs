use crate::{Pooled, Result as StoreErrorResult, StoreError};

use idm_core::ErrorLocation;

use std::collections::VecDeque;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{Gauge, gauge};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// A pooled handle that must be explicitly released when it leaves the pool.
pub trait Close: Send + 'static {
    fn close(self);
}

/// Creates new handles for a [`LimitPool`].
#[async_trait]
pub trait Factory<T>: Send + Sync + 'static {
    async fn create(&self) -> StoreErrorResult<T>;
}

/// What a queued waiter receives: a ready handle, or the right to create one.
enum Grant<T> {
    Item(T),
    Slot,
}

struct PoolState<T> {
    /// Handles counted against capacity (checked out or idle)
    live: usize,
    idle: VecDeque<T>,
    waiters: VecDeque<oneshot::Sender<Grant<T>>>,
    closed: bool,
}

struct Shared<T> {
    kind: &'static str,
    capacity: usize,
    acquire_timeout: Duration,
    factory: Box<dyn Factory<T>>,
    idle_gauge: Gauge,
    state: Mutex<PoolState<T>>,
}

/// Fixed-capacity pool of closable handles.
///
/// A capacity of zero means unbounded. Callers that find the pool exhausted
/// queue in arrival order and are woken by `put` handing its handle straight
/// to them, so nothing ever polls.
pub struct LimitPool<T: Close> {
    shared: Arc<Shared<T>>,
}

impl<T: Close> Clone for LimitPool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Close> LimitPool<T> {
    pub fn new(
        kind: &'static str,
        capacity: usize,
        acquire_timeout: Duration,
        factory: impl Factory<T>,
    ) -> Self {
        Self::with_idle_gauge(
            kind,
            capacity,
            acquire_timeout,
            factory,
            gauge!("idm.pool.idle", "kind" => kind),
        )
    }

    pub fn with_idle_gauge(
        kind: &'static str,
        capacity: usize,
        acquire_timeout: Duration,
        factory: impl Factory<T>,
        idle_gauge: Gauge,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                kind,
                capacity,
                acquire_timeout,
                factory: Box::new(factory),
                idle_gauge,
                state: Mutex::new(PoolState {
                    live: 0,
                    idle: VecDeque::new(),
                    waiters: VecDeque::new(),
                    closed: false,
                }),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.shared.kind
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn idle_count(&self) -> usize {
        self.shared.state.lock().idle.len()
    }

    pub fn live_count(&self) -> usize {
        self.shared.state.lock().live
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Borrow a handle, waiting at most the configured acquisition timeout.
    pub async fn get(&self) -> StoreErrorResult<Pooled<T>> {
        self.get_timeout(self.shared.acquire_timeout).await
    }

    /// Borrow a handle, waiting at most `timeout` for one to be returned
    /// when the pool is at capacity. A zero timeout never waits.
    pub async fn get_timeout(&self, timeout: Duration) -> StoreErrorResult<Pooled<T>> {
        let waiter = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(self.closed_error());
            }
            if let Some(item) = state.idle.pop_front() {
                self.shared.idle_gauge.decrement(1.0);
                return Ok(Pooled::new(self.clone(), item));
            }
            if self.shared.capacity == 0 || state.live < self.shared.capacity {
                state.live += 1;
                None
            } else if timeout.is_zero() {
                return Err(self.limit_error());
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            }
        };

        let Some(rx) = waiter else {
            return self.create_in_slot().await;
        };

        let mut pending = PendingGrant { pool: self, rx };
        let grant = pending.wait(timeout).await?;
        drop(pending);

        match grant {
            Grant::Item(item) => Ok(Pooled::new(self.clone(), item)),
            Grant::Slot => self.create_in_slot().await,
        }
    }

    /// Borrow a handle without regard to capacity. Reuses an idle handle
    /// when there is one, otherwise creates a fresh one.
    pub async fn get_no_limit(&self) -> StoreErrorResult<Pooled<T>> {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(self.closed_error());
            }
            if let Some(item) = state.idle.pop_front() {
                self.shared.idle_gauge.decrement(1.0);
                return Ok(Pooled::new(self.clone(), item));
            }
        }

        let item = self.shared.factory.create().await?;
        Ok(Pooled::new(self.clone(), item))
    }

    /// Return a handle to the pool.
    ///
    /// The oldest waiter gets it directly. Otherwise it is kept idle if
    /// there is room, and closed if there is not (or the pool is closed).
    pub fn put(&self, item: T) {
        let surplus = {
            let mut state = self.shared.state.lock();
            if state.closed {
                Some(item)
            } else if let Some(Grant::Item(item)) = hand_off(&mut state, Grant::Item(item)) {
                if self.shared.capacity == 0 || state.idle.len() < self.shared.capacity {
                    state.idle.push_back(item);
                    self.shared.idle_gauge.increment(1.0);
                    None
                } else {
                    Some(item)
                }
            } else {
                None
            }
        };

        if let Some(item) = surplus {
            item.close();
        }
    }

    /// Close the pool and every idle handle. Waiters fail immediately and
    /// handles still checked out are closed as they come back.
    pub fn close(&self) {
        let idle: Vec<T> = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            state.waiters.clear();
            state.idle.drain(..).collect()
        };

        if !idle.is_empty() {
            log::debug!("Closing {} idle {} handles", idle.len(), self.shared.kind);
        }
        for item in idle {
            self.shared.idle_gauge.decrement(1.0);
            item.close();
        }
    }

    async fn create_in_slot(&self) -> StoreErrorResult<Pooled<T>> {
        let reservation = SlotReservation { pool: self };
        let item = self.shared.factory.create().await?;
        reservation.commit();
        Ok(Pooled::new(self.clone(), item))
    }

    /// Give a reserved slot back, passing it to the oldest waiter if any.
    fn release_slot(&self) {
        let mut state = self.shared.state.lock();
        if hand_off(&mut state, Grant::Slot).is_some() {
            state.live = state.live.saturating_sub(1);
        }
    }

    #[track_caller]
    fn limit_error(&self) -> StoreError {
        StoreError::PoolLimitExceeded {
            kind: self.shared.kind,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    fn closed_error(&self) -> StoreError {
        StoreError::PoolClosed {
            kind: self.shared.kind,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Deliver a grant to the oldest waiter still listening. Returns the grant
/// when nobody took it.
fn hand_off<T>(state: &mut PoolState<T>, mut grant: Grant<T>) -> Option<Grant<T>> {
    while let Some(waiter) = state.waiters.pop_front() {
        match waiter.send(grant) {
            Ok(()) => return None,
            Err(returned) => grant = returned,
        }
    }
    Some(grant)
}

/// A queued waiter's receiving end. Whatever was handed over but never
/// taken, because the acquiring future was dropped, goes back to the pool.
struct PendingGrant<'a, T: Close> {
    pool: &'a LimitPool<T>,
    rx: oneshot::Receiver<Grant<T>>,
}

impl<T: Close> PendingGrant<'_, T> {
    async fn wait(&mut self, timeout: Duration) -> StoreErrorResult<Grant<T>> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(grant)) => Ok(grant),
            // sender dropped by close()
            Ok(Err(_)) => Err(self.pool.closed_error()),
            Err(_) => {
                // a put may have raced the deadline
                self.rx.close();
                self.rx.try_recv().map_err(|_| self.pool.limit_error())
            }
        }
    }
}

impl<T: Close> Drop for PendingGrant<'_, T> {
    fn drop(&mut self) {
        self.rx.close();
        match self.rx.try_recv() {
            Ok(Grant::Item(item)) => self.pool.put(item),
            Ok(Grant::Slot) => self.pool.release_slot(),
            Err(_) => {}
        }
    }
}

/// Releases a reserved slot unless the factory call it guards succeeds,
/// including when the acquiring future is dropped mid-creation.
struct SlotReservation<'a, T: Close> {
    pool: &'a LimitPool<T>,
}

impl<T: Close> SlotReservation<'_, T> {
    fn commit(self) {
        std::mem::forget(self);
    }
}

impl<T: Close> Drop for SlotReservation<'_, T> {
    fn drop(&mut self) {
        self.pool.release_slot();
    }
}
