
use crate::{Close, Factory, Result as StoreErrorResult, StoreError};

use idm_core::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

/// Pool item that records when it is closed
#[derive(Debug)]
pub(crate) struct TestItem {
    pub(crate) id: usize,
    closed: Arc<AtomicUsize>,
}

impl Close for TestItem {
    fn close(self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct TestFactory {
    pub(crate) created: Arc<AtomicUsize>,
    pub(crate) closed: Arc<AtomicUsize>,
    fail_next: AtomicBool,
}

impl TestFactory {
    pub(crate) fn failing_once() -> Self {
        let factory = Self::default();
        factory.fail_next.store(true, Ordering::SeqCst);
        factory
    }
}

#[async_trait]
impl Factory<TestItem> for Arc<TestFactory> {
    async fn create(&self) -> StoreErrorResult<TestItem> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Initialization {
                message: "factory failure".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let id = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TestItem {
            id,
            closed: Arc::clone(&self.closed),
        })
    }
}

/// Gauge stand-in that remembers its value
#[derive(Default)]
pub(crate) struct TestGauge {
    value: Mutex<f64>,
}

impl TestGauge {
    pub(crate) fn value(&self) -> f64 {
        *self.value.lock()
    }
}

impl metrics::GaugeFn for TestGauge {
    fn increment(&self, value: f64) {
        *self.value.lock() += value;
    }

    fn decrement(&self, value: f64) {
        *self.value.lock() -= value;
    }

    fn set(&self, value: f64) {
        *self.value.lock() = value;
    }
}
