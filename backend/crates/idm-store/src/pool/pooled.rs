use crate::{Close, LimitPool};

use std::fmt;
use std::ops::{Deref, DerefMut};

/// A handle borrowed from a [`LimitPool`]. Returned to the pool on drop.
pub struct Pooled<T: Close> {
    pool: LimitPool<T>,
    item: Option<T>,
}

impl<T: Close> Pooled<T> {
    pub(crate) fn new(pool: LimitPool<T>, item: T) -> Self {
        Self {
            pool,
            item: Some(item),
        }
    }

    /// Detach the handle from the pool. The caller becomes responsible for
    /// closing it; its capacity slot stays taken.
    pub fn into_inner(mut self) -> T {
        self.item.take().expect("pooled handle present until dropped")
    }
}

impl<T: Close> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("pooled handle present until dropped")
    }
}

impl<T: Close> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled handle present until dropped")
    }
}

impl<T: Close> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.put(item);
        }
    }
}

impl<T: Close + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("kind", &self.pool.kind())
            .field("item", &self.item)
            .finish()
    }
}
