// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains a lock-free single value cell which always holds the most recent sample.
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// Shared cell with "keep only the latest value" semantics.
///
/// Writers replace the whole value atomically, readers always observe either the old or the
/// new value and never a partially written one. Neither side blocks.
pub struct LatestValue<T> {
    cell: Arc<ArcSwap<T>>,
}

impl<T> LatestValue<T> {
    pub fn new(initial: T) -> Self {
        LatestValue {
            cell: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// Replaces the stored value.
    pub fn store(&self, value: T) {
        self.cell.store(Arc::new(value));
    }

    /// Returns a reference counted snapshot of the stored value.
    pub fn load(&self) -> Arc<T> {
        self.cell.load_full()
    }
}

impl<T: Clone> LatestValue<T> {
    /// Returns a copy of the stored value.
    pub fn get(&self) -> T {
        T::clone(&self.cell.load())
    }
}

impl<T> Clone for LatestValue<T> {
    fn clone(&self) -> Self {
        LatestValue {
            cell: self.cell.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LatestValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LatestValue")
            .field("value", &*self.cell.load())
            .finish()
    }
}
