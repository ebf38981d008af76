// SPDX-License-Identifier: GPL-2.0

//! Synchronisation primitives.
//!
//! This module contains the synchronisation primitives the drivers share state with: the
//! reference-counted [`Arc`] and a [`Mutex`] whose `lock` cannot fail.

pub use std::sync::{Arc, Weak};

use std::sync::{MutexGuard, PoisonError};

/// A mutual exclusion primitive.
///
/// Unlike [`std::sync::Mutex`], locking never returns an error: a panic while the lock was held
/// does not make the protected data unreachable, as in the kernel where there is no poisoning.
pub struct Mutex<T: ?Sized>(std::sync::Mutex<T>);

/// A guard holding a [`Mutex`] locked, unlocking it when dropped.
pub type Guard<'a, T> = MutexGuard<'a, T>;

impl<T> Mutex<T> {
    /// Constructs a new mutex.
    pub const fn new(t: T) -> Self {
        Self(std::sync::Mutex::new(t))
    }

    /// Consumes the mutex, returning the protected data.
    pub fn into_inner(self) -> T {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Acquires the lock and gives the caller access to the data protected by it.
    pub fn lock(&self) -> Guard<'_, T> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tries to acquire the lock without blocking.
    pub fn try_lock(&self) -> Option<Guard<'_, T>> {
        match self.0.try_lock() {
            Ok(guard) => Some(guard),
            Err(std::sync::TryLockError::Poisoned(err)) => Some(err.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Creates a [`Mutex`] protecting the given value.
#[macro_export]
macro_rules! new_mutex {
    ($inner:expr $(, $name:literal)? $(,)?) => {
        $crate::sync::Mutex::new($inner)
    };
}
