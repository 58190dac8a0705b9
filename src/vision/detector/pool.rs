// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed-size pool of model sessions
//!
//! ONNX Runtime sessions need exclusive access while running, so one
//! session per inference worker lets that many inferences overlap.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use super::DetectorError;

pub struct SessionPool<T> {
    slots: Vec<Mutex<T>>,
    next: AtomicUsize,
}

impl<T> SessionPool<T> {
    /// Build a pool from already created sessions
    pub fn new(sessions: Vec<T>) -> Result<Self, DetectorError> {
        if sessions.is_empty() {
            return Err(DetectorError::SessionUnavailable(
                "session pool needs at least one session".to_string(),
            ));
        }

        Ok(Self {
            slots: sessions.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Take a free session, waiting on one in rotation if all are busy
    pub fn acquire(&self) -> Result<MutexGuard<'_, T>, DetectorError> {
        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();

        for offset in 0..self.slots.len() {
            let slot = &self.slots[(start + offset) % self.slots.len()];
            match slot.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(e)) => {
                    return Err(DetectorError::SessionUnavailable(e.to_string()))
                }
            }
        }

        self.slots[start]
            .lock()
            .map_err(|e| DetectorError::SessionUnavailable(e.to_string()))
    }
}
