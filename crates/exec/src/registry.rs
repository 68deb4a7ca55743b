// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run registry — which command is currently running in each slot.
//!
//! Signals arrive asynchronously (e.g. SIGTERM to the restash process) and
//! need to find the live subprocess without holding a reference to the
//! command that started it. Commands register themselves the moment their
//! subprocess starts; lookups always return the latest registration.
//!
//! Entries are not removed when a command terminates. The next command in the
//! same slot overwrites the entry, and signalling a terminated command fails
//! with [`SignalError::Exited`] rather than hitting a recycled pid.

use std::collections::HashMap;
use std::sync::Arc;

use nix::sys::signal::Signal;
use parking_lot::Mutex;

use crate::error::SignalError;
use crate::runner::GenericCommand;

/// Shared, cloneable table of running commands keyed by slot.
#[derive(Clone, Default, Debug)]
pub struct RunRegistry {
    slots: Arc<Mutex<HashMap<String, GenericCommand>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `command` as the one currently running in `slot`.
    pub fn set_running(&self, slot: &str, command: GenericCommand) {
        let previous = self.slots.lock().insert(slot.to_string(), command);
        if previous.is_some() {
            tracing::debug!(%slot, "replaced previous command in slot");
        }
    }

    /// Most recently registered command for `slot`.
    pub fn current(&self, slot: &str) -> Option<GenericCommand> {
        self.slots.lock().get(slot).cloned()
    }

    /// Names of all slots with a registered command.
    pub fn slots(&self) -> Vec<String> {
        let mut slots: Vec<String> = self.slots.lock().keys().cloned().collect();
        slots.sort();
        slots
    }

    /// Remove the entry for `slot`, but only if it still refers to `command`.
    ///
    /// Returns whether an entry was removed.
    pub fn remove_if_current(&self, slot: &str, command: &GenericCommand) -> bool {
        let mut slots = self.slots.lock();
        match slots.get(slot) {
            Some(current) if current.same_invocation(command) => {
                slots.remove(slot);
                true
            }
            _ => false,
        }
    }

    /// Forward `signal` to the command currently registered for `slot`.
    pub fn signal(&self, slot: &str, signal: Signal) -> Result<(), SignalError> {
        // Clone out of the lock; the command takes its own lock to signal.
        match self.current(slot) {
            Some(command) => command.send_signal(signal),
            None => Err(SignalError::NoSuchSlot(slot.to_string())),
        }
    }

    /// Forward `signal` to every registered command that is still running.
    ///
    /// Returns the slots that were signalled.
    pub fn signal_all(&self, signal: Signal) -> Vec<String> {
        let snapshot = self.slots.lock().clone();
        let mut delivered = Vec::new();
        for (slot, command) in snapshot {
            match command.send_signal(signal) {
                Ok(()) => delivered.push(slot),
                Err(SignalError::Exited { .. }) | Err(SignalError::NotStarted) => {}
                Err(e) => tracing::warn!(%slot, error = %e, "failed to forward signal"),
            }
        }
        delivered.sort();
        delivered
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
