//! In-memory slot backend.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{Slot, SlotStorage};
use crate::error::Result;

/// Keeps slots in process memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySlots {
    slots: Mutex<HashMap<Slot, String>>,
}

impl MemorySlots {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStorage for MemorySlots {
    fn read(&self, slot: Slot) -> Result<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(&slot).cloned())
    }

    fn write(&self, slot: Slot, payload: &str) -> Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(slot, payload.to_string());
        Ok(())
    }

    fn remove(&self, slot: Slot) -> Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&slot);
        Ok(())
    }

    fn location(&self) -> String {
        ":memory:".to_string()
    }
}
