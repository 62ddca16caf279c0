//! Object pool for note tokens.
//!
//! Tokens live in fixed slots and are addressed through generational
//! handles, so a handle kept past its release can never reach the next
//! tile that reuses the slot.

use super::token::NoteToken;
use crate::error::EngineError;

/// Reference to a live token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileHandle {
    slot: u32,
    generation: u32,
}

impl TileHandle {
    pub fn slot(&self) -> u32 {
        self.slot
    }
}

#[derive(Debug)]
struct Slot {
    token: NoteToken,
    generation: u32,
    in_use: bool,
}

#[derive(Debug)]
pub struct TilePool {
    slots: Vec<Slot>,
    idle: Vec<u32>,
    initial_size: usize,
    capacity: Option<usize>,
}

impl TilePool {
    /// Pre-builds `initial_size` idle tokens (clamped to `capacity`).
    pub fn new(initial_size: usize, capacity: Option<usize>) -> Self {
        let initial_size = capacity.map_or(initial_size, |cap| initial_size.min(cap));
        let mut pool = Self {
            slots: Vec::with_capacity(initial_size),
            idle: Vec::with_capacity(initial_size),
            initial_size,
            capacity,
        };
        for _ in 0..initial_size {
            pool.create_slot();
        }
        pool
    }

    fn create_slot(&mut self) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            token: NoteToken::idle(),
            generation: 0,
            in_use: false,
        });
        self.idle.push(index);
        index
    }

    /// Hands out an idle token, building one if none is idle.
    ///
    /// Returns `None` only when a capacity is set and every slot is in flight.
    pub fn acquire(&mut self) -> Option<TileHandle> {
        if self.idle.is_empty() {
            if self.capacity.is_some_and(|cap| self.slots.len() >= cap) {
                return None;
            }
            self.create_slot();
            if self.slots.len() > self.initial_size {
                log::debug!("POOL: Grew to {} tiles", self.slots.len());
            }
        }

        let index = self.idle.pop()?;
        let slot = &mut self.slots[index as usize];
        slot.in_use = true;
        Some(TileHandle {
            slot: index,
            generation: slot.generation,
        })
    }

    /// Returns a token to the idle set and resets it.
    ///
    /// Releasing an idle or stale handle is a programming error: it asserts in
    /// debug builds and is a logged no-op otherwise.
    pub fn release(&mut self, handle: TileHandle) -> Result<(), EngineError> {
        let live = self.is_live(handle);
        debug_assert!(live, "double retirement of tile slot {}", handle.slot);
        if !live {
            log::warn!("POOL: Ignored double retirement of slot {}", handle.slot);
            return Err(EngineError::DoubleRetirement { slot: handle.slot });
        }

        let slot = &mut self.slots[handle.slot as usize];
        slot.token.reset();
        slot.in_use = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.idle.push(handle.slot);
        Ok(())
    }

    pub fn is_live(&self, handle: TileHandle) -> bool {
        self.slots
            .get(handle.slot as usize)
            .is_some_and(|s| s.in_use && s.generation == handle.generation)
    }

    pub fn get(&self, handle: TileHandle) -> Option<&NoteToken> {
        self.slots
            .get(handle.slot as usize)
            .filter(|s| s.in_use && s.generation == handle.generation)
            .map(|s| &s.token)
    }

    pub fn get_mut(&mut self, handle: TileHandle) -> Option<&mut NoteToken> {
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|s| s.in_use && s.generation == handle.generation)
            .map(|s| &mut s.token)
    }

    pub fn in_flight(&self) -> usize {
        self.slots.len() - self.idle.len()
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Every token ever built by this pool.
    pub fn total(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
