//! Opaque handles backed by generation-checked arenas.
//!
//! A handle is a non-zero `u64` token:
//!
//! ```text
//!  63      56 55              32 31               0
//! +----------+------------------+------------------+
//! |   tag    |    generation    |    index + 1     |
//! +----------+------------------+------------------+
//! ```
//!
//! The tag identifies the arena, so a session token presented where a loader
//! is expected is rejected. The generation is bumped whenever a slot is
//! freed, so stale tokens are rejected after close or unload.

use std::marker::PhantomData;
use std::num::NonZeroU64;

const TAG_SHIFT: u32 = 56;
const GENERATION_SHIFT: u32 = 32;
const GENERATION_MASK: u32 = 0x00FF_FFFF;

/// A typed token into one [`Arena`].
pub trait Handle: Copy {
    /// Arena tag carried in the top byte.
    const TAG: u8;

    /// Wrap a token. Tokens are not validated until they reach an arena.
    fn from_token(token: NonZeroU64) -> Self;

    /// Raw token.
    fn token(self) -> NonZeroU64;
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $tag:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Raw token value.
            pub fn to_raw(self) -> u64 {
                self.0.get()
            }

            /// Wrap a raw token. Zero maps to `None`.
            pub fn from_raw(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }
        }

        impl Handle for $name {
            const TAG: u8 = $tag;

            fn from_token(token: NonZeroU64) -> Self {
                Self(token)
            }

            fn token(self) -> NonZeroU64 {
                self.0
            }
        }
    };
}

define_handle!(
    /// Handle to a loader.
    LoaderHandle,
    0x4C
);
define_handle!(
    /// Handle to a config owned by a loader.
    ConfigHandle,
    0x43
);
define_handle!(
    /// Handle to an enumeration result vended by a loader.
    ImplDescriptionHandle,
    0x44
);
define_handle!(
    /// Handle to a session.
    SessionHandle,
    0x53
);

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena addressed by handles of type `H`.
pub struct Arena<H, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    _handle: PhantomData<fn() -> H>,
}

impl<H: Handle, T> Arena<H, T> {
    /// Create an empty arena.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            _handle: PhantomData,
        }
    }

    /// Store a value and return its handle.
    ///
    /// Returns `None` once the index space is exhausted.
    pub fn insert(&mut self, value: T) -> Option<H> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.slots.len()).ok().filter(|&i| i < u32::MAX)?;
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                index
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        Some(H::from_token(encode(H::TAG, slot.generation, index)))
    }

    fn locate(&self, handle: H) -> Option<usize> {
        let (tag, generation, index) = decode(handle.token());
        let slot = self.slots.get(index as usize)?;
        (tag == H::TAG && slot.generation == generation && slot.value.is_some())
            .then_some(index as usize)
    }

    /// Value behind a live handle.
    pub fn get(&self, handle: H) -> Option<&T> {
        let index = self.locate(handle)?;
        self.slots[index].value.as_ref()
    }

    /// Mutable value behind a live handle.
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let index = self.locate(handle)?;
        self.slots[index].value.as_mut()
    }

    /// Remove a value, invalidating its handle.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let index = self.locate(handle)?;
        self.release(index)
    }

    /// Remove every value for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        for index in 0..self.slots.len() {
            let drop_it = matches!(&self.slots[index].value, Some(value) if !keep(value));
            if drop_it {
                self.release(index);
            }
        }
    }

    fn release(&mut self, index: usize) -> Option<T> {
        let slot = &mut self.slots[index];
        let value = slot.value.take()?;
        slot.generation = (slot.generation + 1) & GENERATION_MASK;
        self.free.push(index as u32);
        Some(value)
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the arena holds no live value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Handle, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(tag: u8, generation: u32, index: u32) -> NonZeroU64 {
    let raw = (u64::from(tag) << TAG_SHIFT)
        | (u64::from(generation & GENERATION_MASK) << GENERATION_SHIFT)
        | (u64::from(index) + 1);
    // index + 1 is never zero
    NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN)
}

fn decode(token: NonZeroU64) -> (u8, u32, u32) {
    let raw = token.get();
    let tag = (raw >> TAG_SHIFT) as u8;
    let generation = ((raw >> GENERATION_SHIFT) as u32) & GENERATION_MASK;
    let index = (raw as u32).wrapping_sub(1);
    (tag, generation, index)
}
