//! Width of the handles a set uses to address its nested lists.
//!
//! Every sublist lives in an arena slot and its owning record keeps only the slot number,
//! so the handle width bounds how many nested lists one set can hold at a time. `u32`
//! keeps records small; `u16` suits many tiny sets and `usize` lifts the bound entirely.

use std::fmt;
use std::hash::Hash;

/// Handle width used when a set does not name one.
pub type DefaultIx = u32;

/// Unsigned integer usable as an arena slot handle.
///
/// # Safety
///
/// `new` and `index` must round-trip every value below `max`: the arena hands out
/// `new(slots.len())` and later indexes its storage with `index()` unchecked.
pub unsafe trait IndexType: Copy + Default + Hash + Ord + fmt::Debug + 'static {
    /// Handle of the slot at `x`
    fn new(x: usize) -> Self;
    /// Position of the slot
    fn index(&self) -> usize;
    /// Reserved as the "arena full" marker, never handed out
    fn max() -> Self;
}

macro_rules! slot_width {
    ($($ty:ty),*) => {$(
        unsafe impl IndexType for $ty {
            #[inline(always)]
            fn new(x: usize) -> Self {
                x as $ty
            }
            #[inline(always)]
            fn index(&self) -> usize {
                *self as usize
            }
            #[inline(always)]
            fn max() -> Self {
                <$ty>::MAX
            }
        }
    )*};
}

slot_width!(u16, u32, usize);
