//! Low-level primitives for arena memory.
//!
//! Regions are stored as a `Vec` of 64-byte aligned blocks and viewed as
//! bytes through `bytemuck`. The only `unsafe` in the crate is the pair of
//! marker impls below.

#![allow(unsafe_code)]

use bytemuck::{Pod, Zeroable};

use crate::error::ArenaError;

/// Alignment in bytes of every region start, snapshot buffer, and the
/// largest alignment an allocation may request.
pub const REGION_ALIGN: usize = 64;

#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct Block([u8; REGION_ALIGN]);

const _: () = assert!(std::mem::align_of::<Block>() == REGION_ALIGN);
const _: () = assert!(std::mem::size_of::<Block>() == REGION_ALIGN);

// SAFETY: `Block` is a `repr(C)` wrapper around a byte array whose size
// equals its alignment, so it has no padding and the all-zero pattern is
// a valid value.
unsafe impl Zeroable for Block {}
// SAFETY: as above; every bit pattern of `[u8; 64]` is valid, the type is
// `Copy` and `'static`, and there is no padding.
unsafe impl Pod for Block {}

/// Fixed-length, zero-initialised byte storage starting on a
/// [`REGION_ALIGN`] boundary.
pub(crate) struct AlignedBytes {
    blocks: Vec<Block>,
    len: usize,
}

impl AlignedBytes {
    /// Reserve and zero `len` bytes.
    ///
    /// Uses `try_reserve_exact` so that an impossible reservation surfaces
    /// as [`ArenaError::ReservationFailed`] instead of aborting.
    pub(crate) fn zeroed(len: usize) -> Result<Self, ArenaError> {
        if u32::try_from(len).is_err() {
            return Err(ArenaError::RegionTooLarge { requested: len });
        }
        let n_blocks = len.div_ceil(REGION_ALIGN);
        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(n_blocks)
            .map_err(|_| ArenaError::ReservationFailed { requested: len })?;
        blocks.resize(n_blocks, Block::zeroed());
        Ok(Self { blocks, len })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Block, u8>(&self.blocks)[..self.len]
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..self.len]
    }

    /// Bytes held by the backing allocation (rounded up to whole blocks).
    pub(crate) fn memory_bytes(&self) -> usize {
        self.blocks.len() * REGION_ALIGN
    }
}

/// Round `offset` up to the next multiple of `align`.
///
/// `align` must already have passed [`check_align`]. Returns `None` on
/// overflow.
pub(crate) fn align_up(offset: usize, align: usize) -> Option<usize> {
    let mask = align - 1;
    offset.checked_add(mask).map(|v| v & !mask)
}

/// Validate an allocation alignment.
pub(crate) fn check_align(align: usize) -> Result<(), ArenaError> {
    if align.is_power_of_two() && align <= REGION_ALIGN {
        Ok(())
    } else {
        Err(ArenaError::InvalidAlignment { align })
    }
}

/// View a byte range as a slice of `T`.
///
/// Fails with [`ArenaError::Layout`] if the range is misaligned for `T` or
/// its length is not a multiple of `size_of::<T>()`. Ranges obtained from
/// an allocation made with `align >= align_of::<T>()` are always aligned.
pub fn cast_slice<T: Pod>(bytes: &[u8]) -> Result<&[T], ArenaError> {
    bytemuck::try_cast_slice(bytes).map_err(|_| layout_error::<T>(bytes.len()))
}

/// Mutable counterpart of [`cast_slice`].
pub fn cast_slice_mut<T: Pod>(bytes: &mut [u8]) -> Result<&mut [T], ArenaError> {
    let len = bytes.len();
    bytemuck::try_cast_slice_mut(bytes).map_err(|_| layout_error::<T>(len))
}

fn layout_error<T>(len: usize) -> ArenaError {
    ArenaError::Layout {
        size: std::mem::size_of::<T>(),
        align: std::mem::align_of::<T>(),
        len,
    }
}
