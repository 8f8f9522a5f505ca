//! Generation-checked arena of live images.
//!
//! An [`ImageHandle`] packs a slot index and the slot's generation into one
//! non-zero `u64`. Removing an image bumps the generation, so every copy of
//! the old handle is detectably stale from then on. Releasing twice, or using
//! a released handle, is an `InvalidHandle` error and never touches freed
//! memory.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ImageError, Result};
use crate::owned::Image;

/// Opaque reference to an image held by a [`HandleRegistry`].
///
/// Layout of the raw value: the low 32 bits hold `slot index + 1`, the high
/// 32 bits hold the generation. Raw 0 is the null handle and never issued.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(NonZeroU64);

impl ImageHandle {
    fn new(index: u32, generation: u32) -> Option<Self> {
        let low = index.checked_add(1)? as u64;
        NonZeroU64::new(((generation as u64) << 32) | low).map(Self)
    }

    /// Raw value as passed across the C boundary.
    pub fn to_raw(self) -> u64 {
        self.0.get()
    }

    /// Rebuild a handle from its raw value. 0 (the null handle) gives `None`.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    fn index(self) -> Option<usize> {
        let low = (self.0.get() & u32::MAX as u64) as u32;
        low.checked_sub(1).map(|i| i as usize)
    }

    fn generation(self) -> u32 {
        (self.0.get() >> 32) as u32
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({:#x})", self.0.get())
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

struct Slot {
    generation: u32,
    image: Option<Arc<Mutex<Image>>>,
}

/// Arena of shared, individually locked images.
#[derive(Default)]
pub struct HandleRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an image and return its handle.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if the arena cannot grow.
    pub fn insert(&mut self, image: Image) -> Result<ImageHandle> {
        let image = Some(Arc::new(Mutex::new(image)));

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.image = image;
            self.live += 1;
            return ImageHandle::new(index, slot.generation).ok_or_else(exhausted);
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| exhausted())?;
        if index == u32::MAX {
            return Err(exhausted());
        }
        self.slots
            .try_reserve(1)
            .map_err(|e| ImageError::OutOfMemory(e.to_string()))?;
        self.slots.push(Slot {
            generation: 1,
            image,
        });
        self.live += 1;
        ImageHandle::new(index, 1).ok_or_else(exhausted)
    }

    /// Shared reference to the image behind `handle`.
    pub fn get(&self, handle: ImageHandle) -> Result<Arc<Mutex<Image>>> {
        self.slot(handle)
            .and_then(|slot| slot.image.clone())
            .ok_or(ImageError::InvalidHandle)
    }

    /// Release the image behind `handle`.
    ///
    /// The pixels are freed once no in-flight operation still holds the
    /// image. The handle, and every copy of it, is stale afterwards.
    pub fn remove(&mut self, handle: ImageHandle) -> Result<()> {
        let index = handle.index().ok_or(ImageError::InvalidHandle)?;
        let slot = self
            .slots
            .get_mut(index)
            .filter(|slot| slot.generation == handle.generation() && slot.image.is_some())
            .ok_or(ImageError::InvalidHandle)?;

        slot.image = None;
        slot.generation = next_generation(slot.generation);
        self.free.push(index as u32);
        self.live -= 1;
        Ok(())
    }

    /// Release every live image. Returns how many were released.
    pub fn clear(&mut self) -> usize {
        let released = self.live;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.image.take().is_some() {
                slot.generation = next_generation(slot.generation);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
        released
    }

    /// Number of live images.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn slot(&self, handle: ImageHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index()?)
            .filter(|slot| slot.generation == handle.generation())
    }
}

/// Generations skip 0 so a handle is never confused with the null value.
fn next_generation(generation: u32) -> u32 {
    match generation.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

fn exhausted() -> ImageError {
    ImageError::OutOfMemory("image handle space exhausted".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn grey_image(width: u32, height: u32) -> Image {
        Image::from_pixels(DynamicImage::ImageLuma8(image::GrayImage::new(width, height)))
    }

    #[test]
    fn test_insert_and_get() {
        let mut registry = HandleRegistry::new();
        let handle = registry.insert(grey_image(3, 2)).unwrap();

        let shared = registry.get(handle).unwrap();
        assert_eq!(shared.lock().dimensions(), (3, 2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_handles_are_non_null() {
        let mut registry = HandleRegistry::new();
        let handle = registry.insert(grey_image(1, 1)).unwrap();
        assert_ne!(handle.to_raw(), 0);
        assert_eq!(ImageHandle::from_raw(handle.to_raw()), Some(handle));
        assert_eq!(ImageHandle::from_raw(0), None);
    }

    #[test]
    fn test_double_remove_is_invalid_handle() {
        let mut registry = HandleRegistry::new();
        let handle = registry.insert(grey_image(1, 1)).unwrap();

        assert!(registry.remove(handle).is_ok());
        assert!(matches!(registry.remove(handle), Err(ImageError::InvalidHandle)));
        assert!(matches!(registry.get(handle), Err(ImageError::InvalidHandle)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reused_slot_rejects_stale_handle() {
        let mut registry = HandleRegistry::new();
        let old = registry.insert(grey_image(1, 1)).unwrap();
        registry.remove(old).unwrap();

        let new = registry.insert(grey_image(2, 2)).unwrap();
        assert_ne!(old, new);
        assert!(matches!(registry.get(old), Err(ImageError::InvalidHandle)));
        assert_eq!(registry.get(new).unwrap().lock().dimensions(), (2, 2));
    }

    #[test]
    fn test_unknown_handle() {
        let registry = HandleRegistry::new();
        let forged = ImageHandle::from_raw(0x1_0000_0005).unwrap();
        assert!(matches!(registry.get(forged), Err(ImageError::InvalidHandle)));

        // Generation bits set but index bits zero
        let no_index = ImageHandle::from_raw(0x1_0000_0000).unwrap();
        assert!(matches!(registry.get(no_index), Err(ImageError::InvalidHandle)));
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut registry = HandleRegistry::new();
        let a = registry.insert(grey_image(1, 1)).unwrap();
        let b = registry.insert(grey_image(1, 1)).unwrap();
        registry.remove(a).unwrap();
        let c = registry.insert(grey_image(1, 1)).unwrap();

        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        for handle in [a, b, c] {
            assert!(matches!(registry.get(handle), Err(ImageError::InvalidHandle)));
        }
    }

    #[test]
    fn test_outstanding_reference_survives_remove() {
        let mut registry = HandleRegistry::new();
        let handle = registry.insert(grey_image(4, 4)).unwrap();
        let in_flight = registry.get(handle).unwrap();

        registry.remove(handle).unwrap();
        assert_eq!(in_flight.lock().dimensions(), (4, 4));
    }

    #[test]
    fn test_next_generation_skips_zero() {
        assert_eq!(next_generation(1), 2);
        assert_eq!(next_generation(u32::MAX), 1);
    }
}
