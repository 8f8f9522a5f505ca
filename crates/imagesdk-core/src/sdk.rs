//! The operation façade: every public operation, addressed by handle.
//!
//! `ImageSdk` owns the handle registry and the decode configuration. The
//! registry lock is only held long enough to look a handle up; the work
//! itself runs under the image's own lock, so operations on different
//! handles proceed in parallel while operations on one handle are
//! serialised.
//!
//! Each failure is logged here, once, with the operation name and status.

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::decode;
use crate::encode::EncodedBuffer;
use crate::error::{ImageError, Result};
use crate::metadata::ImageMeta;
use crate::options::{
    CropOptions, JpegOptions, OpacityOptions, PngOptions, ResizeOptions, RotateOptions,
    WatermarkOptions,
};
use crate::owned::Image;
use crate::registry::{HandleRegistry, ImageHandle};

/// Handle-based image operations.
pub struct ImageSdk {
    registry: Mutex<HandleRegistry>,
    config: RwLock<Config>,
}

impl Default for ImageSdk {
    fn default() -> Self {
        Self {
            registry: Mutex::new(HandleRegistry::new()),
            config: RwLock::new(Config::default()),
        }
    }
}

impl ImageSdk {
    /// Create an SDK with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `InitFailed` if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: Mutex::new(HandleRegistry::new()),
            config: RwLock::new(config),
        })
    }

    /// Replace the configuration. Images already loaded are unaffected.
    pub fn configure(&self, config: Config) -> Result<()> {
        logged("configure", config.validate())?;
        tracing::debug!(?config, "configuration updated");
        *self.config.write() = config;
        Ok(())
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Decode a file and register the result.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<ImageHandle> {
        let config = self.config();
        let result = decode::load_path(path, &config).and_then(|image| self.insert(image));
        logged("load_image", result)
    }

    /// Decode an in-memory buffer and register the result.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<ImageHandle> {
        let config = self.config();
        let result = decode::load_bytes(bytes, &config).and_then(|image| self.insert(image));
        logged("load_image_from_bytes", result)
    }

    /// Register an already decoded image.
    pub fn insert(&self, image: Image) -> Result<ImageHandle> {
        let handle = self.registry.lock().insert(image)?;
        tracing::debug!(%handle, "image registered");
        Ok(handle)
    }

    /// Release one image. The handle is invalid afterwards.
    pub fn release(&self, handle: ImageHandle) -> Result<()> {
        logged("free_image_handle", self.registry.lock().remove(handle))?;
        tracing::debug!(%handle, "image released");
        Ok(())
    }

    /// Release every live image. Returns how many were released.
    pub fn release_all(&self) -> usize {
        let released = self.registry.lock().clear();
        tracing::debug!(released, "released all images");
        released
    }

    /// Number of images currently registered.
    pub fn live_handles(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn resize(&self, handle: ImageHandle, options: &ResizeOptions) -> Result<()> {
        let max_alloc = self.config.read().max_alloc;
        self.mutate("resize_image", handle, |image| image.resize(options, max_alloc))
    }

    pub fn crop(&self, handle: ImageHandle, options: &CropOptions) -> Result<()> {
        self.mutate("crop_image", handle, |image| image.crop(options))
    }

    pub fn rotate(&self, handle: ImageHandle, options: &RotateOptions) -> Result<()> {
        let max_alloc = self.config.read().max_alloc;
        self.mutate("rotate_image", handle, |image| image.rotate(options, max_alloc))
    }

    pub fn change_opacity(&self, handle: ImageHandle, options: &OpacityOptions) -> Result<()> {
        self.mutate("change_image_opacity", handle, |image| {
            image.set_opacity(options)
        })
    }

    /// Composite the image behind `mark` onto the image behind `base`.
    ///
    /// `base` and `mark` may be the same handle.
    pub fn watermark(
        &self,
        base: ImageHandle,
        mark: ImageHandle,
        options: &WatermarkOptions,
    ) -> Result<()> {
        let result = self.lookup_pair(base, mark).and_then(|(base_image, mark_image)| {
            // Copy the mark out first so only one image lock is held at a time
            let mark_pixels = mark_image.lock().pixels().clone();
            let mut guard = base_image.lock();
            guard.watermark_pixels(&mark_pixels, options)
        });
        logged("watermark_image", result)?;
        tracing::debug!(%base, %mark, "watermark applied");
        Ok(())
    }

    pub fn encode_jpeg(&self, handle: ImageHandle, options: &JpegOptions) -> Result<EncodedBuffer> {
        let result = self.read(handle, |image| image.encode_jpeg(options));
        logged("encode_to_jpeg", result)
    }

    pub fn encode_png(&self, handle: ImageHandle, options: &PngOptions) -> Result<EncodedBuffer> {
        let result = self.read(handle, |image| image.encode_png(options));
        logged("encode_to_png", result)
    }

    /// Snapshot the metadata of an image.
    pub fn metadata(&self, handle: ImageHandle) -> Result<ImageMeta> {
        let result = self.read(handle, |image| Ok(image.metadata()));
        logged("extract_metadata", result)
    }

    fn lookup(&self, handle: ImageHandle) -> Result<Arc<Mutex<Image>>> {
        self.registry.lock().get(handle)
    }

    /// Run `f` on the image behind `handle` under its lock.
    fn read<T, F>(&self, handle: ImageHandle, f: F) -> Result<T>
    where
        F: FnOnce(&Image) -> Result<T>,
    {
        let image = self.lookup(handle)?;
        let guard = image.lock();
        f(&*guard)
    }

    fn lookup_pair(
        &self,
        first: ImageHandle,
        second: ImageHandle,
    ) -> Result<(Arc<Mutex<Image>>, Arc<Mutex<Image>>)> {
        let registry = self.registry.lock();
        Ok((registry.get(first)?, registry.get(second)?))
    }

    fn mutate<F>(&self, operation: &'static str, handle: ImageHandle, f: F) -> Result<()>
    where
        F: FnOnce(&mut Image) -> Result<()>,
    {
        let result = self.lookup(handle).and_then(|image| {
            let mut guard = image.lock();
            f(&mut *guard)?;
            Ok(guard.dimensions())
        });
        let (width, height) = logged(operation, result)?;
        tracing::debug!(operation, %handle, width, height, "image updated");
        Ok(())
    }
}

/// Log a failed operation at warn level and pass the result through.
fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(ref e) = result {
        log_failure(operation, e);
    }
    result
}

fn log_failure(operation: &'static str, error: &ImageError) {
    tracing::warn!(
        operation,
        status = %error.status(),
        error = %error,
        "image operation failed"
    );
}
