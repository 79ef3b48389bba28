// accel.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::{DitherKind, Ditherer};
use crate::{Error, Result, quantize::Color};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Platform dithering backend.
///
/// A backend is checked once when the encoder is opened.  After that it may
/// be called from several worker threads at the same time.
pub trait DitherBackend: Send + Sync {
    /// Get the backend name (for logging)
    fn name(&self) -> &str;

    /// Check whether the backend is usable.
    ///
    /// * `cache_dir`: Directory for compiled kernels, if any.
    fn open(&self, cache_dir: Option<&Path>) -> bool;

    /// Check whether a dithering algorithm is supported
    fn supports(&self, kind: DitherKind) -> bool;

    /// Dither pixels, returning one palette index per pixel
    fn dither(
        &self,
        kind: DitherKind,
        pixels: &[Color],
        width: u32,
        height: u32,
        palette: &[Color],
    ) -> Result<Vec<u8>>;

    /// Release backend resources
    fn close(&self) {}
}

/// Run a backend, checking its output
pub(crate) fn dither(
    backend: &dyn DitherBackend,
    kind: DitherKind,
    pixels: &[Color],
    width: u32,
    height: u32,
    palette: &[Color],
) -> Result<Vec<u8>> {
    let indices = backend.dither(kind, pixels, width, height, palette)?;
    if indices.len() != pixels.len() {
        return Err(Error::Accelerator(format!(
            "{} indices for {} pixels",
            indices.len(),
            pixels.len()
        )));
    }
    if let Some(i) = indices.iter().find(|i| usize::from(**i) >= palette.len())
    {
        return Err(Error::Accelerator(format!("index {i} out of range")));
    }
    Ok(indices)
}

/// Accelerator context.
///
/// Owned by the encoder; the backend is checked by `open` and released
/// when the encoder finishes (or is dropped).
#[derive(Default)]
pub struct AccelContext {
    /// Kernel cache directory
    cache_dir: Option<PathBuf>,
    /// Dithering backend
    backend: Option<Arc<dyn DitherBackend>>,
    /// Backend opened successfully
    opened: bool,
}

impl fmt::Debug for AccelContext {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("AccelContext")
            .field("cache_dir", &self.cache_dir)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("opened", &self.opened)
            .finish()
    }
}

impl AccelContext {
    /// Create a context with no backend (software only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the kernel cache directory
    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the dithering backend
    pub fn with_backend(mut self, backend: Arc<dyn DitherBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Get the backend name, if one is active
    pub fn backend_name(&self) -> Option<&str> {
        match (&self.backend, self.opened) {
            (Some(b), true) => Some(b.name()),
            _ => None,
        }
    }

    /// Probe the backend; an unusable backend is dropped
    pub(crate) fn open(&mut self) {
        if let Some(backend) = &self.backend {
            if backend.open(self.cache_dir.as_deref()) {
                log::info!("dither backend: {}", backend.name());
                self.opened = true;
            } else {
                log::warn!("{}: unavailable, using software", backend.name());
                self.backend = None;
            }
        }
    }

    /// Get a ditherer for one frame
    pub(crate) fn ditherer(&self, kind: DitherKind) -> Ditherer {
        match &self.backend {
            Some(backend) if self.opened && backend.supports(kind) => {
                Ditherer::Accelerated(kind, Arc::clone(backend))
            }
            _ => Ditherer::from(kind),
        }
    }

    /// Release the backend
    pub(crate) fn close(&mut self) {
        if let Some(backend) = self.backend.take() {
            if self.opened {
                log::debug!("{}: closed", backend.name());
                backend.close();
            }
        }
        self.opened = false;
    }
}

impl Drop for AccelContext {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::quantize::make_palette;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend which maps every pixel to one index
    #[derive(Default)]
    pub(crate) struct Fixed {
        pub index: u8,
        pub available: bool,
        pub calls: AtomicUsize,
        pub closed: AtomicUsize,
    }

    impl DitherBackend for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn open(&self, _cache_dir: Option<&Path>) -> bool {
            self.available
        }
        fn supports(&self, kind: DitherKind) -> bool {
            kind == DitherKind::Bayer
        }
        fn dither(
            &self,
            _kind: DitherKind,
            pixels: &[Color],
            _width: u32,
            _height: u32,
            _palette: &[Color],
        ) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![self.index; pixels.len()])
        }
        fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fixed(index: u8, available: bool) -> Arc<Fixed> {
        Arc::new(Fixed {
            index,
            available,
            ..Default::default()
        })
    }

    #[test]
    fn selects_backend() {
        let backend = fixed(1, true);
        let mut ctx = AccelContext::new().with_backend(backend.clone());
        ctx.open();
        assert_eq!(ctx.backend_name(), Some("fixed"));
        assert!(matches!(
            ctx.ditherer(DitherKind::Bayer),
            Ditherer::Accelerated(DitherKind::Bayer, _)
        ));
        assert!(matches!(
            ctx.ditherer(DitherKind::FloydSteinberg),
            Ditherer::FloydSteinberg
        ));
        let palette = make_palette(&[[0, 0, 0], [255, 255, 255]]);
        let raster = ctx
            .ditherer(DitherKind::Bayer)
            .dither(&[[0, 0, 0]; 4], 2, 2, &palette)
            .unwrap();
        assert_eq!(raster.as_u8_slice(), [1, 1, 1, 1]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        ctx.close();
        assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
        drop(ctx);
        assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unavailable_dropped() {
        let backend = fixed(0, false);
        let mut ctx = AccelContext::new()
            .with_cache_dir("/nonexistent")
            .with_backend(backend.clone());
        ctx.open();
        assert_eq!(ctx.backend_name(), None);
        assert!(matches!(ctx.ditherer(DitherKind::Bayer), Ditherer::Bayer));
        drop(ctx);
        assert_eq!(backend.closed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn bad_output_falls_back() {
        let backend = fixed(7, true);
        let mut ctx = AccelContext::new().with_backend(backend.clone());
        ctx.open();
        let colors = [[0, 0, 0], [255, 255, 255]];
        assert!(matches!(
            dither(backend.as_ref(), DitherKind::Bayer, &[[0, 0, 0]], 1, 1, &colors),
            Err(Error::Accelerator(_))
        ));
        let palette = make_palette(&colors);
        let raster = ctx
            .ditherer(DitherKind::Bayer)
            .dither(&[[255, 255, 255]; 2], 2, 1, &palette)
            .unwrap();
        assert_eq!(raster.as_u8_slice(), [1, 1]);
    }
}
