//! Spatia instance pairing the audio processor with its control surface.

use crate::{ControlSurface, SpatiaBuilder, SpatialProcessor};

/// A binaural renderer.
///
/// The [`SpatialProcessor`] belongs on the audio thread and the
/// [`ControlSurface`] on a control thread; [`Spatia::split`] separates them.
/// Both are `Send`.
///
/// # Example
///
/// ```
/// use spatia::prelude::*;
///
/// let mut spatia = Spatia::builder().build()?;
/// spatia.control().set_doppler(true);
/// assert!(spatia.control().settings().doppler_enabled());
/// # Ok::<(), spatia::Error>(())
/// ```
pub struct Spatia {
    processor: SpatialProcessor,
    control: ControlSurface,
}

impl std::fmt::Debug for Spatia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spatia").finish_non_exhaustive()
    }
}

impl Spatia {
    pub fn builder() -> SpatiaBuilder {
        SpatiaBuilder::default()
    }

    pub(crate) fn from_parts(processor: SpatialProcessor, control: ControlSurface) -> Self {
        Self { processor, control }
    }

    pub fn processor(&mut self) -> &mut SpatialProcessor {
        &mut self.processor
    }

    pub fn control(&mut self) -> &mut ControlSurface {
        &mut self.control
    }

    pub fn split(self) -> (SpatialProcessor, ControlSurface) {
        (self.processor, self.control)
    }
}
