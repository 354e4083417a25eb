use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::foundation::error::{StudioError, StudioResult};
use crate::render::FrameRGBA;

/// Counts offscreen targets that are currently alive.
///
/// Shared by every target acquired through the same tracker; a value of zero after an export
/// means every target was released, including on error paths.
#[derive(Clone, Debug, Default)]
pub struct TargetTracker {
    live: Arc<AtomicUsize>,
    acquired: Arc<AtomicUsize>,
}

impl TargetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets acquired and not yet dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Total targets acquired over the tracker's lifetime.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

/// Isolated raster target: its own render context and pixel buffer.
///
/// Released on drop, so every exit path of an export gives the buffers back.
pub(crate) struct OffscreenTarget {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    tracker: TargetTracker,
}

impl OffscreenTarget {
    pub(crate) fn acquire(width: u32, height: u32, tracker: &TargetTracker) -> StudioResult<Self> {
        if width == 0 || height == 0 {
            return Err(StudioError::render("offscreen target must be at least 1x1"));
        }
        let w: u16 = width
            .try_into()
            .map_err(|_| StudioError::render(format!("target width {width} exceeds u16")))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| StudioError::render(format!("target height {height} exceeds u16")))?;

        tracker.live.fetch_add(1, Ordering::SeqCst);
        tracker.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            tracker: tracker.clone(),
        })
    }

    pub(crate) fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    pub(crate) fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    /// Record draw commands, then flush them into the target and read the pixels back.
    pub(crate) fn render(
        &mut self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> StudioResult<()>,
    ) -> StudioResult<FrameRGBA> {
        self.ctx.reset();
        draw(&mut self.ctx)?;
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(FrameRGBA {
            width: self.width(),
            height: self.height(),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

impl Drop for OffscreenTarget {
    fn drop(&mut self) {
        self.tracker.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/target.rs"]
mod tests;
