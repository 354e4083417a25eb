use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::assets::fetch::{ImageFetcher, LoadedImage, load_image};
use crate::foundation::core::{Side, Size};
use crate::foundation::error::StudioResult;
use crate::layer::model::{Geometry, ImageStyle, Layer};

/// Share of the surface width covered by the background.
const BACKGROUND_WIDTH_RATIO: f64 = 0.6;
/// Top offset of the background as a share of the surface height.
const BACKGROUND_TOP_RATIO: f64 = 0.1;
const BACKGROUND_OPACITY: f64 = 0.9;

/// A finished background load, tagged with the request it answers.
pub(crate) struct CompletedBackground {
    pub(crate) generation: u64,
    pub(crate) side: Side,
    pub(crate) source: String,
    pub(crate) result: StudioResult<LoadedImage>,
}

struct Pending {
    generation: u64,
    side: Side,
    source: String,
    rx: oneshot::Receiver<StudioResult<LoadedImage>>,
}

/// Fire-and-forget background fetches.
///
/// Every request bumps the generation and replaces the pending receiver; a task answering an
/// older request finds its receiver gone and drops the result.
#[derive(Default)]
pub(crate) struct BackgroundLoader {
    generation: u64,
    pending: Option<Pending>,
}

impl BackgroundLoader {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start loading `source` for `side`. An empty source only invalidates older requests.
    pub(crate) fn request(&mut self, fetcher: Arc<dyn ImageFetcher>, side: Side, source: &str) -> u64 {
        self.generation += 1;
        self.pending = None;
        let generation = self.generation;

        if source.trim().is_empty() {
            tracing::debug!(%side, generation, "no background source for side");
            return generation;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                tracing::warn!(%side, source, "no async runtime; background not loaded");
                return generation;
            }
        };

        let (tx, rx) = oneshot::channel();
        let url = source.to_owned();
        handle.spawn(async move {
            let result = load_image(fetcher.as_ref(), &url).await;
            // The receiver is gone when a newer request superseded this one.
            let _ = tx.send(result);
        });

        tracing::debug!(%side, generation, source, "background requested");
        self.pending = Some(Pending {
            generation,
            side,
            source: source.to_owned(),
            rx,
        });
        generation
    }

    /// Take a completed load without waiting.
    pub(crate) fn poll(&mut self) -> Option<CompletedBackground> {
        let pending = self.pending.as_mut()?;
        match pending.rx.try_recv() {
            Ok(result) => self.complete(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.pending = None;
                None
            }
        }
    }

    /// Wait at most `timeout` for the pending load.
    pub(crate) async fn settle(&mut self, timeout: Duration) -> Option<CompletedBackground> {
        let pending = self.pending.as_mut()?;
        match tokio::time::timeout(timeout, &mut pending.rx).await {
            Ok(Ok(result)) => self.complete(result),
            Ok(Err(_)) => {
                self.pending = None;
                None
            }
            Err(_) => {
                tracing::debug!(?timeout, "background still loading after timeout");
                None
            }
        }
    }

    fn complete(&mut self, result: StudioResult<LoadedImage>) -> Option<CompletedBackground> {
        let p = self.pending.take()?;
        Some(CompletedBackground {
            generation: p.generation,
            side: p.side,
            source: p.source,
            result,
        })
    }
}

/// Background layer for `image` on a surface of `surface` size: 60% of the width keeping the
/// aspect ratio, horizontally centered, 10% from the top, slightly translucent.
pub(crate) fn place_background(loaded: LoadedImage, source: String, surface: Size, side: Side) -> Layer {
    let img_w = f64::from(loaded.image.width.max(1));
    let scale = surface.width * BACKGROUND_WIDTH_RATIO / img_w;
    let left = (surface.width - img_w * scale) / 2.0;
    let top = surface.height * BACKGROUND_TOP_RATIO;

    Layer::image(
        ImageStyle {
            source,
            opacity: BACKGROUND_OPACITY,
            cross_origin: true,
            tainted: loaded.tainted,
            image: loaded.image,
        },
        Geometry::at(left, top).with_scale(scale),
        side,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/surface/background.rs"]
mod tests;
