//! Per-layer and full-side raster exports, file naming and local saving.

pub(crate) mod identity;
pub(crate) mod pipeline;
pub(crate) mod sink;
