#![forbid(unsafe_code)]
//! Two-sided design editor engine: a CPU raster surface with front/back layer sets, zoom,
//! background artwork and per-layer print exports, plus the HTTP client that submits orders.

mod assets;
mod client;
mod editor;
mod export;
mod foundation;
mod layer;
mod render;
mod surface;
mod view;

pub use assets::decode::{PreparedImage, decode_image};
pub use assets::fetch::{
    FetchedImage, HttpImageFetcher, ImageFetcher, LoadedImage, LocalImageFetcher,
    MemoryImageFetcher, load_image,
};
pub use assets::fonts::FontBook;
pub use client::api::{
    CreateOrderRequest, OrderConfirmation, OrderDesign, Product, StudioApi, UploadFile,
};
pub use client::http::HttpApi;
pub use client::memory::MemoryApi;
pub use client::store::ClientStore;
pub use editor::controller::{
    DEFAULT_TEXT, Editor, ExportSet, HOME_ROUTE, ROTATE_STEP_DEG, ZOOM_STEP,
};
pub use editor::state::{ConfirmForm, ConfirmOutcome, EditorState, Notice, NoticeLevel};
pub use export::identity::{identity_slug, slugify};
pub use export::pipeline::{
    ExportBatches, ExportCategory, ExportContext, ExportedFile, capture_full_side,
    export_batches, export_layers, layer_file_name, side_file_name,
};
pub use export::sink::{DirectorySink, DownloadSink, InMemoryDownloads, download_all};
pub use foundation::config::StudioConfig;
pub use foundation::core::{Affine, Point, Rect, Rgba8, Side, SidePair, Size, Vec2};
pub use foundation::error::{StudioError, StudioResult};
pub use layer::model::{Geometry, ImageStyle, Layer, LayerKey, LayerKind, TextStyle};
pub use render::FrameRGBA;
pub use render::target::TargetTracker;
pub use surface::viewport::{MAX_ZOOM, MIN_ZOOM, Viewport};
pub use surface::{ImagePlacement, Surface, TEXT_ANCHOR, TEXT_DECORATION, TEXT_FONT_SIZE};
pub use view::side_manager::SideManager;
