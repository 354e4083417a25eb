use std::sync::Arc;

use anyhow::anyhow;

use crate::assets::fetch::{ImageFetcher, load_image};
use crate::assets::fonts::FontBook;
use crate::client::api::{OrderConfirmation, OrderDesign, Product, StudioApi};
use crate::client::store::ClientStore;
use crate::editor::state::{ConfirmForm, ConfirmOutcome, EditorState, Notice};
use crate::export::pipeline::{
    ExportBatches, ExportContext, ExportedFile, capture_full_side, export_batches,
};
use crate::export::sink::{DownloadSink, download_all};
use crate::foundation::config::StudioConfig;
use crate::foundation::core::{Point, Rgba8, Side};
use crate::foundation::error::{StudioError, StudioResult};
use crate::layer::model::{Layer, LayerKey};
use crate::surface::{ImagePlacement, Surface};
use crate::view::side_manager::SideManager;

pub const ROTATE_STEP_DEG: f64 = 15.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_TEXT: &str = "Your text";
pub const HOME_ROUTE: &str = "/";

/// One editing session: the live surface plus everything the user picked around it.
///
/// Actions are meant to be driven by a single owner. `busy` mirrors the UI contract that
/// conflicting controls are disabled while an export or design load runs; it is tracked, not
/// enforced.
pub struct Editor {
    config: StudioConfig,
    api: Arc<dyn StudioApi>,
    fetcher: Arc<dyn ImageFetcher>,
    store: ClientStore,
    sink: Box<dyn DownloadSink + Send>,
    surface: Surface,
    sides: SideManager,
    state: EditorState,
    busy: bool,
    notices: Vec<Notice>,
    product: Option<Product>,
    order_id: Option<String>,
    designs: Vec<OrderDesign>,
    selected_design: usize,
    text_input: String,
    selected_font: String,
    selected_color: String,
    confirm: ConfirmForm,
}

impl Editor {
    /// Session over a fresh, uninitialized surface. Nothing is fetched until
    /// [`Editor::initialize`] and [`Editor::open`] run.
    pub fn new(
        config: StudioConfig,
        api: Arc<dyn StudioApi>,
        fetcher: Arc<dyn ImageFetcher>,
        fonts: FontBook,
        store: ClientStore,
        sink: Box<dyn DownloadSink + Send>,
    ) -> Self {
        let surface = Surface::new(&config, fetcher.clone(), fonts);
        let selected_font = config.fonts.first().cloned().unwrap_or_default();
        Self {
            config,
            api,
            fetcher,
            store,
            sink,
            surface,
            sides: SideManager::new(),
            state: EditorState::Idle,
            busy: false,
            notices: Vec::new(),
            product: None,
            order_id: None,
            designs: Vec::new(),
            selected_design: 0,
            text_input: DEFAULT_TEXT.to_owned(),
            selected_font,
            selected_color: "#ffffff".to_owned(),
            confirm: ConfirmForm::default(),
        }
    }

    // ---------------------------------------------------------------------------------------
    // Accessors

    /// The live surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Layers cached for the side that is not shown.
    pub fn sides(&self) -> &SideManager {
        &self.sides
    }

    /// Persisted client state.
    pub fn store(&self) -> &ClientStore {
        &self.store
    }

    /// Current confirm-flow phase.
    pub fn state(&self) -> EditorState {
        self.state
    }

    /// `true` while an export or design load runs.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// User-facing notices raised so far, oldest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain the notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Product being edited, if one loaded.
    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    pub fn order_id(&self) -> Option<&str> {
        self.order_id.as_deref()
    }

    /// Designs of the current order.
    pub fn designs(&self) -> &[OrderDesign] {
        &self.designs
    }

    /// Index of the design last selected.
    pub fn selected_design(&self) -> usize {
        self.selected_design
    }

    /// Side shown on the surface.
    pub fn current_side(&self) -> Side {
        self.surface.active_side()
    }

    /// Confirm dialog state.
    pub fn confirm_form(&self) -> &ConfirmForm {
        &self.confirm
    }

    pub fn confirm_form_mut(&mut self) -> &mut ConfirmForm {
        &mut self.confirm
    }

    pub fn set_text_input(&mut self, text: impl Into<String>) {
        self.text_input = text.into();
    }

    /// Font family used for the next text layer.
    pub fn set_font(&mut self, family: impl Into<String>) {
        self.selected_font = family.into();
    }

    /// Hex fill for the next text layer. Unparsable values fall back to white.
    pub fn set_color(&mut self, hex: impl Into<String>) {
        self.selected_color = hex.into();
    }

    /// Layers of `side` in z-order, cloned out of the arena.
    pub fn layers(&self, side: Side) -> Vec<Layer> {
        self.sides
            .layers_for(&self.surface, side)
            .into_iter()
            .filter_map(|k| self.surface.layer(k).cloned())
            .collect()
    }

    // ---------------------------------------------------------------------------------------
    // Session setup

    /// Size the surface to its container and show the current side's background.
    pub fn initialize(&mut self, container_width: u32) {
        if self.surface.initialize(container_width, self.config.surface_height) {
            self.surface.request_background();
        }
    }

    /// Load the product and the order's designs, the way opening the editor route does.
    pub async fn open(&mut self, product_id: Option<&str>, order_id: Option<&str>) {
        self.order_id = order_id.map(str::to_owned);
        if let Some(id) = product_id {
            self.load_product(id).await;
        }
        if let Some(id) = order_id {
            self.load_designs(id).await;
        }
    }

    /// Fetch a product and install its side images as backgrounds.
    ///
    /// A successful lookup is persisted; a failed lookup falls back to the persisted product.
    pub async fn load_product(&mut self, id: &str) -> Option<&Product> {
        let product = match self.api.get_product(id).await {
            Ok(p) => {
                if let Err(e) = self.store.set_selected_product(&p).and_then(|()| self.store.save()) {
                    tracing::warn!(error = %e, "could not persist selected product");
                }
                Some(p)
            }
            Err(e) => {
                tracing::warn!(product = id, error = %e, "product lookup failed");
                self.store.selected_product()
            }
        };

        if let Some(p) = &product {
            self.surface.set_backdrops(
                p.image_url(Side::Front).map(str::to_owned),
                p.image_url(Side::Back).map(str::to_owned),
            );
            if self.surface.is_initialized() {
                self.surface.request_background();
            }
        }
        self.product = product;
        self.product.as_ref()
    }

    /// Fetch the order's designs and render the first one.
    pub async fn load_designs(&mut self, order_id: &str) -> usize {
        match self.api.order_designs(order_id).await {
            Ok(designs) => {
                self.designs = designs;
                self.selected_design = 0;
                if !self.designs.is_empty() {
                    self.select_design(0).await;
                }
            }
            Err(e) => {
                tracing::warn!(order = order_id, error = %e, "design lookup failed");
                self.designs.clear();
            }
        }
        self.designs.len()
    }

    // ---------------------------------------------------------------------------------------
    // Layer actions

    /// Replace the surface's image layers with design `index`.
    ///
    /// The old images are removed before the new one loads; a failed load leaves no image.
    /// Soft failures (missing or undecodable artwork) are only logged, anything else also
    /// raises an error notice.
    pub async fn select_design(&mut self, index: usize) -> Option<LayerKey> {
        self.selected_design = index;
        let url = self
            .designs
            .get(index)
            .map(|d| d.image_url.clone())
            .unwrap_or_default();

        self.busy = true;
        self.surface.remove_images();
        let loaded = load_image(self.fetcher.as_ref(), &url).await;
        self.busy = false;

        match loaded {
            Ok(img) => Some(self.surface.add_image(&url, img, ImagePlacement::DESIGN)),
            Err(e) if e.is_soft() => {
                tracing::warn!(index, url, error = %e, "design not rendered");
                None
            }
            Err(e) => {
                tracing::error!(index, url, error = %e, "design load failed");
                self.notices
                    .push(Notice::error(format!("Could not load design: {e}")));
                None
            }
        }
    }

    /// Select a design from a dropdown value; anything non-numeric selects the first design.
    pub async fn select_design_option(&mut self, raw: &str) -> Option<LayerKey> {
        let index = raw.trim().parse::<usize>().unwrap_or(0);
        self.select_design(index).await
    }

    /// Add the current text input with the selected font and color.
    pub fn add_text(&mut self) -> StudioResult<LayerKey> {
        let content = if self.text_input.is_empty() {
            DEFAULT_TEXT
        } else {
            self.text_input.as_str()
        };
        let fill = Rgba8::parse_or(&self.selected_color, Rgba8::WHITE);
        self.surface.add_text(content, &self.selected_font, fill)
    }

    pub fn select_at(&mut self, view_point: Point) -> Option<LayerKey> {
        self.surface.select_at(view_point)
    }

    pub fn drag_selected(&mut self, dx: f64, dy: f64) -> bool {
        self.surface.move_selection(dx, dy)
    }

    pub fn rotate_selected(&mut self) -> bool {
        self.surface.rotate_selection(ROTATE_STEP_DEG)
    }

    pub fn delete_selected(&mut self) -> bool {
        self.surface.delete_selection()
    }

    /// Clear the visible side and reload its background. The other side keeps its layers.
    pub fn reset_view(&mut self) {
        self.surface.reset_view();
        self.sides.prune(&self.surface);
    }

    /// Show `side`. Returns `false` when it is already shown.
    pub fn switch_view(&mut self, side: Side) -> bool {
        self.sides.switch_side(&mut self.surface, side)
    }

    pub fn zoom_in(&mut self) -> f64 {
        let next = (self.surface.zoom() + ZOOM_STEP).min(crate::surface::viewport::MAX_ZOOM);
        self.surface.zoom_to_center(next)
    }

    pub fn zoom_out(&mut self) -> f64 {
        let next = (self.surface.zoom() - ZOOM_STEP).max(crate::surface::viewport::MIN_ZOOM);
        self.surface.zoom_to_center(next)
    }

    pub fn open_confirm(&mut self) {
        self.confirm.open = true;
    }

    pub fn close_confirm(&mut self) {
        self.confirm.open = false;
    }

    /// Route back to design generation for the current product.
    pub fn redesign_route(&self) -> Option<String> {
        self.product
            .as_ref()
            .map(|p| format!("/design/product/{}", p.id))
    }

    // ---------------------------------------------------------------------------------------
    // Confirm

    /// Export every layer and both sides, submit the order and save the files locally.
    ///
    /// A missing order or a size/color outside the configured options is rejected before
    /// anything runs. On a later failure nothing on the surface changes, an error notice is
    /// raised and the error is returned so the user can retry.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_order(&mut self) -> StudioResult<ConfirmOutcome> {
        let Some(order_id) = self.order_id.clone() else {
            return Err(StudioError::validation("no order to confirm"));
        };
        self.confirm.validate(&self.config)?;

        self.busy = true;
        self.state = EditorState::Exporting;
        self.notices.push(Notice::info("Preparing order ..."));

        let result = self.export_and_submit(&order_id).await;

        self.busy = false;
        self.state = EditorState::Idle;
        self.confirm.open = false;

        match result {
            Ok(files) => {
                let saved: Vec<String> = download_all(&files, self.sink.as_mut())
                    .into_iter()
                    .map(str::to_owned)
                    .collect();
                if saved.len() < files.len() {
                    tracing::warn!(saved = saved.len(), total = files.len(), "some downloads failed");
                }
                self.notices
                    .push(Notice::success("Order submitted! We will contact you soon."));
                tracing::info!(order = %order_id, files = files.len(), "order submitted");
                Ok(ConfirmOutcome {
                    route: HOME_ROUTE.to_owned(),
                    downloads: saved,
                })
            }
            Err(e) => {
                tracing::warn!(order = %order_id, error = %e, "order confirmation failed");
                self.notices
                    .push(Notice::error(format!("Could not submit order: {e}")));
                Err(e)
            }
        }
    }

    /// Per-layer files of both sides plus the two full-side snapshots.
    ///
    /// Layer batches render on the blocking pool; the snapshots run one after the other since
    /// both switch the live surface.
    #[tracing::instrument(skip(self))]
    pub async fn export_all(&mut self) -> StudioResult<ExportSet> {
        self.surface.poll_background();
        let slug = self.store.identity_slug();
        let front = self.layers(Side::Front);
        let back = self.layers(Side::Back);
        let ctx = ExportContext {
            slug: slug.clone(),
            fonts: self.surface.fonts().clone(),
            tracker: self.surface.tracker().clone(),
            multiplier: self.config.export_multiplier,
        };

        let batches = tokio::task::spawn_blocking(move || export_batches(&front, &back, &ctx))
            .await
            .map_err(|e| anyhow!("export workers failed: {e}"))?;

        let timeout = self.config.background_timeout();
        let front_snapshot =
            capture_full_side(&mut self.surface, &mut self.sides, Side::Front, &slug, timeout).await;
        let back_snapshot =
            capture_full_side(&mut self.surface, &mut self.sides, Side::Back, &slug, timeout).await;

        Ok(ExportSet {
            batches,
            front_snapshot,
            back_snapshot,
        })
    }

    async fn export_and_submit(&mut self, order_id: &str) -> StudioResult<Vec<ExportedFile>> {
        let set = self.export_all().await?;

        self.state = EditorState::Submitting;
        let payload = OrderConfirmation {
            phone_number: Some(self.confirm.phone_number.clone()).filter(|p| !p.is_empty()),
            size: self.confirm.size.clone(),
            color: self.confirm.color.clone(),
            front_snapshot: set.front_snapshot.clone(),
            back_snapshot: set.back_snapshot.clone(),
            design_files: set.batches.design_files().cloned().collect(),
            text_files: set.batches.text_files().cloned().collect(),
        };
        self.api.confirm_order(order_id, payload).await?;

        Ok(set.into_download_queue())
    }
}

/// Everything one export pass produced.
#[derive(Clone, Debug, Default)]
pub struct ExportSet {
    pub batches: ExportBatches,
    pub front_snapshot: Option<ExportedFile>,
    pub back_snapshot: Option<ExportedFile>,
}

impl ExportSet {
    /// Text files, then design files, then the front and back snapshots.
    pub fn into_download_queue(self) -> Vec<ExportedFile> {
        let ExportBatches {
            front_text,
            front_design,
            back_text,
            back_design,
        } = self.batches;
        front_text
            .into_iter()
            .chain(back_text)
            .chain(front_design)
            .chain(back_design)
            .chain(self.front_snapshot)
            .chain(self.back_snapshot)
            .collect()
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("surface", &self.surface)
            .field("state", &self.state)
            .field("busy", &self.busy)
            .field("order_id", &self.order_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/controller.rs"]
mod tests;
