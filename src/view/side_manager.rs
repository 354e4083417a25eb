use crate::foundation::core::{Side, SidePair};
use crate::layer::model::LayerKey;
use crate::surface::Surface;

/// Off-surface layer keys per side.
///
/// The active side's layers live on the surface; the inactive side's layers wait here, in
/// z-order, until the next switch. A key is never attached and cached for the inactive side
/// at once.
#[derive(Clone, Debug, Default)]
pub struct SideManager {
    cache: SidePair<Vec<LayerKey>>,
}

impl SideManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the surface to `target`.
    ///
    /// The current side's layers are detached into its cache, the target's background is
    /// requested without waiting for it, and the target's cached layers are attached in their
    /// original order. Switching to the active side does nothing.
    pub fn switch_side(&mut self, surface: &mut Surface, target: Side) -> bool {
        let current = surface.active_side();
        if target == current {
            return false;
        }

        let detached = surface.detach_all();
        tracing::debug!(from = %current, to = %target, moved = detached.len(), "switching side");
        *self.cache.get_mut(current) = detached;

        surface.set_active_side(target);
        surface.request_background();

        let incoming = std::mem::take(self.cache.get_mut(target));
        surface.attach(incoming);
        surface.request_render();
        true
    }

    /// Snapshot the active side's attached keys into its cache without detaching.
    ///
    /// The snapshot is informational; the next switch overwrites it with the detached keys.
    pub fn sync(&mut self, surface: &Surface) {
        *self.cache.get_mut(surface.active_side()) = surface.objects().to_vec();
    }

    /// Layers of `side` in z-order: live order for the active side, the cache otherwise.
    pub fn layers_for(&self, surface: &Surface, side: Side) -> Vec<LayerKey> {
        if side == surface.active_side() {
            surface.objects().to_vec()
        } else {
            self.cache.get(side).clone()
        }
    }

    pub fn cached(&self, side: Side) -> &[LayerKey] {
        self.cache.get(side)
    }

    /// Every layer key, attached first, then the inactive side's cache.
    pub fn all_keys(&self, surface: &Surface) -> Vec<LayerKey> {
        let inactive = surface.active_side().other();
        let mut keys = surface.objects().to_vec();
        keys.extend_from_slice(self.cache.get(inactive));
        keys
    }

    /// Drop cached keys whose layers no longer exist.
    pub(crate) fn prune(&mut self, surface: &Surface) {
        for side in Side::ALL {
            self.cache.get_mut(side).retain(|k| surface.is_live(*k));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/side_manager.rs"]
mod tests;
