use foundation::bounds::Aabb2;
use foundation::handles::Handle;
use layers::css::ClipInset;
use layers::raster::RasterLayer;

/// The rendered output element of one attached layer (a canvas on the web).
///
/// Issued by the surface on attach; stale once the layer is detached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub Handle);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("layer could not be loaded: {0}")]
    LoadFailed(String),
    #[error("surface does not support {0}")]
    Unsupported(&'static str),
    #[error("no rendered element for {0:?}")]
    MissingElement(ElementHandle),
}

/// The map the comparison is drawn on: camera, base layers and an ordered
/// stack of overlay layers.
///
/// Overlay positions count from the bottom of the overlay stack and do not
/// include base layers. All coordinates are Web Mercator metres.
pub trait BaseSurface {
    /// Inserts `layer` at `position`, or on top when `None`.
    ///
    /// Returning `Ok` means the layer was accepted; loading may still fail
    /// later and is reported back through the view.
    fn attach_layer(
        &mut self,
        layer: &RasterLayer,
        position: Option<usize>,
    ) -> Result<ElementHandle, SurfaceError>;

    /// Removes the layer and returns the stack position it held.
    fn detach_layer(&mut self, element: ElementHandle) -> Result<usize, SurfaceError>;

    fn layer_position(&self, element: ElementHandle) -> Option<usize>;

    fn set_visible(&mut self, element: ElementHandle, visible: bool) -> Result<(), SurfaceError>;
    fn set_opacity(&mut self, element: ElementHandle, opacity: f64) -> Result<(), SurfaceError>;
    /// `None` removes any clip.
    fn set_clip(&mut self, element: ElementHandle, clip: Option<ClipInset>)
    -> Result<(), SurfaceError>;
    /// CSS `filter` value; `None` removes it.
    fn set_filter(&mut self, element: ElementHandle, filter: Option<&str>)
    -> Result<(), SurfaceError>;

    fn fit_extent(&mut self, extent: Aabb2, padding_px: f64);

    fn active_base_layer(&self) -> Option<String>;
    /// Makes `id` the only visible base layer.
    fn show_base_layer(&mut self, id: &str) -> Result<(), SurfaceError>;
    fn set_boundary_visible(&mut self, visible: bool);
    /// Rebuilds the empty base layer with `color` in the same stack slot.
    fn set_background_color(&mut self, color: &str) -> Result<(), SurfaceError>;

    fn zoom(&self) -> f64;
    fn set_zoom(&mut self, zoom: f64);
    fn set_view(&mut self, center: [f64; 2], zoom: f64);

    fn set_loading(&mut self, loading: bool);
}

/// Logs and drops a failed surface call.
///
/// A surface that is missing an element or a capability must not take the
/// page down; the operation is skipped.
pub(crate) fn skip_on_error(result: Result<(), SurfaceError>, what: &str) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "{what} skipped");
    }
}
