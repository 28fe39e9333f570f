//! Recording fake of [`BaseSurface`] for controller tests.

use catalog::{Scene, parse_date};
use foundation::bounds::Aabb2;
use foundation::handles::HandlePool;
use layers::css::ClipInset;
use layers::layer::{Layer, LayerId};
use layers::raster::RasterLayer;
use layers::symbology::TileStyle;

use crate::surface::{BaseSurface, ElementHandle, SurfaceError};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedElement {
    pub handle: ElementHandle,
    pub layer: LayerId,
    pub url: String,
    pub visible: bool,
    pub opacity: f64,
    pub clip: Option<ClipInset>,
    pub filter: Option<String>,
    pub tile_style: Option<TileStyle>,
}

#[derive(Debug)]
pub struct RecordingSurface {
    pool: HandlePool,
    /// Overlay stack, bottom first.
    pub stack: Vec<RecordedElement>,
    pub base_layers: Vec<String>,
    pub active_base: Option<String>,
    pub boundary_visible: bool,
    pub background_color: Option<String>,
    pub zoom: f64,
    pub center: [f64; 2],
    pub fits: Vec<(Aabb2, f64)>,
    pub loading: bool,
    /// Attaching any of these urls fails.
    pub fail_urls: Vec<String>,
    /// Attaching a tiled layer whose style differs from the default fails.
    pub fail_styled_tiles: bool,
    pub log: Vec<String>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            pool: HandlePool::new(),
            stack: Vec::new(),
            base_layers: vec!["osm".into(), "satellite".into(), "empty".into()],
            active_base: Some("satellite".into()),
            boundary_visible: true,
            background_color: None,
            zoom: 7.0,
            center: [0.0, 0.0],
            fits: Vec::new(),
            loading: false,
            fail_urls: Vec::new(),
            fail_styled_tiles: false,
            log: Vec::new(),
        }
    }

    pub fn urls(&self) -> Vec<&str> {
        self.stack.iter().map(|e| e.url.as_str()).collect()
    }

    pub fn element(&self, handle: ElementHandle) -> Option<&RecordedElement> {
        self.stack.iter().find(|e| e.handle == handle)
    }

    pub fn position_of(&self, handle: ElementHandle) -> Option<usize> {
        self.stack.iter().position(|e| e.handle == handle)
    }

    fn element_mut(&mut self, handle: ElementHandle) -> Result<&mut RecordedElement, SurfaceError> {
        self.stack
            .iter_mut()
            .find(|e| e.handle == handle)
            .ok_or(SurfaceError::MissingElement(handle))
    }
}

impl BaseSurface for RecordingSurface {
    fn attach_layer(
        &mut self,
        layer: &RasterLayer,
        position: Option<usize>,
    ) -> Result<ElementHandle, SurfaceError> {
        if self.fail_urls.contains(&layer.url) {
            return Err(SurfaceError::LoadFailed(format!("{} unreachable", layer.url)));
        }
        if self.fail_styled_tiles
            && layer.tile_style.is_some_and(|s| s != TileStyle::default())
        {
            return Err(SurfaceError::Unsupported("styled tiles"));
        }
        let handle = ElementHandle(self.pool.allocate());
        let element = RecordedElement {
            handle,
            layer: layer.id(),
            url: layer.url.clone(),
            visible: layer.style.visible,
            opacity: layer.style.opacity,
            clip: None,
            filter: None,
            tile_style: layer.tile_style,
        };
        let at = position.unwrap_or(self.stack.len()).min(self.stack.len());
        self.stack.insert(at, element);
        self.log.push(format!("attach {}", layer.url));
        Ok(handle)
    }

    fn detach_layer(&mut self, element: ElementHandle) -> Result<usize, SurfaceError> {
        let at = self
            .position_of(element)
            .ok_or(SurfaceError::MissingElement(element))?;
        let removed = self.stack.remove(at);
        self.pool.release(element.0);
        self.log.push(format!("detach {}", removed.url));
        Ok(at)
    }

    fn layer_position(&self, element: ElementHandle) -> Option<usize> {
        self.position_of(element)
    }

    fn set_visible(&mut self, element: ElementHandle, visible: bool) -> Result<(), SurfaceError> {
        self.element_mut(element)?.visible = visible;
        Ok(())
    }

    fn set_opacity(&mut self, element: ElementHandle, opacity: f64) -> Result<(), SurfaceError> {
        self.element_mut(element)?.opacity = opacity;
        Ok(())
    }

    fn set_clip(
        &mut self,
        element: ElementHandle,
        clip: Option<ClipInset>,
    ) -> Result<(), SurfaceError> {
        self.element_mut(element)?.clip = clip;
        Ok(())
    }

    fn set_filter(
        &mut self,
        element: ElementHandle,
        filter: Option<&str>,
    ) -> Result<(), SurfaceError> {
        self.element_mut(element)?.filter = filter.map(str::to_string);
        Ok(())
    }

    fn fit_extent(&mut self, extent: Aabb2, padding_px: f64) {
        self.fits.push((extent, padding_px));
    }

    fn active_base_layer(&self) -> Option<String> {
        self.active_base.clone()
    }

    fn show_base_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        if !self.base_layers.iter().any(|b| b == id) {
            return Err(SurfaceError::Unsupported("base layer"));
        }
        self.active_base = Some(id.to_string());
        self.log.push(format!("base {id}"));
        Ok(())
    }

    fn set_boundary_visible(&mut self, visible: bool) {
        self.boundary_visible = visible;
    }

    fn set_background_color(&mut self, color: &str) -> Result<(), SurfaceError> {
        self.background_color = Some(color.to_string());
        Ok(())
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    fn set_view(&mut self, center: [f64; 2], zoom: f64) {
        self.center = center;
        self.zoom = zoom;
        self.log.push("view reset".to_string());
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

/// A valid JPEG scene with url `data/<id>.jpg`.
pub fn scene(id: &str) -> Scene {
    Scene {
        id: id.to_string(),
        name: format!("Scene {id}"),
        date: parse_date("2023-07-01").unwrap(),
        url: format!("data/{id}.jpg"),
        thumbnail: None,
        cloud_coverage_percent: 10,
        extent: [132.0, 43.0, 132.5, 43.5],
        sensor: "Landsat 8".to_string(),
    }
}

/// Same as [`scene`] but routed to the tiled backend.
pub fn tiff_scene(id: &str) -> Scene {
    Scene {
        url: format!("data/{id}.tif"),
        ..scene(id)
    }
}
