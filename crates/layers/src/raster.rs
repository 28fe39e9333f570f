use foundation::bounds::{Aabb2, GeoExtent};
use foundation::math::extent_to_web_mercator;

use crate::layer::{Layer, LayerId};
use crate::symbology::{LayerStyle, TileStyle};

/// Rendering backend a raster scene is routed to, chosen from its file
/// extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RasterKind {
    /// Single image stretched over its extent, graded with CSS filters.
    StaticImage,
    /// GeoTIFF read through the tiled backend, graded with a [`TileStyle`].
    Tiled,
}

impl RasterKind {
    /// `extension` includes the leading dot and is compared case-insensitively.
    pub fn for_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            ".tif" | ".tiff" => RasterKind::Tiled,
            _ => RasterKind::StaticImage,
        }
    }

    pub fn is_tiled(self) -> bool {
        matches!(self, RasterKind::Tiled)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    id: LayerId,
    pub kind: RasterKind,
    pub title: String,
    pub url: String,
    pub extent: GeoExtent,
    /// `extent` in Web Mercator metres.
    pub projected: Aabb2,
    pub style: LayerStyle,
    /// Set for tiled layers only.
    pub tile_style: Option<TileStyle>,
}

impl RasterLayer {
    pub fn new(
        id: LayerId,
        kind: RasterKind,
        title: impl Into<String>,
        url: impl Into<String>,
        extent: GeoExtent,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            url: url.into(),
            extent,
            projected: extent_to_web_mercator(&extent),
            style: LayerStyle::default(),
            tile_style: kind.is_tiled().then(TileStyle::default),
        }
    }

    /// Same source under a new id with a different tiled style. Only the
    /// layer's own `style` is copied; opacity and clipping set on the
    /// surface since attach belong to the old element.
    pub fn rebuilt(&self, id: LayerId, tile_style: TileStyle) -> Self {
        Self {
            id,
            tile_style: Some(tile_style),
            ..self.clone()
        }
    }
}

impl Layer for RasterLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use foundation::bounds::GeoExtent;

    use super::{RasterKind, RasterLayer};
    use crate::layer::{Layer, LayerId};
    use crate::symbology::{FilterParams, TileStyle};

    const EXTENT: GeoExtent = GeoExtent::new(130.4, 42.3, 139.0, 48.5);

    #[test]
    fn kind_follows_extension() {
        assert_eq!(RasterKind::for_extension(".tif"), RasterKind::Tiled);
        assert_eq!(RasterKind::for_extension(".TIFF"), RasterKind::Tiled);
        assert_eq!(RasterKind::for_extension(".jpg"), RasterKind::StaticImage);
        assert_eq!(RasterKind::for_extension(".jp2"), RasterKind::StaticImage);
    }

    #[test]
    fn static_layers_have_no_tile_style() {
        let l = RasterLayer::new(LayerId(1), RasterKind::StaticImage, "a", "a.jpg", EXTENT);
        assert!(l.tile_style.is_none());
        assert!(l.projected.width() > 0.0);

        let t = RasterLayer::new(LayerId(2), RasterKind::Tiled, "b", "b.tif", EXTENT);
        assert_eq!(t.tile_style, Some(TileStyle::default()));
    }

    #[test]
    fn rebuild_keeps_presentation_and_swaps_identity() {
        let mut l = RasterLayer::new(LayerId(3), RasterKind::Tiled, "b", "b.tif", EXTENT);
        l.style.opacity = 0.4;
        l.style.visible = false;
        let style = TileStyle::from_params(&FilterParams::new(0.2, 1.0, -1.0));
        let r = l.rebuilt(LayerId(9), style);
        assert_eq!(r.id(), LayerId(9));
        assert_eq!(r.style, l.style);
        assert_eq!(r.url, l.url);
        assert_eq!(r.tile_style, Some(style));
    }
}
