use catalog::CatalogError;

use crate::slots::Slot;
use crate::surface::SurfaceError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompareError {
    #[error("scene {id:?} cannot be shown: {reason}")]
    InvalidScene { id: String, reason: String },
    #[error("failed to load the {slot} layer: {reason}")]
    LayerLoad { slot: Slot, reason: String },
    #[error("the {0} slot is empty")]
    EmptySlot(Slot),
    #[error("GeoTIFF scenes can only be shown on the empty base layer")]
    TiffRequiresEmptyBase,
    #[error("unknown base layer {0:?}")]
    UnknownBaseLayer(String),
    #[error("unknown display mode {0:?}")]
    UnknownMode(String),
    #[error("invalid colour {0:?}, expected #RRGGBB")]
    InvalidColor(String),
    #[error("the empty base layer is not active")]
    EmptyBaseInactive,
    #[error("unknown render preset {0:?}")]
    UnknownPreset(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("invalid viewer config: {0}")]
    Config(String),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
