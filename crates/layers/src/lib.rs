//! Map-layer model for the comparison viewer: raster layers, their
//! presentation, and the colour adjustments applied to them.

pub mod css;
pub mod layer;
pub mod raster;
pub mod symbology;

pub use css::*;
pub use layer::*;
pub use raster::*;
pub use symbology::*;
