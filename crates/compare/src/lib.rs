//! Two-slot scene comparison over a map surface.
//!
//! [`ComparisonView`] is the context object: it owns the slot manager, the
//! grading unit and the mode controller, and drives an injected
//! [`BaseSurface`].

pub mod config;
pub mod error;
pub mod grading;
pub mod mode;
pub mod slots;
pub mod surface;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use config::*;
pub use error::*;
pub use grading::*;
pub use mode::*;
pub use slots::*;
pub use surface::*;
pub use view::*;
