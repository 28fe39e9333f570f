pub mod debounce;
pub mod event_bus;

pub use debounce::*;
pub use event_bus::*;
