//! Domain types for the adaptive trend engine

pub mod bar;
pub mod ids;
pub mod signal;

pub use bar::Bar;
pub use ids::{ConfigHash, DatasetHash};
pub use signal::{Signal, SignalKind, Trend};
