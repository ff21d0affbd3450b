//! Domain types shared by the engine, the pipeline and the persistence layer.

pub mod calculation;

pub use calculation::*;
