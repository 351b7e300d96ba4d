pub mod analysis;
pub mod class_key;
pub mod config;
pub mod convert;
pub mod error;
pub mod geom;
pub mod model;
pub mod report;
pub mod sample;
pub mod split;

pub use error::{PrepError, PrepResult};
