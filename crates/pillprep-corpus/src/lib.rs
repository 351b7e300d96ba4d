pub mod analyze;
pub mod annotation;
pub mod error;
pub mod fsutil;
pub mod layout;
pub mod preprocess;
pub mod scan;
pub mod split;
pub mod subset;
pub mod validate;
pub mod yolo;

pub use error::{StageError, StageResult};
