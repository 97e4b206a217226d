pub mod config_manager;
pub mod context;
pub mod curve;
pub mod error;
pub mod fixed;
pub mod prediction;
pub mod preview;
pub mod report;
pub mod types;

pub use config_manager::*;
pub use context::*;
pub use curve::*;
pub use error::*;
pub use fixed::to_fixed;
pub use prediction::*;
pub use preview::*;
pub use report::*;
pub use types::*;
