//! Block materials and the wooden-log allow-list.
#![forbid(unsafe_code)]

pub mod logs;
pub mod material;

pub use logs::{WOODEN_LOGS, is_wooden_log};
pub use material::{Material, Species, UnknownMaterial};
