pub mod generate;
pub mod generate_util;

pub use generate::*;
