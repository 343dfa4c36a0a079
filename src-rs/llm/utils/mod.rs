pub mod html_extract;
pub mod image_loader;
pub mod network;
pub mod path_policy;
pub mod serde_util;
pub mod string_util;
