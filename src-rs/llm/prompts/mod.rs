pub mod ui_edit;

pub use ui_edit::compose_prompt;
