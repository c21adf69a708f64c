//! Output formatting shared by all commands.

pub mod json;

pub use json::{error_code, format_error};
