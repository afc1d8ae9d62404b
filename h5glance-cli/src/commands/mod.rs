//! CLI command implementations.
//!
//! - `view`: print a group tree or dataset summary to the terminal
//! - `html`: write an HTML view to a file, or serve it to a browser

pub mod html;
pub mod view;

pub use html::HtmlCommand;
pub use view::{prompt_for_path, ViewCommand};
