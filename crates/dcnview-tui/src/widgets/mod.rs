//! Custom widget components

mod execution_dialog;
mod header;
pub mod modal_overlay;
mod service_tree;
mod status_bar;

pub use execution_dialog::ExecutionDialog;
pub use header::MainHeader;
pub use service_tree::{scroll_offset, ServiceTree};
pub use status_bar::StatusBar;
