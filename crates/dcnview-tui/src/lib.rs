//! dcnview-tui - Terminal UI for dcnview
//!
//! Ratatui front end over the dcnview Engine: terminal lifecycle, key
//! polling, and the service tree and execution dialog widgets.

pub mod event;
pub mod layout;
pub mod render;
pub mod runner;
pub mod terminal;
pub mod theme;
pub mod widgets;

pub use runner::run;
