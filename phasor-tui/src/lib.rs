//! Terminal UI for Phasor - plot panels, control panel, themes, layout
//!
//! Renders the engine's display lists as braille plots in a CRT-style
//! terminal interface.

mod app;
mod layout;
mod theme;
pub mod widgets;

pub use app::{App, AppState, MessageType};
pub use layout::{Region, ScreenLayout};
pub use theme::{Theme, CRT_AMBER, CRT_GREEN, CYBERPUNK};
pub use widgets::status_bar::HelpWidget;
pub use widgets::{
    item_at, panel_items, BrailleGrid, ControlPanelWidget, ItemKind, PanelHit, PanelItem, PlotWidget,
    StatusBarWidget,
};
