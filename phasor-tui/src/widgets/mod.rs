//! UI Widgets for Phasor

pub mod control_panel;
mod plot;
pub mod status_bar;

pub use control_panel::{item_at, panel_items, ControlPanelWidget, ItemKind, PanelHit, PanelItem};
pub use plot::{BrailleGrid, PlotWidget};
pub use status_bar::StatusBarWidget;
