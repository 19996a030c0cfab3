pub mod controls;
pub mod popup;
pub mod table;

#[cfg(feature = "egui")]
pub mod widget;

pub use controls::{LayerControl, ScaleBar, ScaleControl, ScaleLine};
pub use popup::{PopupContent, PopupRow};
pub use table::{feature_table, Column, DataTable, Sort, SortKey};

#[cfg(feature = "egui")]
pub use widget::MapPanel;
