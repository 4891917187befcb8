#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::LayoutConfig;
pub use error::Error;
pub use ir::{Edge, Graph};
pub use layout::{
    LayoutResult, LayoutStrategy, compute_layout, compute_layout_with, fit_spline_through_boxes,
    route_around_obstacles,
};
