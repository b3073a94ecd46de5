pub mod charts;
pub mod dashboard;
pub mod heatmap;
pub mod panels;
pub mod tables;
