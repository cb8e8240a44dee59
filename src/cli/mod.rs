//! Terminal and SVG rendering of the computed series

pub mod plot;
pub mod table;
