//! Interactive similarity graph for movies and series: a force-directed
//! layout of poster cards around a center item, with hover explanations of
//! why items are connected.

pub mod app;
pub mod graph;
pub mod source;
mod util;
