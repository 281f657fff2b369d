//! HTTP API: REST collections for circles, rectangles and drawings.

pub mod app;
