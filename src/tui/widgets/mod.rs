//! Reusable widgets

pub mod shortcuts;
pub mod table;
