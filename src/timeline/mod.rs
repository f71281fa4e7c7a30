//! Resolution of a document into a time- and layer-resolved clip list.

pub mod clip;
pub mod compiler;
pub mod probe;
