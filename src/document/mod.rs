//! The timeline document as authored: serde model plus structural validation.

pub mod model;
