//! Export contents of `fusion` folder
mod actor;
mod camera;
mod dangers;
mod detection;
mod engine;
mod fusion_errors;
mod group;
mod matching;

pub use self::{
    actor::*,
    camera::*,
    dangers::*,
    detection::*,
    engine::*,
    fusion_errors::*,
    group::*,
};
