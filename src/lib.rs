//! # fusion-rs
//!
//! Multi-camera object identity fusion: associates detections of the same
//! real-world object seen by different cameras of one site into a single
//! persistent "common" identity, step by step, and evaluates simple danger
//! heuristics over the fused identities.
pub mod fusion;
