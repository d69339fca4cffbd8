//! Core processing building blocks: the per-band percentile stretch, RGB
//! composite assembly, and the three-band pipeline tying them together.
//! These are pure in-memory transforms consumed by the high-level `api` module.
pub mod params;
pub mod processing;
