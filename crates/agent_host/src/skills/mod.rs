//! Capabilities agents can call during a run.

pub mod research;
