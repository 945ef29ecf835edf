//! Boundary traits the consensus core depends on.

pub mod outbound;
