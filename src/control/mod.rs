//! Closed-loop controllers: per-wheel speed regulation and steering.

pub mod pid;
pub mod speed;
