//! Actuator drivers on top of `embedded-hal` PWM channels.
//!
//! Timer and pin setup stay with the board support code; these drivers
//! only translate motor power and servo angles into duty cycles.

pub mod motor;
pub mod servo;
