//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                 |
//! |------------|--------------|-----------------------------|
//! | `hardware` | ActuatorPort | H-bridge and servo PWM      |
//! | `log_sink` | EventSink    | `log` facade                |

pub mod hardware;
pub mod log_sink;
