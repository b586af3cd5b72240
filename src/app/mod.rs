pub mod keyboard_input;

mod controller;
mod runtime;
mod startup;
mod types;


pub use controller::{Hardware, ShuttercamApp};
pub use types::{ShutdownHandle, ShutdownReason, TickReport};
