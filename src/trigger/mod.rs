mod debouncer;
mod input;

pub use debouncer::{TriggerDebouncer, TriggerOutcome};
pub use input::{TriggerEdge, TriggerInput};
