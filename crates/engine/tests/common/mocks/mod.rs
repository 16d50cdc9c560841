//! Counter-source doubles.


pub use counters::{MockCounters, ScriptedSource};
