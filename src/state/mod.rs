//! Shared crawl state
//!
//! The frontier is the only crawl state mutated by more than one task. It is
//! owned by the harvester context and shared by reference with every task;
//! there are no process-wide singletons.

mod frontier;

pub use frontier::Frontier;
