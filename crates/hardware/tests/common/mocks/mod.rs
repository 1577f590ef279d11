


/// Event queue and scheduler doubles.
pub mod scheduler;
