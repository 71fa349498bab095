#[cfg(feature = "parallel")]
pub mod parallel;
pub mod tally;
pub mod trials;
