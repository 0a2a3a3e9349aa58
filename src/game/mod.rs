pub mod high_scores;
pub mod pool;
pub mod progression;
pub mod ranker;
pub mod registry;
pub mod selector;
pub mod session;
pub mod types;
