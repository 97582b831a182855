pub mod best_third;
pub mod bracket;
pub mod config;
pub mod error;
pub mod knockout;
pub mod model;
pub mod seeding;
pub mod snapshot;
pub mod standings;
pub mod tiebreak;

pub use error::{EngineError, EngineResult, KnockoutRule};
pub use snapshot::{resolve, resolve_many};
