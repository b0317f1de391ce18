pub mod alphabeta;
pub mod cancel;
pub mod coordinator;
pub mod eval;
pub mod tt;
pub mod worker;

pub use cancel::CancellationToken;
pub use coordinator::{select_best, SearchCoordinator, SearchOutcome};
pub use worker::{SearchWorker, WorkerResult};
