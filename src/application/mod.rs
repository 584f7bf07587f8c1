pub mod actions;
pub mod refresh;
pub mod scheduler;
pub mod validator;

pub use actions::ActionService;
pub use refresh::{RefreshOutcome, RefreshService};
pub use scheduler::Scheduler;
