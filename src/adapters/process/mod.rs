mod runner;

pub use runner::ProcessRunner;
