pub mod fs;
pub mod process;
pub mod store;

pub use fs::DirectoryRegistry;
pub use process::ProcessRunner;
pub use store::MemoryStore;
