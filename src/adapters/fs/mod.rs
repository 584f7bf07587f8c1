mod registry;

pub use registry::DirectoryRegistry;
