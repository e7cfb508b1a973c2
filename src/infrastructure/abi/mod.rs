//! ABI infrastructure - artifact discovery and parsing

mod loader;

pub use loader::ArtifactLoader;
