mod aggregate;
mod scan;
mod store;

pub use store::{MemoryScanner, MemoryStore};
