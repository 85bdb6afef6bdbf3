mod loader;

pub use loader::{supported_extension, DataLoader};
