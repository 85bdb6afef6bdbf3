mod store;

pub use store::{ChunkPoint, IndexStats, VectorIndex};
