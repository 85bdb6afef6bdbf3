mod chunker;

pub use chunker::DocumentChunker;
