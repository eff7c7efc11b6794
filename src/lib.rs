pub mod chunker;
pub mod config;
pub mod embedder;
pub mod fetcher;
pub mod index;
pub mod pipeline;
pub mod preprocess;

// Public API exports
pub use chunker::{Chunk, Chunker, Document};
pub use config::IndexerConfig;
pub use embedder::EmbeddingService;
pub use index::VectorIndex;
pub use pipeline::Pipeline;
pub use preprocess::Preprocessor;
