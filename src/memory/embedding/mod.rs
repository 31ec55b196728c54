//! Embedding abstraction for memory vectors.

pub mod embedder;

pub use embedder::{
    EMBEDDING_DIMENSIONS, Embedder, HashEmbedder, cosine_similarity, hash32, l2_normalize,
};
