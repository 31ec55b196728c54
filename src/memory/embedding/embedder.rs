//! Fixed-dimension vector abstraction and the default hash embedder.

/// Reference vector dimensionality.
pub const EMBEDDING_DIMENSIONS: usize = 384;

/// Trait abstraction over embedding models.
///
/// Implementations must always return vectors of exactly [`Embedder::dimensions`]
/// elements; the index rejects snapshots whose vectors disagree.
pub trait Embedder: Send + Sync {
    /// Embed a text whose normalized keywords are already extracted.
    fn embed(&self, text: &str, keywords: &[String]) -> Vec<f32>;
    /// Return embedding dimensionality.
    fn dimensions(&self) -> usize;
}

/// Deterministic pseudo-embedding.
///
/// Each keyword at position `i` adds `1 / (i + 1)` to the coordinate chosen by
/// its 32-bit string hash, then the vector is L2-normalized. Text without
/// keywords maps to the zero vector.
#[derive(Clone, Copy, Debug)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create a hash embedder with the given dimensionality (clamped to at least 1).
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSIONS)
    }
}

impl Embedder for HashEmbedder {
    #[allow(clippy::cast_precision_loss)]
    fn embed(&self, _text: &str, keywords: &[String]) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for (position, keyword) in keywords.iter().enumerate() {
            let bucket = hash32(keyword).unsigned_abs() as usize % self.dimensions;
            vector[bucket] += 1.0 / (position as f32 + 1.0);
        }
        l2_normalize(&mut vector);
        vector
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Java-style 32-bit string hash (`h = h * 31 + unit`) over UTF-16 code units.
#[must_use]
pub fn hash32(text: &str) -> i32 {
    text.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Scale a vector to unit length in place; zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Cosine similarity; zero when either vector is zero or lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot = x.mul_add(y, dot);
        norm_a = x.mul_add(x, norm_a);
        norm_b = y.mul_add(y, norm_b);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
