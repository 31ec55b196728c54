//! Text analysis for indexing: keywords, entities, and sentence splitting.

pub mod entity_extractor;
pub mod keywords;
pub mod text;

pub use entity_extractor::{EntityExtractor, EntityType, ExtractedEntity};
pub use keywords::{KeywordExtractor, STOP_WORDS, stem};
pub use text::{split_sentences, words};
