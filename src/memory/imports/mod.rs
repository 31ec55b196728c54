//! Import resolution for composite documents.

pub mod paths;
pub mod resolver;

pub use paths::{has_allowed_extension, normalize_path};
pub use resolver::{
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_DEPTH, ImportOptions, ImportResolver,
    ImportedContent, compose,
};
