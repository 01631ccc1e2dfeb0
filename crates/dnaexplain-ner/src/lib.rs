//! Rule-based detection of genes, variant classifications, identifiers, and
//! disallowed medical intents in free-text genetic report excerpts.
//!
//! No learning and no external calls: every result is a deterministic function
//! of the input string.

pub mod classification;
pub mod classifier;
pub mod gene_symbols;
pub mod intent;
pub mod patterns;

pub use classification::{Classification, Zygosity};
pub use classifier::{Analysis, TextClassifier};
pub use gene_symbols::{canonical_gene, is_known_symbol, KNOWN_GENE_SYMBOLS};
pub use intent::detect_intents;
