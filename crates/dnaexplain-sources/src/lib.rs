//! dnaexplain-sources: outbound collaborators: ClinVar variant lookup,
//! PubMed literature search, and document-to-text extraction.

pub mod error;
pub mod ncbi;
pub mod clinvar;
pub mod literature;
pub mod extract;

pub use clinvar::{ClinvarClient, ClinvarResponse, ClinvarVariant};
pub use error::SourceError;
pub use extract::{extract_text, ExtractedDocument};
pub use literature::{LiteratureArticle, LiteratureClient, LiteratureResponse};
pub use ncbi::NcbiClient;
