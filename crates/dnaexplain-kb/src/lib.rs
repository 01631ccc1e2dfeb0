//! dnaexplain-kb: curated knowledge base and the prebuilt response tier.

pub mod knowledge_base;
pub mod prebuilt;

pub use knowledge_base::{
    init_shared, shared, ClassificationEntry, GeneEntry, GeneResponse, GlossaryTerm, KbError,
    KnowledgeBase,
};
pub use prebuilt::{find_prebuilt_match, synthesize, PrebuiltMatch, SynthesisError};
