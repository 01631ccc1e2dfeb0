//! Gene symbol vocabulary: recognised symbols, synonyms, and the stoplist of
//! upper-case tokens that look like symbols but are not.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Symbols commonly reported on consumer and clinical genetic tests.
/// Used to decide whether a gene-shaped token is "recognised" when it has no
/// knowledge-base entry of its own (panel detection).
pub const KNOWN_GENE_SYMBOLS: &[&str] = &[
    // Hereditary cancer
    "BRCA1", "BRCA2", "PALB2", "TP53", "PTEN", "CDH1", "STK11", "ATM", "CHEK2",
    "BARD1", "BRIP1", "RAD51C", "RAD51D", "NBN", "MLH1", "MSH2", "MSH6", "PMS2",
    "EPCAM", "APC", "MUTYH", "CDKN2A", "CDK4", "BAP1", "SMAD4", "BMPR1A", "POLE",
    "POLD1", "VHL", "RET", "MEN1", "NF1", "NF2", "RB1", "SDHB", "SDHD",
    // Cardiovascular / metabolic
    "LDLR", "APOB", "PCSK9", "MYH7", "MYBPC3", "TTN", "LMNA", "SCN5A", "KCNQ1",
    "KCNH2", "APOE", "MTHFR", "F5", "F2", "HFE", "SERPINA1",
    // Carrier screening
    "CFTR", "SMN1", "HBB", "HEXA", "GBA", "FMR1", "DMD", "GJB2", "PAH",
    // Pharmacogenomics
    "CYP2C19", "CYP2C9", "CYP2D6", "CYP3A5", "VKORC1", "SLCO1B1", "DPYD", "TPMT",
    "NUDT15", "UGT1A1", "HLA",
];

/// Upper-case words that match the symbol shape but are report vocabulary.
const STOPLIST: &[&str] = &[
    "THE", "AND", "FOR", "NOT", "BUT", "WITH", "FROM", "THIS", "THAT", "YOUR",
    "VUS", "DNA", "RNA", "SNP", "SNV", "CNV", "INDEL", "HGVS", "ACMG", "AMP",
    "CLIA", "CAP", "NGS", "WGS", "WES", "PCR", "OMIM", "NCBI", "NIH", "USA",
    "PDF", "ID", "MRN", "DOB", "MD", "PHD", "MS", "CGC", "LAB", "NOTE", "NA",
    "GENE", "GENES", "VARIANT", "VARIANTS", "MUTATION", "RESULT", "RESULTS",
    "POSITIVE", "NEGATIVE", "DETECTED", "TEST", "TESTED", "TESTING", "REPORT",
    "PATIENT", "SAMPLE", "SUMMARY", "INTERPRETATION", "PATHOGENIC", "LIKELY",
    "BENIGN", "UNCERTAIN", "SIGNIFICANCE", "CARRIER", "HET", "HOM", "HETEROZYGOUS",
    "HOMOZYGOUS", "ALLELE", "GENOTYPE", "CLINVAR", "DBSNP", "GRCH37", "GRCH38",
    "HG19", "HG38", "CHR", "EXON", "INTRON", "OK", "NO", "YES", "IF", "OR", "IN",
    "OF", "TO", "IS", "IT", "AT", "ON", "BY", "AN", "AS", "BE", "WE", "MY", "US",
    // Report headers and demographics
    "GENETIC", "GENETICS", "NAME", "DATE", "BIRTH", "SEX", "MALE", "FEMALE", "AGE",
    "ORDERING", "PHYSICIAN", "PROVIDER", "LABORATORY", "SPECIMEN", "COLLECTED",
    "RECEIVED", "REPORTED", "ACCESSION", "METHOD", "METHODS", "METHODOLOGY",
    "LIMITATIONS", "FINDINGS", "CLINICAL", "INFORMATION", "PAGE", "FINAL", "FAMILY",
    "HISTORY", "DIAGNOSTIC", "FACTOR", "LEIDEN",
];

/// Multi-word and alternate names mapped to the knowledge-base key.
fn synonym_map() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert("FACTOR V LEIDEN", "Factor V Leiden");
        m.insert("FACTOR V", "Factor V Leiden");
        m.insert("FVL", "Factor V Leiden");
        m.insert("F5", "Factor V Leiden");
        m.insert("APOE4", "APOE");
        m.insert("ALPHA-1 ANTITRYPSIN", "SERPINA1");
        m
    })
}

fn stoplist() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPLIST.iter().copied().collect())
}

fn known_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| KNOWN_GENE_SYMBOLS.iter().copied().collect())
}

pub fn is_stopword(token: &str) -> bool {
    stoplist().contains(token)
}

/// True for symbols on the built-in recognised list.
pub fn is_known_symbol(symbol: &str) -> bool {
    known_set().contains(symbol.to_ascii_uppercase().as_str())
        || synonym_map().contains_key(symbol.to_ascii_uppercase().as_str())
}

/// Canonical name for a candidate token: synonyms resolve to their
/// knowledge-base key, everything else is upper-cased.
pub fn canonical_gene(token: &str) -> String {
    let upper = collapse_whitespace(token).to_ascii_uppercase();
    match synonym_map().get(upper.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => upper,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
