//! Compiled pattern library. Every pattern is compiled once on first use.

use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

/// Gene-symbol shape: upper-case letter then 1-11 upper-case letters or digits.
pub static GENE_TOKEN: LazyLock<Regex> = LazyLock::new(|| compile(r"\b[A-Z][A-Z0-9]{1,11}\b"));

/// Multi-word and short-form gene names that the symbol shape cannot catch.
pub static GENE_SYNONYM: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(factor\s*v\s*leiden|factor\s+v\b|fvl)\b"));

pub static RSID: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\brs\d+\b"));

pub static HGVS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(?:NM_|NC_|NP_|NG_)\d+\.\d+:[cgpnmr]\.\d+[A-Za-z>_\-\d]+"));

/// Short protein/coding change without a reference sequence, e.g. `c.68_69delAG`.
pub static HGVS_SHORT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b[cp]\.(?:\d+[_\d]*[ACGT]?(?:>[ACGT]|del[ACGT]*|dup[ACGT]*|ins[ACGT]+)|[A-Z][a-z]{2}\d+[A-Z][a-z]{2})"));

/// Independent evidence that the text is about genetics.
pub static GENETICS_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\b(genes?|genetic|genotype|variants?|mutations?|rs\d+|rsid|alleles?|pathogenic|benign|vus|uncertain\s+significance|heterozygous|homozygous|hemizygous|carrier|hgvs|dna)\b|\b[eε][234]\s*/\s*[eε][234]\b",
    )
});

// Classification cues, checked in precedence order by the classifier.
pub static PATHOGENIC: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(pathogenic|disease[- ]causing)\b"));
pub static LIKELY_PATHOGENIC: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\blikely[\s-]*pathogenic\b"));
pub static VUS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(vus|variant\s+of\s+uncertain\s+significance|uncertain\s+significance|unknown\s+significance)\b")
});
pub static LIKELY_BENIGN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\blikely[\s-]*benign\b"));
pub static BENIGN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bbenign\b"));
pub static CARRIER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bcarrier\b"));

pub static HOMOZYGOUS: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bhomozygous\b"));
pub static HETEROZYGOUS: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bheterozygous\b"));
pub static HEMIZYGOUS: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bhemizygous\b"));

/// APOE ε4 allele in any of its common spellings (`e4`, `ε4`, `e3/e4`, `APOE4`).
pub static APOE_E4: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\bAPOE[\s-]*4\b|\b[eε]4\b"));

/// "Tested gene(s): X, Y" and close variants; capture group 1 is the list.
pub static PANEL_LIST: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:tested\s+gene(?:\(s\)|s)?|genes?\s+(?:tested|analy[sz]ed|included|on\s+(?:this\s+)?panel))\s*:\s*([^\n;.]+)")
});

/// Conditions frequently named on consumer reports.
pub static CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\b(hereditary\s+breast\s+and\s+ovarian\s+cancer|breast\s+cancer|ovarian\s+cancer|prostate\s+cancer|pancreatic\s+cancer|colorectal\s+cancer|lynch\s+syndrome|cystic\s+fibrosis|hereditary\s+hemochromatosis|hemochromatosis|alzheimer'?s(?:\s+disease)?|thrombophilia|venous\s+thromboembolism|deep\s+vein\s+thrombosis|familial\s+hypercholesterolemia|sickle\s+cell\s+(?:disease|anemia)|spinal\s+muscular\s+atrophy|tay[\s-]sachs(?:\s+disease)?)\b",
    )
});
