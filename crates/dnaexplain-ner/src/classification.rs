//! Variant classification and zygosity cues.

use serde::{Deserialize, Serialize};

use crate::patterns;

/// Clinical significance label found in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Pathogenic,
    LikelyPathogenic,
    Vus,
    LikelyBenign,
    Benign,
    Carrier,
}

impl Classification {
    /// Key into a gene's template set. Likely-pathogenic shares the pathogenic
    /// template and likely-benign shares the benign one.
    pub fn template_key(&self) -> &'static str {
        match self {
            Classification::Pathogenic | Classification::LikelyPathogenic => "pathogenic",
            Classification::Vus => "vus",
            Classification::LikelyBenign | Classification::Benign => "benign",
            Classification::Carrier => "carrier",
        }
    }

    /// Key into the gene-independent classification templates.
    pub fn generic_key(&self) -> &'static str {
        match self {
            Classification::Vus => "VUS",
            other => other.template_key(),
        }
    }

    /// Wording as it would appear on a report.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Pathogenic       => "Pathogenic",
            Classification::LikelyPathogenic => "Likely pathogenic",
            Classification::Vus              => "Variant of uncertain significance (VUS)",
            Classification::LikelyBenign     => "Likely benign",
            Classification::Benign           => "Benign",
            Classification::Carrier          => "Carrier",
        }
    }
}

/// First-match-wins detection in fixed precedence order.
///
/// An exact "pathogenic" cue is suppressed when "likely pathogenic" is present,
/// so a likely-pathogenic report never double-counts as pathogenic.
pub fn detect_classification(text: &str) -> Option<Classification> {
    let likely_pathogenic = patterns::LIKELY_PATHOGENIC.is_match(text);
    if patterns::PATHOGENIC.is_match(text) && !likely_pathogenic {
        return Some(Classification::Pathogenic);
    }
    if likely_pathogenic {
        return Some(Classification::LikelyPathogenic);
    }
    if patterns::VUS.is_match(text) {
        return Some(Classification::Vus);
    }
    if patterns::LIKELY_BENIGN.is_match(text) {
        return Some(Classification::LikelyBenign);
    }
    if patterns::BENIGN.is_match(text) {
        return Some(Classification::Benign);
    }
    if patterns::CARRIER.is_match(text) {
        return Some(Classification::Carrier);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    Homozygous,
    Heterozygous,
    Hemizygous,
}

impl Zygosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zygosity::Homozygous   => "homozygous",
            Zygosity::Heterozygous => "heterozygous",
            Zygosity::Hemizygous   => "hemizygous",
        }
    }
}

/// Homozygous wins over heterozygous when both appear.
pub fn detect_zygosity(text: &str) -> Option<Zygosity> {
    if patterns::HOMOZYGOUS.is_match(text) {
        Some(Zygosity::Homozygous)
    } else if patterns::HETEROZYGOUS.is_match(text) {
        Some(Zygosity::Heterozygous)
    } else if patterns::HEMIZYGOUS.is_match(text) {
        Some(Zygosity::Hemizygous)
    } else {
        None
    }
}
