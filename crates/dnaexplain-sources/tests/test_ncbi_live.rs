//! Live NCBI lookups.
//!
//! Run with: cargo test --package dnaexplain-sources --test test_ncbi_live -- --ignored --nocapture

use std::sync::Arc;
use std::time::Duration;

use dnaexplain_common::cache::TtlCache;
use dnaexplain_common::rate_limit::InMemoryRateLimiter;
use dnaexplain_common::sandbox::SandboxClient;
use dnaexplain_common::schema::LiteratureRequest;
use dnaexplain_sources::clinvar::ClinicalSignificance;
use dnaexplain_sources::{ClinvarClient, ClinvarResponse, LiteratureClient, LiteratureResponse, NcbiClient};

fn ncbi() -> Arc<NcbiClient> {
    Arc::new(NcbiClient::new(
        SandboxClient::new().unwrap(),
        None,
        Arc::new(InMemoryRateLimiter::new()),
    ))
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_clinvar_rsid_lookup() {
    let client = ClinvarClient::new(ncbi(), Arc::new(TtlCache::<ClinvarResponse>::new(Duration::from_secs(300))), "disclaimer");

    let response = client.lookup("rs80357906").await;

    println!("{}", serde_json::to_string_pretty(&response).unwrap());
    assert!(response.found, "rs80357906 should be in ClinVar");
    let variant = response.variant.unwrap();
    assert_eq!(variant.gene_symbol.as_deref(), Some("BRCA1"));
    assert_eq!(variant.clinical_significance, ClinicalSignificance::Pathogenic);
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_clinvar_unknown_query_is_not_found() {
    let client = ClinvarClient::new(ncbi(), Arc::new(TtlCache::<ClinvarResponse>::new(Duration::from_secs(300))), "disclaimer");
    let response = client.lookup("rs999999999999").await;
    assert!(!response.found);
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_literature_search_brca1() {
    let client = LiteratureClient::new(ncbi(), Arc::new(TtlCache::<LiteratureResponse>::new(Duration::from_secs(3600))));
    let req = LiteratureRequest {
        genes: vec!["BRCA1".into()],
        topics: Some(vec!["breast cancer".into()]),
        max_results: Some(3),
    };

    let response = client.search(&req).await.expect("PubMed search failed");

    for article in &response.articles {
        println!("{} ({:?}) {}", article.title, article.year, article.url);
    }
    assert!(!response.articles.is_empty(), "Should find at least one article");
    assert!(response.articles.len() <= 3);
}
