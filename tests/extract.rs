//! Integration tests for figctx.
//!
//! Everything here runs offline: documents are either inline strings or the
//! two article fixtures under `./tests/fixtures/`, and asset persistence goes
//! to a temporary directory or an in-memory store.
//!
//! Run with:
//!   cargo test --test extract -- --nocapture

use figctx::{
    extract, extract_batch, extract_dir, extract_stream, extract_sync, extract_to_dir,
    ArtifactKind, ArtifactRecord, AssetStore, Dialect, DocumentError, DocumentOutput,
    ExtractionConfig, ExtractionProgressCallback, FsAssetStore, SourceDocument,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> SourceDocument {
    let path = fixtures_dir().join(name);
    let content = std::fs::read(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
    let id = path.file_stem().unwrap().to_string_lossy().into_owned();
    SourceDocument::from_bytes(id, content).with_location(path)
}

async fn run(id: &str, markup: &str, config: &ExtractionConfig) -> DocumentOutput {
    extract(SourceDocument::from_bytes(id, markup), config)
        .await
        .expect("valid config")
}

fn contextual_texts(record: &ArtifactRecord) -> Vec<&str> {
    record
        .contextual_paragraphs
        .iter()
        .map(|c| c.text.as_str())
        .collect()
}

/// Invariants every successful document must satisfy.
fn assert_record_invariants(doc: &DocumentOutput, context: &str) {
    let mut ids = HashSet::new();
    for record in &doc.artifacts {
        assert!(
            ids.insert(record.artifact_id.as_str()),
            "[{context}] duplicate artifact id {}",
            record.artifact_id
        );
        assert_eq!(record.document_id, doc.document_id, "[{context}] document id");

        for c in &record.contextual_paragraphs {
            assert!(
                !record.citing_paragraphs.contains(&c.text),
                "[{context}] {} lists a paragraph as both citing and contextual",
                record.artifact_id
            );
            assert!(
                !c.matched_terms.is_empty(),
                "[{context}] contextual paragraph without matched terms"
            );
        }

        if let Some(image) = record.image() {
            assert!(
                image.saved_location.is_empty() || !image.resolved_source.is_empty(),
                "[{context}] saved asset without a resolved source"
            );
        }
    }
}

/// Store that records every request and answers from a fixed script.
struct RecordingStore {
    calls: Mutex<Vec<(String, String, String)>>,
    succeed: bool,
}

impl RecordingStore {
    fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            succeed,
        })
    }
}

#[async_trait]
impl AssetStore for RecordingStore {
    async fn save(
        &self,
        document_id: &str,
        artifact_id: &str,
        resolved_source: &str,
    ) -> Option<String> {
        self.calls.lock().unwrap().push((
            document_id.to_string(),
            artifact_id.to_string(),
            resolved_source.to_string(),
        ));
        self.succeed
            .then(|| format!("memory://{document_id}/{artifact_id}"))
    }
}

#[derive(Default)]
struct CountingCallback {
    batch_total: AtomicUsize,
    started: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    artifacts: AtomicUsize,
    finished_success: AtomicUsize,
}

impl ExtractionProgressCallback for CountingCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.batch_total.store(total_documents, Ordering::SeqCst);
    }
    fn on_document_start(&self, _document_id: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_document_complete(&self, _document_id: &str, artifact_count: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.artifacts.fetch_add(artifact_count, Ordering::SeqCst);
    }
    fn on_document_error(&self, _document_id: &str, _error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_batch_complete(&self, _total_documents: usize, success_count: usize) {
        self.finished_success.store(success_count, Ordering::SeqCst);
    }
}

// ── Inline documents ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_figure_cited_by_number() {
    let doc = run(
        "doc",
        r#"<figure><img src="fig1.png"><figcaption>Figure 1: Outcomes</figcaption></figure>
           <p>As shown in Figure 1, outcomes improved.</p>"#,
        &ExtractionConfig::default(),
    )
    .await;

    assert!(doc.is_ok(), "unexpected error: {:?}", doc.error);
    assert_eq!(doc.artifacts.len(), 1);
    let record = &doc.artifacts[0];
    assert_eq!(record.artifact_id, "doc_image_1");
    assert_eq!(record.kind, ArtifactKind::Image);
    assert_eq!(record.caption, "Outcomes");
    assert_eq!(
        record.citing_paragraphs,
        vec!["As shown in Figure 1, outcomes improved.".to_string()]
    );
    assert!(record.contextual_paragraphs.is_empty());

    let image = record.image().expect("image detail");
    assert_eq!(image.source_reference, "fig1.png");
    assert!(image.resolved_source.ends_with("fig1.png"));
    assert!(PathBuf::from(&image.resolved_source).is_absolute());
    assert_eq!(image.saved_location, "");
}

#[tokio::test]
async fn test_figure_cited_by_number_despite_bibliography_links() {
    let doc = run(
        "doc",
        r##"<figure id="F1"><img src="fig1.png"><figcaption>Figure 1: Outcomes</figcaption></figure>
           <p>As shown in Figure 1, outcomes improved [<a href="#B1">1</a>].</p>
           <p>Earlier trials disagreed [<a href="#B2">2</a>].</p>"##,
        &ExtractionConfig::default(),
    )
    .await;

    assert_eq!(doc.artifacts.len(), 1);
    assert_eq!(
        doc.artifacts[0].citing_paragraphs,
        vec!["As shown in Figure 1, outcomes improved [1].".to_string()]
    );
}

#[tokio::test]
async fn test_figure_outside_article_root_is_found() {
    let doc = run(
        "doc",
        r#"<html><head><title>t</title></head><body>
             <nav><img src="/static/nav-arrow.png"></nav>
             <main><p>Supplementary Figure 1 shows the sampling grid.</p></main>
             <div class="supplement">
               <figure><img src="fig1.png"><figcaption>Sampling grid</figcaption></figure>
             </div>
           </body></html>"#,
        &ExtractionConfig::default(),
    )
    .await;

    assert!(doc.is_ok(), "unexpected error: {:?}", doc.error);
    assert_eq!(doc.image_count(), 1);
    let record = &doc.artifacts[0];
    assert_eq!(record.image().unwrap().source_reference, "fig1.png");
    assert_eq!(record.caption, "Sampling grid");
    assert_eq!(
        record.citing_paragraphs,
        vec!["Supplementary Figure 1 shows the sampling grid.".to_string()]
    );
}

#[tokio::test]
async fn test_jats_table_found_by_shared_terms() {
    let doc = run(
        "pmc1",
        r#"<article><body>
             <table-wrap id="t1">
               <caption><p>Baseline characteristics</p></caption>
               <table><tr><td>Age</td><td>54</td></tr><tr><td>Sex</td><td>F</td></tr></table>
             </table-wrap>
             <p>Baseline characteristics were balanced across arms.</p>
           </body></article>"#,
        &ExtractionConfig::default(),
    )
    .await;

    assert_eq!(doc.dialect, Some(Dialect::StructuredXml));
    assert_eq!(doc.artifacts.len(), 1);
    let record = &doc.artifacts[0];
    assert_eq!(record.artifact_id, "pmc1_table_1");
    assert_eq!(record.caption, "Baseline characteristics");
    assert!(record.citing_paragraphs.is_empty());
    assert_eq!(
        contextual_texts(record),
        vec!["Baseline characteristics were balanced across arms."]
    );
    let matched: Vec<&str> = record.contextual_paragraphs[0]
        .matched_terms
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(matched, vec!["baseline", "characteristics"]);

    let table = record.table().expect("table detail");
    assert_eq!(table.body_text, "Age | 54\nSex | F");
    assert!(table.informative_terms.contains("age"));
}

#[tokio::test]
async fn test_context_threshold_is_configurable() {
    let markup = r#"<article><body>
          <table-wrap id="t1">
            <caption><p>Baseline characteristics</p></caption>
            <table><tr><td>Age</td><td>54</td></tr></table>
          </table-wrap>
          <p>Baseline characteristics were balanced across arms.</p>
        </body></article>"#;

    let strict = ExtractionConfig::builder().min_context_terms(3).build().unwrap();
    let doc = run("t", markup, &strict).await;
    assert!(doc.artifacts[0].contextual_paragraphs.is_empty());

    let loose = ExtractionConfig::builder().min_context_terms(1).build().unwrap();
    let doc = run("t", markup, &loose).await;
    assert_eq!(doc.artifacts[0].contextual_paragraphs.len(), 1);
}

#[tokio::test]
async fn test_inline_data_source_is_kept_verbatim() {
    let data = "data:image/png;base64,iVBORw0KGgo=";
    let markup = format!(r#"<figure><img src="{data}"><figcaption>Logo-free plot</figcaption></figure>"#);

    let doc = run("c", &markup, &ExtractionConfig::default()).await;
    let image = doc.artifacts[0].image().unwrap();
    assert_eq!(image.source_reference, data);
    assert_eq!(image.resolved_source, data);
    assert_eq!(image.saved_location, "");
}

#[tokio::test]
async fn test_inline_data_is_persisted_by_fs_store() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FsAssetStore::new(tmp.path()).unwrap();
    let config = ExtractionConfig::builder()
        .asset_store(Arc::new(store))
        .build()
        .unwrap();

    let doc = run(
        "c",
        r#"<figure><img src="data:image/png;base64,iVBORw0KGgo="></figure>"#,
        &config,
    )
    .await;

    let image = doc.artifacts[0].image().unwrap();
    assert_eq!(image.saved_location, "c/c_image_1.png");
    let bytes = std::fs::read(tmp.path().join("c/c_image_1.png")).unwrap();
    assert_eq!(bytes, b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_store_failure_leaves_location_empty() {
    let store = RecordingStore::new(false);
    let config = ExtractionConfig::builder()
        .asset_store(store.clone())
        .build()
        .unwrap();

    let doc = run(
        "d",
        r#"<figure><img src="https://cdn.example.org/f1.png"></figure>
           <figure><img></figure>"#,
        &config,
    )
    .await;

    assert!(doc.is_ok());
    assert_eq!(doc.image_count(), 2);
    for record in &doc.artifacts {
        assert_eq!(record.image().unwrap().saved_location, "");
    }
    // The image without any source is never offered to the store.
    let calls = store.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        (
            "d".to_string(),
            "d_image_1".to_string(),
            "https://cdn.example.org/f1.png".to_string()
        )
    );
}

#[tokio::test]
async fn test_store_success_records_location() {
    let store = RecordingStore::new(true);
    let config = ExtractionConfig::builder()
        .asset_store(store.clone())
        .build()
        .unwrap();

    let doc = run(
        "d",
        r#"<figure><img src="https://cdn.example.org/f1.png"></figure>
           <table><tr><td>x</td></tr></table>"#,
        &config,
    )
    .await;

    assert_eq!(
        doc.artifacts[0].image().unwrap().saved_location,
        "memory://d/d_image_1"
    );
    // Tables are never persisted.
    assert_eq!(store.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_document_without_artifacts_serialises_to_empty_array() {
    let doc = run(
        "empty",
        "<html><head><title>x</title></head><body><main><p>No artifacts here.</p></main></body></html>",
        &ExtractionConfig::default(),
    )
    .await;

    assert!(doc.is_ok());
    assert!(doc.artifacts.is_empty());
    assert_eq!(serde_json::to_string(&doc.artifacts).unwrap(), "[]");
}

#[tokio::test]
async fn test_plain_text_is_unparsable() {
    let doc = run("e", "plain text", &ExtractionConfig::default()).await;
    assert!(doc.artifacts.is_empty());
    match doc.error {
        Some(DocumentError::Unparsable { ref document_id, .. }) => assert_eq!(document_id, "e"),
        other => panic!("expected Unparsable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_utf8_is_undecodable() {
    let doc = extract(
        SourceDocument::from_bytes("bin", vec![b'<', b'p', b'>', 0xff, 0xfe, b'<']),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap();
    assert!(matches!(doc.error, Some(DocumentError::Undecodable { .. })));
}

#[tokio::test]
async fn test_byte_order_mark_is_ignored() {
    let mut bytes = "\u{feff}".as_bytes().to_vec();
    bytes.extend_from_slice(br#"<article><body><fig id="F1"><graphic href="f.tif"/></fig></body></article>"#);
    let doc = extract(SourceDocument::from_bytes("bom", bytes), &ExtractionConfig::default())
        .await
        .unwrap();
    assert_eq!(doc.dialect, Some(Dialect::StructuredXml));
    assert_eq!(doc.image_count(), 1);
}

#[tokio::test]
async fn test_images_then_tables_in_document_order() {
    let doc = run(
        "o",
        r#"<table><tr><td>first table</td></tr></table>
           <figure><img src="a.png"></figure>
           <img src="b.png">
           <table><tr><td>second table</td></tr></table>"#,
        &ExtractionConfig::default(),
    )
    .await;

    let ids: Vec<&str> = doc.artifacts.iter().map(|r| r.artifact_id.as_str()).collect();
    assert_eq!(ids, vec!["o_image_1", "o_image_2", "o_table_1", "o_table_2"]);
    assert_eq!(doc.artifacts[1].image().unwrap().source_reference, "b.png");
    assert_eq!(doc.artifacts[2].table().unwrap().body_text, "first table");
    assert_record_invariants(&doc, "order");
}

#[test]
fn test_invalid_config_is_fatal() {
    let config = ExtractionConfig {
        concurrency: 0,
        ..ExtractionConfig::default()
    };
    assert!(extract_sync(SourceDocument::from_bytes("x", "<p>x</p>"), &config).is_err());
}

#[test]
fn test_sync_wrapper() {
    let doc = extract_sync(
        SourceDocument::from_bytes("s", r#"<figure><img src="s.png"></figure>"#),
        &ExtractionConfig::default(),
    )
    .unwrap();
    assert_eq!(doc.image_count(), 1);
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pmc_web_page_fixture() {
    let doc = extract(fixture("pmc_web_page.html"), &ExtractionConfig::default())
        .await
        .unwrap();

    assert!(doc.is_ok(), "unexpected error: {:?}", doc.error);
    assert_eq!(doc.dialect, Some(Dialect::WebPage));
    assert_record_invariants(&doc, "pmc_web_page");

    // Metadata from citation_* tags.
    assert_eq!(
        doc.metadata.title.as_deref(),
        Some("Low-dose aspirin and cardiovascular outcomes in older adults")
    );
    assert_eq!(doc.metadata.authors, vec!["Jane Roe", "John Doe"]);
    assert_eq!(doc.metadata.publication_date.as_deref(), Some("2021-03-15"));
    assert!(doc
        .metadata
        .abstract_text
        .as_deref()
        .is_some_and(|a| a.starts_with("A randomized trial")));

    // The header icon is chrome; the journal logo inside <main> is kept by default.
    assert_eq!(doc.image_count(), 2);
    assert_eq!(doc.table_count(), 1);
    assert!(doc.artifacts.iter().all(|r| r
        .image()
        .map_or(true, |i| !i.source_reference.contains("usa-icon"))));

    let figure = &doc.artifacts[0];
    assert_eq!(figure.artifact_id, "pmc_web_page_image_1");
    assert_eq!(
        figure.caption,
        "Cumulative incidence of cardiovascular events by treatment group."
    );
    let image = figure.image().unwrap();
    assert_eq!(image.source_reference, "figs/nihms-f1.jpg");
    assert_eq!(
        PathBuf::from(&image.resolved_source),
        fixtures_dir().join("figs/nihms-f1.jpg")
    );
    assert_eq!(image.alt_text, "Cumulative incidence curves");
    assert_eq!(
        figure.citing_paragraphs,
        vec![
            "Cumulative incidence of the primary end point is plotted in Figure 1; \
             event rates were similar across arms."
                .to_string()
        ]
    );
    assert_eq!(
        contextual_texts(figure),
        vec!["Rates of cardiovascular events did not differ by treatment group."]
    );
    let matched = &figure.contextual_paragraphs[0].matched_terms;
    for term in ["cardiovascular", "events", "treatment", "group"] {
        assert!(matched.contains(term), "missing matched term {term}");
    }

    let logo = &doc.artifacts[1];
    assert_eq!(logo.artifact_id, "pmc_web_page_image_2");
    assert_eq!(logo.caption, "");
    assert!(logo.citing_paragraphs.is_empty());
    assert!(logo.contextual_paragraphs.is_empty());

    let table = &doc.artifacts[2];
    assert_eq!(table.artifact_id, "pmc_web_page_table_1");
    assert_eq!(table.caption, "Baseline characteristics of participants.");
    let detail = table.table().unwrap();
    assert_eq!(
        detail.body_text,
        "Characteristic | Aspirin | Placebo\nAge, years | 74 | 74\nWomen, % | 56 | 56"
    );
    assert!(detail
        .structural_markup
        .as_deref()
        .is_some_and(|m| m.starts_with("<table")));
    assert_eq!(
        table.citing_paragraphs,
        vec!["Participant characteristics at enrollment are summarized in Table 1.".to_string()]
    );
    assert_eq!(
        contextual_texts(table),
        vec!["Baseline characteristics were balanced between the aspirin and placebo arms."]
    );

    // Disclaimers and sidebar prose never surface as context.
    for record in &doc.artifacts {
        for text in record
            .citing_paragraphs
            .iter()
            .chain(record.contextual_paragraphs.iter().map(|c| &c.text))
        {
            assert!(!text.contains("NLM"), "disclaimer leaked: {text}");
            assert!(!text.contains("Open in a new tab"), "chrome leaked: {text}");
            assert!(!text.contains("Similar articles"), "sidebar leaked: {text}");
        }
    }
}

#[tokio::test]
async fn test_decorative_images_can_be_skipped() {
    let config = ExtractionConfig::builder()
        .skip_decorative_images(true)
        .build()
        .unwrap();
    let doc = extract(fixture("pmc_web_page.html"), &config).await.unwrap();

    assert_eq!(doc.image_count(), 1);
    assert_eq!(doc.artifacts[0].artifact_id, "pmc_web_page_image_1");
    assert_eq!(doc.artifacts[0].image().unwrap().source_reference, "figs/nihms-f1.jpg");
}

#[tokio::test]
async fn test_table_markup_can_be_dropped() {
    let config = ExtractionConfig::builder()
        .keep_table_markup(false)
        .cell_separator("\t")
        .build()
        .unwrap();
    let doc = extract(fixture("pmc_web_page.html"), &config).await.unwrap();

    let table = doc.artifacts.iter().find_map(|r| r.table()).unwrap();
    assert!(table.structural_markup.is_none());
    assert!(table.body_text.starts_with("Characteristic\tAspirin\tPlacebo\n"));

    let json = serde_json::to_value(&doc.artifacts).unwrap();
    let table_json = json
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["kind"] == "table")
        .unwrap();
    assert!(table_json.get("structural_markup").is_none());
}

#[tokio::test]
async fn test_jats_fixture() {
    let doc = extract(fixture("jats_article.xml"), &ExtractionConfig::default())
        .await
        .unwrap();

    assert!(doc.is_ok(), "unexpected error: {:?}", doc.error);
    assert_eq!(doc.dialect, Some(Dialect::StructuredXml));
    assert_record_invariants(&doc, "jats_article");

    assert_eq!(
        doc.metadata.title.as_deref(),
        Some("Soil microbiome shifts under prolonged drought")
    );
    assert_eq!(doc.metadata.authors, vec!["Ada Okafor", "Per Lindqvist"]);
    assert_eq!(doc.metadata.publication_date.as_deref(), Some("2020-09-04"));
    assert_eq!(
        doc.metadata.abstract_text.as_deref(),
        Some("Drought reshapes soil bacterial communities within weeks.")
    );

    assert_eq!(doc.artifacts.len(), 2);

    let figure = &doc.artifacts[0];
    assert_eq!(figure.artifact_id, "jats_article_image_1");
    assert_eq!(
        figure.caption,
        "Phylum abundance. Relative abundance of bacterial phyla in watered and droughted plots."
    );
    let image = figure.image().unwrap();
    assert_eq!(image.source_reference, "soil-f1.tif");
    assert_eq!(
        PathBuf::from(&image.resolved_source),
        fixtures_dir().join("soil-f1.tif")
    );
    assert_eq!(
        figure.citing_paragraphs,
        vec!["Relative abundance of dominant phyla is given in Figure 1.".to_string()]
    );
    assert_eq!(
        contextual_texts(figure),
        vec!["Droughted plots lost bacterial diversity relative to watered controls."]
    );

    let table = &doc.artifacts[1];
    assert_eq!(table.artifact_id, "jats_article_table_1");
    assert_eq!(table.caption, "Site characteristics.");
    assert_eq!(
        table.table().unwrap().body_text,
        "Site | Rainfall (mm)\nNorth | 412\nSouth | 198"
    );
    assert_eq!(
        table.citing_paragraphs,
        vec!["Site descriptions are listed in Table 1.".to_string()]
    );
    assert_eq!(
        contextual_texts(table),
        vec!["Rainfall at the north site was twice that of the south site."]
    );
}

#[tokio::test]
async fn test_extraction_is_deterministic() {
    let config = ExtractionConfig::default();
    for name in ["pmc_web_page.html", "jats_article.xml"] {
        let first = extract(fixture(name), &config).await.unwrap();
        let second = extract(fixture(name), &config).await.unwrap();
        assert_eq!(first, second, "{name} differs between runs");
        assert_eq!(
            serde_json::to_string(&first.artifacts).unwrap(),
            serde_json::to_string(&second.artifacts).unwrap()
        );
    }
}

// ── Batches ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_continues_past_failures() {
    let callback = Arc::new(CountingCallback::default());
    let config = ExtractionConfig::builder()
        .progress_callback(callback.clone())
        .concurrency(2)
        .build()
        .unwrap();

    let docs = vec![
        SourceDocument::from_bytes("a", r#"<figure><img src="a.png"></figure>"#),
        SourceDocument::from_bytes("b", "plain text"),
        SourceDocument::from_bytes("c", "<table><tr><td>1</td></tr></table>"),
    ];
    let batch = extract_batch(docs, &config).await.unwrap();

    let ids: Vec<&str> = batch.documents.iter().map(|d| d.document_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(batch.documents[0].is_ok());
    assert!(batch.documents[1].error.is_some());
    assert!(batch.documents[2].is_ok());

    assert_eq!(batch.stats.total_documents, 3);
    assert_eq!(batch.stats.processed_documents, 2);
    assert_eq!(batch.stats.failed_documents, 1);
    assert_eq!(batch.stats.total_images, 1);
    assert_eq!(batch.stats.total_tables, 1);

    assert_eq!(callback.batch_total.load(Ordering::SeqCst), 3);
    assert_eq!(callback.started.load(Ordering::SeqCst), 3);
    assert_eq!(callback.completed.load(Ordering::SeqCst), 2);
    assert_eq!(callback.failed.load(Ordering::SeqCst), 1);
    assert_eq!(callback.artifacts.load(Ordering::SeqCst), 2);
    assert_eq!(callback.finished_success.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_empty_batch() {
    let batch = extract_batch(Vec::new(), &ExtractionConfig::default())
        .await
        .unwrap();
    assert!(batch.documents.is_empty());
    assert_eq!(batch.stats.total_documents, 0);
}

#[tokio::test]
async fn test_extract_dir_over_fixtures() {
    let batch = extract_dir(fixtures_dir(), &ExtractionConfig::default())
        .await
        .unwrap();

    let ids: Vec<&str> = batch.documents.iter().map(|d| d.document_id.as_str()).collect();
    assert_eq!(ids, vec!["jats_article", "pmc_web_page"]);
    assert_eq!(batch.stats.failed_documents, 0);

    let summary = batch.summary();
    assert_eq!(summary.records, 5);
    assert!(summary.with_caption >= 4);
    assert!(summary.with_citing >= 4);
}

#[tokio::test]
async fn test_extract_dir_missing_input_is_fatal() {
    let err = extract_dir("/definitely/not/here", &ExtractionConfig::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here"), "got: {err}");
}

#[tokio::test]
async fn test_extract_to_dir_writes_one_file_per_document() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(
        input.path().join("one.html"),
        r#"<figure><img src="one.png"><figcaption>Figure 1. Setup</figcaption></figure>"#,
    )
    .unwrap();
    std::fs::write(input.path().join("empty.html"), "<p>nothing</p>").unwrap();
    std::fs::write(input.path().join("broken.xml"), "not markup at all").unwrap();
    std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    let batch = extract_to_dir(input.path(), output.path(), &ExtractionConfig::default())
        .await
        .unwrap();
    assert_eq!(batch.documents.len(), 3);
    assert_eq!(batch.stats.failed_documents, 1);

    let one: Vec<ArtifactRecord> =
        serde_json::from_slice(&std::fs::read(output.path().join("one.json")).unwrap()).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].artifact_id, "one_image_1");
    assert_eq!(one[0].caption, "Setup");

    for name in ["empty.json", "broken.json"] {
        let raw = std::fs::read_to_string(output.path().join(name)).unwrap();
        assert_eq!(raw.trim(), "[]", "{name}");
    }
    assert!(!output.path().join("notes.json").exists());
    assert!(!output.path().join("one.json.tmp").exists());
}

#[tokio::test]
async fn test_shared_file_stems_keep_separate_outputs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(
        input.path().join("PMC1.html"),
        r#"<figure><img src="a.png"></figure><figure><img src="b.png"></figure>"#,
    )
    .unwrap();
    std::fs::write(input.path().join("PMC1.xml"), "<article><body><p>No figures.</p></body></article>")
        .unwrap();

    let batch = extract_to_dir(input.path(), output.path(), &ExtractionConfig::default())
        .await
        .unwrap();
    let ids: Vec<&str> = batch.documents.iter().map(|d| d.document_id.as_str()).collect();
    assert_eq!(ids, vec!["PMC1_html", "PMC1_xml"]);

    let html: Vec<ArtifactRecord> =
        serde_json::from_slice(&std::fs::read(output.path().join("PMC1_html.json")).unwrap()).unwrap();
    let html_ids: Vec<&str> = html.iter().map(|r| r.artifact_id.as_str()).collect();
    assert_eq!(html_ids, vec!["PMC1_html_image_1", "PMC1_html_image_2"]);

    let xml = std::fs::read_to_string(output.path().join("PMC1_xml.json")).unwrap();
    assert_eq!(xml.trim(), "[]");
    assert!(!output.path().join("PMC1.json").exists());
}

#[tokio::test]
async fn test_stream_matches_batch() {
    let docs = || vec![fixture("pmc_web_page.html"), fixture("jats_article.xml")];
    let config = ExtractionConfig::default();

    let mut streamed: Vec<DocumentOutput> =
        extract_stream(docs(), &config).unwrap().collect().await;
    streamed.sort_by(|a, b| a.document_id.cmp(&b.document_id));

    let mut batch = extract_batch(docs(), &config).await.unwrap().documents;
    batch.sort_by(|a, b| a.document_id.cmp(&b.document_id));

    assert_eq!(streamed, batch);
}
