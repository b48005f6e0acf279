use std::fs;
use std::sync::Arc;

use filesearch::parser::ParserRegistry;
use filesearch::pipeline::{IndexDirectoryOptions, IndexingPipeline};
use filesearch::query::{QueryEngine, SearchType};
use filesearch::store::Store;

async fn build(dir: &std::path::Path) -> (Arc<Store>, Arc<IndexingPipeline>, Arc<QueryEngine>) {
    let store = Arc::new(Store::open(&dir.join(".index")).unwrap());
    let pipeline = Arc::new(IndexingPipeline::new(
        Arc::clone(&store),
        Arc::new(ParserRegistry::new()),
        10,
        2,
        10 * 1024 * 1024,
    ));
    let query_engine = Arc::new(QueryEngine::new(Arc::clone(&store)));
    (store, pipeline, query_engine)
}

#[tokio::test]
async fn index_then_exact_search_matches_subset_of_tokens() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a.txt"), "the quick brown fox").unwrap();
    fs::write(tmp.path().join("b.txt"), "quick silver").unwrap();
    fs::write(tmp.path().join("c.txt"), "").unwrap();

    let (store, pipeline, query_engine) = build(tmp.path()).await;
    let summary = pipeline
        .index_directory(tmp.path(), IndexDirectoryOptions { include_all_files: true, ..Default::default() })
        .await
        .unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.indexed_files, 3);
    assert_eq!(store.stats().document_count, 3);

    let both = query_engine.search("quick", SearchType::Exact, 10, 30.0, None).unwrap();
    assert_eq!(both.total_results, 2);

    let narrow = query_engine.search("quick brown", SearchType::Exact, 10, 30.0, None).unwrap();
    assert_eq!(narrow.total_results, 1);
    assert!(narrow.results[0].path.ends_with("a.txt"));

    let none = query_engine.search("zzz", SearchType::Exact, 10, 30.0, None).unwrap();
    assert_eq!(none.total_results, 0);
}

#[tokio::test]
async fn path_filter_and_file_type_filter() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a.txt"), "the quick brown fox").unwrap();
    fs::write(tmp.path().join("b.txt"), "quick silver").unwrap();

    let (_store, pipeline, query_engine) = build(tmp.path()).await;
    pipeline
        .index_directory(tmp.path(), IndexDirectoryOptions { include_all_files: true, ..Default::default() })
        .await
        .unwrap();

    let by_path = query_engine.search("b.", SearchType::Path, 10, 30.0, None).unwrap();
    assert_eq!(by_path.total_results, 1);
    assert!(by_path.results[0].path.ends_with("b.txt"));

    let md_only = vec!["md".to_string()];
    let none = query_engine.search("quick", SearchType::Exact, 10, 30.0, Some(md_only.as_slice())).unwrap();
    assert_eq!(none.total_results, 0);
}

#[tokio::test]
async fn reindex_without_force_skips_unchanged_files() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("a.txt");
    fs::write(&a, "version one").unwrap();

    let (store, pipeline, _query_engine) = build(tmp.path()).await;
    pipeline
        .index_directory(tmp.path(), IndexDirectoryOptions { include_all_files: true, ..Default::default() })
        .await
        .unwrap();
    assert!(store.is_indexed(a.to_str().unwrap()));

    fs::write(&a, "version two, totally different bytes").unwrap();
    assert!(!store.is_indexed(a.to_str().unwrap()));

    let summary = pipeline
        .index_directory(tmp.path(), IndexDirectoryOptions { include_all_files: true, ..Default::default() })
        .await
        .unwrap();
    assert!(summary.indexed_files >= 1);
}

#[tokio::test]
async fn fuzzy_search_finds_misspelled_body_above_threshold() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a.txt"), "pythn programing is grate").unwrap();

    let (_store, pipeline, query_engine) = build(tmp.path()).await;
    pipeline
        .index_directory(tmp.path(), IndexDirectoryOptions { include_all_files: true, ..Default::default() })
        .await
        .unwrap();

    let response = query_engine.search("python programming", SearchType::Fuzzy, 5, 40.0, None).unwrap();
    assert!(!response.results.is_empty());
    let top = &response.results[0];
    assert!(top.fuzzy_score.unwrap() >= 40.0);
    assert!(matches!(top.fuzzy_method, Some("ratio") | Some("partial_ratio") | Some("token_sort_ratio") | Some("token_set_ratio")));
}
