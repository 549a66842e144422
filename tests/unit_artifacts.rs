// Unit tests for artifact loading.
//
// Every missing or inconsistent artifact must stop the store from loading
// with an ArtifactLoad error that names the offending file.

mod common;

use serde_json::json;

use common::{is_artifact_error_for, npy, Fixture};
use newstopic::artifacts::{
    missing_files, CLUSTER_LABELS_FILE, CLUSTER_MODEL_FILE, EMBEDDINGS_FILE,
    EMBEDDING_INDEX_FILE, KEYWORD_TABLE_FILE, LABEL_TABLE_FILE, REDUCED_EMBEDDINGS_FILE,
    REDUCTION_MODEL_FILE, REQUIRED_FILES,
};
use newstopic::cluster::ClusterId;
use newstopic::reduction::traits::DimensionalityReducer;

// ============================================================
// Happy path
// ============================================================

#[test]
fn fixture_loads_and_summarizes() {
    let fixture = Fixture::new();
    let store = fixture.load().unwrap();

    let summary = store.summary();
    assert_eq!(summary.training_rows, 6);
    assert_eq!(summary.embedding_dim, 3);
    assert_eq!(summary.reduced_dim, 2);
    assert_eq!(summary.reducer, "neighbors");
    assert_eq!(summary.clusters, 3);
    for id in 0..3 {
        assert_eq!(summary.cluster_sizes[&ClusterId(id)], 2);
    }

    assert_eq!(store.embedding_index(), &[10, 11, 12, 13, 14, 15]);
    assert_eq!(store.reduced_embeddings().len(), 6);
    assert_eq!(store.cluster_labels()[4], ClusterId(2));
    assert_eq!(store.topics().len(), 3);
}

#[test]
fn keywords_are_ranked_at_load() {
    let store = Fixture::new().load().unwrap();
    let record = store.topics().get(ClusterId(0)).unwrap();
    let scores: Vec<f32> = record.keywords.iter().map(|(_, s)| *s).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
    assert_eq!(record.keywords[0].0, "government");
}

#[test]
fn linear_reduction_model_loads() {
    let fixture = Fixture::new();
    fixture.write_json(
        REDUCTION_MODEL_FILE,
        &json!({
            "kind": "linear",
            "mean": [0.0, 0.0, 0.0],
            "components": [[-5.0, 5.0, 0.0], [0.0, 0.0, 5.0]]
        }),
    );
    let store = fixture.load().unwrap();
    assert_eq!(store.reducer().kind(), "linear");
    let out = store.reducer().transform(&[vec![0.0, 1.0, 0.0]]).unwrap();
    assert_eq!(out, vec![vec![5.0, 0.0]]);
}

#[test]
fn missing_files_reports_nothing_for_complete_dir() {
    let fixture = Fixture::new();
    assert!(missing_files(fixture.path()).is_empty());

    fixture.remove(LABEL_TABLE_FILE);
    assert_eq!(missing_files(fixture.path()), vec![LABEL_TABLE_FILE]);
}

// ============================================================
// Missing and corrupt files
// ============================================================

#[test]
fn missing_keyword_table_fails_before_any_prediction() {
    let fixture = Fixture::new();
    fixture.remove(KEYWORD_TABLE_FILE);
    let err = fixture.load().err().expect("load must fail");
    assert!(is_artifact_error_for(&err, KEYWORD_TABLE_FILE), "{err}");
}

#[test]
fn every_required_file_is_fatal_when_missing() {
    for name in REQUIRED_FILES {
        let fixture = Fixture::new();
        fixture.remove(name);
        let err = fixture.load().err().unwrap_or_else(|| panic!("{name}: load must fail"));
        assert!(is_artifact_error_for(&err, name), "{name}: {err}");
    }
}

#[test]
fn corrupt_npy_is_rejected() {
    let fixture = Fixture::new();
    fixture.write_raw(EMBEDDINGS_FILE, b"definitely not numpy");
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, EMBEDDINGS_FILE), "{err}");
}

#[test]
fn npy_shape_that_overflows_is_an_artifact_error() {
    let fixture = Fixture::new();
    fixture.write_raw(
        EMBEDDINGS_FILE,
        &npy("<f4", "(4611686018427387904, 8)", &[0; 32]),
    );
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, EMBEDDINGS_FILE), "{err}");
}

#[test]
fn npy_with_huge_zero_column_shape_is_an_artifact_error() {
    let fixture = Fixture::new();
    fixture.write_raw(REDUCED_EMBEDDINGS_FILE, &npy("<f4", "(100000000000, 0)", &[]));
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, REDUCED_EMBEDDINGS_FILE), "{err}");
}

#[test]
fn npy_label_vector_that_overflows_is_an_artifact_error() {
    let fixture = Fixture::new();
    fixture.write_raw(
        CLUSTER_LABELS_FILE,
        &npy("<i8", "(4611686018427387904,)", &[0; 8]),
    );
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, CLUSTER_LABELS_FILE), "{err}");
}

#[test]
fn malformed_json_is_rejected() {
    let fixture = Fixture::new();
    fixture.write_raw(CLUSTER_MODEL_FILE, b"{ \"centroids\": [[1.0, ");
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, CLUSTER_MODEL_FILE), "{err}");
}

// ============================================================
// Cross-artifact consistency
// ============================================================

#[test]
fn index_length_must_match_embeddings() {
    let fixture = Fixture::new();
    fixture.write_ints(EMBEDDING_INDEX_FILE, &[1, 2, 3]);
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, EMBEDDING_INDEX_FILE), "{err}");
}

#[test]
fn reduced_rows_must_match_embeddings() {
    let fixture = Fixture::new();
    fixture.write_matrix(REDUCED_EMBEDDINGS_FILE, &[vec![0.0, 0.0]]);
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, REDUCED_EMBEDDINGS_FILE), "{err}");
}

#[test]
fn centroid_dimension_must_match_reducer_output() {
    let fixture = Fixture::new();
    fixture.write_json(
        CLUSTER_MODEL_FILE,
        &json!({ "centroids": [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]] }),
    );
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, CLUSTER_MODEL_FILE), "{err}");
}

#[test]
fn linear_model_input_dimension_must_match_embeddings() {
    let fixture = Fixture::new();
    fixture.write_json(
        REDUCTION_MODEL_FILE,
        &json!({ "kind": "linear", "components": [[1.0, 0.0], [0.0, 1.0]] }),
    );
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, REDUCTION_MODEL_FILE), "{err}");
}

#[test]
fn cluster_label_outside_fitted_set_is_rejected() {
    let fixture = Fixture::new();
    fixture.write_ints(CLUSTER_LABELS_FILE, &[0, 0, 1, 1, 2, 7]);
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, CLUSTER_LABELS_FILE), "{err}");
}

#[test]
fn negative_cluster_label_is_rejected() {
    let fixture = Fixture::new();
    fixture.write_ints(CLUSTER_LABELS_FILE, &[0, 0, 1, 1, 2, -1]);
    assert!(fixture.load().is_err());
}

#[test]
fn cluster_without_topic_is_rejected() {
    // A fourth centroid with no keyword/label entry would be an orphan id.
    let fixture = Fixture::new();
    fixture.write_json(
        CLUSTER_MODEL_FILE,
        &json!({ "centroids": [[-4.75, 0.0], [4.75, 0.0], [0.0, 4.75], [0.0, -4.75]] }),
    );
    let err = fixture.load().err().unwrap();
    assert!(is_artifact_error_for(&err, KEYWORD_TABLE_FILE), "{err}");
    assert!(err.to_string().contains("cluster 3"), "{err}");
}

#[test]
fn keyword_and_label_tables_must_agree() {
    let fixture = Fixture::new();
    fixture.write_json(LABEL_TABLE_FILE, &json!({ "0": "Government", "1": "Technology" }));
    let err = fixture.load().err().unwrap();
    assert!(err.to_string().contains("cluster 2"), "{err}");
}
