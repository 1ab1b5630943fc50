use statistico::doc_examples::describe_column;
use statistico::{
    CellValue, Dataset, MetaSpec, OutlierMethod, StatsErrorKind, detect_outliers_in_column,
    run_meta_analysis,
};

fn worksheet() -> Dataset {
    let rows = vec![
        vec![CellValue::Number(0.2), CellValue::Number(0.1)],
        vec![CellValue::Text("n/a".into()), CellValue::Number(0.2)],
        vec![CellValue::Number(0.5), CellValue::Number(0.15)],
        vec![CellValue::Number(0.3), CellValue::Empty],
        vec![CellValue::Number(0.4), CellValue::Number(0.25)],
    ];
    Dataset::from_rows(&["effect", "se"], rows).unwrap()
}

#[test]
fn facade_reaches_both_layers() {
    let ds = worksheet();
    let stats = describe_column(&ds, "effect").unwrap();
    assert_eq!(stats.n, 4);

    let meta = run_meta_analysis(&ds, &MetaSpec::default()).unwrap();
    assert_eq!(meta.k, 3);
    assert_eq!(meta.excluded_studies, 2);
}

#[test]
fn errors_surface_their_kind() {
    let ds = worksheet();
    let err = detect_outliers_in_column(&ds, "missing", OutlierMethod::iqr()).unwrap_err();
    assert_eq!(err.kind(), StatsErrorKind::InvalidConfiguration);
}
