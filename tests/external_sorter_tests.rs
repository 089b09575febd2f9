use rowsort::{
    CancellationToken, Compression, ExternalSorter, Row, SortConfig, SortError, lexicographic,
    merge, partition, read_rows, row_of, sort, write_rows,
};
use std::fs;

mod common;
use common::{
    config_with_segments, count_files, fixed_width_rows, random_rows, rows_of, spill_dir,
    write_input,
};

fn assert_sorted(rows: &[Row]) {
    for (i, pair) in rows.windows(2).enumerate() {
        assert!(
            lexicographic(&pair[0], &pair[1]).is_le(),
            "rows {} and {} out of order: {:?} > {:?}",
            i,
            i + 1,
            pair[0],
            pair[1]
        );
    }
}

fn canonical(mut rows: Vec<Row>) -> Vec<Row> {
    rows.sort();
    rows
}

#[test]
fn test_basic_functionality() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &rows_of(&[
            &["7", "8", "9"],
            &["5", "7", "8"],
            &["1", "2", "4"],
            &["1", "2", "3"],
            &["5", "6", "7"],
        ]),
    );
    let output = dir.path().join("output.dat");

    assert_eq!(sort(&input, &output).unwrap(), 5);

    let sorted = read_rows(&output, Compression::default()).unwrap();
    assert_eq!(
        sorted,
        rows_of(&[
            &["1", "2", "3"],
            &["1", "2", "4"],
            &["5", "6", "7"],
            &["5", "7", "8"],
            &["7", "8", "9"],
        ])
    );
}

#[test]
fn test_string_ordering_not_numeric() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &rows_of(&[&["0", "25153", "000000"], &["0", "25153", "000"]]),
    );
    let output = dir.path().join("output.dat");

    assert_eq!(sort(&input, &output).unwrap(), 2);
    assert_eq!(
        read_rows(&output, Compression::default()).unwrap(),
        rows_of(&[&["0", "25153", "000"], &["0", "25153", "000000"]])
    );
}

#[test]
fn test_missing_input_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("output.dat");

    assert_eq!(sort(dir.path().join("does_not_exist"), &output).unwrap(), 0);
    assert!(!output.exists());
}

#[test]
fn test_empty_input_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.dat");
    fs::write(&input, b"").unwrap();
    let output = dir.path().join("output.dat");

    assert_eq!(sort(&input, &output).unwrap(), 0);
    assert!(!output.exists());
}

#[test]
fn test_empty_input_leaves_existing_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.dat");
    fs::write(&input, b"").unwrap();
    let output = dir.path().join("output.dat");
    fs::write(&output, b"previous contents").unwrap();

    sort(&input, &output).unwrap();
    assert_eq!(fs::read(&output).unwrap(), b"previous contents");
}

#[test]
fn test_small_budget_forces_external_sort() {
    let dir = tempfile::tempdir().unwrap();
    let rows = fixed_width_rows(3000, 7);
    let input = write_input(dir.path(), &rows);
    let output = dir.path().join("output.dat");

    let stats = ExternalSorter::new(config_with_segments(dir.path(), 16))
        .sort(&input, &output)
        .unwrap();
    assert!(stats.num_segments > 1);
    assert_eq!(stats.rows, 3000);

    let sorted = read_rows(&output, Compression::default()).unwrap();
    assert_sorted(&sorted);
    assert_eq!(canonical(sorted), canonical(rows));
}

#[test]
fn test_output_is_permutation_of_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = random_rows(2000, 11);
    rows.push(vec![]);
    rows.push(vec![None, None]);
    rows.push(row_of(&["", ""]));
    let input = write_input(dir.path(), &rows);
    let output = dir.path().join("output.dat");

    // Ragged rows tie with their own extensions, so the comparison is not
    // transitive and adjacent output rows are not guaranteed to be ordered.
    // The sort must still finish and keep every row.
    ExternalSorter::new(config_with_segments(dir.path(), 8))
        .sort(&input, &output)
        .unwrap();

    let sorted = read_rows(&output, Compression::default()).unwrap();
    assert_eq!(sorted.len(), rows.len());
    assert_eq!(canonical(sorted), canonical(rows));
}

#[test]
fn test_ragged_rows_in_one_batch() {
    let rows = random_rows(3000, 7);

    let segments = partition(rows.iter().cloned().map(Ok), lexicographic, u64::MAX).unwrap();
    assert_eq!(segments.len(), 1);
    let batch = read_rows(segments[0].path(), Compression::default()).unwrap();
    assert_eq!(canonical(batch), canonical(rows.clone()));

    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &rows);
    let output = dir.path().join("output.dat");
    assert_eq!(sort(&input, &output).unwrap(), 3000);
    let sorted = read_rows(&output, Compression::default()).unwrap();
    assert_eq!(canonical(sorted), canonical(rows));
}

#[test]
fn test_fixed_width_output_is_sorted_permutation() {
    let dir = tempfile::tempdir().unwrap();
    let rows = fixed_width_rows(2000, 11);
    let input = write_input(dir.path(), &rows);
    let output = dir.path().join("output.dat");

    ExternalSorter::new(config_with_segments(dir.path(), 8))
        .sort(&input, &output)
        .unwrap();

    let sorted = read_rows(&output, Compression::default()).unwrap();
    assert_sorted(&sorted);
    assert_eq!(canonical(sorted), canonical(rows));
}

#[test]
fn test_output_independent_of_segment_count() {
    // Fixed width, no absent fields: rows that compare equal are identical,
    // so the output is fully determined.
    let rows: Vec<Row> = random_rows(1500, 3)
        .into_iter()
        .map(|row| {
            let key = row[0].clone().unwrap_or_default();
            row_of(&[key.clone(), format!("{key}-x"), "tail".to_string()])
        })
        .collect();

    let mut outputs = Vec::new();
    for max_segments in [1, 2, 4, 16] {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), &rows);
        let output = dir.path().join("output.dat");
        ExternalSorter::new(config_with_segments(dir.path(), max_segments))
            .sort(&input, &output)
            .unwrap();
        outputs.push(read_rows(&output, Compression::default()).unwrap());
    }

    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
    assert_sorted(&outputs[0]);
}

#[test]
fn test_partition_and_merge_with_varied_budgets() {
    let rows: Vec<Row> = (0..100)
        .map(|i| row_of(&[format!("{:03}", (i * 37) % 100)]))
        .collect();
    let expected: Vec<Row> = (0..100).map(|i| row_of(&[format!("{i:03}")])).collect();

    for budget in [1, 200, 5_000, u64::MAX] {
        let segments = partition(rows.iter().cloned().map(Ok), lexicographic, budget).unwrap();
        if budget == u64::MAX {
            assert_eq!(segments.len(), 1);
        } else if budget == 1 {
            assert_eq!(segments.len(), 100);
        }
        let paths: Vec<_> = segments.iter().map(|s| s.path().to_path_buf()).collect();

        let mut out: Vec<Row> = Vec::new();
        assert_eq!(merge(segments, lexicographic, &mut out).unwrap(), 100);
        assert_eq!(out, expected);
        assert!(paths.iter().all(|p| !p.exists()));
    }
}

#[test]
fn test_ragged_rows_and_absent_fields() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<Row> = vec![
        row_of(&["b"]),
        vec![None, Some("z".to_string())],
        row_of(&["a", "b", "c"]),
        row_of(&["", "a"]),
        row_of(&["a"]),
    ];
    let input = write_input(dir.path(), &rows);
    let output = dir.path().join("output.dat");

    // The default budget fits this input in one batch, which is sorted
    // stably: rows that compare equal keep their input order.
    sort(&input, &output).unwrap();
    let sorted = read_rows(&output, Compression::default()).unwrap();

    assert_eq!(
        sorted,
        vec![
            row_of(&["", "a"]),
            vec![None, Some("z".to_string())],
            row_of(&["a", "b", "c"]),
            row_of(&["a"]),
            row_of(&["b"]),
        ]
    );
}

#[test]
fn test_custom_comparator() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<Row> = (0..200).map(|i| row_of(&[i.to_string()])).collect();
    let input = write_input(dir.path(), &rows);
    let output = dir.path().join("output.dat");

    let numeric_desc = |a: &Row, b: &Row| {
        let key = |r: &Row| r[0].as_deref().unwrap_or("0").parse::<i64>().unwrap_or(0);
        key(b).cmp(&key(a))
    };
    ExternalSorter::new(config_with_segments(dir.path(), 16))
        .sort_by(&input, &output, numeric_desc)
        .unwrap();

    let sorted = read_rows(&output, Compression::default()).unwrap();
    let expected: Vec<Row> = (0..200).rev().map(|i| row_of(&[i.to_string()])).collect();
    assert_eq!(sorted, expected);
}

#[test]
fn test_uncompressed_streams() {
    let dir = tempfile::tempdir().unwrap();
    let rows = fixed_width_rows(500, 5);
    let input = dir.path().join("input.raw");
    write_rows(&input, rows.clone(), Compression::None).unwrap();
    let output = dir.path().join("output.raw");

    let config = SortConfig {
        compression: Compression::None,
        ..config_with_segments(dir.path(), 8)
    };
    ExternalSorter::new(config).sort(&input, &output).unwrap();

    let sorted = read_rows(&output, Compression::None).unwrap();
    assert_sorted(&sorted);
    assert_eq!(canonical(sorted), canonical(rows));
}

#[test]
fn test_corrupt_input_fails_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.raw");
    write_rows(&input, random_rows(300, 9), Compression::None).unwrap();
    let mut bytes = fs::read(&input).unwrap();
    bytes.extend_from_slice(&[0, 0, 0, 2, 1, 0]);
    fs::write(&input, &bytes).unwrap();
    let output = dir.path().join("output.raw");

    let config = SortConfig {
        compression: Compression::None,
        ..config_with_segments(dir.path(), 64)
    };
    let err = ExternalSorter::new(config).sort(&input, &output).unwrap_err();

    assert!(matches!(err, SortError::Decode { .. }));
    assert!(!output.exists());
    assert_eq!(count_files(&spill_dir(dir.path())), 0);
}

#[test]
fn test_cancelled_sort_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &random_rows(500, 13));
    let output = dir.path().join("output.dat");

    let token = CancellationToken::new();
    token.cancel();
    let err = ExternalSorter::new(config_with_segments(dir.path(), 64))
        .with_cancellation(token)
        .sort(&input, &output)
        .unwrap_err();

    assert!(matches!(err, SortError::Cancelled));
    assert!(!output.exists());
    assert_eq!(count_files(&spill_dir(dir.path())), 0);
}

#[test]
fn test_output_spans_compression_resets() {
    let dir = tempfile::tempdir().unwrap();
    let rows = fixed_width_rows(25_000, 21);
    let input = write_input(dir.path(), &rows);
    let output = dir.path().join("output.dat");

    // Default flush interval: the merge output crosses two compression resets.
    ExternalSorter::new(config_with_segments(dir.path(), 4))
        .sort(&input, &output)
        .unwrap();

    let sorted = read_rows(&output, Compression::default()).unwrap();
    assert_eq!(sorted.len(), 25_000);
    assert_sorted(&sorted);
}
