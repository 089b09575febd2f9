#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rowsort::{Compression, Row, SortConfig, row_of, write_rows};

/// Config that sizes batches from the input length alone, so small inputs
/// still spill into several segments.
pub fn config_with_segments(dir: &Path, max_segments: u32) -> SortConfig {
    SortConfig {
        max_segments,
        temp_dir: spill_dir(dir),
        use_free_memory: false,
        ..SortConfig::default()
    }
}

pub fn spill_dir(dir: &Path) -> PathBuf {
    dir.join("spill")
}

pub fn write_input(dir: &Path, rows: &[Row]) -> PathBuf {
    let path = dir.join("input.dat");
    write_rows(&path, rows.iter().cloned(), Compression::default()).unwrap();
    path
}

pub fn rows_of(data: &[&[&str]]) -> Vec<Row> {
    data.iter().map(|fields| row_of(*fields)).collect()
}

/// Random rows with a fixed seed: 1-4 columns, small alphabet so that
/// duplicate keys are common, some absent fields.
pub fn random_rows(count: usize, seed: u64) -> Vec<Row> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut rows: Vec<Row> = (0..count)
        .map(|_| {
            let columns = rng.random_range(1..=4);
            (0..columns)
                .map(|_| {
                    if rng.random_bool(0.1) {
                        None
                    } else {
                        Some(format!("{}", rng.random_range(0..50u32)))
                    }
                })
                .collect()
        })
        .collect();
    rows.shuffle(&mut rng);
    rows
}

/// Random three-column rows with a fixed seed. Equal widths make the
/// column-wise comparison a total preorder, so sorted output can be checked
/// pair by pair.
pub fn fixed_width_rows(count: usize, seed: u64) -> Vec<Row> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (0..3)
                .map(|_| {
                    if rng.random_bool(0.1) {
                        None
                    } else {
                        Some(format!("{}", rng.random_range(0..50u32)))
                    }
                })
                .collect()
        })
        .collect()
}

pub fn count_files(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).count(),
        Err(_) => 0,
    }
}
