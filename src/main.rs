use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rowsort::{Compression, ExternalSorter, Row, RowWriter, SortConfig};

#[derive(Parser)]
#[command(name = "rowsort", about = "External sort for compressed row-stream files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sort a row-stream file column by column
    Sort {
        input: PathBuf,
        output: PathBuf,

        /// Upper bound on the number of spill segments
        #[arg(long, default_value_t = 1024)]
        max_segments: u32,

        /// Directory for spill segments (defaults to the system temp dir)
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Codec::Gzip)]
        compression: Codec,

        /// Rows between encoder flushes
        #[arg(long, default_value_t = 10_000)]
        flush_interval: usize,

        /// Size batches from the input length only, ignoring free memory
        #[arg(long)]
        ignore_free_memory: bool,
    },
    /// Write a file of random rows for testing
    Generate {
        output: PathBuf,

        #[arg(long, default_value_t = 100_000)]
        rows: u64,

        #[arg(long, default_value_t = 4)]
        columns: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Probability that a field is absent
        #[arg(long, default_value_t = 0.05, value_parser = parse_ratio)]
        null_ratio: f64,

        #[arg(long, value_enum, default_value_t = Codec::Gzip)]
        compression: Codec,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Codec {
    Gzip,
    None,
}

impl From<Codec> for Compression {
    fn from(codec: Codec) -> Self {
        match codec {
            Codec::Gzip => Compression::default(),
            Codec::None => Compression::None,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Sort {
            input,
            output,
            max_segments,
            temp_dir,
            compression,
            flush_interval,
            ignore_free_memory,
        } => {
            let mut config = SortConfig {
                max_segments,
                compression: compression.into(),
                flush_interval,
                use_free_memory: !ignore_free_memory,
                ..SortConfig::default()
            };
            if let Some(dir) = temp_dir {
                config.temp_dir = dir;
            }
            ExternalSorter::new(config)
                .sort(&input, &output)
                .map(|stats| println!("{}", stats))
        }
        Command::Generate {
            output,
            rows,
            columns,
            seed,
            null_ratio,
            compression,
        } => generate(&output, rows, columns, seed, null_ratio, compression.into()).map(|count| {
            println!("Generated {} rows into {}", count, output.display());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_ratio(s: &str) -> Result<f64, String> {
    let ratio: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("{s} is not a probability between 0 and 1"))
    }
}

fn generate(
    output: &Path,
    rows: u64,
    columns: usize,
    seed: u64,
    null_ratio: f64,
    compression: Compression,
) -> rowsort::Result<u64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut writer = RowWriter::create(output, compression, 10_000)?;

    for _ in 0..rows {
        let row: Row = (0..columns)
            .map(|_| {
                if rng.random_bool(null_ratio) {
                    None
                } else {
                    Some(format!("{:08}", rng.random_range(0..100_000_000u32)))
                }
            })
            .collect();
        writer.write(&row)?;
    }
    writer.finish()
}
