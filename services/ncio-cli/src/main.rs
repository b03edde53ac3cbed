//! `ncio`: write, dump and copy 2D NetCDF datasets through buffered
//! row streams.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use row_stream::StreamConfig;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ncio")]
#[command(about = "Buffered chunked access to 2D NetCDF datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Variable holding the 2D data
    #[arg(long, global = true, env = "NCIO_VARIABLE")]
    variable: Option<String>,

    /// Row dimension name
    #[arg(long, global = true, env = "NCIO_ROW_DIM")]
    row_dim: Option<String>,

    /// Column dimension name
    #[arg(long, global = true, env = "NCIO_COL_DIM")]
    col_dim: Option<String>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the reference 12-row file and read it back in 5-row chunks
    Demo {
        /// Directory the demo file is written to
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Print a dataset chunk by chunk until end of stream
    Dump {
        /// NetCDF file to read
        file: PathBuf,

        /// Rows per printed chunk
        #[arg(long, default_value = "5")]
        chunk_rows: usize,

        /// Reader buffer capacity in rows
        #[arg(long, env = "NCIO_BUFFER_ROWS", default_value = "1024")]
        buffer_rows: usize,

        /// Element type of the variable
        #[arg(long, value_enum, default_value = "f32")]
        dtype: Dtype,
    },

    /// Re-stream a dataset into a new file
    Copy {
        /// Source NetCDF file
        src: PathBuf,

        /// Destination NetCDF file, overwritten if present
        dst: PathBuf,

        /// Rows moved per chunk
        #[arg(long, default_value = "64")]
        chunk_rows: usize,

        /// Reader buffer capacity in rows
        #[arg(long, default_value = "1024")]
        read_buffer: usize,

        /// Writer buffer capacity in rows
        #[arg(long, default_value = "1024")]
        write_buffer: usize,

        /// Element type of the variable
        #[arg(long, value_enum, default_value = "f32")]
        dtype: Dtype,
    },
}

/// Element types selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Dtype {
    F32,
    F64,
    I32,
    I16,
}

impl Cli {
    /// Environment defaults overridden by explicit flags.
    fn stream_config(&self) -> StreamConfig {
        let mut config = StreamConfig::from_env();
        if let Some(variable) = &self.variable {
            config.variable = variable.clone();
        }
        if let Some(row_dim) = &self.row_dim {
            config.row_dimension = row_dim.clone();
        }
        if let Some(col_dim) = &self.col_dim {
            config.column_dimension = col_dim.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if cli.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    nc_store::silence_hdf5_errors();
    let config = cli.stream_config();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        variable = %config.variable,
        row_dim = %config.row_dimension,
        col_dim = %config.column_dimension,
        "Loaded configuration"
    );

    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::Demo { dir } => commands::demo(&dir, &config, &mut out),
        Commands::Dump {
            file,
            chunk_rows,
            buffer_rows,
            dtype,
        } => {
            let config = config.with_buffer_rows(buffer_rows);
            match dtype {
                Dtype::F32 => commands::dump::<f32>(&file, chunk_rows, &config, &mut out),
                Dtype::F64 => commands::dump::<f64>(&file, chunk_rows, &config, &mut out),
                Dtype::I32 => commands::dump::<i32>(&file, chunk_rows, &config, &mut out),
                Dtype::I16 => commands::dump::<i16>(&file, chunk_rows, &config, &mut out),
            }
        }
        Commands::Copy {
            src,
            dst,
            chunk_rows,
            read_buffer,
            write_buffer,
            dtype,
        } => {
            let plan = commands::CopyPlan {
                chunk_rows,
                read_buffer,
                write_buffer,
            };
            let summary = match dtype {
                Dtype::F32 => commands::copy::<f32>(&src, &dst, &plan, &config)?,
                Dtype::F64 => commands::copy::<f64>(&src, &dst, &plan, &config)?,
                Dtype::I32 => commands::copy::<i32>(&src, &dst, &plan, &config)?,
                Dtype::I16 => commands::copy::<i16>(&src, &dst, &plan, &config)?,
            };
            info!(
                src = %src.display(),
                dst = %dst.display(),
                rows = summary.rows,
                refills = summary.refills,
                flushes = summary.flushes,
                "Copy complete"
            );
            Ok(())
        }
    }
}
