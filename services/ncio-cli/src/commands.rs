//! Subcommand implementations.

use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use nc_store::Element;
use ncio_common::Dense2D;
use row_stream::{NetCdfReader, NetCdfWriter, StreamConfig};
use tracing::info;

/// Columns of the demo dataset.
const DEMO_NCOLS: usize = 5;
/// Rows per chunk written by the demo; chunk `k` holds the value `k`.
const DEMO_WRITE_CHUNK: usize = 3;
const DEMO_WRITE_BUFFER: usize = 7;
const DEMO_READ_CHUNK: usize = 5;
/// Larger than the dataset on purpose, so the reader clamps it.
const DEMO_READ_BUFFER: usize = 14;

/// Buffer and chunk sizes for `copy`.
#[derive(Debug, Clone, Copy)]
pub struct CopyPlan {
    pub chunk_rows: usize,
    pub read_buffer: usize,
    pub write_buffer: usize,
}

/// Counters reported after a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub rows: u64,
    pub refills: u64,
    pub flushes: u64,
}

/// Write four 3-row chunks through a 7-row writer buffer, then read the file
/// back in 5-row chunks until the first fully padded chunk.
pub fn demo(dir: &Path, config: &StreamConfig, out: &mut impl Write) -> Result<()> {
    let path = dir.join("test_write.nc");

    info!(path = %path.display(), "Writing test file");
    let mut writer: NetCdfWriter<f32> = NetCdfWriter::create(
        &path,
        &config.variable,
        &config.row_dimension,
        &config.column_dimension,
        DEMO_NCOLS,
        DEMO_WRITE_BUFFER,
    )?;
    for step in 1..=4i16 {
        let chunk = Dense2D::filled(DEMO_WRITE_CHUNK, DEMO_NCOLS, f32::from(step));
        writer.write_chunk(&chunk)?;
    }
    writer.close()?;

    info!(path = %path.display(), "Reading test file");
    let mut reader: NetCdfReader<f32> = NetCdfReader::open(
        &path,
        &config.variable,
        &config.row_dimension,
        &config.column_dimension,
        DEMO_READ_BUFFER,
    )?;
    let mut chunk = Dense2D::new(DEMO_READ_CHUNK, DEMO_NCOLS);
    loop {
        let read = reader.read_chunk(&mut chunk)?;
        print_chunk(&chunk, out)?;
        writeln!(out)?;
        if read.is_end_of_stream() {
            break;
        }
    }
    reader.close()?;
    Ok(())
}

/// Print `file` in chunks of `chunk_rows`, padding included, until the data
/// runs out.
pub fn dump<T: Element + Display>(
    file: &Path,
    chunk_rows: usize,
    config: &StreamConfig,
    out: &mut impl Write,
) -> Result<()> {
    if chunk_rows == 0 {
        bail!("--chunk-rows must be > 0");
    }

    let mut reader: NetCdfReader<T> = NetCdfReader::open_with(file, config)
        .with_context(|| format!("failed to open {}", file.display()))?;
    writeln!(out, "# {}", reader.descriptor())?;

    let mut chunk = Dense2D::new(chunk_rows, reader.ncols());
    loop {
        let read = reader.read_chunk(&mut chunk)?;
        if read.is_end_of_stream() {
            break;
        }
        print_chunk(&chunk, out)?;
        writeln!(out)?;
    }

    let stats = reader.stats();
    reader.close()?;
    info!(
        rows = stats.rows,
        padded_rows = stats.padded_rows,
        refills = stats.store_calls,
        "Dump complete"
    );
    Ok(())
}

/// Stream every row of `src` into a newly created `dst`.
pub fn copy<T: Element>(
    src: &Path,
    dst: &Path,
    plan: &CopyPlan,
    config: &StreamConfig,
) -> Result<CopySummary> {
    if plan.chunk_rows == 0 {
        bail!("--chunk-rows must be > 0");
    }

    let mut reader: NetCdfReader<T> = NetCdfReader::open(
        src,
        &config.variable,
        &config.row_dimension,
        &config.column_dimension,
        plan.read_buffer,
    )
    .with_context(|| format!("failed to open {}", src.display()))?;
    let ncols = reader.ncols();

    let mut writer: NetCdfWriter<T> = NetCdfWriter::create(
        dst,
        &config.variable,
        &config.row_dimension,
        &config.column_dimension,
        ncols,
        plan.write_buffer,
    )
    .with_context(|| format!("failed to create {}", dst.display()))?;

    let mut chunk = Dense2D::new(plan.chunk_rows, ncols);
    loop {
        let read = reader.read_chunk(&mut chunk)?;
        if read.is_empty() {
            break;
        }
        if read.is_padded() {
            let rows = chunk.row_block(0, read.rows_read)?.to_vec();
            writer.write_chunk(&Dense2D::from_vec(read.rows_read, ncols, rows)?)?;
            break;
        }
        writer.write_chunk(&chunk)?;
    }

    writer.close()?;
    reader.close()?;
    Ok(CopySummary {
        rows: writer.stats().rows,
        refills: reader.stats().store_calls,
        flushes: writer.stats().store_calls,
    })
}

fn print_chunk<T: Element + Display>(chunk: &Dense2D<T>, out: &mut impl Write) -> Result<()> {
    for row in chunk.iter_rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}
