use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write, stdout},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use rfse::{BlockMetrics, BlockObserver};
use tracing_subscriber::{EnvFilter, prelude::*};

/// Container layout: a magic word, then one `[raw_len u32][comp_len u32]`
/// record per block followed by its compressed bytes. Everything little
/// endian.
const MAGIC: u32 = 0x4553_4652; // "RFSE"
const BLOCK_SIZE: usize = 64 * 1024;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compresses a file
    Compress(IoArgs),

    /// Decompresses a file
    Decompress(IoArgs),
}

#[derive(Args)]
struct IoArgs {
    /// Input file
    input: PathBuf,

    /// Output file
    output: Option<PathBuf>,
}

#[derive(Default)]
struct Totals {
    blocks: usize,
    raw_bytes: usize,
    compressed_bytes: usize,
    entropy_bits: f64,
}

impl BlockObserver for Totals {
    fn record(&mut self, metrics: &BlockMetrics) {
        self.blocks += 1;
        self.raw_bytes += metrics.uncompressed_bytes;
        self.compressed_bytes += 1 + metrics.header_bytes + metrics.payload_bytes;
        self.entropy_bits += metrics.entropy_bits;
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let file_appender = tracing_appender::rolling::never("target", "rfse.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .without_time()
        .with_level(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(stdout)
        .with_ansi(true)
        .without_time()
        .with_level(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(file_layer)
        .with(stdout_layer)
        .init();

    match cli.command {
        Commands::Compress(args) => {
            let (mut reader, mut writer) = open(&args, "rfse")?;
            compress(&mut reader, &mut writer)
        }
        Commands::Decompress(args) => {
            let (mut reader, mut writer) = open(&args, "out")?;
            decompress(&mut reader, &mut writer)
        }
    }
}

fn open(args: &IoArgs, extension: &str) -> miette::Result<(BufReader<File>, BufWriter<File>)> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension(extension));

    let input = File::open(&args.input).into_diagnostic()?;
    let output = File::create(output).into_diagnostic()?;
    Ok((BufReader::new(input), BufWriter::new(output)))
}

fn compress(reader: &mut impl Read, writer: &mut impl Write) -> miette::Result<()> {
    writer.write_all(&MAGIC.to_le_bytes()).into_diagnostic()?;

    let mut block = vec![0u8; BLOCK_SIZE];
    let mut compressed = vec![0u8; rfse::compress_bound(BLOCK_SIZE)];
    let mut totals = Totals::default();

    loop {
        let raw_len = read_block(reader, &mut block)?;
        if raw_len == 0 {
            break;
        }

        let comp_len = rfse::compress_observed(
            &mut compressed,
            &block[..raw_len],
            rfse::MAX_SYMBOLS,
            0,
            &mut totals,
        )?;

        writer
            .write_all(&(raw_len as u32).to_le_bytes())
            .into_diagnostic()?;
        writer
            .write_all(&(comp_len as u32).to_le_bytes())
            .into_diagnostic()?;
        writer.write_all(&compressed[..comp_len]).into_diagnostic()?;
    }

    tracing::info!(
        blocks = totals.blocks,
        raw_bytes = totals.raw_bytes,
        compressed_bytes = totals.compressed_bytes,
        entropy_bytes = (totals.entropy_bits / 8.0).ceil(),
        "compressed"
    );
    writer.flush().into_diagnostic()?;
    Ok(())
}

fn decompress(reader: &mut impl Read, writer: &mut impl Write) -> miette::Result<()> {
    let mut word = [0u8; 4];
    reader.read_exact(&mut word).into_diagnostic()?;
    if u32::from_le_bytes(word) != MAGIC {
        return Err(miette::miette!("not an rfse container"));
    }

    let mut compressed = Vec::new();
    let mut block = Vec::new();

    loop {
        match reader.read_exact(&mut word) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e).into_diagnostic(),
        }
        let raw_len = u32::from_le_bytes(word) as usize;

        reader.read_exact(&mut word).into_diagnostic()?;
        let comp_len = u32::from_le_bytes(word) as usize;

        if raw_len > BLOCK_SIZE || comp_len > rfse::compress_bound(BLOCK_SIZE) {
            return Err(miette::miette!("oversized block in container"));
        }

        compressed.resize(comp_len, 0);
        reader.read_exact(&mut compressed).into_diagnostic()?;

        block.resize(raw_len, 0);
        let consumed = rfse::decompress_safe(&mut block, &compressed, comp_len)?;
        if consumed != comp_len {
            return Err(miette::miette!(
                "block length mismatch: consumed {consumed} of {comp_len} bytes"
            ));
        }
        writer.write_all(&block).into_diagnostic()?;
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}

fn read_block(reader: &mut impl Read, block: &mut [u8]) -> miette::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        let n = reader.read(&mut block[filled..]).into_diagnostic()?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
