/// How a block was represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Raw,
    SingleSymbol,
    Fse,
}

/// Per-block compression report, delivered through [`BlockObserver`].
#[derive(Debug, Clone, Copy)]
pub struct BlockMetrics {
    pub mode: BlockMode,
    pub uncompressed_bytes: usize,
    /// Distribution header bytes (0 outside FSE mode).
    pub header_bytes: usize,
    /// Descriptor + bitstream bytes (mode byte and header excluded).
    pub payload_bytes: usize,
    /// 0 outside FSE mode.
    pub table_log: u32,
    /// Shannon ideal for the block's empirical distribution, in bits.
    pub entropy_bits: f64,
}

/// Injected sink for per-block metrics. Compression never keeps state of its
/// own; callers that want statistics pass an observer to
/// [`compress_observed`](crate::compress_observed).
pub trait BlockObserver {
    fn record(&mut self, metrics: &BlockMetrics);
}

/// Discards every report; the plain compression entry points use this.
impl BlockObserver for () {
    fn record(&mut self, _metrics: &BlockMetrics) {}
}
