#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(code(rfse::io))]
    Io(#[from] rfse_io::Error),

    #[error("Table log {0} is out of range")]
    #[diagnostic(
        code(rfse::table_log_out_of_range),
        help("Supported table logs are 5..=12.")
    )]
    TableLogOutOfRange(u32),

    #[error("Too many symbols: {0}")]
    #[diagnostic(
        code(rfse::too_many_symbols),
        help("At most 256 distinct symbol values are supported.")
    )]
    TooManySymbols(usize),

    #[error("Empty input")]
    #[diagnostic(code(rfse::empty_input), help("At least one input symbol is required."))]
    EmptyInput,

    #[error("Symbol {symbol:#04x} is outside the declared alphabet of {cap} values")]
    #[diagnostic(
        code(rfse::bad_symbol),
        help("Every input byte must be below the symbol cap passed to the encoder.")
    )]
    BadSymbol { symbol: u8, cap: usize },

    #[error("Distribution sum mismatch ({0} remaining)")]
    #[diagnostic(
        code(rfse::sum_mismatch),
        help("The normalized counts must sum to exactly the table size.")
    )]
    SumMismatch(i32),

    #[error("Spread misalignment (pos: {0})")]
    #[diagnostic(
        code(rfse::spread_misalignment),
        help("The symbol spread did not return to slot 0; the distribution is inconsistent.")
    )]
    SpreadMisalignment(usize),

    #[error("Block too large: {0} bytes")]
    #[diagnostic(
        code(rfse::block_too_large),
        help("A compressed stream's byte length must fit the descriptor's 27-bit field.")
    )]
    BlockTooLarge(usize),

    #[error("Unsupported state count: {0}")]
    #[diagnostic(
        code(rfse::unsupported_state_count),
        help("Streams carry one or two interleaved states.")
    )]
    UnsupportedStateCount(u32),

    #[error("Input truncated: needed {needed} bytes, got {available}")]
    #[diagnostic(
        code(rfse::truncated),
        help("The compressed input ends before the frame does.")
    )]
    Truncated { needed: usize, available: usize },

    #[error("Malformed stream")]
    #[diagnostic(
        code(rfse::malformed_stream),
        help("The payload did not decode back to its own start; the data is corrupted.")
    )]
    MalformedStream,
}
