#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(code(rfse::dist::fse))]
    Fse(#[from] rfse::Error),

    #[error(transparent)]
    #[diagnostic(code(rfse::dist::io))]
    Io(#[from] rfse_io::Error),

    #[error("Value {0} cannot be magnitude-coded")]
    #[diagnostic(
        code(rfse::dist::bad_value),
        help("Values must be nonzero and below the codec's magnitude ceiling.")
    )]
    BadValue(u32),

    #[error("Table log {0} is out of range for this codec")]
    #[diagnostic(
        code(rfse::dist::table_log_out_of_range),
        help("The integer codecs cap the table log below the byte codec's maximum.")
    )]
    TableLogOutOfRange(u32),

    #[error("Input truncated: needed {needed} bytes, got {available}")]
    #[diagnostic(
        code(rfse::dist::truncated),
        help("The compressed input ends before the frame does.")
    )]
    Truncated { needed: usize, available: usize },

    #[error("Malformed stream")]
    #[diagnostic(
        code(rfse::dist::malformed_stream),
        help("The payload did not decode back to its own start; the data is corrupted.")
    )]
    MalformedStream,
}
