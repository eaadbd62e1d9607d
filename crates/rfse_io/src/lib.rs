mod bit_reader;
mod bit_writer;
mod reverse_bit_reader;

pub use bit_reader::BitReader;
pub use bit_writer::BitWriter;
pub use reverse_bit_reader::ReverseBitReader;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error("Destination buffer too small")]
    #[diagnostic(
        code(rfse::io::dst_too_small),
        help("The output slice cannot hold the bits queued for flushing.")
    )]
    DstTooSmall,

    #[error("Stream too short: needed {needed} bytes, got {available}")]
    #[diagnostic(
        code(rfse::io::truncated),
        help("The input ends before the bit container could be initialized.")
    )]
    Truncated { needed: usize, available: usize },

    #[error("Bit stream rewound past its start")]
    #[diagnostic(
        code(rfse::io::stream_underflow),
        help("The backward reader consumed more bits than the payload holds.")
    )]
    StreamUnderflow,
}
