//! # FGK Compressor
//!
//! One-pass adaptive Huffman compression.  The code tree starts out as a single
//! "not yet transmitted" (NYT) leaf and is rebalanced after every symbol, so the
//! encoder and decoder stay in lockstep without ever exchanging a frequency table.
//!
//! * `fgk` is the public codec, it transforms streams or buffers
//! * the tree engine and bit channel are internal tools

mod tools;
pub mod fgk;

type DYNERR = Box<dyn std::error::Error>;

/// Stream Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("stream ended before the end-of-transmission code")]
    UnterminatedStream,
    #[error("literal symbol {0} is out of range")]
    InvalidLiteral(usize)
}
