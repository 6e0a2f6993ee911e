//! Adaptive Huffman Compression
//!
//! One-pass Huffman coding in the manner of Faller, Gallager and Knuth.
//! No frequency table is stored, the decoder rebuilds the encoder's tree
//! symbol by symbol.
//!
//! * There is no header, the stream is a bare sequence of codes
//! * A symbol seen for the first time is sent as the NYT code followed by a 9 bit literal
//! * The end of data is marked by the code for EOT (256), trailing pad bits are ignored
//! * Streams are read and written sequentially, no `Seek` is needed

use std::io::{Cursor,Read,Write,BufReader,ErrorKind};
use crate::tools::code_tree::{CodeTree,SYMBOL_COUNT};
use crate::DYNERR;
pub use crate::tools::code_tree::EOT;
pub use crate::tools::bit_channel::{BitReader,BitWriter};

/// width of the literal following an NYT code, wide enough for EOT
const LITERAL_BITS: usize = 9;

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// Return an error if the stream is truncated or holds an impossible literal,
    /// otherwise expansion stops quietly and keeps what was decoded.
    pub strict: bool
}

pub const STD_OPTIONS: Options = Options {
    strict: false
};

/// Outcome of decoding one unit of the stream
#[derive(Debug,PartialEq)]
pub enum Decoded {
    Symbol(u8),
    /// the EOT code was read
    End,
    /// stream ran out mid-code or mid-literal
    Truncated,
    /// literal beyond the alphabet, the stream is corrupt
    BadLiteral(usize)
}

/// Symbol level coder, one instance per stream.
pub struct FgkHuffman {
    tree: CodeTree
}

impl FgkHuffman {
    pub fn new() -> Self {
        Self {
            tree: CodeTree::create()
        }
    }
    /// start over with an empty tree, as at the beginning of a stream
    pub fn reset(&mut self) {
        self.tree.reset();
    }
    /// Write the code for `symbol` using the tree as it stands, then update the tree.
    /// Returns the number of bits written.
    pub fn encode_symbol<W: Write>(&mut self,symbol: usize,obuf: &mut BitWriter<W>) -> std::io::Result<usize> {
        let len = match self.tree.leaf(symbol) {
            Some(leaf) => {
                let code = self.tree.path_of(leaf);
                obuf.put_bits(&code)?;
                code.len()
            },
            None => {
                let code = self.tree.path_of(self.tree.nyt());
                obuf.put_bits(&code)?;
                obuf.put_code(LITERAL_BITS,symbol)?;
                code.len() + LITERAL_BITS
            }
        };
        log::trace!("symbol {} took {} bits",symbol,len);
        self.tree.update(symbol);
        Ok(len)
    }
    /// Walk from the root to a leaf and resolve it to a symbol, updating the tree
    /// unless the symbol is EOT.
    pub fn decode_symbol<R: Read>(&mut self,ibuf: &mut BitReader<R>) -> std::io::Result<Decoded> {
        let mut node = self.tree.root();
        while !self.tree.is_leaf(node) {
            let bit = match ibuf.get_bit()? {
                Some(bit) => bit,
                None => return Ok(Decoded::Truncated)
            };
            node = match self.tree.child(node,bit) {
                Some(child) => child,
                None => return Ok(Decoded::Truncated)
            };
        }
        let symbol = match self.tree.symbol(node) {
            Some(s) => s,
            None => match ibuf.get_code(LITERAL_BITS)? {
                Some(s) if s < SYMBOL_COUNT => s,
                Some(s) => return Ok(Decoded::BadLiteral(s)),
                None => return Ok(Decoded::Truncated)
            }
        };
        if symbol == EOT {
            return Ok(Decoded::End);
        }
        self.tree.update(symbol);
        Ok(Decoded::Symbol(symbol as u8))
    }
}

/// Main compression function.
/// `expanded_in` is an object with `Read`, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with `Write`, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, _opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read, W: Write {
    let mut reader = BufReader::new(expanded_in);
    let mut writer = BitWriter::new(compressed_out);
    let mut huff = FgkHuffman::new();
    let mut in_size: u64 = 0;
    let mut out_bits: u64 = 0;
    let mut sym_in: [u8;1] = [0];
    log::debug!("entering loop over symbols");
    loop {
        match reader.read_exact(&mut sym_in) {
            Ok(()) => {
                out_bits += huff.encode_symbol(sym_in[0] as usize,&mut writer)? as u64;
                in_size += 1;
            },
            Err(e) if e.kind()==ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Box::new(e))
        }
    }
    out_bits += huff.encode_symbol(EOT,&mut writer)? as u64;
    log::debug!("{} symbols coded in {} bits",in_size,out_bits);
    let out_size = writer.flush()?;
    Ok((in_size,out_size))
}

/// Main decompression function.
/// `compressed_in` is an object with `Read`, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with `Write`, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.  A truncated stream is only an error if `opt.strict` is set.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read, W: Write {
    let mut reader = BitReader::new(compressed_in);
    let mut writer = std::io::BufWriter::new(expanded_out);
    let mut huff = FgkHuffman::new();
    let mut out_size: u64 = 0;
    log::debug!("entering loop over codes");
    loop {
        match huff.decode_symbol(&mut reader)? {
            Decoded::Symbol(c) => {
                writer.write_all(&[c])?;
                out_size += 1;
            },
            Decoded::End => {
                log::debug!("end of transmission after {} symbols",out_size);
                break;
            },
            Decoded::Truncated => {
                if opt.strict {
                    writer.flush()?;
                    return Err(Box::new(crate::Error::UnterminatedStream));
                }
                log::warn!("stream ended without EOT, keeping {} symbols",out_size);
                break;
            },
            Decoded::BadLiteral(s) => {
                if opt.strict {
                    writer.flush()?;
                    return Err(Box::new(crate::Error::InvalidLiteral(s)));
                }
                log::warn!("literal {} is out of range, keeping {} symbols",s,out_size);
                break;
            }
        }
    }
    writer.flush()?;
    Ok((reader.bytes_in(),out_size))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

// *************** TESTS *****************

#[test]
fn compression_works() {
    let compressed = compress_slice("AAAAB".as_bytes(),&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode("20F1088000").unwrap());

    let compressed = compress_slice("A".as_bytes(),&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode("20A000").unwrap());
}

#[test]
fn empty_input() {
    // only the NYT escape (empty code) and the EOT literal 1 0000 0000
    let compressed = compress_slice(&[],&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode("8000").unwrap());
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert!(expanded.is_empty());
}

#[test]
fn code_lengths() {
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    let mut huff = FgkHuffman::new();
    // first A: empty NYT code + literal, then one bit each
    assert_eq!(huff.encode_symbol(b'A' as usize,&mut writer).unwrap(),9);
    for _i in 0..3 {
        assert_eq!(huff.encode_symbol(b'A' as usize,&mut writer).unwrap(),1);
    }
    // B escapes through NYT at "0", then EOT escapes through NYT at "00"
    assert_eq!(huff.encode_symbol(b'B' as usize,&mut writer).unwrap(),10);
    assert_eq!(huff.encode_symbol(EOT,&mut writer).unwrap(),11);
}

#[test]
fn new_symbol_cost() {
    let text = "the quick brown fox jumps over the lazy dog".as_bytes();
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    let mut huff = FgkHuffman::new();
    for &c in text {
        let expected = match huff.tree.leaf(c as usize) {
            Some(leaf) => huff.tree.path_of(leaf).len(),
            None => huff.tree.path_of(huff.tree.nyt()).len() + LITERAL_BITS
        };
        assert_eq!(huff.encode_symbol(c as usize,&mut writer).unwrap(),expected);
    }
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data = "AAAAB".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility_all_bytes() {
    // every byte value, then a skewed tail, exercises a full tree
    let mut test_data: Vec<u8> = (0..=255).collect();
    for i in 0..2000 {
        test_data.push(((i * i) % 17) as u8);
    }
    test_data.extend((0..=255).rev());
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn repeated_symbol() {
    let test_data = "BBBBBBBB".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    // literal, seven single bit codes, NYT code "0" and the EOT literal
    assert_eq!(compressed.len(),4);
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn determinism() {
    let test_data = "abracadabra, abracadabra, mississippi".as_bytes();
    let c1 = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let c2 = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(c1,c2);
    let x1 = expand_slice(&c1,&STD_OPTIONS).expect("expansion failed");
    let x2 = expand_slice(&c2,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(x1,x2);
}

#[test]
fn reuse_after_reset() {
    let mut huff = FgkHuffman::new();
    let mut scratch: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut scratch);
    for c in "xyzzy".bytes() {
        huff.encode_symbol(c as usize,&mut writer).unwrap();
    }
    drop(writer);
    huff.reset();
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    for c in "AAAAB".bytes() {
        huff.encode_symbol(c as usize,&mut writer).unwrap();
    }
    huff.encode_symbol(EOT,&mut writer).unwrap();
    writer.flush().unwrap();
    drop(writer);
    assert_eq!(out,hex::decode("20F1088000").unwrap());
}

#[test]
fn truncation_is_tolerated() {
    // 20 F1 08 80 00 is AAAAB; without the last two bytes B is complete but EOT is lost
    let expanded = expand_slice(&hex::decode("20F108").unwrap(),&STD_OPTIONS).expect("expansion failed");
    assert_eq!(expanded,"AAAAB".as_bytes().to_vec());
    // cut inside the literal for B
    let expanded = expand_slice(&hex::decode("20F1").unwrap(),&STD_OPTIONS).expect("expansion failed");
    assert_eq!(expanded,"AAAA".as_bytes().to_vec());
    let expanded = expand_slice(&[],&STD_OPTIONS).expect("expansion failed");
    assert!(expanded.is_empty());
}

#[test]
fn strict_rejects_truncation() {
    let opt = Options { strict: true };
    let expanded = expand_slice(&hex::decode("20F1088000").unwrap(),&opt).expect("expansion failed");
    assert_eq!(expanded,"AAAAB".as_bytes().to_vec());
    match expand_slice(&hex::decode("20F108").unwrap(),&opt) {
        Err(e) => assert!(e.downcast_ref::<crate::Error>().is_some()),
        Ok(_) => panic!("truncated stream was accepted")
    }
}

#[test]
fn out_of_range_literal() {
    // first literal 1 1111 1111 can never be produced
    let expanded = expand_slice(&[0xff,0x80],&STD_OPTIONS).expect("expansion failed");
    assert!(expanded.is_empty());
    let opt = Options { strict: true };
    match expand_slice(&[0xff,0x80],&opt) {
        Err(e) => match e.downcast_ref::<crate::Error>() {
            Some(crate::Error::InvalidLiteral(511)) => {},
            _ => panic!("unexpected error {}",e)
        },
        Ok(_) => panic!("corrupt stream was accepted")
    }
}
