//! Bit channel between the codec and byte streams.
//! Both sides are MSB first, the last byte written is padded on the right with zeros.

use bit_vec::BitVec;
use std::io::{Read,Write,BufReader,BufWriter,ErrorKind};

pub struct BitWriter<W: Write> {
    writer: BufWriter<W>,
    /// accumulator, bits enter on the right
    buf: u8,
    /// bits held in `buf`, 0-7 between calls
    count: u8,
    bytes_out: u64
}

pub struct BitReader<R: Read> {
    reader: BufReader<R>,
    buf: u8,
    /// bits not yet consumed from `buf`
    count: u8,
    bytes_in: u64
}

impl <W: Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            buf: 0,
            count: 0,
            bytes_out: 0
        }
    }
    pub fn put_bit(&mut self,bit: bool) -> std::io::Result<()> {
        self.buf = (self.buf << 1) | bit as u8;
        self.count += 1;
        if self.count == 8 {
            self.writer.write_all(&[self.buf])?;
            self.bytes_out += 1;
            self.buf = 0;
            self.count = 0;
        }
        Ok(())
    }
    pub fn put_bits(&mut self,bits: &BitVec) -> std::io::Result<()> {
        for bit in bits.iter() {
            self.put_bit(bit)?;
        }
        Ok(())
    }
    /// output the low `num_bits` of `code` starting from the MSB
    pub fn put_code(&mut self,num_bits: usize,code: usize) -> std::io::Result<()> {
        for i in (0..num_bits).rev() {
            self.put_bit((code >> i) & 1 > 0)?;
        }
        Ok(())
    }
    /// Pad any partial byte with zeros, write it, and flush the underlying stream.
    /// Returns the number of bytes written over the life of the channel.
    pub fn flush(&mut self) -> std::io::Result<u64> {
        if self.count > 0 {
            let pad = 8 - self.count;
            self.writer.write_all(&[self.buf << pad])?;
            self.bytes_out += 1;
            self.buf = 0;
            self.count = 0;
        }
        self.writer.flush()?;
        Ok(self.bytes_out)
    }
}

impl <R: Read> BitReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: 0,
            count: 0,
            bytes_in: 0
        }
    }
    /// Get the next bit, reading from the stream as needed.
    /// Returns None once the stream is exhausted.
    pub fn get_bit(&mut self) -> std::io::Result<Option<bool>> {
        if self.count == 0 {
            let mut by: [u8;1] = [0];
            match self.reader.read_exact(&mut by) {
                Ok(()) => {
                    self.buf = by[0];
                    self.count = 8;
                    self.bytes_in += 1;
                },
                Err(e) if e.kind()==ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e)
            }
        }
        self.count -= 1;
        Ok(Some((self.buf >> self.count) & 1 > 0))
    }
    /// Get `num_bits` as an MSB first integer, None if the stream runs out first.
    pub fn get_code(&mut self,num_bits: usize) -> std::io::Result<Option<usize>> {
        let mut ans: usize = 0;
        for _i in 0..num_bits {
            match self.get_bit()? {
                Some(bit) => ans = (ans << 1) | bit as usize,
                None => return Ok(None)
            }
        }
        Ok(Some(ans))
    }
    /// bytes pulled from the stream so far
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }
}

#[test]
fn msb_first_with_padding() {
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    writer.put_code(3,0b101).expect("write failed");
    writer.put_code(9,256).expect("write failed");
    assert_eq!(writer.flush().expect("flush failed"),2);
    drop(writer);
    assert_eq!(out,vec![0b1011_0000,0b0000_0000]);
}

#[test]
fn flush_of_whole_bytes_adds_nothing() {
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    assert_eq!(writer.flush().expect("flush failed"),0);
    writer.put_code(8,0xa5).expect("write failed");
    assert_eq!(writer.flush().expect("flush failed"),1);
    drop(writer);
    assert_eq!(out,vec![0xa5]);
}

#[test]
fn reader_signals_end_of_input() {
    let src: &[u8] = &[0b1000_0001];
    let mut reader = BitReader::new(src);
    assert_eq!(reader.get_bit().unwrap(),Some(true));
    assert_eq!(reader.get_code(6).unwrap(),Some(0));
    assert_eq!(reader.get_bit().unwrap(),Some(true));
    assert_eq!(reader.get_bit().unwrap(),None);
    assert_eq!(reader.bytes_in(),1);
}

#[test]
fn reader_gives_up_mid_code() {
    let src: &[u8] = &[0xff];
    let mut reader = BitReader::new(src);
    assert_eq!(reader.get_code(9).unwrap(),None);
}

#[test]
fn bits_pass_through_unchanged() {
    let path: BitVec = [true,false,false,true,true].into_iter().collect();
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    writer.put_bits(&path).expect("write failed");
    writer.put_bits(&path).expect("write failed");
    writer.flush().expect("flush failed");
    drop(writer);
    assert_eq!(out,vec![0b1001_1100,0b1100_0000]);
    let mut reader = BitReader::new(out.as_slice());
    for expected in path.iter().chain(path.iter()) {
        assert_eq!(reader.get_bit().unwrap(),Some(expected));
    }
}
