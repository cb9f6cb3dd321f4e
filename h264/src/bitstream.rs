use super::{Error, Result};
use std::io;

pub struct Bitstream<T> {
    inner: T,
    bit_offset: usize,
}

impl<T: AsRef<[u8]>> Bitstream<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, bit_offset: 0 }
    }

    pub fn bits_remaining(&self) -> usize {
        self.inner.as_ref().len() * 8 - self.bit_offset
    }

    pub fn advance_bits(&mut self, n: usize) -> bool {
        if self.bits_remaining() < n {
            return false;
        }
        self.bit_offset += n;
        return true;
    }

    pub fn next_bits(&self, n: usize) -> Option<u64> {
        if self.bits_remaining() < n {
            return None;
        }
        let mut ret = 0;
        let data = self.inner.as_ref();
        for i in 0..n {
            ret = (ret << 1) | ((data[(self.bit_offset + i) / 8] >> (8 - (self.bit_offset + i) % 8 - 1)) & 1) as u64;
        }
        Some(ret)
    }

    pub fn read_bits(&mut self, n: usize) -> io::Result<u64> {
        match self.next_bits(n) {
            Some(ret) => {
                self.bit_offset += n;
                Ok(ret)
            }
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected end of bitstream")),
        }
    }

    pub fn decode<V: Decode>(&mut self, v: &mut V) -> io::Result<()> {
        *v = V::decode(self)?;
        Ok(())
    }
}

pub trait Decode: Sized {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self>;
}

#[macro_export]
macro_rules! decode {
    ($b:expr, $e:expr) => {{
        $b.decode($e)
    }};
    ($b:expr, $e:expr, $($r:expr),+) => {
        decode!($b, $e).and(decode!($b, $($r),+))
    };
}

enum Buffer<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl<'a> Buffer<'a> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Owned(v) => v,
            Buffer::Borrowed(s) => s,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Buffer::Owned(v) => v,
            Buffer::Borrowed(s) => s,
        }
    }
}

/// Writes bits most-significant first through a 32-bit accumulator. Whole bytes leave the
/// accumulator through a single byte path which optionally performs start code emulation
/// prevention.
///
/// Once a write fails for lack of space the writer is permanently overflowed and every further
/// write returns [`Error::BufferOverflow`].
pub struct BitstreamWriter<'a> {
    buffer: Buffer<'a>,
    offset: usize,
    pending: u32,
    // 1..=32, 32 means the accumulator is empty
    bits_to_go: u32,
    overflow: bool,
    allow_growth: bool,
    prevent_start_code: bool,
}

impl BitstreamWriter<'static> {
    /// Creates a writer that owns its storage and grows it by half whenever it runs out.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Buffer::Owned(vec![0; capacity]),
            offset: 0,
            pending: 0,
            bits_to_go: 32,
            overflow: false,
            allow_growth: true,
            prevent_start_code: false,
        }
    }
}

impl<'a> BitstreamWriter<'a> {
    /// Writes into caller storage starting at `offset`. Borrowed storage never grows.
    pub fn attach(buf: &'a mut [u8], offset: usize) -> Self {
        assert!(offset <= buf.len(), "attach offset {} past end of {} byte buffer", offset, buf.len());
        Self {
            buffer: Buffer::Borrowed(buf),
            offset,
            pending: 0,
            bits_to_go: 32,
            overflow: false,
            allow_growth: false,
            prevent_start_code: false,
        }
    }

    pub fn set_allow_growth(&mut self, allow: bool) {
        self.allow_growth = allow && matches!(self.buffer, Buffer::Owned(_));
    }

    pub fn set_start_code_prevention(&mut self, enabled: bool) {
        self.prevent_start_code = enabled;
    }

    pub fn start_code_prevention(&self) -> bool {
        self.prevent_start_code
    }

    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    pub fn capacity(&self) -> usize {
        self.buffer.as_slice().len()
    }

    pub fn bits_count(&self) -> usize {
        self.offset * 8 + (32 - self.bits_to_go) as usize
    }

    pub fn byte_count(&self) -> usize {
        self.offset + ((32 - self.bits_to_go) as usize + 7) / 8
    }

    /// An overflowed writer reports itself as aligned and drops whatever it was accumulating.
    pub fn is_byte_aligned(&mut self) -> bool {
        if self.overflow {
            self.bits_to_go = 32;
        }
        self.bits_to_go % 8 == 0
    }

    /// The bytes emitted so far. Bits still in the accumulator are not included until `flush`.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.offset]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let offset = self.offset;
        match self.buffer {
            Buffer::Owned(mut v) => {
                v.truncate(offset);
                v
            }
            Buffer::Borrowed(s) => s[..offset].to_vec(),
        }
    }

    /// The unwritten tail of the buffer, for writing bytes in place. Must be followed by
    /// [`advance`](Self::advance).
    pub fn current_buffer_mut(&mut self) -> &mut [u8] {
        let offset = self.offset;
        &mut self.buffer.as_mut_slice()[offset..]
    }

    pub fn advance(&mut self, n: usize) {
        assert_eq!(self.bits_to_go, 32, "advancing a writer with pending bits");
        assert!(self.offset + n <= self.capacity());
        self.offset += n;
    }

    fn overflow_error(&self) -> Error {
        Error::BufferOverflow { capacity: self.capacity() }
    }

    fn verify_buffer(&mut self, bytes: usize) -> Result<()> {
        if self.overflow {
            return Err(self.overflow_error());
        }
        let required = self.offset + bytes;
        if required <= self.capacity() {
            return Ok(());
        }
        if self.allow_growth {
            if let Buffer::Owned(v) = &mut self.buffer {
                let grown = v.len() + v.len() / 2;
                v.resize(grown.max(required), 0);
                return Ok(());
            }
        }
        log::warn!("bitstream writer overflowed: {} bytes needed, capacity {}", required, self.capacity());
        self.overflow = true;
        Err(self.overflow_error())
    }

    // ITU-T H.264, 04/2017, 7.4.1
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        let offset = self.offset;
        let escape = self.prevent_start_code && offset > 1 && {
            let buf = self.buffer.as_slice();
            ((byte & 0xfc) | buf[offset - 2] | buf[offset - 1]) == 0
        };
        self.verify_buffer(if escape { 2 } else { 1 })?;

        let buf = self.buffer.as_mut_slice();
        let mut offset = offset;
        if escape {
            buf[offset] = 0x03;
            offset += 1;
        }
        buf[offset] = byte;
        self.offset = offset + 1;
        Ok(())
    }

    /// Writes the low `count` bits of `value`. A count of zero writes nothing.
    pub fn put_bits(&mut self, count: u32, value: u32) -> Result<()> {
        assert!(count <= 32, "cannot put {} bits at once", count);
        if self.overflow {
            return Err(self.overflow_error());
        }
        if count == 0 {
            return Ok(());
        }
        let value = if count < 32 { value & ((1 << count) - 1) } else { value };

        if count < self.bits_to_go {
            self.pending |= value << (self.bits_to_go - count);
            self.bits_to_go -= count;
            return Ok(());
        }

        self.verify_buffer(4)?;
        let left_over = count - self.bits_to_go;
        let word = (self.pending | (value >> left_over)).to_be_bytes();
        self.pending = if left_over > 0 { value << (32 - left_over) } else { 0 };
        self.bits_to_go = 32 - left_over;
        for &b in word.iter() {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// Like `put_bits`, for fields up to 64 bits wide.
    pub fn put_bits_u64(&mut self, count: u32, value: u64) -> Result<()> {
        assert!(count <= 64, "cannot put {} bits at once", count);
        if count > 32 {
            self.put_bits(count - 32, (value >> 32) as u32)?;
            self.put_bits(32, value as u32)
        } else {
            self.put_bits(count, value as u32)
        }
    }

    pub fn put_bool(&mut self, flag: bool) -> Result<()> {
        self.put_bits(1, flag as u32)
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.is_byte_aligned() {
            return Err(Error::NotByteAligned);
        }
        if self.overflow {
            return Err(self.overflow_error());
        }

        let mut pending_bits = 32 - self.bits_to_go;
        self.verify_buffer((pending_bits / 8) as usize)?;
        while pending_bits > 0 {
            self.write_byte((self.pending >> 24) as u8)?;
            self.pending <<= 8;
            pending_bits -= 8;
        }

        self.bits_to_go = 32;
        self.pending = 0;
        Ok(())
    }

    /// Pads with zero bits to the next byte boundary.
    pub fn put_aligning_bits(&mut self) -> Result<()> {
        self.put_bits(self.bits_to_go % 8, 0)
    }

    /// A one bit followed by zero bits up to the next byte boundary.
    pub fn put_trailing_bits(&mut self) -> Result<()> {
        self.put_bits(1, 1)?;
        self.put_aligning_bits()
    }

    /// Copies the bytes another writer has emitted. Both writers must be flushed. No emulation
    /// prevention is applied to the copied bytes.
    pub fn append_byte_stream(&mut self, other: &BitstreamWriter<'_>) -> Result<()> {
        if self.bits_to_go != 32 || other.bits_to_go != 32 {
            return Err(Error::NotByteAligned);
        }
        let src = other.bytes();
        self.verify_buffer(src.len())?;
        self.current_buffer_mut()[..src.len()].copy_from_slice(src);
        self.advance(src.len());
        Ok(())
    }

    /// Writes whole bytes, at any bit position. Emulation prevention applies as it does to
    /// `put_bits`.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.bits_to_go == 32 && !self.prevent_start_code {
            self.verify_buffer(bytes.len())?;
            self.current_buffer_mut()[..bytes.len()].copy_from_slice(bytes);
            self.advance(bytes.len());
            return Ok(());
        }
        for &b in bytes {
            self.put_bits(8, b as u32)?;
        }
        Ok(())
    }

    // ITU-T H.264, 04/2017, 9.1
    pub fn put_ue(&mut self, value: u32) -> Result<()> {
        if value == u32::MAX {
            self.put_bits(32, 0)?;
            self.put_bits(1, 1)?;
            return self.put_bits(32, 1);
        }
        let code = value + 1;
        let leading_zero_bits = 31 - code.leading_zeros();
        self.put_bits(leading_zero_bits, 0)?;
        self.put_bits(leading_zero_bits + 1, code)
    }

    // ITU-T H.264, 04/2017, 9.1.1
    pub fn put_se(&mut self, value: i32) -> Result<()> {
        if value > 0 {
            self.put_ue(value as u32 * 2 - 1)
        } else if value == i32::MIN {
            self.put_ue(u32::MAX)
        } else {
            self.put_ue((-value) as u32 * 2)
        }
    }

    /// AV1-Spec-2 - 4.10.6
    ///
    /// `value` may also be given as the raw `count` bit two's complement pattern.
    pub fn put_su(&mut self, count: u32, value: i32) -> Result<()> {
        assert!(count >= 1 && count <= 32);
        let sign = 1i64 << (count - 1);
        let mut value = value as i64;
        debug_assert!(value >= -sign && value < 2 * sign, "{} does not fit su({})", value, count);
        if value & sign != 0 {
            value -= 2 * sign;
        }
        self.put_bits(count, value as u32)
    }

    /// AV1-Spec-2 - 4.10.7
    pub fn put_ns(&mut self, max_value: u32, value: u32) -> Result<()> {
        assert!(value < max_value, "ns value {} out of range for {}", value, max_value);
        let width = 32 - max_value.leading_zeros();
        let m = (1u64 << width) - max_value as u64;
        if (value as u64) < m {
            self.put_bits(width - 1, value)
        } else {
            self.put_bits(width, (value as u64 + m) as u32)
        }
    }

    /// AV1-Spec-2 - 4.10.5
    pub fn put_leb128(&mut self, mut value: u64) -> Result<()> {
        loop {
            let mut byte = (value & 0x7f) as u32;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.put_bits(8, byte)?;
            if value == 0 {
                return Ok(());
            }
        }
    }

    /// AV1-Spec-2 - 4.10.4
    pub fn put_le_bytes(&mut self, count: usize, mut value: u32) -> Result<()> {
        assert!(count <= 4);
        for _ in 0..count {
            self.put_bits(8, value & 0xff)?;
            value >>= 8;
        }
        Ok(())
    }

    pub fn encode<V: Encode + ?Sized>(&mut self, v: &V) -> Result<()> {
        v.encode(self)
    }
}

pub trait Encode {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()>;
}

impl<V: Encode> Encode for [V] {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        for v in self {
            v.encode(bs)?;
        }
        Ok(())
    }
}

impl<V: Encode> Encode for Vec<V> {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        self.as_slice().encode(bs)
    }
}

#[macro_export]
macro_rules! encode {
    ($b:expr, $($e:expr),+ $(,)?) => {
        (|| -> $crate::Result<()> {
            $($crate::Encode::encode($e, &mut *$b)?;)+
            Ok(())
        })()
    };
}
