use super::{decode, encode, syntax_elements::*, Bitstream, BitstreamWriter, Decode, Encode, Error, Result};

use std::io;

/// The first byte of each NALU contains its type. If you just need the type without decoding the
/// NALU, mask the first byte with this.
pub const NAL_UNIT_TYPE_MASK: u8 = 0x1f;

pub const NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET: u8 = 7;
pub const NAL_UNIT_TYPE_PICTURE_PARAMETER_SET: u8 = 8;
pub const NAL_UNIT_TYPE_ACCESS_UNIT_DELIMITER: u8 = 9;

pub const NAL_REF_IDC_NON_REFERENCE: u8 = 0;
pub const NAL_REF_IDC_REFERENCE: u8 = 3;

/// Every NAL unit written here starts with the four byte form of the start code.
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

// ITU-T H.264, 04/2017, 7.3.1
#[derive(Default)]
pub struct NALUnit {
    pub forbidden_zero_bit: F1,
    pub nal_ref_idc: U2,
    pub nal_unit_type: U5,
    pub rbsp_byte: Vec<u8>,
}

pub fn decode_rbsp<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Vec<u8>> {
    let mut rbsp = Vec::with_capacity(bs.bits_remaining() / 8);
    while bs.bits_remaining() >= 8 {
        if bs.next_bits(24) == Some(0x000003) {
            rbsp.push(0);
            rbsp.push(0);
            bs.advance_bits(24);
        } else {
            rbsp.push(bs.read_bits(8)? as u8);
        }
    }
    Ok(rbsp)
}

impl Decode for NALUnit {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();

        decode!(bs, &mut ret.forbidden_zero_bit, &mut ret.nal_ref_idc, &mut ret.nal_unit_type)?;

        if ret.forbidden_zero_bit.0 != 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "non-zero forbidden_zero_bit"));
        }

        match ret.nal_unit_type.0 {
            14 | 20 | 21 => return Err(io::Error::new(io::ErrorKind::Other, "unsupported nal_unit_type")),
            _ => {}
        }

        ret.rbsp_byte = decode_rbsp(bs)?;

        Ok(ret)
    }
}

// ITU-T H.264, 04/2017, 7.3.1
#[derive(Clone, Copy, Debug, Default)]
pub struct NALUnitHeader {
    pub forbidden_zero_bit: F1,
    pub nal_ref_idc: U2,
    pub nal_unit_type: U5,
}

impl NALUnitHeader {
    pub fn new(nal_ref_idc: u8, nal_unit_type: u8) -> Self {
        Self {
            forbidden_zero_bit: F1(0),
            nal_ref_idc: U2(nal_ref_idc),
            nal_unit_type: U5(nal_unit_type),
        }
    }
}

impl Encode for NALUnitHeader {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(bs, &self.forbidden_zero_bit, &self.nal_ref_idc, &self.nal_unit_type)
    }
}

/// Appends a start code, `header` and the RBSP to `nalu`, returning the number of bytes added.
///
/// If `rbsp` was written with start code prevention its bytes are copied as they are, otherwise
/// they are escaped on the way in. The header is never escaped.
pub fn wrap_rbsp_into_nal_unit<H: Encode + ?Sized>(nalu: &mut BitstreamWriter<'_>, rbsp: &mut BitstreamWriter<'_>, header: &H) -> Result<usize> {
    if !rbsp.is_byte_aligned() {
        return Err(Error::NotByteAligned);
    }

    let start = nalu.byte_count();
    nalu.set_start_code_prevention(false);

    for &b in START_CODE.iter() {
        nalu.put_bits(8, b as u32)?;
    }
    header.encode(nalu)?;
    nalu.flush()?;

    rbsp.flush()?;
    if rbsp.start_code_prevention() {
        nalu.append_byte_stream(rbsp)?;
    } else {
        nalu.set_start_code_prevention(true);
        for &b in rbsp.bytes() {
            nalu.put_bits(8, b as u32)?;
        }
    }

    write_nal_unit_end(nalu)?;
    Ok(nalu.byte_count() - start)
}

// A trailing zero byte would run into the next start code.
fn write_nal_unit_end(nalu: &mut BitstreamWriter<'_>) -> Result<()> {
    nalu.flush()?;
    nalu.set_start_code_prevention(false);
    if nalu.bytes().last() == Some(&0x00) {
        nalu.put_bits(8, 0x03)?;
        nalu.flush()?;
    }
    Ok(())
}

// Parameter sets are small; these only seed the writers, which grow if needed.
const RBSP_INITIAL_CAPACITY: usize = 1024;
const NAL_UNIT_INITIAL_CAPACITY: usize = 2 * RBSP_INITIAL_CAPACITY;

/// Serializes an RBSP with `write_rbsp` (start code prevention on, trailing bits appended), wraps
/// it in a NAL unit and stores the unit in `dest` at `position`. `dest` ends up exactly
/// `position` plus the returned length long.
pub fn build_nal_unit<H, F>(header: &H, dest: &mut Vec<u8>, position: usize, write_rbsp: F) -> Result<usize>
where
    H: Encode + ?Sized,
    F: FnOnce(&mut BitstreamWriter<'_>) -> Result<()>,
{
    let mut rbsp = BitstreamWriter::with_capacity(RBSP_INITIAL_CAPACITY);
    rbsp.set_start_code_prevention(true);
    write_rbsp(&mut rbsp)?;
    rbsp.put_trailing_bits()?;

    let mut nalu = BitstreamWriter::with_capacity(NAL_UNIT_INITIAL_CAPACITY);
    let written = wrap_rbsp_into_nal_unit(&mut nalu, &mut rbsp, header)?;
    place_unit(dest, position, nalu.bytes());
    Ok(written)
}

/// Copies `unit` into `dest` at `position`, growing or truncating `dest` to end right after it.
pub fn place_unit(dest: &mut Vec<u8>, position: usize, unit: &[u8]) {
    dest.resize(position + unit.len(), 0);
    dest[position..].copy_from_slice(unit);
}

#[cfg(test)]
mod test {
    use super::*;

    fn rbsp_of(bytes: &[u8], start_code_prevention: bool) -> BitstreamWriter<'static> {
        let mut rbsp = BitstreamWriter::with_capacity(bytes.len());
        rbsp.set_start_code_prevention(start_code_prevention);
        for &b in bytes {
            rbsp.put_bits(8, b as u32).unwrap();
        }
        rbsp
    }

    #[test]
    fn test_wrap_rbsp_into_nal_unit() {
        let mut nalu = BitstreamWriter::with_capacity(16);
        let mut rbsp = rbsp_of(&[0x64, 0x00, 0x1f, 0x80], true);
        let n = wrap_rbsp_into_nal_unit(&mut nalu, &mut rbsp, &NALUnitHeader::new(3, 7)).unwrap();
        assert_eq!(n, 9);
        assert_eq!(nalu.bytes(), &[0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x1f, 0x80]);
    }

    #[test]
    fn test_trailing_zero_guard() {
        let mut nalu = BitstreamWriter::with_capacity(16);
        let mut rbsp = rbsp_of(&[0x12, 0x00], true);
        let n = wrap_rbsp_into_nal_unit(&mut nalu, &mut rbsp, &NALUnitHeader::new(0, 9)).unwrap();
        assert_eq!(n, 8);
        assert_eq!(nalu.bytes(), &[0x00, 0x00, 0x00, 0x01, 0x09, 0x12, 0x00, 0x03]);

        let mut nalu = BitstreamWriter::with_capacity(16);
        let mut rbsp = rbsp_of(&[0x12, 0x01], true);
        wrap_rbsp_into_nal_unit(&mut nalu, &mut rbsp, &NALUnitHeader::new(0, 9)).unwrap();
        assert_eq!(nalu.bytes(), &[0x00, 0x00, 0x00, 0x01, 0x09, 0x12, 0x01]);
    }

    #[test]
    fn test_escape_while_wrapping() {
        let unescaped = [0x00, 0x00, 0x01, 0x80];

        let mut nalu = BitstreamWriter::with_capacity(16);
        let mut rbsp = rbsp_of(&unescaped, false);
        wrap_rbsp_into_nal_unit(&mut nalu, &mut rbsp, &NALUnitHeader::new(3, 8)).unwrap();
        assert_eq!(nalu.bytes(), &[0x00, 0x00, 0x00, 0x01, 0x68, 0x00, 0x00, 0x03, 0x01, 0x80]);

        let mut direct = BitstreamWriter::with_capacity(16);
        let mut rbsp = rbsp_of(&unescaped, true);
        wrap_rbsp_into_nal_unit(&mut direct, &mut rbsp, &NALUnitHeader::new(3, 8)).unwrap();
        assert_eq!(direct.bytes(), nalu.bytes());

        let mut bs = Bitstream::new(&nalu.bytes()[4..]);
        let decoded = NALUnit::decode(&mut bs).unwrap();
        assert_eq!(decoded.nal_unit_type.0, NAL_UNIT_TYPE_PICTURE_PARAMETER_SET);
        assert_eq!(decoded.rbsp_byte, unescaped);
    }

    #[test]
    fn test_wrap_requires_alignment() {
        let mut nalu = BitstreamWriter::with_capacity(16);
        let mut rbsp = BitstreamWriter::with_capacity(16);
        rbsp.put_bits(3, 1).unwrap();
        assert!(matches!(
            wrap_rbsp_into_nal_unit(&mut nalu, &mut rbsp, &NALUnitHeader::new(3, 7)),
            Err(Error::NotByteAligned)
        ));
    }

    #[test]
    fn test_build_nal_unit_placement() {
        let mut dest = vec![0xee; 3];
        let n = build_nal_unit(&NALUnitHeader::new(0, 9), &mut dest, 2, |bs| bs.put_bits(3, 2)).unwrap();
        assert_eq!(n, 6);
        assert_eq!(dest, vec![0xee, 0xee, 0x00, 0x00, 0x00, 0x01, 0x09, 0x50]);

        let mut dest = Vec::new();
        let n = build_nal_unit(&NALUnitHeader::new(0, 9), &mut dest, 4, |bs| bs.put_bits(3, 2)).unwrap();
        assert_eq!(n, 6);
        assert_eq!(dest.len(), 10);
        assert_eq!(&dest[4..], &[0x00, 0x00, 0x00, 0x01, 0x09, 0x50]);
    }
}
