use super::{decode, encode, syntax_elements::*, Bitstream, BitstreamWriter, Decode, Encode, Result};
use std::io;

pub const NAL_UNIT_TYPE_VIDEO_PARAMETER_SET: u8 = 32;
pub const NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET: u8 = 33;
pub const NAL_UNIT_TYPE_PICTURE_PARAMETER_SET: u8 = 34;
pub const NAL_UNIT_TYPE_ACCESS_UNIT_DELIMITER: u8 = 35;

// ITU-T H.265, 11/2019, 7.3.1.1
pub struct NALUnit {
    pub nal_unit_header: NALUnitHeader,
    pub rbsp_byte: Vec<u8>,
}

impl Decode for NALUnit {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        Ok(Self {
            nal_unit_header: NALUnitHeader::decode(bs)?,
            rbsp_byte: h264::decode_rbsp(bs)?,
        })
    }
}

// ITU-T H.265, 11/2019, 7.3.1.2
#[derive(Clone, Copy, Debug, Default)]
pub struct NALUnitHeader {
    pub forbidden_zero_bit: F1,
    pub nal_unit_type: U6,
    pub nuh_layer_id: U6,
    pub nuh_temporal_id_plus1: U3,
}

impl NALUnitHeader {
    /// A base layer header with TemporalId 0.
    pub fn new(nal_unit_type: u8) -> Self {
        Self {
            forbidden_zero_bit: F1(0),
            nal_unit_type: U6(nal_unit_type),
            nuh_layer_id: U6(0),
            nuh_temporal_id_plus1: U3(1),
        }
    }
}

impl Decode for NALUnitHeader {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();

        decode!(
            bs,
            &mut ret.forbidden_zero_bit,
            &mut ret.nal_unit_type,
            &mut ret.nuh_layer_id,
            &mut ret.nuh_temporal_id_plus1
        )?;

        if ret.nal_unit_type.0 < 48 && ret.forbidden_zero_bit.0 != 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "non-zero forbidden_zero_bit"));
        }

        Ok(ret)
    }
}

impl Encode for NALUnitHeader {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.forbidden_zero_bit,
            &self.nal_unit_type,
            &self.nuh_layer_id,
            &self.nuh_temporal_id_plus1
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_nal_unit_header() {
        let mut bs = BitstreamWriter::with_capacity(2);
        NALUnitHeader::new(NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET).encode(&mut bs).unwrap();
        bs.flush().unwrap();
        assert_eq!(bs.bytes(), &[0x42, 0x01]);

        let header = NALUnitHeader::decode(&mut Bitstream::new(bs.bytes())).unwrap();
        assert_eq!(header.nal_unit_type.0, NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET);
        assert_eq!(header.nuh_layer_id.0, 0);
        assert_eq!(header.nuh_temporal_id_plus1.0, 1);
    }

    #[test]
    fn test_nal_unit() {
        let data = [0x40, 0x01, 0x0c, 0x00, 0x00, 0x03, 0x01];
        let nalu = NALUnit::decode(&mut Bitstream::new(&data)).unwrap();
        assert_eq!(nalu.nal_unit_header.nal_unit_type.0, NAL_UNIT_TYPE_VIDEO_PARAMETER_SET);
        assert_eq!(nalu.rbsp_byte, vec![0x0c, 0x00, 0x00, 0x01]);
    }
}
