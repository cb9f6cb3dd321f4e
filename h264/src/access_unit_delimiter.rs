use super::{decode, syntax_elements::*, Bitstream, BitstreamWriter, Decode, Encode, Result};

use std::io;

pub const PRIMARY_PIC_TYPE_I: u8 = 0;
pub const PRIMARY_PIC_TYPE_I_P: u8 = 1;
pub const PRIMARY_PIC_TYPE_I_P_B: u8 = 2;

// ITU-T H.264, 04/2017, 7.3.2.4
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessUnitDelimiter {
    pub primary_pic_type: U3,
}

impl Decode for AccessUnitDelimiter {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();
        decode!(bs, &mut ret.primary_pic_type)?;
        Ok(ret)
    }
}

impl Encode for AccessUnitDelimiter {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        self.primary_pic_type.encode(bs)
    }
}
