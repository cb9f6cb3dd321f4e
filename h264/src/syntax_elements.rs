use super::{Bitstream, BitstreamWriter, Decode, Encode, Result};

use std::{convert::TryFrom, io};

// ITU-T H.264, 04/2017, 7.2
macro_rules! define_syntax_element_u {
    ($e:ident, $t:tt, $n:literal) => {
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        pub struct $e(pub $t);

        impl Decode for $e {
            fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
                Ok(Self(bs.read_bits($n)? as _))
            }
        }

        impl Encode for $e {
            fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
                bs.put_bits_u64($n, self.0 as u64)
            }
        }
    };
}

define_syntax_element_u!(U1, u8, 1);
define_syntax_element_u!(U2, u8, 2);
define_syntax_element_u!(U3, u8, 3);
define_syntax_element_u!(U4, u8, 4);
define_syntax_element_u!(U5, u8, 5);
define_syntax_element_u!(U6, u8, 6);
define_syntax_element_u!(U7, u8, 7);
define_syntax_element_u!(U8, u8, 8);
define_syntax_element_u!(U12, u16, 12);
define_syntax_element_u!(U16, u16, 16);
define_syntax_element_u!(U32, u32, 32);
define_syntax_element_u!(U48, u64, 48);

// ITU-T H.264, 04/2017, 7.2
define_syntax_element_u!(F1, u8, 1);

impl From<bool> for U1 {
    fn from(flag: bool) -> Self {
        Self(flag as u8)
    }
}

impl U1 {
    pub fn is_set(&self) -> bool {
        self.0 != 0
    }
}

// ITU-T H.264, 04/2017, 7.2 / 9.1
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct UE(pub u32);

impl Decode for UE {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut leading_zero_bits = 0;
        while bs.read_bits(1)? == 0 {
            leading_zero_bits += 1;
            if leading_zero_bits > 32 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "exp-golomb code too long"));
            }
        }
        let value = bs.read_bits(leading_zero_bits)? + (1 << leading_zero_bits) - 1;
        u32::try_from(value)
            .map(Self)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "exp-golomb value out of range"))
    }
}

impl Encode for UE {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        bs.put_ue(self.0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SE(pub i32);

impl Decode for SE {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let ue = UE::decode(bs)?.0 as i64;
        let mut value = (ue + 1) >> 1;
        if (ue & 1) == 0 {
            value = -value;
        }
        Ok(Self(value as i32))
    }
}

impl Encode for SE {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        bs.put_se(self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ue() {
        {
            let mut bs = Bitstream::new(&[0x00]);
            assert_eq!(UE::decode(&mut bs).is_err(), true);
        }

        {
            let mut bs = Bitstream::new(&[0x80]);
            assert_eq!(UE::decode(&mut bs).unwrap().0, 0);
        }

        {
            let mut bs = Bitstream::new(&[0x40]);
            assert_eq!(UE::decode(&mut bs).unwrap().0, 1);
        }

        {
            let mut bs = Bitstream::new(&[0x60]);
            assert_eq!(UE::decode(&mut bs).unwrap().0, 2);
        }

        {
            let mut bs = Bitstream::new(&[0x20]);
            assert_eq!(UE::decode(&mut bs).unwrap().0, 3);
        }

        {
            let mut bs = Bitstream::new(&[0x28]);
            assert_eq!(UE::decode(&mut bs).unwrap().0, 4);
        }
    }

    #[test]
    fn test_se() {
        {
            let mut bs = Bitstream::new(&[0x00]);
            assert_eq!(SE::decode(&mut bs).is_err(), true);
        }

        {
            let mut bs = Bitstream::new(&[0x80]);
            assert_eq!(SE::decode(&mut bs).unwrap().0, 0);
        }

        {
            let mut bs = Bitstream::new(&[0x40]);
            assert_eq!(SE::decode(&mut bs).unwrap().0, 1);
        }

        {
            let mut bs = Bitstream::new(&[0x60]);
            assert_eq!(SE::decode(&mut bs).unwrap().0, -1);
        }

        {
            let mut bs = Bitstream::new(&[0x20]);
            assert_eq!(SE::decode(&mut bs).unwrap().0, 2);
        }

        {
            let mut bs = Bitstream::new(&[0x28]);
            assert_eq!(SE::decode(&mut bs).unwrap().0, -2);
        }
    }

    #[test]
    fn test_encode_exp_golomb() {
        for (value, expected) in &[(UE(0), 0x80u8), (UE(1), 0x40), (UE(2), 0x60), (UE(3), 0x20), (UE(4), 0x28)] {
            let mut bs = BitstreamWriter::with_capacity(1);
            value.encode(&mut bs).unwrap();
            bs.put_aligning_bits().unwrap();
            bs.flush().unwrap();
            assert_eq!(bs.bytes(), &[*expected]);
        }

        for (value, expected) in &[(SE(0), 0x80u8), (SE(1), 0x40), (SE(-1), 0x60), (SE(2), 0x20), (SE(-2), 0x28)] {
            let mut bs = BitstreamWriter::with_capacity(1);
            value.encode(&mut bs).unwrap();
            bs.put_aligning_bits().unwrap();
            bs.flush().unwrap();
            assert_eq!(bs.bytes(), &[*expected]);
        }
    }

    #[test]
    fn test_encode_u48() {
        let mut bs = BitstreamWriter::with_capacity(6);
        U48(0x8000_0000_0001).encode(&mut bs).unwrap();
        bs.flush().unwrap();
        assert_eq!(bs.bytes(), &[0x80, 0x00, 0x00, 0x00, 0x00, 0x01]);
    }
}
