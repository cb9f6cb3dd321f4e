use super::{decode, encode, syntax_elements::*, Bitstream, BitstreamWriter, Error, Result};
use std::{convert::TryFrom, io};

/// Profiles by their general_profile_idc (ITU-T H.265, 11/2019, A.3).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HevcProfile {
    Main = 1,
    Main10 = 2,
    MainStillPicture = 3,
    RangeExtensions = 4,
}

impl HevcProfile {
    pub fn general_profile_idc(self) -> u8 {
        self as u8
    }

    /// general_profile_compatibility_flag[j] is set for j equal to the profile itself, plus Main
    /// for Main Still Picture decoders and Main 10 for Main decoders.
    pub fn general_profile_compatibility_flags(self) -> u32 {
        let flag = |idc: u8| 1u32 << (31 - idc);
        match self {
            HevcProfile::Main => flag(1) | flag(2),
            HevcProfile::MainStillPicture => flag(1) | flag(2) | flag(3),
            p => flag(p.general_profile_idc()),
        }
    }
}

/// Levels by their general_level_idc, which is 30 times the level number (ITU-T H.265, 11/2019,
/// A.4).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HevcLevel {
    L1,
    L2,
    L2_1,
    L3,
    L3_1,
    L4,
    L4_1,
    L5,
    L5_1,
    L5_2,
    L6,
    L6_1,
    L6_2,
}

impl HevcLevel {
    pub fn general_level_idc(self) -> u8 {
        match self {
            HevcLevel::L1 => 30,
            HevcLevel::L2 => 60,
            HevcLevel::L2_1 => 63,
            HevcLevel::L3 => 90,
            HevcLevel::L3_1 => 93,
            HevcLevel::L4 => 120,
            HevcLevel::L4_1 => 123,
            HevcLevel::L5 => 150,
            HevcLevel::L5_1 => 153,
            HevcLevel::L5_2 => 156,
            HevcLevel::L6 => 180,
            HevcLevel::L6_1 => 183,
            HevcLevel::L6_2 => 186,
        }
    }
}

impl TryFrom<u8> for HevcLevel {
    type Error = Error;

    fn try_from(general_level_idc: u8) -> Result<Self> {
        Ok(match general_level_idc {
            30 => HevcLevel::L1,
            60 => HevcLevel::L2,
            63 => HevcLevel::L2_1,
            90 => HevcLevel::L3,
            93 => HevcLevel::L3_1,
            120 => HevcLevel::L4,
            123 => HevcLevel::L4_1,
            150 => HevcLevel::L5,
            153 => HevcLevel::L5_1,
            156 => HevcLevel::L5_2,
            180 => HevcLevel::L6,
            183 => HevcLevel::L6_1,
            186 => HevcLevel::L6_2,
            idc => return Err(Error::UnsupportedLevelIdc(idc)),
        })
    }
}

/// The 88 bits shared by the general and sub-layer profiles.
#[derive(Clone, Debug, Default)]
pub struct ProfileInfo {
    pub profile_space: U2,
    pub tier_flag: U1,
    pub profile_idc: U5,
    pub profile_compatibility_flags: U32,
    pub constraint_flags: U48,
}

impl ProfileInfo {
    pub fn new(profile: HevcProfile) -> Self {
        Self {
            profile_idc: U5(profile.general_profile_idc()),
            profile_compatibility_flags: U32(profile.general_profile_compatibility_flags()),
            ..Default::default()
        }
    }

    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();
        decode!(
            bs,
            &mut ret.profile_space,
            &mut ret.tier_flag,
            &mut ret.profile_idc,
            &mut ret.profile_compatibility_flags,
            &mut ret.constraint_flags
        )?;
        Ok(ret)
    }

    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.profile_space,
            &self.tier_flag,
            &self.profile_idc,
            &self.profile_compatibility_flags,
            &self.constraint_flags
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct SubLayerProfileTierLevel {
    // if( sub_layer_profile_present_flag[ i ] )
    pub profile: Option<ProfileInfo>,
    // if( sub_layer_level_present_flag[ i ] )
    pub level_idc: Option<U8>,
}

// ITU-T H.265, 11/2019, 7.3.3
#[derive(Clone, Debug, Default)]
pub struct ProfileTierLevel {
    // if( profilePresentFlag )
    pub general_profile: ProfileInfo,
    pub general_level_idc: U8,

    // for( i = 0; i < maxNumSubLayersMinus1; i++ ). Missing entries are written as absent.
    pub sub_layers: Vec<SubLayerProfileTierLevel>,
}

impl ProfileTierLevel {
    pub fn new(profile: HevcProfile, level: HevcLevel) -> Self {
        Self {
            general_profile: ProfileInfo::new(profile),
            general_level_idc: U8(level.general_level_idc()),
            sub_layers: Vec::new(),
        }
    }

    pub fn level(&self) -> Result<HevcLevel> {
        HevcLevel::try_from(self.general_level_idc.0)
    }

    pub fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>, profile_present_flag: u8, max_num_sub_layers_minus1: u8) -> io::Result<Self> {
        let mut ret = Self::default();

        if profile_present_flag != 0 {
            ret.general_profile = ProfileInfo::decode(bs)?;
        }

        decode!(bs, &mut ret.general_level_idc)?;

        let mut sub_layer_profile_present_flag = vec![];
        let mut sub_layer_level_present_flag = vec![];
        for _ in 0..max_num_sub_layers_minus1 {
            sub_layer_profile_present_flag.push(bs.read_bits(1)?);
            sub_layer_level_present_flag.push(bs.read_bits(1)?);
        }

        if max_num_sub_layers_minus1 > 0 {
            for _ in max_num_sub_layers_minus1..8 {
                bs.read_bits(2)?;
            }
        }

        for i in 0..max_num_sub_layers_minus1 as usize {
            let mut sub_layer = SubLayerProfileTierLevel::default();
            if sub_layer_profile_present_flag[i] != 0 {
                sub_layer.profile = Some(ProfileInfo::decode(bs)?);
            }
            if sub_layer_level_present_flag[i] != 0 {
                sub_layer.level_idc = Some(U8(bs.read_bits(8)? as _));
            }
            ret.sub_layers.push(sub_layer);
        }

        Ok(ret)
    }

    pub fn encode(&self, bs: &mut BitstreamWriter<'_>, profile_present_flag: bool, max_num_sub_layers_minus1: u8) -> Result<()> {
        if profile_present_flag {
            self.general_profile.encode(bs)?;
        }

        encode!(bs, &self.general_level_idc)?;

        let absent = SubLayerProfileTierLevel::default();
        let sub_layers: Vec<&SubLayerProfileTierLevel> = (0..max_num_sub_layers_minus1 as usize)
            .map(|i| self.sub_layers.get(i).unwrap_or(&absent))
            .collect();

        for sub_layer in &sub_layers {
            bs.put_bool(sub_layer.profile.is_some())?;
            bs.put_bool(sub_layer.level_idc.is_some())?;
        }

        if max_num_sub_layers_minus1 > 0 {
            for _ in max_num_sub_layers_minus1..8 {
                // reserved_zero_2bits
                bs.put_bits(2, 0)?;
            }
        }

        for sub_layer in &sub_layers {
            if let Some(profile) = &sub_layer.profile {
                profile.encode(bs)?;
            }
            if let Some(level_idc) = &sub_layer.level_idc {
                encode!(bs, level_idc)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_mapping() {
        for idc in 0..=255u8 {
            if let Ok(level) = HevcLevel::try_from(idc) {
                assert_eq!(level.general_level_idc(), idc);
            }
        }
        assert_eq!(HevcLevel::L3_1.general_level_idc(), 93);
        assert_eq!(HevcLevel::try_from(150).unwrap(), HevcLevel::L5);
        assert!(matches!(HevcLevel::try_from(91), Err(Error::UnsupportedLevelIdc(91))));
    }

    #[test]
    fn test_profile_compatibility_flags() {
        assert_eq!(HevcProfile::Main.general_profile_compatibility_flags(), 0x6000_0000);
        assert_eq!(HevcProfile::Main10.general_profile_compatibility_flags(), 0x2000_0000);
        assert_eq!(HevcProfile::RangeExtensions.general_profile_compatibility_flags(), 0x0800_0000);
    }

    #[test]
    fn test_profile_tier_level() {
        let mut ptl = ProfileTierLevel::new(HevcProfile::Main, HevcLevel::L5);
        ptl.general_profile.constraint_flags = U48(0xb000_0000_0000);

        let mut bs = BitstreamWriter::with_capacity(12);
        ptl.encode(&mut bs, true, 0).unwrap();
        bs.flush().unwrap();
        assert_eq!(bs.bytes(), &[0x01, 0x60, 0x00, 0x00, 0x00, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x96]);
    }

    #[test]
    fn test_sub_layers() {
        let mut ptl = ProfileTierLevel::new(HevcProfile::Main10, HevcLevel::L4_1);
        ptl.sub_layers.push(SubLayerProfileTierLevel {
            profile: None,
            level_idc: Some(U8(HevcLevel::L4.general_level_idc())),
        });

        let mut bs = BitstreamWriter::with_capacity(16);
        ptl.encode(&mut bs, true, 2).unwrap();
        bs.flush().unwrap();
        // 12 general bytes, 2 flag pairs and 6 reserved pairs, one sub-layer level
        assert_eq!(bs.byte_count(), 15);

        let decoded = ProfileTierLevel::decode(&mut Bitstream::new(bs.bytes()), 1, 2).unwrap();
        assert_eq!(decoded.level().unwrap(), HevcLevel::L4_1);
        assert_eq!(decoded.general_profile.profile_idc.0, 2);
        assert_eq!(decoded.sub_layers.len(), 2);
        assert_eq!(decoded.sub_layers[0].level_idc, Some(U8(120)));
        assert!(decoded.sub_layers[0].profile.is_none());
        assert!(decoded.sub_layers[1].level_idc.is_none());
    }
}
