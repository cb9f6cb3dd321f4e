use super::{decode, encode, syntax_elements::*, Bitstream, BitstreamWriter, Decode, Encode, Error, HrdParameters, ProfileTierLevel, Result};
use std::io;

#[derive(Clone, Debug, Default)]
pub struct VideoParameterSetSubLayerOrderingInfo {
    pub vps_max_dec_pic_buffering_minus1: UE,
    pub vps_max_num_reorder_pics: UE,
    pub vps_max_latency_increase_plus1: UE,
}

impl Decode for VideoParameterSetSubLayerOrderingInfo {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        Ok(Self {
            vps_max_dec_pic_buffering_minus1: UE::decode(bs)?,
            vps_max_num_reorder_pics: UE::decode(bs)?,
            vps_max_latency_increase_plus1: UE::decode(bs)?,
        })
    }
}

impl Encode for VideoParameterSetSubLayerOrderingInfo {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.vps_max_dec_pic_buffering_minus1,
            &self.vps_max_num_reorder_pics,
            &self.vps_max_latency_increase_plus1
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct VideoParameterSetHrd {
    pub hrd_layer_set_idx: UE,
    // if( i > 0 ), otherwise inferred to be 1
    pub cprms_present_flag: U1,
    pub hrd_parameters: HrdParameters,
}

// ITU-T H.265, 11/2019, 7.3.2.1
#[derive(Clone, Debug)]
pub struct VideoParameterSet {
    pub vps_video_parameter_set_id: U4,
    pub vps_base_layer_internal_flag: U1,
    pub vps_base_layer_available_flag: U1,
    pub vps_max_layers_minus1: U6,
    pub vps_max_sub_layers_minus1: U3,
    pub vps_temporal_id_nesting_flag: U1,
    pub vps_reserved_0xffff_16bits: U16,
    pub profile_tier_level: ProfileTierLevel,
    pub vps_sub_layer_ordering_info_present_flag: U1,

    // for( i = ( vps_sub_layer_ordering_info_present_flag ? 0 : vps_max_sub_layers_minus1 ); i <= vps_max_sub_layers_minus1; i++ )
    pub sub_layer_ordering_info: Vec<VideoParameterSetSubLayerOrderingInfo>,

    pub vps_max_layer_id: U6,
    pub vps_num_layer_sets_minus1: UE,
    // for( i = 1; i <= vps_num_layer_sets_minus1; i++ )
    // for( j = 0; j <= vps_max_layer_id; j++ )
    pub layer_id_included_flag: Vec<Vec<U1>>,

    pub vps_timing_info_present_flag: U1,

    // if( vps_timing_info_present_flag ) {
    pub vps_num_units_in_tick: U32,
    pub vps_time_scale: U32,
    pub vps_poc_proportional_to_timing_flag: U1,
    // if( vps_poc_proportional_to_timing_flag )
    pub vps_num_ticks_poc_diff_one_minus1: UE,
    // for( i = 0; i < vps_num_hrd_parameters; i++ )
    pub hrd: Vec<VideoParameterSetHrd>,
    // }
    pub vps_extension_flag: U1,
}

impl Default for VideoParameterSet {
    fn default() -> Self {
        Self {
            vps_video_parameter_set_id: U4(0),
            vps_base_layer_internal_flag: U1(1),
            vps_base_layer_available_flag: U1(1),
            vps_max_layers_minus1: U6(0),
            vps_max_sub_layers_minus1: U3(0),
            vps_temporal_id_nesting_flag: U1(1),
            vps_reserved_0xffff_16bits: U16(0xffff),
            profile_tier_level: ProfileTierLevel::default(),
            vps_sub_layer_ordering_info_present_flag: U1(0),
            sub_layer_ordering_info: vec![VideoParameterSetSubLayerOrderingInfo::default()],
            vps_max_layer_id: U6(0),
            vps_num_layer_sets_minus1: UE(0),
            layer_id_included_flag: vec![vec![U1(0)]],
            vps_timing_info_present_flag: U1(0),
            vps_num_units_in_tick: U32(0),
            vps_time_scale: U32(0),
            vps_poc_proportional_to_timing_flag: U1(0),
            vps_num_ticks_poc_diff_one_minus1: UE(0),
            hrd: Vec::new(),
            vps_extension_flag: U1(0),
        }
    }
}

impl Decode for VideoParameterSet {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();

        decode!(
            bs,
            &mut ret.vps_video_parameter_set_id,
            &mut ret.vps_base_layer_internal_flag,
            &mut ret.vps_base_layer_available_flag,
            &mut ret.vps_max_layers_minus1,
            &mut ret.vps_max_sub_layers_minus1,
            &mut ret.vps_temporal_id_nesting_flag,
            &mut ret.vps_reserved_0xffff_16bits
        )?;

        ret.profile_tier_level = ProfileTierLevel::decode(bs, 1, ret.vps_max_sub_layers_minus1.0)?;

        decode!(bs, &mut ret.vps_sub_layer_ordering_info_present_flag)?;

        ret.sub_layer_ordering_info.clear();
        let mut i = match ret.vps_sub_layer_ordering_info_present_flag.0 {
            0 => ret.vps_max_sub_layers_minus1.0,
            _ => 0,
        };
        while i <= ret.vps_max_sub_layers_minus1.0 {
            ret.sub_layer_ordering_info.push(VideoParameterSetSubLayerOrderingInfo::decode(bs)?);
            i += 1;
        }

        decode!(bs, &mut ret.vps_max_layer_id, &mut ret.vps_num_layer_sets_minus1)?;

        ret.layer_id_included_flag = vec![vec![U1(0); ret.vps_max_layer_id.0 as usize + 1]];
        for _ in 1..=ret.vps_num_layer_sets_minus1.0 {
            let mut v = vec![];
            for _ in 0..=ret.vps_max_layer_id.0 {
                v.push(U1::decode(bs)?);
            }
            ret.layer_id_included_flag.push(v);
        }

        decode!(bs, &mut ret.vps_timing_info_present_flag)?;

        if ret.vps_timing_info_present_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.vps_num_units_in_tick,
                &mut ret.vps_time_scale,
                &mut ret.vps_poc_proportional_to_timing_flag
            )?;
            if ret.vps_poc_proportional_to_timing_flag.0 != 0 {
                decode!(bs, &mut ret.vps_num_ticks_poc_diff_one_minus1)?;
            }
            let vps_num_hrd_parameters = UE::decode(bs)?.0;
            for i in 0..vps_num_hrd_parameters {
                let mut hrd = VideoParameterSetHrd::default();
                decode!(bs, &mut hrd.hrd_layer_set_idx)?;
                hrd.cprms_present_flag = U1(1);
                if i > 0 {
                    decode!(bs, &mut hrd.cprms_present_flag)?;
                }
                hrd.hrd_parameters = HrdParameters::decode(bs, hrd.cprms_present_flag.is_set(), ret.vps_max_sub_layers_minus1.0)?;
                ret.hrd.push(hrd);
            }
        }

        decode!(bs, &mut ret.vps_extension_flag)?;
        if ret.vps_extension_flag.0 != 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "decoding vps extensions is not supported"));
        }

        Ok(ret)
    }
}

impl Encode for VideoParameterSet {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.vps_video_parameter_set_id,
            &self.vps_base_layer_internal_flag,
            &self.vps_base_layer_available_flag,
            &self.vps_max_layers_minus1,
            &self.vps_max_sub_layers_minus1,
            &self.vps_temporal_id_nesting_flag,
            &self.vps_reserved_0xffff_16bits
        )?;

        self.profile_tier_level.encode(bs, true, self.vps_max_sub_layers_minus1.0)?;

        encode!(bs, &self.vps_sub_layer_ordering_info_present_flag)?;

        let expected = match self.vps_sub_layer_ordering_info_present_flag.0 {
            0 => 1,
            _ => self.vps_max_sub_layers_minus1.0 as usize + 1,
        };
        assert_eq!(self.sub_layer_ordering_info.len(), expected);
        encode!(bs, &self.sub_layer_ordering_info)?;

        encode!(bs, &self.vps_max_layer_id, &self.vps_num_layer_sets_minus1)?;

        // entry 0 stands for layer set 0, which is implied
        assert_eq!(self.layer_id_included_flag.len(), self.vps_num_layer_sets_minus1.0 as usize + 1);
        for flags in self.layer_id_included_flag.iter().skip(1) {
            assert_eq!(flags.len(), self.vps_max_layer_id.0 as usize + 1);
            encode!(bs, flags)?;
        }

        encode!(bs, &self.vps_timing_info_present_flag)?;

        if self.vps_timing_info_present_flag.0 != 0 {
            encode!(
                bs,
                &self.vps_num_units_in_tick,
                &self.vps_time_scale,
                &self.vps_poc_proportional_to_timing_flag
            )?;
            if self.vps_poc_proportional_to_timing_flag.0 != 0 {
                encode!(bs, &self.vps_num_ticks_poc_diff_one_minus1)?;
            }
            bs.put_ue(self.hrd.len() as u32)?;
            for (i, hrd) in self.hrd.iter().enumerate() {
                encode!(bs, &hrd.hrd_layer_set_idx)?;
                let cprms_present_flag = if i > 0 {
                    encode!(bs, &hrd.cprms_present_flag)?;
                    hrd.cprms_present_flag.is_set()
                } else {
                    true
                };
                hrd.hrd_parameters.encode(bs, cprms_present_flag, self.vps_max_sub_layers_minus1.0)?;
            }
        }

        if self.vps_extension_flag.0 != 0 {
            return Err(Error::Unsupported("vps extensions"));
        }
        encode!(bs, &self.vps_extension_flag)
    }
}
