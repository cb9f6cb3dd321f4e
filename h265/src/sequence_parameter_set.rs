use super::{decode, encode, syntax_elements::*, Bitstream, BitstreamWriter, Decode, Encode, Error, HrdParameters, ProfileTierLevel, Result};
use std::io;

/// Luma coding block sizes a CTB may be split into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HevcCodingUnitSize {
    Cu8x8,
    Cu16x16,
    Cu32x32,
    Cu64x64,
}

impl HevcCodingUnitSize {
    pub fn log2(self) -> u32 {
        match self {
            HevcCodingUnitSize::Cu8x8 => 3,
            HevcCodingUnitSize::Cu16x16 => 4,
            HevcCodingUnitSize::Cu32x32 => 5,
            HevcCodingUnitSize::Cu64x64 => 6,
        }
    }

    pub fn from_log2(log2: u32) -> Option<Self> {
        match log2 {
            3 => Some(HevcCodingUnitSize::Cu8x8),
            4 => Some(HevcCodingUnitSize::Cu16x16),
            5 => Some(HevcCodingUnitSize::Cu32x32),
            6 => Some(HevcCodingUnitSize::Cu64x64),
            _ => None,
        }
    }
}

/// Luma transform block sizes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HevcTransformUnitSize {
    Tu4x4,
    Tu8x8,
    Tu16x16,
    Tu32x32,
}

impl HevcTransformUnitSize {
    pub fn log2(self) -> u32 {
        match self {
            HevcTransformUnitSize::Tu4x4 => 2,
            HevcTransformUnitSize::Tu8x8 => 3,
            HevcTransformUnitSize::Tu16x16 => 4,
            HevcTransformUnitSize::Tu32x32 => 5,
        }
    }

    pub fn from_log2(log2: u32) -> Option<Self> {
        match log2 {
            2 => Some(HevcTransformUnitSize::Tu4x4),
            3 => Some(HevcTransformUnitSize::Tu8x8),
            4 => Some(HevcTransformUnitSize::Tu16x16),
            5 => Some(HevcTransformUnitSize::Tu32x32),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SequenceParameterSetSubLayerOrderingInfo {
    pub sps_max_dec_pic_buffering_minus1: UE,
    pub sps_max_num_reorder_pics: UE,
    pub sps_max_latency_increase_plus1: UE,
}

impl Decode for SequenceParameterSetSubLayerOrderingInfo {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        Ok(Self {
            sps_max_dec_pic_buffering_minus1: UE::decode(bs)?,
            sps_max_num_reorder_pics: UE::decode(bs)?,
            sps_max_latency_increase_plus1: UE::decode(bs)?,
        })
    }
}

impl Encode for SequenceParameterSetSubLayerOrderingInfo {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.sps_max_dec_pic_buffering_minus1,
            &self.sps_max_num_reorder_pics,
            &self.sps_max_latency_increase_plus1
        )
    }
}

/// DeltaPocS0/S1 and the matching UsedByCurrPicS0/S1 of a short-term RPS (ITU-T H.265, 11/2019,
/// 7.4.8).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeltaPocs {
    pub s0: Vec<(i32, bool)>,
    pub s1: Vec<(i32, bool)>,
}

impl DeltaPocs {
    pub fn num_delta_pocs(&self) -> usize {
        self.s0.len() + self.s1.len()
    }
}

// ITU-T H.265, 11/2019, 7.3.7
#[derive(Clone, Debug, Default)]
pub struct SequenceParameterSetShortTermRefPicSet {
    // if( stRpsIdx != 0 )
    pub inter_ref_pic_set_prediction_flag: U1,

    // if( inter_ref_pic_set_prediction_flag ) {
    pub delta_rps_sign: U1,
    pub abs_delta_rps_minus1: UE,
    // for( j = 0; j <= NumDeltaPocs[ RefRpsIdx ]; j++ ) {
    pub used_by_curr_pic_flag: Vec<U1>,
    // if( !used_by_curr_pic_flag[ j ] ), otherwise inferred to be 1
    pub use_delta_flag: Vec<U1>,
    // }
    // } else {
    // for( i = 0; i < num_negative_pics; i++ ) {
    pub delta_poc_s0_minus1: Vec<UE>,
    pub used_by_curr_pic_s0_flag: Vec<U1>,
    // }
    // for( i = 0; i < num_positive_pics; i++ ) {
    pub delta_poc_s1_minus1: Vec<UE>,
    pub used_by_curr_pic_s1_flag: Vec<U1>,
    // }
    // }
}

impl SequenceParameterSetShortTermRefPicSet {
    fn use_delta(&self, j: usize) -> bool {
        self.used_by_curr_pic_flag[j].is_set() || self.use_delta_flag.get(j).map_or(true, |f| f.is_set())
    }

    /// Derives the delta POCs of this set. `reference` is the derivation of the set at
    /// RefRpsIdx, which only inter-predicted sets need.
    pub fn delta_pocs(&self, reference: Option<&DeltaPocs>) -> DeltaPocs {
        let mut ret = DeltaPocs::default();

        let r = match (self.inter_ref_pic_set_prediction_flag.is_set(), reference) {
            (true, Some(r)) => r,
            _ => {
                let mut poc = 0;
                for (d, used) in self.delta_poc_s0_minus1.iter().zip(&self.used_by_curr_pic_s0_flag) {
                    poc -= d.0 as i32 + 1;
                    ret.s0.push((poc, used.is_set()));
                }
                poc = 0;
                for (d, used) in self.delta_poc_s1_minus1.iter().zip(&self.used_by_curr_pic_s1_flag) {
                    poc += d.0 as i32 + 1;
                    ret.s1.push((poc, used.is_set()));
                }
                return ret;
            }
        };

        let delta_rps = (1 - 2 * self.delta_rps_sign.0 as i32) * (self.abs_delta_rps_minus1.0 as i32 + 1);
        let num_negative = r.s0.len();
        let num_delta_pocs = r.num_delta_pocs();
        let used = |j: usize| self.used_by_curr_pic_flag[j].is_set();

        // 7-61
        for j in (0..r.s1.len()).rev() {
            let d_poc = r.s1[j].0 + delta_rps;
            if d_poc < 0 && self.use_delta(num_negative + j) {
                ret.s0.push((d_poc, used(num_negative + j)));
            }
        }
        if delta_rps < 0 && self.use_delta(num_delta_pocs) {
            ret.s0.push((delta_rps, used(num_delta_pocs)));
        }
        for j in 0..num_negative {
            let d_poc = r.s0[j].0 + delta_rps;
            if d_poc < 0 && self.use_delta(j) {
                ret.s0.push((d_poc, used(j)));
            }
        }

        // 7-62
        for j in (0..num_negative).rev() {
            let d_poc = r.s0[j].0 + delta_rps;
            if d_poc > 0 && self.use_delta(j) {
                ret.s1.push((d_poc, used(j)));
            }
        }
        if delta_rps > 0 && self.use_delta(num_delta_pocs) {
            ret.s1.push((delta_rps, used(num_delta_pocs)));
        }
        for j in 0..r.s1.len() {
            let d_poc = r.s1[j].0 + delta_rps;
            if d_poc > 0 && self.use_delta(num_negative + j) {
                ret.s1.push((d_poc, used(num_negative + j)));
            }
        }

        ret
    }

    /// `reference` is the derivation of the previous set in the SPS, if there is one.
    pub fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>, st_rps_idx: usize, reference: Option<&DeltaPocs>) -> io::Result<Self> {
        let mut ret = Self::default();

        if st_rps_idx != 0 {
            decode!(bs, &mut ret.inter_ref_pic_set_prediction_flag)?;
        }

        if ret.inter_ref_pic_set_prediction_flag.is_set() {
            let reference = reference.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing reference rps"))?;
            decode!(bs, &mut ret.delta_rps_sign, &mut ret.abs_delta_rps_minus1)?;
            for _ in 0..=reference.num_delta_pocs() {
                let used_by_curr_pic_flag = U1::decode(bs)?;
                let use_delta_flag = match used_by_curr_pic_flag.0 {
                    0 => U1::decode(bs)?,
                    _ => U1(1),
                };
                ret.used_by_curr_pic_flag.push(used_by_curr_pic_flag);
                ret.use_delta_flag.push(use_delta_flag);
            }
        } else {
            let num_negative_pics = UE::decode(bs)?;
            let num_positive_pics = UE::decode(bs)?;
            for _ in 0..num_negative_pics.0 {
                ret.delta_poc_s0_minus1.push(UE::decode(bs)?);
                ret.used_by_curr_pic_s0_flag.push(U1::decode(bs)?);
            }
            for _ in 0..num_positive_pics.0 {
                ret.delta_poc_s1_minus1.push(UE::decode(bs)?);
                ret.used_by_curr_pic_s1_flag.push(U1::decode(bs)?);
            }
        }

        Ok(ret)
    }

    pub fn encode(&self, bs: &mut BitstreamWriter<'_>, st_rps_idx: usize, reference: Option<&DeltaPocs>) -> Result<()> {
        if st_rps_idx != 0 {
            encode!(bs, &self.inter_ref_pic_set_prediction_flag)?;
        }

        match (self.inter_ref_pic_set_prediction_flag.is_set(), reference) {
            (true, Some(reference)) => {
                assert_eq!(self.used_by_curr_pic_flag.len(), reference.num_delta_pocs() + 1);
                encode!(bs, &self.delta_rps_sign, &self.abs_delta_rps_minus1)?;
                for (j, used_by_curr_pic_flag) in self.used_by_curr_pic_flag.iter().enumerate() {
                    encode!(bs, used_by_curr_pic_flag)?;
                    if !used_by_curr_pic_flag.is_set() {
                        bs.put_bool(self.use_delta(j))?;
                    }
                }
            }
            (true, None) => return Err(Error::Unsupported("inter-predicted first short-term rps")),
            _ => {
                assert_eq!(self.delta_poc_s0_minus1.len(), self.used_by_curr_pic_s0_flag.len());
                assert_eq!(self.delta_poc_s1_minus1.len(), self.used_by_curr_pic_s1_flag.len());
                bs.put_ue(self.delta_poc_s0_minus1.len() as u32)?;
                bs.put_ue(self.delta_poc_s1_minus1.len() as u32)?;
                for (d, used) in self.delta_poc_s0_minus1.iter().zip(&self.used_by_curr_pic_s0_flag) {
                    encode!(bs, d, used)?;
                }
                for (d, used) in self.delta_poc_s1_minus1.iter().zip(&self.used_by_curr_pic_s1_flag) {
                    encode!(bs, d, used)?;
                }
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct LongTermRefPicSps {
    // u(v), log2_max_pic_order_cnt_lsb_minus4 + 4 bits
    pub lt_ref_pic_poc_lsb_sps: u32,
    pub used_by_curr_pic_lt_sps_flag: U1,
}

// ITU-T H.265, 11/2019, 7.3.2.2.2
#[derive(Clone, Debug, Default)]
pub struct SequenceParameterSetRangeExtension {
    pub transform_skip_rotation_enabled_flag: U1,
    pub transform_skip_context_enabled_flag: U1,
    pub implicit_rdpcm_enabled_flag: U1,
    pub explicit_rdpcm_enabled_flag: U1,
    pub extended_precision_processing_flag: U1,
    pub intra_smoothing_disabled_flag: U1,
    pub high_precision_offsets_enabled_flag: U1,
    pub persistent_rice_adaptation_enabled_flag: U1,
    pub cabac_bypass_alignment_enabled_flag: U1,
}

impl Decode for SequenceParameterSetRangeExtension {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();
        decode!(
            bs,
            &mut ret.transform_skip_rotation_enabled_flag,
            &mut ret.transform_skip_context_enabled_flag,
            &mut ret.implicit_rdpcm_enabled_flag,
            &mut ret.explicit_rdpcm_enabled_flag,
            &mut ret.extended_precision_processing_flag,
            &mut ret.intra_smoothing_disabled_flag,
            &mut ret.high_precision_offsets_enabled_flag,
            &mut ret.persistent_rice_adaptation_enabled_flag,
            &mut ret.cabac_bypass_alignment_enabled_flag
        )?;
        Ok(ret)
    }
}

impl Encode for SequenceParameterSetRangeExtension {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.transform_skip_rotation_enabled_flag,
            &self.transform_skip_context_enabled_flag,
            &self.implicit_rdpcm_enabled_flag,
            &self.explicit_rdpcm_enabled_flag,
            &self.extended_precision_processing_flag,
            &self.intra_smoothing_disabled_flag,
            &self.high_precision_offsets_enabled_flag,
            &self.persistent_rice_adaptation_enabled_flag,
            &self.cabac_bypass_alignment_enabled_flag
        )
    }
}

// ITU-T H.265, 11/2019 7.3.2.2.1
#[derive(Clone, Debug, Default)]
pub struct SequenceParameterSet {
    pub sps_video_parameter_set_id: U4,
    pub sps_max_sub_layers_minus1: U3,
    pub sps_temporal_id_nesting_flag: U1,
    pub profile_tier_level: ProfileTierLevel,
    pub sps_seq_parameter_set_id: UE,
    pub chroma_format_idc: UE,

    // if( chroma_format_idc = = 3 )
    pub separate_colour_plane_flag: U1,

    pub pic_width_in_luma_samples: UE,
    pub pic_height_in_luma_samples: UE,
    pub conformance_window_flag: U1,

    // if( conformance_window_flag ) {
    pub conf_win_left_offset: UE,
    pub conf_win_right_offset: UE,
    pub conf_win_top_offset: UE,
    pub conf_win_bottom_offset: UE,
    // }
    pub bit_depth_luma_minus8: UE,
    pub bit_depth_chroma_minus8: UE,
    pub log2_max_pic_order_cnt_lsb_minus4: UE,
    pub sps_sub_layer_ordering_info_present_flag: U1,

    // for( i = ( sps_sub_layer_ordering_info_present_flag ? 0 : sps_max_sub_layers_minus1 ); i <= sps_max_sub_layers_minus1; i++ )
    pub sub_layer_ordering_info: Vec<SequenceParameterSetSubLayerOrderingInfo>,

    pub log2_min_luma_coding_block_size_minus3: UE,
    pub log2_diff_max_min_luma_coding_block_size: UE,
    pub log2_min_luma_transform_block_size_minus2: UE,
    pub log2_diff_max_min_luma_transform_block_size: UE,
    pub max_transform_hierarchy_depth_inter: UE,
    pub max_transform_hierarchy_depth_intra: UE,
    pub scaling_list_enabled_flag: U1,

    // if( scaling_list_enabled_flag )
    pub sps_scaling_list_data_present_flag: U1,

    pub amp_enabled_flag: U1,
    pub sample_adaptive_offset_enabled_flag: U1,
    pub pcm_enabled_flag: U1,

    // if( pcm_enabled_flag ) {
    pub pcm_sample_bit_depth_luma_minus1: U4,
    pub pcm_sample_bit_depth_chroma_minus1: U4,
    pub log2_min_pcm_luma_coding_block_size_minus3: UE,
    pub log2_diff_max_min_pcm_luma_coding_block_size: UE,
    pub pcm_loop_filter_disabled_flag: U1,
    // }

    // for( i = 0; i < num_short_term_ref_pic_sets; i++)
    pub st_ref_pic_set: Vec<SequenceParameterSetShortTermRefPicSet>,

    pub long_term_ref_pics_present_flag: U1,

    // if( long_term_ref_pics_present_flag )
    // for( i = 0; i < num_long_term_ref_pics_sps; i++ )
    pub long_term_ref_pics: Vec<LongTermRefPicSps>,

    pub sps_temporal_mvp_enabled_flag: U1,
    pub strong_intra_smoothing_enabled_flag: U1,

    // if( vui_parameters_present_flag )
    pub vui_parameters: Option<VUIParameters>,

    pub sps_extension_present_flag: U1,
    // if( sps_extension_present_flag ) {
    pub sps_range_extension_flag: U1,
    pub sps_multilayer_extension_flag: U1,
    pub sps_3d_extension_flag: U1,
    pub sps_scc_extension_flag: U1,
    pub sps_extension_4bits: U4,
    // }
    // if( sps_range_extension_flag )
    pub sps_range_extension: SequenceParameterSetRangeExtension,
}

impl SequenceParameterSet {
    pub fn set_coding_unit_sizes(&mut self, min: HevcCodingUnitSize, max: HevcCodingUnitSize) {
        assert!(min.log2() <= max.log2());
        self.log2_min_luma_coding_block_size_minus3 = UE(min.log2() - 3);
        self.log2_diff_max_min_luma_coding_block_size = UE(max.log2() - min.log2());
    }

    pub fn min_coding_unit_size(&self) -> Option<HevcCodingUnitSize> {
        HevcCodingUnitSize::from_log2(self.log2_min_luma_coding_block_size_minus3.0 + 3)
    }

    /// The CTB size.
    pub fn max_coding_unit_size(&self) -> Option<HevcCodingUnitSize> {
        HevcCodingUnitSize::from_log2(self.log2_min_luma_coding_block_size_minus3.0 + 3 + self.log2_diff_max_min_luma_coding_block_size.0)
    }

    pub fn set_transform_unit_sizes(&mut self, min: HevcTransformUnitSize, max: HevcTransformUnitSize) {
        assert!(min.log2() <= max.log2());
        self.log2_min_luma_transform_block_size_minus2 = UE(min.log2() - 2);
        self.log2_diff_max_min_luma_transform_block_size = UE(max.log2() - min.log2());
    }

    pub fn min_transform_unit_size(&self) -> Option<HevcTransformUnitSize> {
        HevcTransformUnitSize::from_log2(self.log2_min_luma_transform_block_size_minus2.0 + 2)
    }

    pub fn max_transform_unit_size(&self) -> Option<HevcTransformUnitSize> {
        HevcTransformUnitSize::from_log2(self.log2_min_luma_transform_block_size_minus2.0 + 2 + self.log2_diff_max_min_luma_transform_block_size.0)
    }

    fn poc_lsb_bits(&self) -> u32 {
        self.log2_max_pic_order_cnt_lsb_minus4.0 + 4
    }

    /// The derived delta POCs of every short-term RPS, in order.
    pub fn short_term_delta_pocs(&self) -> Vec<DeltaPocs> {
        let mut ret: Vec<DeltaPocs> = Vec::with_capacity(self.st_ref_pic_set.len());
        for rps in &self.st_ref_pic_set {
            let pocs = rps.delta_pocs(ret.last());
            ret.push(pocs);
        }
        ret
    }
}

impl Decode for SequenceParameterSet {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();

        decode!(
            bs,
            &mut ret.sps_video_parameter_set_id,
            &mut ret.sps_max_sub_layers_minus1,
            &mut ret.sps_temporal_id_nesting_flag
        )?;

        ret.profile_tier_level = ProfileTierLevel::decode(bs, 1, ret.sps_max_sub_layers_minus1.0)?;

        decode!(bs, &mut ret.sps_seq_parameter_set_id, &mut ret.chroma_format_idc)?;

        if ret.chroma_format_idc.0 == 3 {
            decode!(bs, &mut ret.separate_colour_plane_flag)?;
        }

        decode!(
            bs,
            &mut ret.pic_width_in_luma_samples,
            &mut ret.pic_height_in_luma_samples,
            &mut ret.conformance_window_flag
        )?;

        if ret.conformance_window_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.conf_win_left_offset,
                &mut ret.conf_win_right_offset,
                &mut ret.conf_win_top_offset,
                &mut ret.conf_win_bottom_offset
            )?;
        }

        decode!(
            bs,
            &mut ret.bit_depth_luma_minus8,
            &mut ret.bit_depth_chroma_minus8,
            &mut ret.log2_max_pic_order_cnt_lsb_minus4,
            &mut ret.sps_sub_layer_ordering_info_present_flag
        )?;

        let mut i = match ret.sps_sub_layer_ordering_info_present_flag.0 {
            0 => ret.sps_max_sub_layers_minus1.0,
            _ => 0,
        };
        while i <= ret.sps_max_sub_layers_minus1.0 {
            ret.sub_layer_ordering_info.push(SequenceParameterSetSubLayerOrderingInfo::decode(bs)?);
            i += 1;
        }

        decode!(
            bs,
            &mut ret.log2_min_luma_coding_block_size_minus3,
            &mut ret.log2_diff_max_min_luma_coding_block_size,
            &mut ret.log2_min_luma_transform_block_size_minus2,
            &mut ret.log2_diff_max_min_luma_transform_block_size,
            &mut ret.max_transform_hierarchy_depth_inter,
            &mut ret.max_transform_hierarchy_depth_intra,
            &mut ret.scaling_list_enabled_flag
        )?;

        if ret.scaling_list_enabled_flag.0 != 0 {
            decode!(bs, &mut ret.sps_scaling_list_data_present_flag)?;
            if ret.sps_scaling_list_data_present_flag.0 != 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "decoding scaling matrices is not supported"));
            }
        }

        decode!(
            bs,
            &mut ret.amp_enabled_flag,
            &mut ret.sample_adaptive_offset_enabled_flag,
            &mut ret.pcm_enabled_flag
        )?;

        if ret.pcm_enabled_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.pcm_sample_bit_depth_luma_minus1,
                &mut ret.pcm_sample_bit_depth_chroma_minus1,
                &mut ret.log2_min_pcm_luma_coding_block_size_minus3,
                &mut ret.log2_diff_max_min_pcm_luma_coding_block_size,
                &mut ret.pcm_loop_filter_disabled_flag
            )?;
        }

        let num_short_term_ref_pic_sets = UE::decode(bs)?.0 as usize;
        let mut delta_pocs: Vec<DeltaPocs> = Vec::with_capacity(num_short_term_ref_pic_sets);
        for i in 0..num_short_term_ref_pic_sets {
            let rps = SequenceParameterSetShortTermRefPicSet::decode(bs, i, delta_pocs.last())?;
            delta_pocs.push(rps.delta_pocs(delta_pocs.last()));
            ret.st_ref_pic_set.push(rps);
        }

        decode!(bs, &mut ret.long_term_ref_pics_present_flag)?;

        if ret.long_term_ref_pics_present_flag.0 != 0 {
            let num_long_term_ref_pics_sps = UE::decode(bs)?.0;
            for _ in 0..num_long_term_ref_pics_sps {
                ret.long_term_ref_pics.push(LongTermRefPicSps {
                    lt_ref_pic_poc_lsb_sps: bs.read_bits(ret.poc_lsb_bits() as usize)? as u32,
                    used_by_curr_pic_lt_sps_flag: U1::decode(bs)?,
                });
            }
        }

        decode!(bs, &mut ret.sps_temporal_mvp_enabled_flag, &mut ret.strong_intra_smoothing_enabled_flag)?;

        if U1::decode(bs)?.is_set() {
            ret.vui_parameters = Some(VUIParameters::decode(bs, ret.sps_max_sub_layers_minus1.0)?);
        }

        decode!(bs, &mut ret.sps_extension_present_flag)?;

        if ret.sps_extension_present_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.sps_range_extension_flag,
                &mut ret.sps_multilayer_extension_flag,
                &mut ret.sps_3d_extension_flag,
                &mut ret.sps_scc_extension_flag,
                &mut ret.sps_extension_4bits
            )?;
            if ret.sps_range_extension_flag.0 != 0 {
                decode!(bs, &mut ret.sps_range_extension)?;
            }
            if ret.sps_multilayer_extension_flag.0 != 0
                || ret.sps_3d_extension_flag.0 != 0
                || ret.sps_scc_extension_flag.0 != 0
                || ret.sps_extension_4bits.0 != 0
            {
                return Err(io::Error::new(io::ErrorKind::Other, "decoding sps extensions other than range is not supported"));
            }
        }

        Ok(ret)
    }
}

impl Encode for SequenceParameterSet {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.sps_video_parameter_set_id,
            &self.sps_max_sub_layers_minus1,
            &self.sps_temporal_id_nesting_flag
        )?;

        self.profile_tier_level.encode(bs, true, self.sps_max_sub_layers_minus1.0)?;

        encode!(bs, &self.sps_seq_parameter_set_id, &self.chroma_format_idc)?;

        if self.chroma_format_idc.0 == 3 {
            encode!(bs, &self.separate_colour_plane_flag)?;
        }

        encode!(
            bs,
            &self.pic_width_in_luma_samples,
            &self.pic_height_in_luma_samples,
            &self.conformance_window_flag
        )?;

        if self.conformance_window_flag.0 != 0 {
            encode!(
                bs,
                &self.conf_win_left_offset,
                &self.conf_win_right_offset,
                &self.conf_win_top_offset,
                &self.conf_win_bottom_offset
            )?;
        }

        encode!(
            bs,
            &self.bit_depth_luma_minus8,
            &self.bit_depth_chroma_minus8,
            &self.log2_max_pic_order_cnt_lsb_minus4,
            &self.sps_sub_layer_ordering_info_present_flag
        )?;

        let expected = match self.sps_sub_layer_ordering_info_present_flag.0 {
            0 => 1,
            _ => self.sps_max_sub_layers_minus1.0 as usize + 1,
        };
        assert_eq!(self.sub_layer_ordering_info.len(), expected);
        encode!(bs, &self.sub_layer_ordering_info)?;

        encode!(
            bs,
            &self.log2_min_luma_coding_block_size_minus3,
            &self.log2_diff_max_min_luma_coding_block_size,
            &self.log2_min_luma_transform_block_size_minus2,
            &self.log2_diff_max_min_luma_transform_block_size,
            &self.max_transform_hierarchy_depth_inter,
            &self.max_transform_hierarchy_depth_intra,
            &self.scaling_list_enabled_flag
        )?;

        if self.scaling_list_enabled_flag.0 != 0 {
            encode!(bs, &self.sps_scaling_list_data_present_flag)?;
            if self.sps_scaling_list_data_present_flag.0 != 0 {
                return Err(Error::Unsupported("sps scaling lists"));
            }
        }

        encode!(
            bs,
            &self.amp_enabled_flag,
            &self.sample_adaptive_offset_enabled_flag,
            &self.pcm_enabled_flag
        )?;

        if self.pcm_enabled_flag.0 != 0 {
            encode!(
                bs,
                &self.pcm_sample_bit_depth_luma_minus1,
                &self.pcm_sample_bit_depth_chroma_minus1,
                &self.log2_min_pcm_luma_coding_block_size_minus3,
                &self.log2_diff_max_min_pcm_luma_coding_block_size,
                &self.pcm_loop_filter_disabled_flag
            )?;
        }

        bs.put_ue(self.st_ref_pic_set.len() as u32)?;
        let delta_pocs = self.short_term_delta_pocs();
        for (i, rps) in self.st_ref_pic_set.iter().enumerate() {
            let reference = if i > 0 { delta_pocs.get(i - 1) } else { None };
            rps.encode(bs, i, reference)?;
        }

        encode!(bs, &self.long_term_ref_pics_present_flag)?;

        if self.long_term_ref_pics_present_flag.0 != 0 {
            bs.put_ue(self.long_term_ref_pics.len() as u32)?;
            for lt in &self.long_term_ref_pics {
                bs.put_bits(self.poc_lsb_bits(), lt.lt_ref_pic_poc_lsb_sps)?;
                encode!(bs, &lt.used_by_curr_pic_lt_sps_flag)?;
            }
        }

        encode!(bs, &self.sps_temporal_mvp_enabled_flag, &self.strong_intra_smoothing_enabled_flag)?;

        bs.put_bool(self.vui_parameters.is_some())?;
        if let Some(vui) = &self.vui_parameters {
            vui.encode(bs, self.sps_max_sub_layers_minus1.0)?;
        }

        encode!(bs, &self.sps_extension_present_flag)?;

        if self.sps_extension_present_flag.0 != 0 {
            if self.sps_multilayer_extension_flag.0 != 0 || self.sps_3d_extension_flag.0 != 0 || self.sps_scc_extension_flag.0 != 0 || self.sps_extension_4bits.0 != 0
            {
                return Err(Error::Unsupported("sps extensions other than range"));
            }
            encode!(
                bs,
                &self.sps_range_extension_flag,
                &self.sps_multilayer_extension_flag,
                &self.sps_3d_extension_flag,
                &self.sps_scc_extension_flag,
                &self.sps_extension_4bits
            )?;
            if self.sps_range_extension_flag.0 != 0 {
                encode!(bs, &self.sps_range_extension)?;
            }
        }

        Ok(())
    }
}

// ITU-T H.265, 11/2019, E.2.1
#[derive(Clone, Debug, Default)]
pub struct VUIParameters {
    pub aspect_ratio_info_present_flag: U1,

    // if (aspect_ratio_info_present_flag) {
    pub aspect_ratio_idc: U8,
    // if (aspect_ratio_idc == Extended_SAR) {
    pub sar_width: U16,
    pub sar_height: U16,
    // }
    // }
    pub overscan_info_present_flag: U1,

    // if (overscan_info_present_flag) {
    pub overscan_appropriate_flag: U1,
    // }
    pub video_signal_type_present_flag: U1,

    // if (video_signal_type_present_flag) {
    pub video_format: U3,
    pub video_full_range_flag: U1,
    pub colour_description_present_flag: U1,

    // if (colour_description_present_flag) {
    pub colour_primaries: U8,
    pub transfer_characteristics: U8,
    pub matrix_coefficients: U8,
    // }
    // }
    pub chroma_loc_info_present_flag: U1,

    // if (chroma_loc_info_present_flag) {
    pub chroma_sample_loc_type_top_field: UE,
    pub chroma_sample_loc_type_bottom_field: UE,
    // }
    pub neutral_chroma_indication_flag: U1,
    pub field_seq_flag: U1,
    pub frame_field_info_present_flag: U1,
    pub default_display_window_flag: U1,

    // if( default_display_window_flag ) {
    pub def_disp_win_left_offset: UE,
    pub def_disp_win_right_offset: UE,
    pub def_disp_win_top_offset: UE,
    pub def_disp_win_bottom_offset: UE,
    // }
    pub vui_timing_info_present_flag: U1,

    // if (vui_timing_info_present_flag) {
    pub vui_num_units_in_tick: U32,
    pub vui_time_scale: U32,
    pub vui_poc_proportional_to_timing_flag: U1,
    // if( vui_poc_proportional_to_timing_flag )
    pub vui_num_ticks_poc_diff_one_minus1: UE,
    // if( vui_hrd_parameters_present_flag )
    pub hrd_parameters: Option<HrdParameters>,
    // }
    pub bitstream_restriction_flag: U1,

    // if( bitstream_restriction_flag ) {
    pub tiles_fixed_structure_flag: U1,
    pub motion_vectors_over_pic_boundaries_flag: U1,
    pub restricted_ref_pic_lists_flag: U1,
    pub min_spatial_segmentation_idc: UE,
    pub max_bytes_per_pic_denom: UE,
    pub max_bits_per_min_cu_denom: UE,
    pub log2_max_mv_length_horizontal: UE,
    pub log2_max_mv_length_vertical: UE,
    // }
}

pub const ASPECT_RATIO_IDC_EXTENDED_SAR: u8 = 255;

impl VUIParameters {
    pub fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>, sps_max_sub_layers_minus1: u8) -> io::Result<Self> {
        let mut ret = Self::default();

        decode!(bs, &mut ret.aspect_ratio_info_present_flag)?;

        if ret.aspect_ratio_info_present_flag.0 != 0 {
            decode!(bs, &mut ret.aspect_ratio_idc)?;

            if ret.aspect_ratio_idc.0 == ASPECT_RATIO_IDC_EXTENDED_SAR {
                decode!(bs, &mut ret.sar_width, &mut ret.sar_height)?;
            }
        }

        decode!(bs, &mut ret.overscan_info_present_flag)?;

        if ret.overscan_info_present_flag.0 != 0 {
            decode!(bs, &mut ret.overscan_appropriate_flag)?;
        }

        decode!(bs, &mut ret.video_signal_type_present_flag)?;

        if ret.video_signal_type_present_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.video_format,
                &mut ret.video_full_range_flag,
                &mut ret.colour_description_present_flag
            )?;

            if ret.colour_description_present_flag.0 != 0 {
                decode!(bs, &mut ret.colour_primaries, &mut ret.transfer_characteristics, &mut ret.matrix_coefficients)?;
            }
        }

        decode!(bs, &mut ret.chroma_loc_info_present_flag)?;

        if ret.chroma_loc_info_present_flag.0 != 0 {
            decode!(bs, &mut ret.chroma_sample_loc_type_top_field, &mut ret.chroma_sample_loc_type_bottom_field)?;
        }

        decode!(
            bs,
            &mut ret.neutral_chroma_indication_flag,
            &mut ret.field_seq_flag,
            &mut ret.frame_field_info_present_flag,
            &mut ret.default_display_window_flag
        )?;

        if ret.default_display_window_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.def_disp_win_left_offset,
                &mut ret.def_disp_win_right_offset,
                &mut ret.def_disp_win_top_offset,
                &mut ret.def_disp_win_bottom_offset
            )?;
        }

        decode!(bs, &mut ret.vui_timing_info_present_flag)?;

        if ret.vui_timing_info_present_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.vui_num_units_in_tick,
                &mut ret.vui_time_scale,
                &mut ret.vui_poc_proportional_to_timing_flag
            )?;
            if ret.vui_poc_proportional_to_timing_flag.0 != 0 {
                decode!(bs, &mut ret.vui_num_ticks_poc_diff_one_minus1)?;
            }
            if U1::decode(bs)?.is_set() {
                ret.hrd_parameters = Some(HrdParameters::decode(bs, true, sps_max_sub_layers_minus1)?);
            }
        }

        decode!(bs, &mut ret.bitstream_restriction_flag)?;

        if ret.bitstream_restriction_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.tiles_fixed_structure_flag,
                &mut ret.motion_vectors_over_pic_boundaries_flag,
                &mut ret.restricted_ref_pic_lists_flag,
                &mut ret.min_spatial_segmentation_idc,
                &mut ret.max_bytes_per_pic_denom,
                &mut ret.max_bits_per_min_cu_denom,
                &mut ret.log2_max_mv_length_horizontal,
                &mut ret.log2_max_mv_length_vertical
            )?;
        }

        Ok(ret)
    }

    pub fn encode(&self, bs: &mut BitstreamWriter<'_>, sps_max_sub_layers_minus1: u8) -> Result<()> {
        encode!(bs, &self.aspect_ratio_info_present_flag)?;

        if self.aspect_ratio_info_present_flag.0 != 0 {
            encode!(bs, &self.aspect_ratio_idc)?;

            if self.aspect_ratio_idc.0 == ASPECT_RATIO_IDC_EXTENDED_SAR {
                encode!(bs, &self.sar_width, &self.sar_height)?;
            }
        }

        encode!(bs, &self.overscan_info_present_flag)?;

        if self.overscan_info_present_flag.0 != 0 {
            encode!(bs, &self.overscan_appropriate_flag)?;
        }

        encode!(bs, &self.video_signal_type_present_flag)?;

        if self.video_signal_type_present_flag.0 != 0 {
            encode!(bs, &self.video_format, &self.video_full_range_flag, &self.colour_description_present_flag)?;

            if self.colour_description_present_flag.0 != 0 {
                encode!(bs, &self.colour_primaries, &self.transfer_characteristics, &self.matrix_coefficients)?;
            }
        }

        encode!(bs, &self.chroma_loc_info_present_flag)?;

        if self.chroma_loc_info_present_flag.0 != 0 {
            encode!(bs, &self.chroma_sample_loc_type_top_field, &self.chroma_sample_loc_type_bottom_field)?;
        }

        encode!(
            bs,
            &self.neutral_chroma_indication_flag,
            &self.field_seq_flag,
            &self.frame_field_info_present_flag,
            &self.default_display_window_flag
        )?;

        if self.default_display_window_flag.0 != 0 {
            encode!(
                bs,
                &self.def_disp_win_left_offset,
                &self.def_disp_win_right_offset,
                &self.def_disp_win_top_offset,
                &self.def_disp_win_bottom_offset
            )?;
        }

        encode!(bs, &self.vui_timing_info_present_flag)?;

        if self.vui_timing_info_present_flag.0 != 0 {
            encode!(bs, &self.vui_num_units_in_tick, &self.vui_time_scale, &self.vui_poc_proportional_to_timing_flag)?;
            if self.vui_poc_proportional_to_timing_flag.0 != 0 {
                encode!(bs, &self.vui_num_ticks_poc_diff_one_minus1)?;
            }
            bs.put_bool(self.hrd_parameters.is_some())?;
            if let Some(hrd) = &self.hrd_parameters {
                hrd.encode(bs, true, sps_max_sub_layers_minus1)?;
            }
        }

        encode!(bs, &self.bitstream_restriction_flag)?;

        if self.bitstream_restriction_flag.0 != 0 {
            encode!(
                bs,
                &self.tiles_fixed_structure_flag,
                &self.motion_vectors_over_pic_boundaries_flag,
                &self.restricted_ref_pic_lists_flag,
                &self.min_spatial_segmentation_idc,
                &self.max_bytes_per_pic_denom,
                &self.max_bits_per_min_cu_denom,
                &self.log2_max_mv_length_horizontal,
                &self.log2_max_mv_length_vertical
            )?;
        }

        Ok(())
    }
}
