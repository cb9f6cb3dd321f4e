use super::{decode, encode, syntax_elements::*, Bitstream, BitstreamWriter, Decode, Encode, Error, Result};
use std::io;

// ITU-T H.265, 11/2019 7.3.2.3.1
#[derive(Clone, Debug, Default)]
pub struct PictureParameterSet {
    pub pps_pic_parameter_set_id: UE,
    pub pps_seq_parameter_set_id: UE,
    pub dependent_slice_segments_enabled_flag: U1,
    pub output_flag_present_flag: U1,
    pub num_extra_slice_header_bits: U3,
    pub sign_data_hiding_enabled_flag: U1,
    pub cabac_init_present_flag: U1,
    pub num_ref_idx_l0_default_active_minus1: UE,
    pub num_ref_idx_l1_default_active_minus1: UE,
    pub init_qp_minus26: SE,
    pub constrained_intra_pred_flag: U1,
    pub transform_skip_enabled_flag: U1,
    pub cu_qp_delta_enabled_flag: U1,

    // if( cu_qp_delta_enabled_flag )
    pub diff_cu_qp_delta_depth: UE,

    pub pps_cb_qp_offset: SE,
    pub pps_cr_qp_offset: SE,
    pub pps_slice_chroma_qp_offsets_present_flag: U1,
    pub weighted_pred_flag: U1,
    pub weighted_bipred_flag: U1,
    pub transquant_bypass_enabled_flag: U1,
    pub tiles_enabled_flag: U1,
    pub entropy_coding_sync_enabled_flag: U1,

    // if( tiles_enabled_flag ) {
    pub num_tile_columns_minus1: UE,
    pub num_tile_rows_minus1: UE,
    pub uniform_spacing_flag: U1,
    //   if( !uniform_spacing_flag ) {
    //     for( i = 0; i < num_tile_columns_minus1; i++ )
    pub column_width_minus1: Vec<UE>,
    //     for( i = 0; i < num_tile_rows_minus1; i++ )
    pub row_height_minus1: Vec<UE>,
    //   }
    pub loop_filter_across_tiles_enabled_flag: U1,
    // }
    pub pps_loop_filter_across_slices_enabled_flag: U1,
    pub deblocking_filter_control_present_flag: U1,

    //if( deblocking_filter_control_present_flag ) {
    pub deblocking_filter_override_enabled_flag: U1,
    pub pps_deblocking_filter_disabled_flag: U1,
    //if( !pps_deblocking_filter_disabled_flag ) {
    pub pps_beta_offset_div2: SE,
    pub pps_tc_offset_div2: SE,
    //}
    //}
    pub pps_scaling_list_data_present_flag: U1,

    pub lists_modification_present_flag: U1,
    pub log2_parallel_merge_level_minus2: UE,
    pub slice_segment_header_extension_present_flag: U1,

    pub pps_extension_present_flag: U1,
    //if( pps_extension_present_flag ) {
    pub pps_range_extension_flag: U1,
    pub pps_multilayer_extension_flag: U1,
    pub pps_3d_extension_flag: U1,
    pub pps_scc_extension_flag: U1,
    pub pps_extension_4bits: U4,
    //}
    // if( pps_range_extension_flag )
    pub pps_range_extension: PictureParameterSetRangeExtension,
}

// ITU-T H.265, 11/2019 7.3.2.3.2
#[derive(Clone, Debug, Default)]
pub struct PictureParameterSetRangeExtension {
    // if( transform_skip_enabled_flag )
    pub log2_max_transform_skip_block_size_minus2: UE,
    pub cross_component_prediction_enabled_flag: U1,
    pub chroma_qp_offset_list_enabled_flag: U1,

    // if( chroma_qp_offset_list_enabled_flag ) {
    pub diff_cu_chroma_qp_offset_depth: UE,
    // for( i = 0; i <= chroma_qp_offset_list_len_minus1; i++ ) {
    pub cb_qp_offset_list: Vec<SE>,
    pub cr_qp_offset_list: Vec<SE>,
    // }
    // }
    pub log2_sao_offset_scale_luma: UE,
    pub log2_sao_offset_scale_chroma: UE,
}

impl PictureParameterSetRangeExtension {
    pub fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>, transform_skip_enabled_flag: bool) -> io::Result<Self> {
        let mut ret = Self::default();

        if transform_skip_enabled_flag {
            decode!(bs, &mut ret.log2_max_transform_skip_block_size_minus2)?;
        }

        decode!(
            bs,
            &mut ret.cross_component_prediction_enabled_flag,
            &mut ret.chroma_qp_offset_list_enabled_flag
        )?;

        if ret.chroma_qp_offset_list_enabled_flag.0 != 0 {
            decode!(bs, &mut ret.diff_cu_chroma_qp_offset_depth)?;
            let chroma_qp_offset_list_len_minus1 = UE::decode(bs)?.0;
            for _ in 0..=chroma_qp_offset_list_len_minus1 {
                ret.cb_qp_offset_list.push(SE::decode(bs)?);
                ret.cr_qp_offset_list.push(SE::decode(bs)?);
            }
        }

        decode!(bs, &mut ret.log2_sao_offset_scale_luma, &mut ret.log2_sao_offset_scale_chroma)?;

        Ok(ret)
    }

    pub fn encode(&self, bs: &mut BitstreamWriter<'_>, transform_skip_enabled_flag: bool) -> Result<()> {
        if transform_skip_enabled_flag {
            encode!(bs, &self.log2_max_transform_skip_block_size_minus2)?;
        }

        encode!(
            bs,
            &self.cross_component_prediction_enabled_flag,
            &self.chroma_qp_offset_list_enabled_flag
        )?;

        if self.chroma_qp_offset_list_enabled_flag.0 != 0 {
            assert!(!self.cb_qp_offset_list.is_empty());
            assert_eq!(self.cb_qp_offset_list.len(), self.cr_qp_offset_list.len());
            encode!(bs, &self.diff_cu_chroma_qp_offset_depth)?;
            bs.put_ue(self.cb_qp_offset_list.len() as u32 - 1)?;
            for (cb, cr) in self.cb_qp_offset_list.iter().zip(&self.cr_qp_offset_list) {
                encode!(bs, cb, cr)?;
            }
        }

        encode!(bs, &self.log2_sao_offset_scale_luma, &self.log2_sao_offset_scale_chroma)
    }
}

// These function names follow the naming conventions in the standard.
#[allow(non_snake_case)]
impl PictureParameterSet {
    /// Specifies the width of the i-th tile column in units of CTBs.
    pub fn colWidth(&self, i: usize, PicWidthInCtbsY: u32) -> u32 {
        let num_tile_columns = self.num_tile_columns_minus1.0 + 1;
        match self.uniform_spacing_flag.0 {
            0 if i as u32 == self.num_tile_columns_minus1.0 => PicWidthInCtbsY - self.column_width_minus1.iter().map(|ue| ue.0 + 1).sum::<u32>(),
            0 => self.column_width_minus1[i].0 + 1,
            _ => ((i as u32 + 1) * PicWidthInCtbsY) / num_tile_columns - (i as u32 * PicWidthInCtbsY) / num_tile_columns,
        }
    }

    /// Specifies the height of the j-th tile row in units of CTBs.
    pub fn rowHeight(&self, j: usize, PicHeightInCtbsY: u32) -> u32 {
        let num_tile_rows = self.num_tile_rows_minus1.0 + 1;
        match self.uniform_spacing_flag.0 {
            0 if j as u32 == self.num_tile_rows_minus1.0 => PicHeightInCtbsY - self.row_height_minus1.iter().map(|ue| ue.0 + 1).sum::<u32>(),
            0 => self.row_height_minus1[j].0 + 1,
            _ => ((j as u32 + 1) * PicHeightInCtbsY) / num_tile_rows - (j as u32 * PicHeightInCtbsY) / num_tile_rows,
        }
    }
}

impl Decode for PictureParameterSet {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();

        decode!(
            bs,
            &mut ret.pps_pic_parameter_set_id,
            &mut ret.pps_seq_parameter_set_id,
            &mut ret.dependent_slice_segments_enabled_flag,
            &mut ret.output_flag_present_flag,
            &mut ret.num_extra_slice_header_bits,
            &mut ret.sign_data_hiding_enabled_flag,
            &mut ret.cabac_init_present_flag,
            &mut ret.num_ref_idx_l0_default_active_minus1,
            &mut ret.num_ref_idx_l1_default_active_minus1,
            &mut ret.init_qp_minus26,
            &mut ret.constrained_intra_pred_flag,
            &mut ret.transform_skip_enabled_flag,
            &mut ret.cu_qp_delta_enabled_flag
        )?;

        if ret.cu_qp_delta_enabled_flag.0 != 0 {
            decode!(bs, &mut ret.diff_cu_qp_delta_depth)?;
        }

        decode!(
            bs,
            &mut ret.pps_cb_qp_offset,
            &mut ret.pps_cr_qp_offset,
            &mut ret.pps_slice_chroma_qp_offsets_present_flag,
            &mut ret.weighted_pred_flag,
            &mut ret.weighted_bipred_flag,
            &mut ret.transquant_bypass_enabled_flag,
            &mut ret.tiles_enabled_flag,
            &mut ret.entropy_coding_sync_enabled_flag
        )?;

        if ret.tiles_enabled_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.num_tile_columns_minus1,
                &mut ret.num_tile_rows_minus1,
                &mut ret.uniform_spacing_flag
            )?;
            if ret.uniform_spacing_flag.0 == 0 {
                for _ in 0..ret.num_tile_columns_minus1.0 {
                    ret.column_width_minus1.push(UE::decode(bs)?);
                }
                for _ in 0..ret.num_tile_rows_minus1.0 {
                    ret.row_height_minus1.push(UE::decode(bs)?);
                }
            }
            decode!(bs, &mut ret.loop_filter_across_tiles_enabled_flag)?;
        }

        decode!(
            bs,
            &mut ret.pps_loop_filter_across_slices_enabled_flag,
            &mut ret.deblocking_filter_control_present_flag
        )?;

        if ret.deblocking_filter_control_present_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.deblocking_filter_override_enabled_flag,
                &mut ret.pps_deblocking_filter_disabled_flag
            )?;
            if ret.pps_deblocking_filter_disabled_flag.0 == 0 {
                decode!(bs, &mut ret.pps_beta_offset_div2, &mut ret.pps_tc_offset_div2)?;
            }
        }
        bs.decode(&mut ret.pps_scaling_list_data_present_flag)?;

        if ret.pps_scaling_list_data_present_flag.0 != 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "decoding scaling matrices is not supported"));
        }

        decode!(
            bs,
            &mut ret.lists_modification_present_flag,
            &mut ret.log2_parallel_merge_level_minus2,
            &mut ret.slice_segment_header_extension_present_flag,
            &mut ret.pps_extension_present_flag
        )?;

        if ret.pps_extension_present_flag.0 != 0 {
            decode!(
                bs,
                &mut ret.pps_range_extension_flag,
                &mut ret.pps_multilayer_extension_flag,
                &mut ret.pps_3d_extension_flag,
                &mut ret.pps_scc_extension_flag,
                &mut ret.pps_extension_4bits
            )?;
            if ret.pps_range_extension_flag.0 != 0 {
                ret.pps_range_extension = PictureParameterSetRangeExtension::decode(bs, ret.transform_skip_enabled_flag.is_set())?;
            }
            if ret.pps_multilayer_extension_flag.0 != 0
                || ret.pps_3d_extension_flag.0 != 0
                || ret.pps_scc_extension_flag.0 != 0
                || ret.pps_extension_4bits.0 != 0
            {
                return Err(io::Error::new(io::ErrorKind::Other, "decoding pps extensions other than range is not supported"));
            }
        }

        Ok(ret)
    }
}

impl Encode for PictureParameterSet {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.pps_pic_parameter_set_id,
            &self.pps_seq_parameter_set_id,
            &self.dependent_slice_segments_enabled_flag,
            &self.output_flag_present_flag,
            &self.num_extra_slice_header_bits,
            &self.sign_data_hiding_enabled_flag,
            &self.cabac_init_present_flag,
            &self.num_ref_idx_l0_default_active_minus1,
            &self.num_ref_idx_l1_default_active_minus1,
            &self.init_qp_minus26,
            &self.constrained_intra_pred_flag,
            &self.transform_skip_enabled_flag,
            &self.cu_qp_delta_enabled_flag
        )?;

        if self.cu_qp_delta_enabled_flag.0 != 0 {
            encode!(bs, &self.diff_cu_qp_delta_depth)?;
        }

        encode!(
            bs,
            &self.pps_cb_qp_offset,
            &self.pps_cr_qp_offset,
            &self.pps_slice_chroma_qp_offsets_present_flag,
            &self.weighted_pred_flag,
            &self.weighted_bipred_flag,
            &self.transquant_bypass_enabled_flag,
            &self.tiles_enabled_flag,
            &self.entropy_coding_sync_enabled_flag
        )?;

        if self.tiles_enabled_flag.0 != 0 {
            encode!(bs, &self.num_tile_columns_minus1, &self.num_tile_rows_minus1, &self.uniform_spacing_flag)?;
            if self.uniform_spacing_flag.0 == 0 {
                assert_eq!(self.column_width_minus1.len(), self.num_tile_columns_minus1.0 as usize);
                assert_eq!(self.row_height_minus1.len(), self.num_tile_rows_minus1.0 as usize);
                encode!(bs, &self.column_width_minus1, &self.row_height_minus1)?;
            }
            encode!(bs, &self.loop_filter_across_tiles_enabled_flag)?;
        }

        encode!(
            bs,
            &self.pps_loop_filter_across_slices_enabled_flag,
            &self.deblocking_filter_control_present_flag
        )?;

        if self.deblocking_filter_control_present_flag.0 != 0 {
            encode!(bs, &self.deblocking_filter_override_enabled_flag, &self.pps_deblocking_filter_disabled_flag)?;
            if self.pps_deblocking_filter_disabled_flag.0 == 0 {
                encode!(bs, &self.pps_beta_offset_div2, &self.pps_tc_offset_div2)?;
            }
        }
        bs.encode(&self.pps_scaling_list_data_present_flag)?;

        if self.pps_scaling_list_data_present_flag.0 != 0 {
            return Err(Error::Unsupported("pps scaling lists"));
        }

        encode!(
            bs,
            &self.lists_modification_present_flag,
            &self.log2_parallel_merge_level_minus2,
            &self.slice_segment_header_extension_present_flag,
            &self.pps_extension_present_flag
        )?;

        if self.pps_extension_present_flag.0 != 0 {
            if self.pps_multilayer_extension_flag.0 != 0 || self.pps_3d_extension_flag.0 != 0 || self.pps_scc_extension_flag.0 != 0 || self.pps_extension_4bits.0 != 0
            {
                return Err(Error::Unsupported("pps extensions other than range"));
            }
            encode!(
                bs,
                &self.pps_range_extension_flag,
                &self.pps_multilayer_extension_flag,
                &self.pps_3d_extension_flag,
                &self.pps_scc_extension_flag,
                &self.pps_extension_4bits
            )?;
            if self.pps_range_extension_flag.0 != 0 {
                self.pps_range_extension.encode(bs, self.transform_skip_enabled_flag.is_set())?;
            }
        }

        Ok(())
    }
}
