use super::{decode, encode, syntax_elements::*, Bitstream, BitstreamWriter, Decode, Encode, Error, Result};

use std::io;

// ITU-T H.264, 04/2017, 7.3.2.2
#[derive(Clone, Debug, Default)]
pub struct PictureParameterSet {
    pub pic_parameter_set_id: UE,
    pub seq_parameter_set_id: UE,
    pub entropy_coding_mode_flag: U1,
    pub bottom_field_pic_order_in_frame_present_flag: U1,
    pub num_slice_groups_minus1: UE,
    pub num_ref_idx_l0_default_active_minus1: UE,
    pub num_ref_idx_l1_default_active_minus1: UE,
    pub weighted_pred_flag: U1,
    pub weighted_bipred_idc: U2,
    pub pic_init_qp_minus26: SE,
    pub pic_init_qs_minus26: SE,
    pub chroma_qp_index_offset: SE,
    pub deblocking_filter_control_present_flag: U1,
    pub constrained_intra_pred_flag: U1,
    pub redundant_pic_cnt_present_flag: U1,

    // if (more_rbsp_data())
    pub high_profile_extension: Option<PictureParameterSetHighProfileExtension>,
}

#[derive(Clone, Debug, Default)]
pub struct PictureParameterSetHighProfileExtension {
    pub transform_8x8_mode_flag: U1,
    pub pic_scaling_matrix_present_flag: U1,
    pub second_chroma_qp_index_offset: SE,
}

// ITU-T H.264, 04/2017, 7.2: true unless only rbsp_trailing_bits() remain.
fn more_rbsp_data<T: AsRef<[u8]>>(bs: &Bitstream<T>) -> bool {
    let remaining = bs.bits_remaining();
    if remaining > 64 {
        return true;
    }
    match bs.next_bits(remaining) {
        Some(bits) => bits & bits.wrapping_sub(1) != 0,
        None => false,
    }
}

impl Decode for PictureParameterSet {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>) -> io::Result<Self> {
        let mut ret = Self::default();

        decode!(
            bs,
            &mut ret.pic_parameter_set_id,
            &mut ret.seq_parameter_set_id,
            &mut ret.entropy_coding_mode_flag,
            &mut ret.bottom_field_pic_order_in_frame_present_flag,
            &mut ret.num_slice_groups_minus1
        )?;

        if ret.num_slice_groups_minus1.0 > 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "decoding slice groups is not supported"));
        }

        decode!(
            bs,
            &mut ret.num_ref_idx_l0_default_active_minus1,
            &mut ret.num_ref_idx_l1_default_active_minus1,
            &mut ret.weighted_pred_flag,
            &mut ret.weighted_bipred_idc,
            &mut ret.pic_init_qp_minus26,
            &mut ret.pic_init_qs_minus26,
            &mut ret.chroma_qp_index_offset,
            &mut ret.deblocking_filter_control_present_flag,
            &mut ret.constrained_intra_pred_flag,
            &mut ret.redundant_pic_cnt_present_flag
        )?;

        if more_rbsp_data(bs) {
            let mut ext = PictureParameterSetHighProfileExtension::default();
            decode!(bs, &mut ext.transform_8x8_mode_flag, &mut ext.pic_scaling_matrix_present_flag)?;
            if ext.pic_scaling_matrix_present_flag.0 != 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "decoding scaling matrices is not supported"));
            }
            decode!(bs, &mut ext.second_chroma_qp_index_offset)?;
            ret.high_profile_extension = Some(ext);
        }

        Ok(ret)
    }
}

impl Encode for PictureParameterSet {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        encode!(
            bs,
            &self.pic_parameter_set_id,
            &self.seq_parameter_set_id,
            &self.entropy_coding_mode_flag,
            &self.bottom_field_pic_order_in_frame_present_flag,
            &self.num_slice_groups_minus1
        )?;

        if self.num_slice_groups_minus1.0 > 0 {
            return Err(Error::Unsupported("slice groups"));
        }

        encode!(
            bs,
            &self.num_ref_idx_l0_default_active_minus1,
            &self.num_ref_idx_l1_default_active_minus1,
            &self.weighted_pred_flag,
            &self.weighted_bipred_idc,
            &self.pic_init_qp_minus26,
            &self.pic_init_qs_minus26,
            &self.chroma_qp_index_offset,
            &self.deblocking_filter_control_present_flag,
            &self.constrained_intra_pred_flag,
            &self.redundant_pic_cnt_present_flag
        )?;

        if let Some(ext) = &self.high_profile_extension {
            encode!(bs, &ext.transform_8x8_mode_flag, &ext.pic_scaling_matrix_present_flag)?;
            if ext.pic_scaling_matrix_present_flag.0 != 0 {
                return Err(Error::Unsupported("picture scaling matrices"));
            }
            encode!(bs, &ext.second_chroma_qp_index_offset)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_picture_parameter_set() {
        // pic_parameter_set_id 0, seq_parameter_set_id 0, CABAC, deblocking control, no high profile tail
        let pps = PictureParameterSet {
            entropy_coding_mode_flag: U1(1),
            deblocking_filter_control_present_flag: U1(1),
            ..Default::default()
        };
        let mut bs = BitstreamWriter::with_capacity(4);
        pps.encode(&mut bs).unwrap();
        bs.put_trailing_bits().unwrap();
        bs.flush().unwrap();
        assert_eq!(bs.bytes(), &[0xee, 0x3c, 0x80]);

        let decoded = PictureParameterSet::decode(&mut Bitstream::new(bs.bytes())).unwrap();
        assert_eq!(decoded.entropy_coding_mode_flag.0, 1);
        assert!(decoded.high_profile_extension.is_none());
    }

    #[test]
    fn test_high_profile_extension() {
        let pps = PictureParameterSet {
            pic_parameter_set_id: UE(1),
            entropy_coding_mode_flag: U1(1),
            num_ref_idx_l0_default_active_minus1: UE(2),
            weighted_bipred_idc: U2(2),
            pic_init_qp_minus26: SE(-4),
            chroma_qp_index_offset: SE(-2),
            deblocking_filter_control_present_flag: U1(1),
            high_profile_extension: Some(PictureParameterSetHighProfileExtension {
                transform_8x8_mode_flag: U1(1),
                second_chroma_qp_index_offset: SE(-2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut bs = BitstreamWriter::with_capacity(4);
        pps.encode(&mut bs).unwrap();
        bs.put_trailing_bits().unwrap();
        bs.flush().unwrap();

        let decoded = PictureParameterSet::decode(&mut Bitstream::new(bs.bytes())).unwrap();
        assert_eq!(decoded.pic_parameter_set_id.0, 1);
        assert_eq!(decoded.num_ref_idx_l0_default_active_minus1.0, 2);
        assert_eq!(decoded.weighted_bipred_idc.0, 2);
        assert_eq!(decoded.pic_init_qp_minus26.0, -4);
        assert_eq!(decoded.chroma_qp_index_offset.0, -2);
        let ext = decoded.high_profile_extension.unwrap();
        assert_eq!(ext.transform_8x8_mode_flag.0, 1);
        assert_eq!(ext.second_chroma_qp_index_offset.0, -2);
    }

    #[test]
    fn test_slice_groups_unsupported() {
        let pps = PictureParameterSet {
            num_slice_groups_minus1: UE(1),
            ..Default::default()
        };
        let mut bs = BitstreamWriter::with_capacity(4);
        assert!(matches!(pps.encode(&mut bs), Err(Error::Unsupported(_))));
    }
}
