use super::{
    AccessUnitDelimiter, Encode, NALUnitHeader, PictureParameterSet, Result, SequenceParameterSet, VideoParameterSet, NAL_UNIT_TYPE_ACCESS_UNIT_DELIMITER,
    NAL_UNIT_TYPE_PICTURE_PARAMETER_SET, NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET, NAL_UNIT_TYPE_VIDEO_PARAMETER_SET,
};

fn build<V: Encode>(kind: &str, nal_unit_type: u8, value: &V, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    let header = NALUnitHeader::new(nal_unit_type);
    let written = h264::build_nal_unit(&header, dest, position, |bs| value.encode(bs))?;
    log::trace!("built h265 {} at {} ({} bytes)", kind, position, written);
    Ok(written)
}

/// Writes `vps` as an Annex B NAL unit into `dest` at `position`. `dest` is resized to end right
/// after the unit, and the unit's length is returned.
pub fn build_vps(vps: &VideoParameterSet, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    build("vps", NAL_UNIT_TYPE_VIDEO_PARAMETER_SET, vps, dest, position)
}

pub fn build_sps(sps: &SequenceParameterSet, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    build("sps", NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET, sps, dest, position)
}

pub fn build_pps(pps: &PictureParameterSet, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    build("pps", NAL_UNIT_TYPE_PICTURE_PARAMETER_SET, pps, dest, position)
}

pub fn build_aud(aud: &AccessUnitDelimiter, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    build("aud", NAL_UNIT_TYPE_ACCESS_UNIT_DELIMITER, aud, dest, position)
}

#[cfg(test)]
mod test {
    use super::super::*;

    const VPS_RBSP: [u8; 19] = [
        0x0c, 0x01, 0xff, 0xff, 0x01, 0x60, 0x00, 0x00, 0x00, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x96, 0x17, 0x02, 0x40,
    ];

    const SPS_RBSP: [u8; 36] = [
        0x01, 0x01, 0x60, 0x00, 0x00, 0x00, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x96, 0xa0, 0x02, 0x80, 0x80, 0x2d, 0x16, 0x20, 0x5e, 0xe4, 0x59, 0x14,
        0xbf, 0xf2, 0xe7, 0xf1, 0x3f, 0xac, 0x05, 0xa8, 0x10, 0x10, 0x10, 0x04,
    ];

    const PPS_RBSP: [u8; 8] = [0xc1, 0x62, 0x4f, 0x08, 0x20, 0x26, 0x4c, 0x90];

    fn parse_nal_unit(bytes: &[u8]) -> NALUnit {
        assert_eq!(&bytes[..4], &[0, 0, 0, 1]);
        NALUnit::decode(&mut Bitstream::new(&bytes[4..])).unwrap()
    }

    #[test]
    fn test_build_vps() {
        let vps = VideoParameterSet::decode(&mut Bitstream::new(&VPS_RBSP)).unwrap();
        let mut dest = Vec::new();
        let n = build_vps(&vps, &mut dest, 0).unwrap();
        assert_eq!(n, dest.len());
        assert_eq!(&dest[..6], &[0x00, 0x00, 0x00, 0x01, 0x40, 0x01]);
        // 60 00 00 00 b0 needs an emulation prevention byte
        assert_eq!(&dest[11..17], &[0x60, 0x00, 0x00, 0x03, 0x00, 0xb0]);

        let nalu = parse_nal_unit(&dest);
        assert_eq!(nalu.nal_unit_header.nal_unit_type.0, NAL_UNIT_TYPE_VIDEO_PARAMETER_SET);
        assert_eq!(nalu.rbsp_byte, VPS_RBSP);
    }

    #[test]
    fn test_build_sps_and_pps() {
        let sps = SequenceParameterSet::decode(&mut Bitstream::new(&SPS_RBSP)).unwrap();
        let pps = PictureParameterSet::decode(&mut Bitstream::new(&PPS_RBSP)).unwrap();

        let mut dest = Vec::new();
        let sps_len = build_sps(&sps, &mut dest, 0).unwrap();
        assert_eq!(&dest[4..6], &[0x42, 0x01]);
        let nalu = parse_nal_unit(&dest);
        assert_eq!(nalu.rbsp_byte, SPS_RBSP);

        let pps_len = build_pps(&pps, &mut dest, sps_len).unwrap();
        assert_eq!(dest.len(), sps_len + pps_len);
        assert_eq!(&dest[sps_len..], &[0x00, 0x00, 0x00, 0x01, 0x44, 0x01, 0xc1, 0x62, 0x4f, 0x08, 0x20, 0x26, 0x4c, 0x90]);
    }

    #[test]
    fn test_build_aud() {
        let aud = AccessUnitDelimiter {
            pic_type: U3(PIC_TYPE_I_P_B),
        };
        let mut dest = Vec::new();
        let n = build_aud(&aud, &mut dest, 0).unwrap();
        assert_eq!(n, 7);
        assert_eq!(dest, vec![0x00, 0x00, 0x00, 0x01, 0x46, 0x01, 0x50]);
    }

    #[test]
    fn test_build_stream() {
        let mut vps = VideoParameterSet::default();
        vps.profile_tier_level = ProfileTierLevel::new(HevcProfile::Main, HevcLevel::L4_1);
        let mut sps = SequenceParameterSet {
            profile_tier_level: vps.profile_tier_level.clone(),
            chroma_format_idc: UE(1),
            pic_width_in_luma_samples: UE(1920),
            pic_height_in_luma_samples: UE(1080),
            sub_layer_ordering_info: vec![SequenceParameterSetSubLayerOrderingInfo::default()],
            ..Default::default()
        };
        sps.set_coding_unit_sizes(HevcCodingUnitSize::Cu8x8, HevcCodingUnitSize::Cu64x64);
        sps.set_transform_unit_sizes(HevcTransformUnitSize::Tu4x4, HevcTransformUnitSize::Tu32x32);
        let pps = PictureParameterSet::default();

        let mut dest = Vec::new();
        let mut position = 0;
        position += build_aud(&AccessUnitDelimiter::default(), &mut dest, position).unwrap();
        position += build_vps(&vps, &mut dest, position).unwrap();
        position += build_sps(&sps, &mut dest, position).unwrap();
        position += build_pps(&pps, &mut dest, position).unwrap();
        assert_eq!(dest.len(), position);

        let types: Vec<u8> = iterate_annex_b(&dest).map(|nalu| nalu[0] >> 1).collect();
        assert_eq!(
            types,
            vec![
                NAL_UNIT_TYPE_ACCESS_UNIT_DELIMITER,
                NAL_UNIT_TYPE_VIDEO_PARAMETER_SET,
                NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET,
                NAL_UNIT_TYPE_PICTURE_PARAMETER_SET
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let sps = SequenceParameterSet::decode(&mut Bitstream::new(&SPS_RBSP)).unwrap();
        let mut a = vec![0xaa; 3];
        let mut b = vec![0xaa; 3];
        build_sps(&sps, &mut a, 3).unwrap();
        build_sps(&sps, &mut b, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..3], &[0xaa; 3]);
    }
}
