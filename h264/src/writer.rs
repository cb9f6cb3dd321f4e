use super::{
    build_nal_unit, AccessUnitDelimiter, Encode, NALUnitHeader, PictureParameterSet, Result, SequenceParameterSet, NAL_REF_IDC_NON_REFERENCE,
    NAL_REF_IDC_REFERENCE, NAL_UNIT_TYPE_ACCESS_UNIT_DELIMITER, NAL_UNIT_TYPE_PICTURE_PARAMETER_SET, NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET,
};

fn build<V: Encode>(kind: &str, header: NALUnitHeader, value: &V, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    let written = build_nal_unit(&header, dest, position, |bs| value.encode(bs))?;
    log::trace!("built h264 {} at {} ({} bytes)", kind, position, written);
    Ok(written)
}

/// Writes `sps` as an Annex B NAL unit into `dest` at `position`. `dest` is resized to end right
/// after the unit, and the unit's length is returned.
pub fn build_sps(sps: &SequenceParameterSet, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    let header = NALUnitHeader::new(NAL_REF_IDC_REFERENCE, NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET);
    build("sps", header, sps, dest, position)
}

/// Like `build_sps`, for picture parameter sets.
pub fn build_pps(pps: &PictureParameterSet, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    let header = NALUnitHeader::new(NAL_REF_IDC_REFERENCE, NAL_UNIT_TYPE_PICTURE_PARAMETER_SET);
    build("pps", header, pps, dest, position)
}

pub fn build_aud(aud: &AccessUnitDelimiter, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
    let header = NALUnitHeader::new(NAL_REF_IDC_NON_REFERENCE, NAL_UNIT_TYPE_ACCESS_UNIT_DELIMITER);
    build("aud", header, aud, dest, position)
}

#[cfg(test)]
mod test {
    use super::super::*;

    const SPS_NALU: [u8; 32] = [
        0x00, 0x00, 0x00, 0x01, 0x67, 0x4d, 0x40, 0x1f, 0xec, 0xa0, 0x28, 0x02, 0xdd, 0x80, 0xb5, 0x01, 0x01, 0x01, 0x40, 0x00, 0x00, 0x03, 0x00, 0x40,
        0x00, 0x05, 0xdc, 0x03, 0xc6, 0x0c, 0x65, 0x80,
    ];

    fn captured_sps() -> SequenceParameterSet {
        let nalu = NALUnit::decode(&mut Bitstream::new(&SPS_NALU[4..])).unwrap();
        SequenceParameterSet::decode(&mut Bitstream::new(&nalu.rbsp_byte)).unwrap()
    }

    #[test]
    fn test_build_sps() {
        let sps = captured_sps();
        let mut dest = Vec::new();
        let n = build_sps(&sps, &mut dest, 0).unwrap();
        assert_eq!(n, SPS_NALU.len());
        assert_eq!(dest, SPS_NALU);
    }

    #[test]
    fn test_build_pps() {
        let pps = PictureParameterSet {
            entropy_coding_mode_flag: U1(1),
            deblocking_filter_control_present_flag: U1(1),
            ..Default::default()
        };
        let mut dest = Vec::new();
        let n = build_pps(&pps, &mut dest, 0).unwrap();
        assert_eq!(n, 8);
        assert_eq!(dest, vec![0x00, 0x00, 0x00, 0x01, 0x68, 0xee, 0x3c, 0x80]);
    }

    #[test]
    fn test_build_aud() {
        let aud = AccessUnitDelimiter {
            primary_pic_type: U3(PRIMARY_PIC_TYPE_I_P_B),
        };
        let mut dest = Vec::new();
        let n = build_aud(&aud, &mut dest, 0).unwrap();
        assert_eq!(n, 6);
        assert_eq!(dest, vec![0x00, 0x00, 0x00, 0x01, 0x09, 0x50]);
    }

    #[test]
    fn test_build_stream() {
        let sps = captured_sps();
        let pps = PictureParameterSet::default();

        let mut dest = Vec::new();
        let mut position = 0;
        position += build_aud(&AccessUnitDelimiter::default(), &mut dest, position).unwrap();
        position += build_sps(&sps, &mut dest, position).unwrap();
        position += build_pps(&pps, &mut dest, position).unwrap();
        assert_eq!(dest.len(), position);

        let types: Vec<u8> = iterate_annex_b(&dest).map(|nalu| nalu[0] & NAL_UNIT_TYPE_MASK).collect();
        assert_eq!(
            types,
            vec![
                NAL_UNIT_TYPE_ACCESS_UNIT_DELIMITER,
                NAL_UNIT_TYPE_SEQUENCE_PARAMETER_SET,
                NAL_UNIT_TYPE_PICTURE_PARAMETER_SET
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let sps = captured_sps();
        let mut a = Vec::new();
        let mut b = Vec::new();
        build_sps(&sps, &mut a, 0).unwrap();
        build_sps(&sps, &mut b, 0).unwrap();
        assert_eq!(a, b);

        let pps = PictureParameterSet::default();
        let mut a = vec![0xff; 7];
        let mut b = vec![0xff; 7];
        build_pps(&pps, &mut a, 7).unwrap();
        build_pps(&pps, &mut b, 7).unwrap();
        assert_eq!(a, b);
    }
}
