use super::{BitstreamWriter, Result};

// a header byte, an extension byte and the longest leb128
const OBU_HEADER_MAX_SIZE: usize = 2 + 10;

/// AV1-Spec-2 - 6.2.2
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum ObuType {
    SequenceHeader,
    TemporalDelimiter,
    FrameHeader,
    TileGroup,
    Metadata,
    Frame,
    RedundantFrameHeader,
    TileList,
    Padding,
}

impl From<ObuType> for u8 {
    fn from(value: ObuType) -> Self {
        match value {
            ObuType::SequenceHeader => 1,
            ObuType::TemporalDelimiter => 2,
            ObuType::FrameHeader => 3,
            ObuType::TileGroup => 4,
            ObuType::Metadata => 5,
            ObuType::Frame => 6,
            ObuType::RedundantFrameHeader => 7,
            ObuType::TileList => 8,
            ObuType::Padding => 15,
        }
    }
}

/// AV1-Spec-2 - 5.3.3
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
pub struct ObuExtension {
    /// 3 bits
    pub temporal_id: u8,
    /// 2 bits
    pub spatial_id: u8,
}

/// Writes `obu_header()` with `obu_has_size_field` set. AV1-Spec-2 - 5.3.2
pub fn write_obu_header(bs: &mut BitstreamWriter<'_>, obu_type: ObuType, extension: Option<&ObuExtension>) -> Result<()> {
    bs.put_bool(false)?; // obu_forbidden_bit
    bs.put_bits(4, u8::from(obu_type) as u32)?;
    bs.put_bool(extension.is_some())?;
    bs.put_bool(true)?; // obu_has_size_field
    bs.put_bool(false)?; // obu_reserved_1bit

    if let Some(ext) = extension {
        bs.put_bits(3, ext.temporal_id as u32)?;
        bs.put_bits(2, ext.spatial_id as u32)?;
        bs.put_bits(3, 0)?; // extension_header_reserved_3bits
    }

    Ok(())
}

/// Frames a flushed `payload` as an OBU at `position` in `dest` and truncates `dest` right after
/// it. `trailing_size` counts bytes the caller appends after the payload that still belong to the
/// OBU; they are included in `obu_size` but not written.
///
/// Returns the number of bytes written.
pub fn build_obu(
    obu_type: ObuType,
    extension: Option<&ObuExtension>,
    payload: &BitstreamWriter<'_>,
    trailing_size: usize,
    dest: &mut Vec<u8>,
    position: usize,
) -> Result<usize> {
    let obu_size = payload.byte_count() + trailing_size;
    dest.resize(position + OBU_HEADER_MAX_SIZE + payload.byte_count(), 0);

    let written = {
        let mut bs = BitstreamWriter::attach(dest.as_mut_slice(), position);
        write_obu_header(&mut bs, obu_type, extension)?;
        bs.put_leb128(obu_size as u64)?;
        bs.flush()?;
        bs.append_byte_stream(payload)?;
        bs.byte_count() - position
    };

    dest.truncate(position + written);
    Ok(written)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_obu_header() {
        let mut bs = BitstreamWriter::with_capacity(2);
        write_obu_header(&mut bs, ObuType::SequenceHeader, None).unwrap();
        bs.flush().unwrap();
        assert_eq!(bs.bytes(), &[0x0a]);

        let mut bs = BitstreamWriter::with_capacity(2);
        let ext = ObuExtension {
            temporal_id: 5,
            spatial_id: 2,
        };
        write_obu_header(&mut bs, ObuType::Frame, Some(&ext)).unwrap();
        bs.flush().unwrap();
        assert_eq!(bs.bytes(), &[0x36, 0b1011_0000]);
    }

    #[test]
    fn test_build_obu() {
        let mut payload = BitstreamWriter::with_capacity(200);
        for i in 0..200u32 {
            payload.put_bits(8, i).unwrap();
        }
        payload.flush().unwrap();

        let mut dest = vec![0xee; 3];
        let n = build_obu(ObuType::Metadata, None, &payload, 0, &mut dest, 3).unwrap();
        assert_eq!(n, 1 + 2 + 200);
        assert_eq!(dest.len(), 3 + n);
        assert_eq!(&dest[..6], &[0xee, 0xee, 0xee, 0x2a, 0xc8, 0x01]);
        assert_eq!(dest[6], 0);
        assert_eq!(dest[205], 199);
    }

    #[test]
    fn test_build_obu_counts_trailing_size() {
        let mut payload = BitstreamWriter::with_capacity(1);
        payload.put_bits(8, 0x10).unwrap();
        payload.flush().unwrap();

        let mut dest = Vec::new();
        let n = build_obu(ObuType::Frame, None, &payload, 127, &mut dest, 0).unwrap();
        assert_eq!(n, 4);
        assert_eq!(dest, vec![0x32, 0x80, 0x01, 0x10]);
    }
}
