use super::{
    build_obu, calculate_tile_group_obu_size, write_tile_group, BitstreamWriter, Encode, FrameHeader, ObuExtension, ObuType, Result, SequenceHeader,
    TileGroup, TileLayout,
};

const PAYLOAD_INITIAL_CAPACITY: usize = 256;

/// Writes AV1 OBUs into a caller's buffer. Every builder writes one OBU at `position`, resizes
/// `dest` to end right after it, and returns the OBU's length.
#[derive(Clone, Debug, Default)]
pub struct Av1BitstreamBuilder {
    /// When set, every OBU carries this extension header.
    pub obu_extension: Option<ObuExtension>,
}

impl Av1BitstreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_obu_extension(obu_extension: ObuExtension) -> Self {
        Self {
            obu_extension: Some(obu_extension),
        }
    }

    fn build(&self, kind: &str, obu_type: ObuType, payload: &BitstreamWriter<'_>, trailing_size: usize, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
        let written = build_obu(obu_type, self.obu_extension.as_ref(), payload, trailing_size, dest, position)?;
        log::trace!("built av1 {} at {} ({} bytes)", kind, position, written);
        Ok(written)
    }

    pub fn build_temporal_delimiter(&self, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
        let payload = BitstreamWriter::with_capacity(0);
        self.build("temporal delimiter", ObuType::TemporalDelimiter, &payload, 0, dest, position)
    }

    pub fn build_sequence_header(&self, seq: &SequenceHeader, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
        let mut payload = BitstreamWriter::with_capacity(PAYLOAD_INITIAL_CAPACITY);
        seq.encode(&mut payload)?;
        payload.put_trailing_bits()?;
        payload.flush()?;
        self.build("sequence header", ObuType::SequenceHeader, &payload, 0, dest, position)
    }

    /// An `OBU_FRAME_HEADER`.
    pub fn build_frame_header(&self, seq: &SequenceHeader, frame: &FrameHeader, dest: &mut Vec<u8>, position: usize) -> Result<usize> {
        let mut payload = BitstreamWriter::with_capacity(PAYLOAD_INITIAL_CAPACITY);
        frame.encode(seq, &mut payload)?;
        payload.put_trailing_bits()?;
        payload.flush()?;
        self.build("frame header", ObuType::FrameHeader, &payload, 0, dest, position)
    }

    /// The start of an `OBU_FRAME`: the OBU header and the frame header. The OBU size also counts
    /// `tile_group_obu_size` bytes of tile group the caller places right after the returned
    /// length, see `calculate_tile_group_obu_size`. That tile group must cover every tile of the
    /// frame.
    pub fn build_frame_obu_header(
        &self,
        seq: &SequenceHeader,
        frame: &FrameHeader,
        tile_group_obu_size: usize,
        dest: &mut Vec<u8>,
        position: usize,
    ) -> Result<usize> {
        assert!(!frame.show_existing_frame, "an OBU_FRAME cannot show an existing frame");
        let mut payload = BitstreamWriter::with_capacity(PAYLOAD_INITIAL_CAPACITY);
        frame.encode(seq, &mut payload)?;
        payload.put_aligning_bits()?;
        payload.flush()?;
        self.build("frame", ObuType::Frame, &payload, tile_group_obu_size, dest, position)
    }

    /// A complete `OBU_FRAME` carrying every tile of the frame.
    pub fn build_frame(&self, seq: &SequenceHeader, frame: &FrameHeader, tiles: &[&[u8]], dest: &mut Vec<u8>, position: usize) -> Result<usize> {
        let layout = frame.tile_layout(seq);
        let group = TileGroup::all(&layout);
        assert_eq!(tiles.len(), group.num_tiles(), "an OBU_FRAME carries every tile of the frame");
        let mut tile_group = BitstreamWriter::with_capacity(tiles.iter().map(|t| t.len() + layout.tile_size_bytes).sum::<usize>() + 16);
        write_tile_group(&mut tile_group, &layout, &group, tiles)?;
        tile_group.flush()?;

        let header_len = self.build_frame_obu_header(seq, frame, tile_group.byte_count(), dest, position)?;
        dest.extend_from_slice(tile_group.bytes());
        Ok(header_len + tile_group.byte_count())
    }

    /// The envelope of an `OBU_TILE_GROUP`: the OBU header and size. The caller places the tile
    /// group payload right after the returned length.
    pub fn build_tile_group_obu_header(&self, layout: &TileLayout, group: &TileGroup, tile_sizes: &[usize], dest: &mut Vec<u8>, position: usize) -> Result<usize> {
        let payload = BitstreamWriter::with_capacity(0);
        let tile_group_obu_size = calculate_tile_group_obu_size(layout, group, tile_sizes);
        self.build("tile group header", ObuType::TileGroup, &payload, tile_group_obu_size, dest, position)
    }

    /// A complete `OBU_TILE_GROUP`.
    pub fn build_tile_group(&self, layout: &TileLayout, group: &TileGroup, tiles: &[&[u8]], dest: &mut Vec<u8>, position: usize) -> Result<usize> {
        let mut payload = BitstreamWriter::with_capacity(tiles.iter().map(|t| t.len() + layout.tile_size_bytes).sum::<usize>() + 16);
        write_tile_group(&mut payload, layout, group, tiles)?;
        payload.flush()?;
        self.build("tile group", ObuType::TileGroup, &payload, 0, dest, position)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ColorConfig, FrameType, OperatingPoint, TileInfo, ALL_FRAMES};

    const SEQUENCE_HEADER_PAYLOAD: [u8; 16] = [0x00, 0x00, 0x00, 0x43, 0xfc, 0x1d, 0xfc, 0x10, 0xdc, 0x02, 0x79, 0x10, 0x10, 0x10, 0x10, 0x40];

    fn sequence_header() -> SequenceHeader {
        SequenceHeader {
            operating_points: vec![OperatingPoint {
                seq_level_idx: 8,
                ..Default::default()
            }],
            max_frame_width_minus_1: 1919,
            max_frame_height_minus_1: 1079,
            enable_order_hint: true,
            order_hint_bits_minus_1: 6,
            enable_cdef: true,
            seq_choose_screen_content_tools: true,
            seq_choose_integer_mv: true,
            color_config: ColorConfig {
                color_description_present_flag: true,
                color_primaries: 1,
                transfer_characteristics: 1,
                matrix_coefficients: 1,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    // a lossless key frame, so no loop filter or cdef fields
    fn key_frame() -> FrameHeader {
        FrameHeader {
            frame_type: FrameType::Key,
            show_frame: true,
            error_resilient_mode: true,
            refresh_frame_flags: ALL_FRAMES,
            tile_info: TileInfo {
                uniform_tile_spacing_flag: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_temporal_delimiter() {
        let builder = Av1BitstreamBuilder::new();
        let mut dest = Vec::new();
        assert_eq!(builder.build_temporal_delimiter(&mut dest, 0).unwrap(), 2);
        assert_eq!(dest, vec![0x12, 0x00]);

        let builder = Av1BitstreamBuilder::with_obu_extension(ObuExtension {
            temporal_id: 1,
            spatial_id: 0,
        });
        let mut dest = vec![0xff];
        assert_eq!(builder.build_temporal_delimiter(&mut dest, 1).unwrap(), 3);
        assert_eq!(dest, vec![0xff, 0x16, 0x20, 0x00]);
    }

    #[test]
    fn test_sequence_header() {
        let builder = Av1BitstreamBuilder::new();
        let mut dest = Vec::new();
        let n = builder.build_sequence_header(&sequence_header(), &mut dest, 0).unwrap();
        assert_eq!(n, 18);
        assert_eq!(&dest[..2], &[0x0a, 0x10]);
        assert_eq!(&dest[2..], &SEQUENCE_HEADER_PAYLOAD);
    }

    #[test]
    fn test_frame_header() {
        let builder = Av1BitstreamBuilder::new();
        let mut dest = Vec::new();
        let n = builder.build_frame_header(&sequence_header(), &key_frame(), &mut dest, 0).unwrap();
        assert_eq!(n, 7);
        assert_eq!(dest, vec![0x1a, 0x05, 0x10, 0x00, 0x80, 0x00, 0x40]);
    }

    #[test]
    fn test_frame() {
        let builder = Av1BitstreamBuilder::new();
        let seq = sequence_header();
        let frame = key_frame();
        let tile: &[u8] = &[0xaa, 0xbb, 0xcc];

        let mut dest = Vec::new();
        let n = builder.build_frame(&seq, &frame, &[tile], &mut dest, 0).unwrap();
        assert_eq!(n, dest.len());
        // frame header ends with byte alignment instead of trailing bits
        assert_eq!(dest, vec![0x32, 0x08, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0xbb, 0xcc]);

        // the same OBU built as an envelope followed by the caller's tile group
        let layout = frame.tile_layout(&seq);
        let group = TileGroup::all(&layout);
        let mut split = Vec::new();
        let header_len = builder
            .build_frame_obu_header(&seq, &frame, calculate_tile_group_obu_size(&layout, &group, &[tile.len()]), &mut split, 0)
            .unwrap();
        assert_eq!(header_len, 7);
        split.extend_from_slice(tile);
        assert_eq!(split, dest);
    }

    #[test]
    #[should_panic]
    fn test_frame_cannot_show_existing_frame() {
        let frame = FrameHeader {
            show_existing_frame: true,
            ..Default::default()
        };
        let _ = Av1BitstreamBuilder::new().build_frame_obu_header(&sequence_header(), &frame, 0, &mut Vec::new(), 0);
    }

    #[test]
    fn test_tile_group() {
        let builder = Av1BitstreamBuilder::new();
        let layout = TileLayout {
            tile_cols: 2,
            tile_rows: 1,
            tile_cols_log2: 1,
            tile_rows_log2: 0,
            tile_size_bytes: 1,
        };
        let group = TileGroup::all(&layout);
        let tiles: [&[u8]; 2] = [&[0x01, 0x02], &[0x03]];

        let mut dest = Vec::new();
        let n = builder.build_tile_group(&layout, &group, &tiles, &mut dest, 0).unwrap();
        // every tile is present, so tile_start_and_end_present_flag is 0
        assert_eq!(dest, vec![0x22, 0x05, 0x00, 0x01, 0x01, 0x02, 0x03]);
        assert_eq!(n, 7);

        let mut envelope = Vec::new();
        assert_eq!(builder.build_tile_group_obu_header(&layout, &group, &[2, 1], &mut envelope, 0).unwrap(), 2);
        assert_eq!(envelope, &dest[..2]);

        // the second tile on its own: 1, 1, 1, then aligning bits
        let second = TileGroup { tg_start: 1, tg_end: 1 };
        let mut dest = Vec::new();
        builder.build_tile_group(&layout, &second, &tiles[1..], &mut dest, 0).unwrap();
        assert_eq!(dest, vec![0x22, 0x02, 0b1110_0000, 0x03]);
    }

    #[test]
    fn test_frame_with_two_tiles() {
        let builder = Av1BitstreamBuilder::new();
        let seq = sequence_header();
        let mut frame = key_frame();
        frame.tile_info = TileInfo {
            uniform_tile_spacing_flag: true,
            tile_cols_log2: 1,
            tile_size_bytes_minus_1: 3,
            ..Default::default()
        };
        let layout = frame.tile_layout(&seq);
        assert_eq!(layout.num_tiles(), 2);

        let tiles: [&[u8]; 2] = [&[0xaa], &[0xbb]];
        let mut dest = Vec::new();
        let n = builder.build_frame(&seq, &frame, &tiles, &mut dest, 0).unwrap();
        assert_eq!(n, 14);
        assert_eq!(
            dest,
            vec![
                0x32, 0x0c, // OBU_FRAME, 12 byte payload
                0x10, 0x00, 0xc6, 0x00, 0x00, // frame header and byte alignment
                0x00, // tile_start_and_end_present_flag = 0
                0x00, 0x00, 0x00, 0x00, 0xaa, // tile_size_minus_1 and the first tile
                0xbb,
            ]
        );

        let group = TileGroup::all(&layout);
        let tile_group_obu_size = calculate_tile_group_obu_size(&layout, &group, &[1, 1]);
        assert_eq!(tile_group_obu_size, 7);
        let mut split = Vec::new();
        let header_len = builder.build_frame_obu_header(&seq, &frame, tile_group_obu_size, &mut split, 0).unwrap();
        assert_eq!(&split[..header_len], &dest[..header_len]);
    }

    #[test]
    #[should_panic(expected = "every tile")]
    fn test_frame_missing_tiles() {
        let seq = sequence_header();
        let mut frame = key_frame();
        frame.tile_info.tile_cols_log2 = 1;
        let tile: &[u8] = &[0xaa];
        let _ = Av1BitstreamBuilder::new().build_frame(&seq, &frame, &[tile], &mut Vec::new(), 0);
    }

    #[test]
    fn test_stream() {
        let builder = Av1BitstreamBuilder::new();
        let seq = sequence_header();
        let frame = key_frame();
        let tile: &[u8] = &[0x00; 40];

        let mut dest = Vec::new();
        let mut position = 0;
        position += builder.build_temporal_delimiter(&mut dest, position).unwrap();
        position += builder.build_sequence_header(&seq, &mut dest, position).unwrap();
        position += builder.build_frame(&seq, &frame, &[tile], &mut dest, position).unwrap();
        assert_eq!(dest.len(), position);
        assert_eq!(position, 2 + 18 + 2 + 5 + 40);

        // rebuilding a unit in place leaves the stream unchanged
        let mut rebuilt = dest.clone();
        builder.build_sequence_header(&seq, &mut rebuilt, 2).unwrap();
        rebuilt.truncate(20);
        assert_eq!(&rebuilt[..], &dest[..20]);
    }
}
