use super::{BitstreamWriter, Encode, Result};

pub const SELECT_SCREEN_CONTENT_TOOLS: u8 = 2;
pub const SELECT_INTEGER_MV: u8 = 2;

pub const CP_BT_709: u8 = 1;
pub const CP_UNSPECIFIED: u8 = 2;
pub const TC_UNSPECIFIED: u8 = 2;
pub const TC_SRGB: u8 = 13;
pub const MC_IDENTITY: u8 = 0;
pub const MC_UNSPECIFIED: u8 = 2;

// frame_width_bits_minus_1 and frame_height_bits_minus_1 are always 15
const FRAME_SIZE_BITS: u32 = 16;

#[derive(Clone, Debug, Default)]
pub struct OperatingPoint {
    /// 12 bits
    pub idc: u16,
    /// 5 bits
    pub seq_level_idx: u8,
    /// only coded when `seq_level_idx` is above 7
    pub seq_tier: u8,
}

/// AV1-Spec-2 - 5.5.2. `mono_chrome` is always 0.
#[derive(Clone, Debug, Default)]
pub struct ColorConfig {
    pub high_bitdepth: bool,
    pub twelve_bit: bool,
    pub color_description_present_flag: bool,
    pub color_primaries: u8,
    pub transfer_characteristics: u8,
    pub matrix_coefficients: u8,
    pub color_range: bool,
    // only coded for 12 bit profile 2 streams
    pub subsampling_x: bool,
    pub subsampling_y: bool,
    pub chroma_sample_position: u8,
    pub separate_uv_delta_q: bool,
}

impl ColorConfig {
    pub fn bit_depth(&self, seq_profile: u8) -> u32 {
        match (seq_profile, self.high_bitdepth, self.twelve_bit) {
            (2, true, true) => 12,
            (_, true, _) => 10,
            _ => 8,
        }
    }

    fn color_description(&self) -> (u8, u8, u8) {
        match self.color_description_present_flag {
            true => (self.color_primaries, self.transfer_characteristics, self.matrix_coefficients),
            false => (CP_UNSPECIFIED, TC_UNSPECIFIED, MC_UNSPECIFIED),
        }
    }

    fn is_srgb(&self) -> bool {
        self.color_description() == (CP_BT_709, TC_SRGB, MC_IDENTITY)
    }

    /// The (subsampling_x, subsampling_y) a decoder derives.
    pub fn subsampling(&self, seq_profile: u8) -> (bool, bool) {
        if self.is_srgb() {
            return (false, false);
        }
        match seq_profile {
            0 => (true, true),
            1 => (false, false),
            _ if self.bit_depth(seq_profile) == 12 => (self.subsampling_x, self.subsampling_x && self.subsampling_y),
            _ => (true, false),
        }
    }

    pub fn encode(&self, bs: &mut BitstreamWriter<'_>, seq_profile: u8) -> Result<()> {
        bs.put_bool(self.high_bitdepth)?;
        if seq_profile == 2 && self.high_bitdepth {
            bs.put_bool(self.twelve_bit)?;
        }

        if seq_profile != 1 {
            bs.put_bool(false)?; // mono_chrome
        }

        bs.put_bool(self.color_description_present_flag)?;
        if self.color_description_present_flag {
            bs.put_bits(8, self.color_primaries as u32)?;
            bs.put_bits(8, self.transfer_characteristics as u32)?;
            bs.put_bits(8, self.matrix_coefficients as u32)?;
        }

        if !self.is_srgb() {
            bs.put_bool(self.color_range)?;
            if seq_profile > 1 && self.bit_depth(seq_profile) == 12 {
                bs.put_bool(self.subsampling_x)?;
                if self.subsampling_x {
                    bs.put_bool(self.subsampling_y)?;
                }
            }
            if self.subsampling(seq_profile) == (true, true) {
                bs.put_bits(2, self.chroma_sample_position as u32)?;
            }
        }

        bs.put_bool(self.separate_uv_delta_q)
    }
}

/// The fields of `sequence_header_obu()` an encoder chooses. Still pictures, timing and decoder
/// model info, initial display delays, frame ids and film grain are never signaled.
#[derive(Clone, Debug, Default)]
pub struct SequenceHeader {
    /// 3 bits
    pub seq_profile: u8,
    /// at least one, at most 32
    pub operating_points: Vec<OperatingPoint>,
    pub max_frame_width_minus_1: u16,
    pub max_frame_height_minus_1: u16,
    pub use_128x128_superblock: bool,
    pub enable_filter_intra: bool,
    pub enable_intra_edge_filter: bool,
    pub enable_interintra_compound: bool,
    pub enable_masked_compound: bool,
    pub enable_warped_motion: bool,
    pub enable_dual_filter: bool,
    pub enable_order_hint: bool,
    pub enable_jnt_comp: bool,
    pub enable_ref_frame_mvs: bool,
    pub seq_choose_screen_content_tools: bool,
    /// used when `seq_choose_screen_content_tools` is unset
    pub seq_force_screen_content_tools: u8,
    pub seq_choose_integer_mv: bool,
    /// used when `seq_choose_integer_mv` is unset
    pub seq_force_integer_mv: u8,
    pub order_hint_bits_minus_1: u8,
    pub enable_superres: bool,
    pub enable_cdef: bool,
    pub enable_restoration: bool,
    pub color_config: ColorConfig,
}

impl SequenceHeader {
    /// OrderHintBits
    pub fn order_hint_bits(&self) -> u32 {
        match self.enable_order_hint {
            true => self.order_hint_bits_minus_1 as u32 + 1,
            false => 0,
        }
    }

    /// The derived seq_force_screen_content_tools.
    pub fn screen_content_tools(&self) -> u8 {
        match self.seq_choose_screen_content_tools {
            true => SELECT_SCREEN_CONTENT_TOOLS,
            false => self.seq_force_screen_content_tools,
        }
    }

    /// The derived seq_force_integer_mv.
    pub fn integer_mv(&self) -> u8 {
        if self.screen_content_tools() == 0 || self.seq_choose_integer_mv {
            SELECT_INTEGER_MV
        } else {
            self.seq_force_integer_mv
        }
    }

    pub fn frame_size_bits(&self) -> u32 {
        FRAME_SIZE_BITS
    }
}

// AV1-Spec-2 - 5.5.1
impl Encode for SequenceHeader {
    fn encode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        assert!(!self.operating_points.is_empty() && self.operating_points.len() <= 32);

        bs.put_bits(3, self.seq_profile as u32)?;
        bs.put_bool(false)?; // still_picture
        bs.put_bool(false)?; // reduced_still_picture_header
        bs.put_bool(false)?; // timing_info_present_flag
        bs.put_bool(false)?; // initial_display_delay_present_flag

        bs.put_bits(5, self.operating_points.len() as u32 - 1)?;
        for op in &self.operating_points {
            bs.put_bits(12, op.idc as u32)?;
            bs.put_bits(5, op.seq_level_idx as u32)?;
            if op.seq_level_idx > 7 {
                bs.put_bits(1, op.seq_tier as u32)?;
            }
        }

        bs.put_bits(4, FRAME_SIZE_BITS - 1)?;
        bs.put_bits(4, FRAME_SIZE_BITS - 1)?;
        bs.put_bits(FRAME_SIZE_BITS, self.max_frame_width_minus_1 as u32)?;
        bs.put_bits(FRAME_SIZE_BITS, self.max_frame_height_minus_1 as u32)?;

        bs.put_bool(false)?; // frame_id_numbers_present_flag
        bs.put_bool(self.use_128x128_superblock)?;
        bs.put_bool(self.enable_filter_intra)?;
        bs.put_bool(self.enable_intra_edge_filter)?;
        bs.put_bool(self.enable_interintra_compound)?;
        bs.put_bool(self.enable_masked_compound)?;
        bs.put_bool(self.enable_warped_motion)?;
        bs.put_bool(self.enable_dual_filter)?;
        bs.put_bool(self.enable_order_hint)?;
        if self.enable_order_hint {
            bs.put_bool(self.enable_jnt_comp)?;
            bs.put_bool(self.enable_ref_frame_mvs)?;
        }

        bs.put_bool(self.seq_choose_screen_content_tools)?;
        if !self.seq_choose_screen_content_tools {
            bs.put_bits(1, self.seq_force_screen_content_tools as u32)?;
        }
        if self.screen_content_tools() > 0 {
            bs.put_bool(self.seq_choose_integer_mv)?;
            if !self.seq_choose_integer_mv {
                bs.put_bits(1, self.seq_force_integer_mv as u32)?;
            }
        }

        if self.enable_order_hint {
            bs.put_bits(3, self.order_hint_bits_minus_1 as u32)?;
        }

        bs.put_bool(self.enable_superres)?;
        bs.put_bool(self.enable_cdef)?;
        bs.put_bool(self.enable_restoration)?;

        self.color_config.encode(bs, self.seq_profile)?;

        bs.put_bool(false) // film_grain_params_present
    }
}
