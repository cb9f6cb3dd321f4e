use super::{BitstreamWriter, Result, SequenceHeader, SELECT_INTEGER_MV, SELECT_SCREEN_CONTENT_TOOLS};

pub const PRIMARY_REF_NONE: u8 = 7;
pub const REFS_PER_FRAME: usize = 7;
pub const NUM_REF_FRAMES: usize = 8;
pub const ALL_FRAMES: u8 = 0xff;

pub const MAX_SEGMENTS: usize = 8;
pub const SEG_LVL_MAX: usize = 8;
pub const SEG_LVL_ALT_Q: usize = 0;

const SUPERRES_NUM: u32 = 8;
const SUPERRES_DENOM_MIN: u32 = 9;
const SUPERRES_DENOM_BITS: u32 = 3;

const MAX_TILE_WIDTH: u32 = 4096;
const MAX_TILE_AREA: u32 = 4096 * 2304;
const MAX_TILE_ROWS: u32 = 64;
const MAX_TILE_COLS: u32 = 64;

const SEGMENTATION_FEATURE_BITS: [u32; SEG_LVL_MAX] = [8, 6, 6, 6, 6, 3, 0, 0];
const SEGMENTATION_FEATURE_SIGNED: [bool; SEG_LVL_MAX] = [true, true, true, true, true, false, false, false];
const SEGMENTATION_FEATURE_MAX: [i32; SEG_LVL_MAX] = [255, 63, 63, 63, 63, 7, 0, 0];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameType {
    Key = 0,
    Inter = 1,
    IntraOnly = 2,
    Switch = 3,
}

impl Default for FrameType {
    fn default() -> Self {
        FrameType::Key
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InterpolationFilter {
    EightTap = 0,
    EightTapSmooth = 1,
    EightTapSharp = 2,
    Bilinear = 3,
    Switchable = 4,
}

impl Default for InterpolationFilter {
    fn default() -> Self {
        InterpolationFilter::EightTap
    }
}

/// The signed distance between two order hints. AV1-Spec-2 - 7.12.3
pub fn get_relative_dist(order_hint_bits: u32, a: u32, b: u32) -> i32 {
    if order_hint_bits == 0 {
        return 0;
    }
    let diff = a as i32 - b as i32;
    let m = 1i32 << (order_hint_bits - 1);
    (diff & (m - 1)) - (diff & m)
}

/// The smallest k such that `blk_size << k` is at least `target`.
pub fn tile_log2(blk_size: u32, target: u32) -> u32 {
    let mut k = 0;
    while (blk_size << k) < target {
        k += 1;
    }
    k
}

/// AV1-Spec-2 - 5.9.15. For uniform spacing the log2 counts are the values to signal. For
/// explicit spacing the sizes of every column and row are given in superblocks.
#[derive(Clone, Debug, Default)]
pub struct TileInfo {
    pub uniform_tile_spacing_flag: bool,
    pub tile_cols_log2: u32,
    pub tile_rows_log2: u32,
    pub width_in_sbs_minus_1: Vec<u32>,
    pub height_in_sbs_minus_1: Vec<u32>,
    pub context_update_tile_id: u32,
    /// 2 bits
    pub tile_size_bytes_minus_1: u8,
}

/// The tiling a decoder derives from `tile_info()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileLayout {
    pub tile_cols: u32,
    pub tile_rows: u32,
    pub tile_cols_log2: u32,
    pub tile_rows_log2: u32,
    /// TileSizeBytes
    pub tile_size_bytes: usize,
}

impl TileLayout {
    pub fn num_tiles(&self) -> u32 {
        self.tile_cols * self.tile_rows
    }
}

struct TileLimits {
    sb_cols: u32,
    sb_rows: u32,
    max_tile_width_sb: u32,
    min_log2_tile_cols: u32,
    max_log2_tile_cols: u32,
    max_log2_tile_rows: u32,
    min_log2_tiles: u32,
}

impl TileLimits {
    fn new(seq: &SequenceHeader, mi_cols: u32, mi_rows: u32) -> Self {
        let (sb_cols, sb_rows, sb_shift) = match seq.use_128x128_superblock {
            true => ((mi_cols + 31) >> 5, (mi_rows + 31) >> 5, 5),
            false => ((mi_cols + 15) >> 4, (mi_rows + 15) >> 4, 4),
        };
        let sb_size = sb_shift + 2;
        let max_tile_width_sb = MAX_TILE_WIDTH >> sb_size;
        let max_tile_area_sb = MAX_TILE_AREA >> (2 * sb_size);
        let min_log2_tile_cols = tile_log2(max_tile_width_sb, sb_cols);
        Self {
            sb_cols,
            sb_rows,
            max_tile_width_sb,
            min_log2_tile_cols,
            max_log2_tile_cols: tile_log2(1, sb_cols.min(MAX_TILE_COLS)),
            max_log2_tile_rows: tile_log2(1, sb_rows.min(MAX_TILE_ROWS)),
            min_log2_tiles: min_log2_tile_cols.max(tile_log2(max_tile_area_sb, sb_rows * sb_cols)),
        }
    }

    fn min_log2_tile_rows(&self, tile_cols_log2: u32) -> u32 {
        self.min_log2_tiles.saturating_sub(tile_cols_log2)
    }
}

/// AV1-Spec-2 - 5.9.12
#[derive(Clone, Debug, Default)]
pub struct QuantizationParams {
    pub base_q_idx: u8,
    pub delta_q_y_dc: i8,
    pub delta_q_u_dc: i8,
    pub delta_q_u_ac: i8,
    /// must equal the U deltas unless the sequence has separate_uv_delta_q
    pub delta_q_v_dc: i8,
    pub delta_q_v_ac: i8,
    pub using_qmatrix: bool,
    pub qm_y: u8,
    pub qm_u: u8,
    pub qm_v: u8,
}

impl QuantizationParams {
    fn diff_uv_delta(&self) -> bool {
        self.delta_q_u_dc != self.delta_q_v_dc || self.delta_q_u_ac != self.delta_q_v_ac
    }
}

/// AV1-Spec-2 - 5.9.14
#[derive(Clone, Debug, Default)]
pub struct SegmentationParams {
    pub segmentation_enabled: bool,
    pub segmentation_update_map: bool,
    pub segmentation_temporal_update: bool,
    pub segmentation_update_data: bool,
    pub feature_enabled: [[bool; SEG_LVL_MAX]; MAX_SEGMENTS],
    pub feature_value: [[i16; SEG_LVL_MAX]; MAX_SEGMENTS],
}

/// delta_q_params() and delta_lf_params(), AV1-Spec-2 - 5.9.17 and 5.9.18
#[derive(Clone, Debug, Default)]
pub struct DeltaParams {
    pub delta_q_present: bool,
    pub delta_q_res: u8,
    pub delta_lf_present: bool,
    pub delta_lf_res: u8,
    pub delta_lf_multi: bool,
}

/// AV1-Spec-2 - 5.9.11. A `Some` delta is signaled as updated.
#[derive(Clone, Debug, Default)]
pub struct LoopFilterParams {
    pub loop_filter_level: [u8; 4],
    pub loop_filter_sharpness: u8,
    pub loop_filter_delta_enabled: bool,
    pub loop_filter_delta_update: bool,
    pub loop_filter_ref_deltas: [Option<i8>; NUM_REF_FRAMES],
    pub loop_filter_mode_deltas: [Option<i8>; 2],
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CdefStrength {
    pub y_pri: u8,
    pub y_sec: u8,
    pub uv_pri: u8,
    pub uv_sec: u8,
}

/// AV1-Spec-2 - 5.9.19
#[derive(Clone, Debug, Default)]
pub struct CdefParams {
    pub cdef_damping_minus_3: u8,
    pub cdef_bits: u8,
    /// 1 << cdef_bits entries
    pub strengths: Vec<CdefStrength>,
}

/// AV1-Spec-2 - 5.9.20. `lr_type` holds the coded values, 0 meaning no restoration.
#[derive(Clone, Debug, Default)]
pub struct LoopRestorationParams {
    pub lr_type: [u8; 3],
    pub lr_unit_shift: u8,
    pub lr_unit_extra_shift: u8,
    pub lr_uv_shift: u8,
}

/// The fields of `uncompressed_header()` an encoder chooses. Fields the grammar forces are
/// checked against the forced value instead of being written.
#[derive(Clone, Debug, Default)]
pub struct FrameHeader {
    pub show_existing_frame: bool,
    pub frame_to_show_map_idx: u8,
    pub frame_type: FrameType,
    pub show_frame: bool,
    pub showable_frame: bool,
    pub error_resilient_mode: bool,
    pub disable_cdf_update: bool,
    pub allow_screen_content_tools: bool,
    pub force_integer_mv: bool,
    pub frame_size_override_flag: bool,
    pub order_hint: u32,
    pub primary_ref_frame: u8,
    pub refresh_frame_flags: u8,
    /// the order hints of the reference slots
    pub ref_order_hint: [u32; NUM_REF_FRAMES],
    // if( frame_size_override_flag )
    pub frame_width_minus_1: u16,
    pub frame_height_minus_1: u16,
    pub use_superres: bool,
    pub coded_denom: u8,
    pub render_and_frame_size_different: bool,
    pub render_width_minus_1: u16,
    pub render_height_minus_1: u16,
    pub allow_intrabc: bool,
    pub ref_frame_idx: [u8; REFS_PER_FRAME],
    pub allow_high_precision_mv: bool,
    pub interpolation_filter: InterpolationFilter,
    pub is_motion_mode_switchable: bool,
    pub use_ref_frame_mvs: bool,
    pub disable_frame_end_update_cdf: bool,
    pub tile_info: TileInfo,
    pub quantization_params: QuantizationParams,
    pub segmentation_params: SegmentationParams,
    pub delta_params: DeltaParams,
    pub loop_filter_params: LoopFilterParams,
    pub cdef_params: CdefParams,
    pub lr_params: LoopRestorationParams,
    pub tx_mode_select: bool,
    pub reference_select: bool,
    pub skip_mode_present: bool,
    pub allow_warped_motion: bool,
    pub reduced_tx_set: bool,
}

// These function names follow the naming conventions in the standard.
#[allow(non_snake_case)]
impl FrameHeader {
    pub fn FrameIsIntra(&self) -> bool {
        matches!(self.frame_type, FrameType::IntraOnly | FrameType::Key)
    }

    fn is_shown_key_frame(&self) -> bool {
        self.frame_type == FrameType::Key && self.show_frame
    }

    fn forces_error_resilient_mode(&self) -> bool {
        self.frame_type == FrameType::Switch || self.is_shown_key_frame()
    }

    /// (UpscaledWidth, FrameWidth, FrameHeight)
    pub fn frame_size(&self, seq: &SequenceHeader) -> (u32, u32, u32) {
        let (width, height) = match self.frame_size_override_flag {
            true => (self.frame_width_minus_1 as u32 + 1, self.frame_height_minus_1 as u32 + 1),
            false => (seq.max_frame_width_minus_1 as u32 + 1, seq.max_frame_height_minus_1 as u32 + 1),
        };
        let denom = match seq.enable_superres && self.use_superres {
            true => self.coded_denom as u32 + SUPERRES_DENOM_MIN,
            false => SUPERRES_NUM,
        };
        (width, (width * SUPERRES_NUM + denom / 2) / denom, height)
    }

    /// (MiCols, MiRows)
    pub fn mi_size(&self, seq: &SequenceHeader) -> (u32, u32) {
        let (_, width, height) = self.frame_size(seq);
        (2 * ((width + 7) >> 3), 2 * ((height + 7) >> 3))
    }

    fn allow_screen_content_tools(&self, seq: &SequenceHeader) -> bool {
        match seq.screen_content_tools() {
            SELECT_SCREEN_CONTENT_TOOLS => self.allow_screen_content_tools,
            v => v != 0,
        }
    }

    fn force_integer_mv(&self, seq: &SequenceHeader) -> bool {
        if self.FrameIsIntra() {
            return true;
        }
        if !self.allow_screen_content_tools(seq) {
            return false;
        }
        match seq.integer_mv() {
            SELECT_INTEGER_MV => self.force_integer_mv,
            v => v != 0,
        }
    }

    fn effective_primary_ref_frame(&self) -> u8 {
        match self.FrameIsIntra() || self.error_resilient_mode {
            true => PRIMARY_REF_NONE,
            false => self.primary_ref_frame,
        }
    }

    fn effective_allow_intrabc(&self, seq: &SequenceHeader) -> bool {
        let (upscaled_width, frame_width, _) = self.frame_size(seq);
        self.FrameIsIntra() && self.allow_screen_content_tools(seq) && upscaled_width == frame_width && self.allow_intrabc
    }

    fn effective_delta_q_present(&self) -> bool {
        self.quantization_params.base_q_idx > 0 && self.delta_params.delta_q_present
    }

    fn qindex(&self, segment_id: usize) -> u8 {
        let seg = &self.segmentation_params;
        let base_q_idx = self.quantization_params.base_q_idx as i32;
        if seg.segmentation_enabled && seg.feature_enabled[segment_id][SEG_LVL_ALT_Q] {
            (base_q_idx + seg.feature_value[segment_id][SEG_LVL_ALT_Q] as i32).max(0).min(255) as u8
        } else {
            base_q_idx as u8
        }
    }

    pub fn CodedLossless(&self) -> bool {
        let q = &self.quantization_params;
        let deltas_zero =
            q.delta_q_y_dc == 0 && q.delta_q_u_dc == 0 && q.delta_q_u_ac == 0 && q.delta_q_v_dc == 0 && q.delta_q_v_ac == 0;
        deltas_zero && (0..MAX_SEGMENTS).all(|segment_id| self.qindex(segment_id) == 0)
    }

    pub fn AllLossless(&self, seq: &SequenceHeader) -> bool {
        let (upscaled_width, frame_width, _) = self.frame_size(seq);
        self.CodedLossless() && upscaled_width == frame_width
    }

    /// skipModeAllowed, AV1-Spec-2 - 5.9.22
    pub fn skip_mode_allowed(&self, seq: &SequenceHeader) -> bool {
        if self.FrameIsIntra() || !self.reference_select || !seq.enable_order_hint {
            return false;
        }

        let bits = seq.order_hint_bits();
        let dist = |a: u32, b: u32| get_relative_dist(bits, a, b);

        let mut forward_hint = None;
        let mut backward_hint = None;
        for &idx in &self.ref_frame_idx {
            let ref_hint = self.ref_order_hint[idx as usize];
            if dist(ref_hint, self.order_hint) < 0 {
                if forward_hint.map_or(true, |hint| dist(ref_hint, hint) > 0) {
                    forward_hint = Some(ref_hint);
                }
            } else if dist(ref_hint, self.order_hint) > 0 && backward_hint.map_or(true, |hint| dist(ref_hint, hint) < 0) {
                backward_hint = Some(ref_hint);
            }
        }

        let forward_hint = match forward_hint {
            Some(hint) => hint,
            None => return false,
        };
        if backward_hint.is_some() {
            return true;
        }

        let mut second_forward_hint = None;
        for &idx in &self.ref_frame_idx {
            let ref_hint = self.ref_order_hint[idx as usize];
            if dist(ref_hint, forward_hint) < 0 && second_forward_hint.map_or(true, |hint| dist(ref_hint, hint) > 0) {
                second_forward_hint = Some(ref_hint);
            }
        }
        second_forward_hint.is_some()
    }

    /// The tiling this header signals.
    pub fn tile_layout(&self, seq: &SequenceHeader) -> TileLayout {
        let (mi_cols, mi_rows) = self.mi_size(seq);
        let limits = TileLimits::new(seq, mi_cols, mi_rows);
        let info = &self.tile_info;
        let tile_size_bytes = info.tile_size_bytes_minus_1 as usize + 1;

        if info.uniform_tile_spacing_flag {
            let tile_cols_log2 = info.tile_cols_log2;
            let tile_width_sb = (limits.sb_cols + (1 << tile_cols_log2) - 1) >> tile_cols_log2;
            let tile_rows_log2 = info.tile_rows_log2;
            let tile_height_sb = (limits.sb_rows + (1 << tile_rows_log2) - 1) >> tile_rows_log2;
            TileLayout {
                tile_cols: (limits.sb_cols + tile_width_sb - 1) / tile_width_sb,
                tile_rows: (limits.sb_rows + tile_height_sb - 1) / tile_height_sb,
                tile_cols_log2,
                tile_rows_log2,
                tile_size_bytes,
            }
        } else {
            let tile_cols = info.width_in_sbs_minus_1.len() as u32;
            let tile_rows = info.height_in_sbs_minus_1.len() as u32;
            TileLayout {
                tile_cols,
                tile_rows,
                tile_cols_log2: tile_log2(1, tile_cols),
                tile_rows_log2: tile_log2(1, tile_rows),
                tile_size_bytes,
            }
        }
    }

    /// Writes `uncompressed_header()`, AV1-Spec-2 - 5.9.2. Trailing or alignment bits are up to
    /// the caller.
    pub fn encode(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        bs.put_bool(self.show_existing_frame)?;
        if self.show_existing_frame {
            return bs.put_bits(3, self.frame_to_show_map_idx as u32);
        }

        bs.put_bits(2, self.frame_type as u32)?;
        bs.put_bool(self.show_frame)?;
        if !self.show_frame {
            bs.put_bool(self.showable_frame)?;
        }

        if self.forces_error_resilient_mode() {
            assert!(self.error_resilient_mode, "{:?} frames must be error resilient", self.frame_type);
        } else {
            bs.put_bool(self.error_resilient_mode)?;
        }

        bs.put_bool(self.disable_cdf_update)?;

        if seq.screen_content_tools() == SELECT_SCREEN_CONTENT_TOOLS {
            bs.put_bool(self.allow_screen_content_tools)?;
        }
        if self.allow_screen_content_tools(seq) && seq.integer_mv() == SELECT_INTEGER_MV {
            bs.put_bool(self.force_integer_mv)?;
        }

        if self.frame_type == FrameType::Switch {
            assert!(self.frame_size_override_flag, "switch frames must override the frame size");
        } else {
            bs.put_bool(self.frame_size_override_flag)?;
        }

        bs.put_bits(seq.order_hint_bits(), self.order_hint)?;

        if !(self.FrameIsIntra() || self.error_resilient_mode) {
            bs.put_bits(3, self.primary_ref_frame as u32)?;
        }

        let refresh_frame_flags = if self.forces_error_resilient_mode() {
            ALL_FRAMES
        } else {
            bs.put_bits(8, self.refresh_frame_flags as u32)?;
            self.refresh_frame_flags
        };

        if (!self.FrameIsIntra() || refresh_frame_flags != ALL_FRAMES) && self.error_resilient_mode && seq.enable_order_hint {
            for &hint in &self.ref_order_hint {
                bs.put_bits(seq.order_hint_bits(), hint)?;
            }
        }

        if self.FrameIsIntra() {
            self.write_frame_size(seq, bs)?;
            self.write_render_size(bs)?;
            let (upscaled_width, frame_width, _) = self.frame_size(seq);
            if self.allow_screen_content_tools(seq) && upscaled_width == frame_width {
                bs.put_bool(self.allow_intrabc)?;
            }
        } else {
            if seq.enable_order_hint {
                bs.put_bool(false)?; // frame_refs_short_signaling
            }
            for &idx in &self.ref_frame_idx {
                bs.put_bits(3, idx as u32)?;
            }
            if self.frame_size_override_flag && !self.error_resilient_mode {
                self.write_frame_size_with_refs(seq, bs)?;
            } else {
                self.write_frame_size(seq, bs)?;
                self.write_render_size(bs)?;
            }
            if !self.force_integer_mv(seq) {
                bs.put_bool(self.allow_high_precision_mv)?;
            }
            self.write_interpolation_filter(bs)?;
            bs.put_bool(self.is_motion_mode_switchable)?;
            if !self.error_resilient_mode && seq.enable_ref_frame_mvs {
                bs.put_bool(self.use_ref_frame_mvs)?;
            }
        }

        if !self.disable_cdf_update {
            bs.put_bool(self.disable_frame_end_update_cdf)?;
        }

        self.write_tile_info(seq, bs)?;
        self.write_quantization_params(seq, bs)?;
        self.write_segmentation_params(bs)?;
        self.write_delta_q_params(bs)?;
        self.write_delta_lf_params(seq, bs)?;
        self.write_loop_filter_params(seq, bs)?;
        self.write_cdef_params(seq, bs)?;
        self.write_lr_params(seq, bs)?;
        self.write_tx_mode(bs)?;

        if !self.FrameIsIntra() {
            bs.put_bool(self.reference_select)?;
        }

        let skip_mode_allowed = self.skip_mode_allowed(seq);
        log::debug!("skip mode allowed: {}", skip_mode_allowed);
        if skip_mode_allowed {
            bs.put_bool(self.skip_mode_present)?;
        }

        if !(self.FrameIsIntra() || self.error_resilient_mode || !seq.enable_warped_motion) {
            bs.put_bool(self.allow_warped_motion)?;
        }

        bs.put_bool(self.reduced_tx_set)?;

        self.write_global_motion_params(bs)
    }

    // 5.9.5
    fn write_frame_size(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if self.frame_size_override_flag {
            bs.put_bits(seq.frame_size_bits(), self.frame_width_minus_1 as u32)?;
            bs.put_bits(seq.frame_size_bits(), self.frame_height_minus_1 as u32)?;
        }
        self.write_superres_params(seq, bs)
    }

    // 5.9.8
    fn write_superres_params(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if seq.enable_superres {
            bs.put_bool(self.use_superres)?;
            if self.use_superres {
                bs.put_bits(SUPERRES_DENOM_BITS, self.coded_denom as u32)?;
            }
        }
        Ok(())
    }

    // 5.9.6
    fn write_render_size(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        bs.put_bool(self.render_and_frame_size_different)?;
        if self.render_and_frame_size_different {
            bs.put_bits(16, self.render_width_minus_1 as u32)?;
            bs.put_bits(16, self.render_height_minus_1 as u32)?;
        }
        Ok(())
    }

    // 5.9.7, sizes are never copied from a reference
    fn write_frame_size_with_refs(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        for _ in 0..REFS_PER_FRAME {
            bs.put_bool(false)?; // found_ref
        }
        self.write_frame_size(seq, bs)?;
        self.write_render_size(bs)
    }

    // 5.9.10
    fn write_interpolation_filter(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        let is_filter_switchable = self.interpolation_filter == InterpolationFilter::Switchable;
        bs.put_bool(is_filter_switchable)?;
        if !is_filter_switchable {
            bs.put_bits(2, self.interpolation_filter as u32)?;
        }
        Ok(())
    }

    // 5.9.15
    fn write_tile_info(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        let (mi_cols, mi_rows) = self.mi_size(seq);
        let limits = TileLimits::new(seq, mi_cols, mi_rows);
        let info = &self.tile_info;

        bs.put_bool(info.uniform_tile_spacing_flag)?;

        let (tile_cols_log2, tile_rows_log2) = if info.uniform_tile_spacing_flag {
            assert!(
                info.tile_cols_log2 >= limits.min_log2_tile_cols && info.tile_cols_log2 <= limits.max_log2_tile_cols,
                "tile_cols_log2 {} outside [{}, {}]",
                info.tile_cols_log2,
                limits.min_log2_tile_cols,
                limits.max_log2_tile_cols
            );
            let mut tile_cols_log2 = limits.min_log2_tile_cols;
            while tile_cols_log2 < limits.max_log2_tile_cols {
                let increment_tile_cols_log2 = tile_cols_log2 < info.tile_cols_log2;
                bs.put_bool(increment_tile_cols_log2)?;
                if !increment_tile_cols_log2 {
                    break;
                }
                tile_cols_log2 += 1;
            }

            let min_log2_tile_rows = limits.min_log2_tile_rows(tile_cols_log2);
            assert!(
                info.tile_rows_log2 >= min_log2_tile_rows && info.tile_rows_log2 <= limits.max_log2_tile_rows,
                "tile_rows_log2 {} outside [{}, {}]",
                info.tile_rows_log2,
                min_log2_tile_rows,
                limits.max_log2_tile_rows
            );
            let mut tile_rows_log2 = min_log2_tile_rows;
            while tile_rows_log2 < limits.max_log2_tile_rows {
                let increment_tile_rows_log2 = tile_rows_log2 < info.tile_rows_log2;
                bs.put_bool(increment_tile_rows_log2)?;
                if !increment_tile_rows_log2 {
                    break;
                }
                tile_rows_log2 += 1;
            }

            (tile_cols_log2, tile_rows_log2)
        } else {
            let mut widest_tile_sb = 0;
            let mut start_sb = 0;
            for &width_in_sbs_minus_1 in &info.width_in_sbs_minus_1 {
                assert!(start_sb < limits.sb_cols, "tile columns extend past the frame");
                let max_width = (limits.sb_cols - start_sb).min(limits.max_tile_width_sb);
                bs.put_ns(max_width, width_in_sbs_minus_1)?;
                let size_sb = width_in_sbs_minus_1 + 1;
                widest_tile_sb = widest_tile_sb.max(size_sb);
                start_sb += size_sb;
            }
            assert_eq!(start_sb, limits.sb_cols, "tile columns do not cover the frame");

            let max_tile_area_sb = match limits.min_log2_tiles {
                0 => limits.sb_rows * limits.sb_cols,
                min_log2_tiles => (limits.sb_rows * limits.sb_cols) >> (min_log2_tiles + 1),
            };
            let max_tile_height_sb = (max_tile_area_sb / widest_tile_sb).max(1);

            start_sb = 0;
            for &height_in_sbs_minus_1 in &info.height_in_sbs_minus_1 {
                assert!(start_sb < limits.sb_rows, "tile rows extend past the frame");
                let max_height = (limits.sb_rows - start_sb).min(max_tile_height_sb);
                bs.put_ns(max_height, height_in_sbs_minus_1)?;
                start_sb += height_in_sbs_minus_1 + 1;
            }
            assert_eq!(start_sb, limits.sb_rows, "tile rows do not cover the frame");

            (
                tile_log2(1, info.width_in_sbs_minus_1.len() as u32),
                tile_log2(1, info.height_in_sbs_minus_1.len() as u32),
            )
        };

        log::debug!(
            "tile_info: {} superblock columns, {} rows, log2 tiles {}x{}",
            limits.sb_cols,
            limits.sb_rows,
            tile_cols_log2,
            tile_rows_log2
        );

        if tile_cols_log2 > 0 || tile_rows_log2 > 0 {
            bs.put_bits(tile_rows_log2 + tile_cols_log2, info.context_update_tile_id)?;
            bs.put_bits(2, info.tile_size_bytes_minus_1 as u32)?;
        }

        Ok(())
    }

    // 5.9.12, mono_chrome is never set so there are always three planes
    fn write_quantization_params(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        let q = &self.quantization_params;
        let separate_uv_delta_q = seq.color_config.separate_uv_delta_q;

        bs.put_bits(8, q.base_q_idx as u32)?;
        write_delta_q(bs, q.delta_q_y_dc)?;

        let diff_uv_delta = q.diff_uv_delta();
        assert!(
            !diff_uv_delta || separate_uv_delta_q,
            "different U and V deltas need separate_uv_delta_q in the sequence header"
        );
        if separate_uv_delta_q {
            bs.put_bool(diff_uv_delta)?;
        }
        write_delta_q(bs, q.delta_q_u_dc)?;
        write_delta_q(bs, q.delta_q_u_ac)?;
        if diff_uv_delta {
            write_delta_q(bs, q.delta_q_v_dc)?;
            write_delta_q(bs, q.delta_q_v_ac)?;
        }

        bs.put_bool(q.using_qmatrix)?;
        if q.using_qmatrix {
            bs.put_bits(4, q.qm_y as u32)?;
            bs.put_bits(4, q.qm_u as u32)?;
            if separate_uv_delta_q {
                bs.put_bits(4, q.qm_v as u32)?;
            }
        }

        Ok(())
    }

    // 5.9.14
    fn write_segmentation_params(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        let seg = &self.segmentation_params;

        bs.put_bool(seg.segmentation_enabled)?;
        if !seg.segmentation_enabled {
            return Ok(());
        }

        let update_data = if self.effective_primary_ref_frame() == PRIMARY_REF_NONE {
            true
        } else {
            bs.put_bool(seg.segmentation_update_map)?;
            if seg.segmentation_update_map {
                bs.put_bool(seg.segmentation_temporal_update)?;
            }
            bs.put_bool(seg.segmentation_update_data)?;
            seg.segmentation_update_data
        };

        if update_data {
            for i in 0..MAX_SEGMENTS {
                for j in 0..SEG_LVL_MAX {
                    let feature_enabled = seg.feature_enabled[i][j];
                    bs.put_bool(feature_enabled)?;
                    if !feature_enabled {
                        continue;
                    }
                    let bits_to_read = SEGMENTATION_FEATURE_BITS[j];
                    let limit = SEGMENTATION_FEATURE_MAX[j];
                    let value = seg.feature_value[i][j] as i32;
                    if SEGMENTATION_FEATURE_SIGNED[j] {
                        bs.put_su(1 + bits_to_read, value.max(-limit).min(limit))?;
                    } else {
                        bs.put_bits(bits_to_read, value.max(0).min(limit) as u32)?;
                    }
                }
            }
        }

        Ok(())
    }

    // 5.9.17
    fn write_delta_q_params(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if self.quantization_params.base_q_idx > 0 {
            bs.put_bool(self.delta_params.delta_q_present)?;
        }
        if self.effective_delta_q_present() {
            bs.put_bits(2, self.delta_params.delta_q_res as u32)?;
        }
        Ok(())
    }

    // 5.9.18
    fn write_delta_lf_params(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if !self.effective_delta_q_present() {
            return Ok(());
        }
        if !self.effective_allow_intrabc(seq) {
            bs.put_bool(self.delta_params.delta_lf_present)?;
            if self.delta_params.delta_lf_present {
                bs.put_bits(2, self.delta_params.delta_lf_res as u32)?;
                bs.put_bool(self.delta_params.delta_lf_multi)?;
            }
        }
        Ok(())
    }

    // 5.9.11
    fn write_loop_filter_params(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if self.CodedLossless() || self.effective_allow_intrabc(seq) {
            return Ok(());
        }
        let lf = &self.loop_filter_params;

        bs.put_bits(6, lf.loop_filter_level[0] as u32)?;
        bs.put_bits(6, lf.loop_filter_level[1] as u32)?;
        if lf.loop_filter_level[0] != 0 || lf.loop_filter_level[1] != 0 {
            bs.put_bits(6, lf.loop_filter_level[2] as u32)?;
            bs.put_bits(6, lf.loop_filter_level[3] as u32)?;
        }
        bs.put_bits(3, lf.loop_filter_sharpness as u32)?;

        bs.put_bool(lf.loop_filter_delta_enabled)?;
        if lf.loop_filter_delta_enabled {
            bs.put_bool(lf.loop_filter_delta_update)?;
            if lf.loop_filter_delta_update {
                for delta in lf.loop_filter_ref_deltas.iter().chain(lf.loop_filter_mode_deltas.iter()) {
                    bs.put_bool(delta.is_some())?;
                    if let Some(delta) = delta {
                        write_su7(bs, *delta)?;
                    }
                }
            }
        }

        Ok(())
    }

    // 5.9.19
    fn write_cdef_params(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if self.CodedLossless() || self.effective_allow_intrabc(seq) || !seq.enable_cdef {
            return Ok(());
        }
        let cdef = &self.cdef_params;
        assert_eq!(cdef.strengths.len(), 1 << cdef.cdef_bits);

        bs.put_bits(2, cdef.cdef_damping_minus_3 as u32)?;
        bs.put_bits(2, cdef.cdef_bits as u32)?;
        for strength in &cdef.strengths {
            bs.put_bits(4, strength.y_pri as u32)?;
            bs.put_bits(2, strength.y_sec as u32)?;
            bs.put_bits(4, strength.uv_pri as u32)?;
            bs.put_bits(2, strength.uv_sec as u32)?;
        }

        Ok(())
    }

    // 5.9.20
    fn write_lr_params(&self, seq: &SequenceHeader, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if self.AllLossless(seq) || self.effective_allow_intrabc(seq) || !seq.enable_restoration {
            return Ok(());
        }
        let lr = &self.lr_params;

        for &lr_type in &lr.lr_type {
            bs.put_bits(2, lr_type as u32)?;
        }
        let uses_lr = lr.lr_type.iter().any(|&t| t != 0);
        let uses_chroma_lr = lr.lr_type[1..].iter().any(|&t| t != 0);

        if uses_lr {
            bs.put_bits(1, lr.lr_unit_shift as u32)?;
            if !seq.use_128x128_superblock && lr.lr_unit_shift != 0 {
                bs.put_bits(1, lr.lr_unit_extra_shift as u32)?;
            }
            if seq.color_config.subsampling(seq.seq_profile) == (true, true) && uses_chroma_lr {
                bs.put_bits(1, lr.lr_uv_shift as u32)?;
            }
        }

        Ok(())
    }

    // 5.9.21
    fn write_tx_mode(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if !self.CodedLossless() {
            bs.put_bool(self.tx_mode_select)?;
        }
        Ok(())
    }

    // 5.9.24, every reference uses the identity model
    fn write_global_motion_params(&self, bs: &mut BitstreamWriter<'_>) -> Result<()> {
        if self.FrameIsIntra() {
            return Ok(());
        }
        for _ in 0..REFS_PER_FRAME {
            bs.put_bool(false)?; // is_global
        }
        Ok(())
    }
}

// quantizer and loop filter deltas are su(1+6)
fn write_su7(bs: &mut BitstreamWriter<'_>, value: i8) -> Result<()> {
    assert!((-64..=63).contains(&value), "delta {} does not fit su(7)", value);
    bs.put_su(7, value as i32)
}

// read_delta_q, 5.9.13
fn write_delta_q(bs: &mut BitstreamWriter<'_>, delta_q: i8) -> Result<()> {
    bs.put_bool(delta_q != 0)?;
    if delta_q != 0 {
        write_su7(bs, delta_q)?;
    }
    Ok(())
}
