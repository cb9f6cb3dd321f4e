use super::{BitstreamWriter, Result, TileLayout};

/// The inclusive range of tiles a tile group covers, in raster order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGroup {
    pub tg_start: u32,
    pub tg_end: u32,
}

impl TileGroup {
    /// A group covering every tile of the layout.
    pub fn all(layout: &TileLayout) -> Self {
        assert!(layout.num_tiles() > 0, "tile layout has no tiles");
        Self {
            tg_start: 0,
            tg_end: layout.num_tiles() - 1,
        }
    }

    pub fn num_tiles(&self) -> usize {
        (self.tg_end - self.tg_start + 1) as usize
    }

    pub fn covers(&self, layout: &TileLayout) -> bool {
        self.tg_start == 0 && self.tg_end + 1 == layout.num_tiles()
    }
}

// tile_start_and_end_present_flag, which must be 0 inside an OBU_FRAME
fn tile_start_and_end_present(layout: &TileLayout, group: &TileGroup) -> bool {
    !group.covers(layout)
}

fn tile_bits(layout: &TileLayout) -> u32 {
    layout.tile_cols_log2 + layout.tile_rows_log2
}

/// The size of the `tile_group_obu()` payload `write_tile_group` produces for tiles of the given
/// sizes.
pub fn calculate_tile_group_obu_size(layout: &TileLayout, group: &TileGroup, tile_sizes: &[usize]) -> usize {
    assert_eq!(tile_sizes.len(), group.num_tiles());
    let mut header_bits = 0;
    if layout.num_tiles() > 1 {
        header_bits += 1;
        if tile_start_and_end_present(layout, group) {
            header_bits += 2 * tile_bits(layout) as usize;
        }
    }
    (header_bits + 7) / 8 + layout.tile_size_bytes * (tile_sizes.len() - 1) + tile_sizes.iter().sum::<usize>()
}

/// Writes `tile_group_obu()`, AV1-Spec-2 - 5.11.1. Every tile but the last is prefixed with its
/// size in `TileSizeBytes` little endian bytes.
pub fn write_tile_group(bs: &mut BitstreamWriter<'_>, layout: &TileLayout, group: &TileGroup, tiles: &[&[u8]]) -> Result<()> {
    assert_eq!(tiles.len(), group.num_tiles());
    assert!(group.tg_end < layout.num_tiles());

    if layout.num_tiles() > 1 {
        let tile_start_and_end_present_flag = tile_start_and_end_present(layout, group);
        bs.put_bool(tile_start_and_end_present_flag)?;
        if tile_start_and_end_present_flag {
            bs.put_bits(tile_bits(layout), group.tg_start)?;
            bs.put_bits(tile_bits(layout), group.tg_end)?;
        }
    }
    bs.put_aligning_bits()?;

    let (last, rest) = match tiles.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };
    for tile in rest {
        assert!(!tile.is_empty() && ((tile.len() - 1) as u64) < 1u64 << (8 * layout.tile_size_bytes));
        bs.put_le_bytes(layout.tile_size_bytes, (tile.len() - 1) as u32)?;
        bs.put_bytes(tile)?;
    }
    bs.put_bytes(last)
}
