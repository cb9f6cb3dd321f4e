pub use h264::bitstream::{BitstreamWriter, Encode};
pub use h264::{Error, Result};

pub mod obu;
pub use obu::*;

pub mod sequence_header;
pub use sequence_header::*;

pub mod frame_header;
pub use frame_header::*;

pub mod tile_group;
pub use tile_group::*;

pub mod builder;
pub use builder::*;
