pub mod nal_unit;
pub use nal_unit::*;

pub use h264::{decode, encode, Error, Result};

pub use h264::bitstream;
pub use h264::bitstream::*;

pub use h264::syntax_elements;
pub use syntax_elements::*;

pub mod profile_tier_level;
pub use profile_tier_level::*;

pub mod hrd_parameters;
pub use hrd_parameters::*;

pub mod video_parameter_set;
pub use video_parameter_set::*;

pub mod sequence_parameter_set;
pub use sequence_parameter_set::*;

pub mod picture_parameter_set;
pub use picture_parameter_set::*;

pub mod access_unit_delimiter;
pub use access_unit_delimiter::*;

pub mod writer;
pub use writer::*;

pub use h264::{iterate_annex_b, iterate_avcc};
