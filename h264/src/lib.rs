use std::iter::Iterator;

use memchr::memmem;

pub mod error;
pub use error::*;

pub mod bitstream;
pub use bitstream::*;

pub mod syntax_elements;
pub use syntax_elements::*;

pub mod nal_unit;
pub use nal_unit::*;

pub mod sequence_parameter_set;
pub use sequence_parameter_set::*;

pub mod picture_parameter_set;
pub use picture_parameter_set::*;

pub mod access_unit_delimiter;
pub use access_unit_delimiter::*;

pub mod writer;
pub use writer::*;

pub struct AVCCIter<'a> {
    buf: &'a [u8],
    nalu_length_size: usize,
}

pub fn iterate_avcc<'a, T: AsRef<[u8]>>(buf: &'a T, nalu_length_size: usize) -> AVCCIter<'a> {
    AVCCIter {
        buf: buf.as_ref(),
        nalu_length_size,
    }
}

impl<'a> Iterator for AVCCIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.len() < self.nalu_length_size {
            return None;
        }

        let mut len = 0;
        for i in 0..self.nalu_length_size {
            len = len << 8 | self.buf[i] as usize;
        }

        if self.buf.len() < self.nalu_length_size + len {
            return None;
        }

        let ret = &self.buf[self.nalu_length_size..self.nalu_length_size + len];
        self.buf = &self.buf[self.nalu_length_size + len..];
        Some(ret)
    }
}

pub struct AnnexBIter<'a> {
    buf: &'a [u8],
}

/// Iterates over the NAL units of an Annex B byte stream, such as the output of the `build_*`
/// functions. Each item excludes its start code and any trailing zero bytes.
pub fn iterate_annex_b<'a, T: AsRef<[u8]>>(buf: &'a T) -> AnnexBIter<'a> {
    AnnexBIter { buf: buf.as_ref() }
}

impl<'a> Iterator for AnnexBIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let start = memmem::find(self.buf, &[0x00, 0x00, 0x01])?;
        // only zero bytes may precede a start code
        if self.buf[..start].iter().any(|&b| b != 0) {
            return None;
        }

        let nalu = &self.buf[start + 3..];
        let mut end = nalu.len();
        let mut search = 0;
        while let Some(i) = memmem::find(&nalu[search..], &[0x00, 0x00]) {
            let i = search + i;
            if i + 2 < nalu.len() && nalu[i + 2] <= 1 {
                end = i;
                break;
            }
            search = i + 1;
        }

        self.buf = &nalu[end..];
        Some(&nalu[..end])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_iterate_annex_b() {
        let data = &[0x00, 0x00, 0x00, 0x01, 0x01, 0x02, 0x03, 0x00, 0x00, 0x00, 0x01, 0x04];
        let expected: Vec<&[u8]> = vec![&[0x01, 0x02, 0x03], &[0x04]];
        assert_eq!(expected, iterate_annex_b(&data).collect::<Vec<&[u8]>>());
    }

    #[test]
    fn test_iterate_annex_b_escaped() {
        let data = &[0x00, 0x00, 0x01, 0x09, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01, 0x09, 0x00, 0x00];
        let expected: Vec<&[u8]> = vec![&[0x09, 0x00, 0x00, 0x03], &[0x09, 0x00, 0x00]];
        assert_eq!(expected, iterate_annex_b(&data).collect::<Vec<&[u8]>>());
    }

    #[test]
    fn test_iterate_annex_b_garbage() {
        let data = &[0x12, 0x00, 0x00, 0x01, 0x09];
        assert_eq!(iterate_annex_b(&data).count(), 0);
    }

    #[test]
    fn test_iterate_avcc() {
        let data = &[0x00, 0x00, 0x00, 0x03, 0x01, 0x02, 0x03, 0x00, 0x00, 0x00, 0x01, 0x04];
        let expected: Vec<&[u8]> = vec![&[0x01, 0x02, 0x03], &[0x04]];
        assert_eq!(expected, iterate_avcc(&data, 4).collect::<Vec<&[u8]>>());
    }
}
