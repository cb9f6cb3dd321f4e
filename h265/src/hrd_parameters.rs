use super::{decode, encode, syntax_elements::*, Bitstream, BitstreamWriter, Result};
use std::io;

// ITU-T H.265, 11/2019, E.2.3
#[derive(Clone, Debug, Default)]
pub struct SubLayerHrdParameters {
    pub bit_rate_value_minus1: UE,
    pub cpb_size_value_minus1: UE,
    // if( sub_pic_hrd_params_present_flag ) {
    pub cpb_size_du_value_minus1: UE,
    pub bit_rate_du_value_minus1: UE,
    // }
    pub cbr_flag: U1,
}

impl SubLayerHrdParameters {
    fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>, sub_pic_hrd_params_present_flag: bool) -> io::Result<Self> {
        let mut ret = Self::default();
        decode!(bs, &mut ret.bit_rate_value_minus1, &mut ret.cpb_size_value_minus1)?;
        if sub_pic_hrd_params_present_flag {
            decode!(bs, &mut ret.cpb_size_du_value_minus1, &mut ret.bit_rate_du_value_minus1)?;
        }
        decode!(bs, &mut ret.cbr_flag)?;
        Ok(ret)
    }

    fn encode(&self, bs: &mut BitstreamWriter<'_>, sub_pic_hrd_params_present_flag: bool) -> Result<()> {
        encode!(bs, &self.bit_rate_value_minus1, &self.cpb_size_value_minus1)?;
        if sub_pic_hrd_params_present_flag {
            encode!(bs, &self.cpb_size_du_value_minus1, &self.bit_rate_du_value_minus1)?;
        }
        encode!(bs, &self.cbr_flag)
    }
}

#[derive(Clone, Debug, Default)]
pub struct HrdSubLayer {
    pub fixed_pic_rate_general_flag: U1,

    // if( !fixed_pic_rate_general_flag[ i ] ), otherwise inferred to be 1
    pub fixed_pic_rate_within_cvs_flag: U1,

    // if( fixed_pic_rate_within_cvs_flag[ i ] )
    pub elemental_duration_in_tc_minus1: UE,
    // else
    pub low_delay_hrd_flag: U1,

    // if( !low_delay_hrd_flag[ i ] )
    pub cpb_cnt_minus1: UE,

    // if( nal_hrd_parameters_present_flag ), cpb_cnt_minus1 + 1 entries
    pub nal_sub_layer_hrd_parameters: Vec<SubLayerHrdParameters>,
    // if( vcl_hrd_parameters_present_flag ), cpb_cnt_minus1 + 1 entries
    pub vcl_sub_layer_hrd_parameters: Vec<SubLayerHrdParameters>,
}

impl HrdSubLayer {
    fn fixed_pic_rate_within_cvs(&self) -> bool {
        self.fixed_pic_rate_general_flag.is_set() || self.fixed_pic_rate_within_cvs_flag.is_set()
    }
}

// ITU-T H.265, 11/2019, E.2.2
#[derive(Clone, Debug, Default)]
pub struct HrdParameters {
    // if( commonInfPresentFlag ) {
    pub nal_hrd_parameters_present_flag: U1,
    pub vcl_hrd_parameters_present_flag: U1,
    //   if( nal_hrd_parameters_present_flag | | vcl_hrd_parameters_present_flag ) {
    pub sub_pic_hrd_params_present_flag: U1,
    //     if( sub_pic_hrd_params_present_flag ) {
    pub tick_divisor_minus2: U8,
    pub du_cpb_removal_delay_increment_length_minus1: U5,
    pub sub_pic_cpb_params_in_pic_timing_sei_flag: U1,
    pub dpb_output_delay_du_length_minus1: U5,
    //     }
    pub bit_rate_scale: U4,
    pub cpb_size_scale: U4,
    //     if( sub_pic_hrd_params_present_flag )
    pub cpb_size_du_scale: U4,
    pub initial_cpb_removal_delay_length_minus1: U5,
    pub au_cpb_removal_delay_length_minus1: U5,
    pub dpb_output_delay_length_minus1: U5,
    //   }
    // }

    // for( i = 0; i <= maxNumSubLayersMinus1; i++ )
    pub sub_layers: Vec<HrdSubLayer>,
}

impl HrdParameters {
    fn has_hrd_parameters(&self) -> bool {
        self.nal_hrd_parameters_present_flag.is_set() || self.vcl_hrd_parameters_present_flag.is_set()
    }

    pub fn decode<T: AsRef<[u8]>>(bs: &mut Bitstream<T>, common_inf_present_flag: bool, max_num_sub_layers_minus1: u8) -> io::Result<Self> {
        let mut ret = Self::default();

        if common_inf_present_flag {
            decode!(bs, &mut ret.nal_hrd_parameters_present_flag, &mut ret.vcl_hrd_parameters_present_flag)?;
            if ret.has_hrd_parameters() {
                decode!(bs, &mut ret.sub_pic_hrd_params_present_flag)?;
                if ret.sub_pic_hrd_params_present_flag.is_set() {
                    decode!(
                        bs,
                        &mut ret.tick_divisor_minus2,
                        &mut ret.du_cpb_removal_delay_increment_length_minus1,
                        &mut ret.sub_pic_cpb_params_in_pic_timing_sei_flag,
                        &mut ret.dpb_output_delay_du_length_minus1
                    )?;
                }
                decode!(bs, &mut ret.bit_rate_scale, &mut ret.cpb_size_scale)?;
                if ret.sub_pic_hrd_params_present_flag.is_set() {
                    decode!(bs, &mut ret.cpb_size_du_scale)?;
                }
                decode!(
                    bs,
                    &mut ret.initial_cpb_removal_delay_length_minus1,
                    &mut ret.au_cpb_removal_delay_length_minus1,
                    &mut ret.dpb_output_delay_length_minus1
                )?;
            }
        }

        let sub_pic = ret.sub_pic_hrd_params_present_flag.is_set();
        for _ in 0..=max_num_sub_layers_minus1 {
            let mut sub_layer = HrdSubLayer::default();
            decode!(bs, &mut sub_layer.fixed_pic_rate_general_flag)?;
            if sub_layer.fixed_pic_rate_general_flag.is_set() {
                sub_layer.fixed_pic_rate_within_cvs_flag = U1(1);
            } else {
                decode!(bs, &mut sub_layer.fixed_pic_rate_within_cvs_flag)?;
            }
            if sub_layer.fixed_pic_rate_within_cvs_flag.is_set() {
                decode!(bs, &mut sub_layer.elemental_duration_in_tc_minus1)?;
            } else {
                decode!(bs, &mut sub_layer.low_delay_hrd_flag)?;
            }
            if !sub_layer.low_delay_hrd_flag.is_set() {
                decode!(bs, &mut sub_layer.cpb_cnt_minus1)?;
            }
            for _ in 0..=sub_layer.cpb_cnt_minus1.0 {
                if ret.nal_hrd_parameters_present_flag.is_set() {
                    sub_layer.nal_sub_layer_hrd_parameters.push(SubLayerHrdParameters::decode(bs, sub_pic)?);
                }
            }
            for _ in 0..=sub_layer.cpb_cnt_minus1.0 {
                if ret.vcl_hrd_parameters_present_flag.is_set() {
                    sub_layer.vcl_sub_layer_hrd_parameters.push(SubLayerHrdParameters::decode(bs, sub_pic)?);
                }
            }
            ret.sub_layers.push(sub_layer);
        }

        Ok(ret)
    }

    pub fn encode(&self, bs: &mut BitstreamWriter<'_>, common_inf_present_flag: bool, max_num_sub_layers_minus1: u8) -> Result<()> {
        assert_eq!(self.sub_layers.len(), max_num_sub_layers_minus1 as usize + 1);

        if common_inf_present_flag {
            encode!(bs, &self.nal_hrd_parameters_present_flag, &self.vcl_hrd_parameters_present_flag)?;
            if self.has_hrd_parameters() {
                encode!(bs, &self.sub_pic_hrd_params_present_flag)?;
                if self.sub_pic_hrd_params_present_flag.is_set() {
                    encode!(
                        bs,
                        &self.tick_divisor_minus2,
                        &self.du_cpb_removal_delay_increment_length_minus1,
                        &self.sub_pic_cpb_params_in_pic_timing_sei_flag,
                        &self.dpb_output_delay_du_length_minus1
                    )?;
                }
                encode!(bs, &self.bit_rate_scale, &self.cpb_size_scale)?;
                if self.sub_pic_hrd_params_present_flag.is_set() {
                    encode!(bs, &self.cpb_size_du_scale)?;
                }
                encode!(
                    bs,
                    &self.initial_cpb_removal_delay_length_minus1,
                    &self.au_cpb_removal_delay_length_minus1,
                    &self.dpb_output_delay_length_minus1
                )?;
            }
        }

        let sub_pic = self.sub_pic_hrd_params_present_flag.is_set();
        for sub_layer in &self.sub_layers {
            encode!(bs, &sub_layer.fixed_pic_rate_general_flag)?;
            if !sub_layer.fixed_pic_rate_general_flag.is_set() {
                encode!(bs, &sub_layer.fixed_pic_rate_within_cvs_flag)?;
            }
            if sub_layer.fixed_pic_rate_within_cvs() {
                encode!(bs, &sub_layer.elemental_duration_in_tc_minus1)?;
            } else {
                encode!(bs, &sub_layer.low_delay_hrd_flag)?;
            }
            if !sub_layer.low_delay_hrd_flag.is_set() {
                encode!(bs, &sub_layer.cpb_cnt_minus1)?;
            }

            let cpb_cnt = sub_layer.cpb_cnt_minus1.0 as usize + 1;
            if self.nal_hrd_parameters_present_flag.is_set() {
                assert_eq!(sub_layer.nal_sub_layer_hrd_parameters.len(), cpb_cnt);
                for params in &sub_layer.nal_sub_layer_hrd_parameters {
                    params.encode(bs, sub_pic)?;
                }
            }
            if self.vcl_hrd_parameters_present_flag.is_set() {
                assert_eq!(sub_layer.vcl_sub_layer_hrd_parameters.len(), cpb_cnt);
                for params in &sub_layer.vcl_sub_layer_hrd_parameters {
                    params.encode(bs, sub_pic)?;
                }
            }
        }

        Ok(())
    }
}
