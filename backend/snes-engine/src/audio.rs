//! SNES audio resampling code

use crate::apu;
use crate::constants;
use bincode::{Decode, Encode};
use jgenesis_common::audio::{FirKernel, FirResampler, LpfCoefficients};
use jgenesis_common::frontend::AudioOutput;

const SNES_AUDIO_FREQUENCY: f64 = apu::OUTPUT_FREQUENCY as f64;

#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
struct SnesLpfKernel;

impl FirKernel<{ constants::LPF_TAPS }> for SnesLpfKernel {
    fn lpf_coefficients() -> &'static LpfCoefficients<{ constants::LPF_TAPS }> {
        static COEFFICIENTS: LpfCoefficients<{ constants::LPF_TAPS }> =
            LpfCoefficients(constants::LPF_COEFFICIENTS);
        &COEFFICIENTS
    }
}

type SnesResampler = FirResampler<2, { constants::LPF_TAPS }, SnesLpfKernel>;

#[derive(Debug, Clone, Encode, Decode)]
pub struct AudioResampler {
    resampler: SnesResampler,
    hpf_capacitor_l: f64,
    hpf_capacitor_r: f64,
}

fn new_snes_resampler() -> SnesResampler {
    SnesResampler::new(SNES_AUDIO_FREQUENCY, jgenesis_common::audio::DEFAULT_OUTPUT_FREQUENCY)
}

// Simple DC-blocking one-pole high-pass filter; applied before the FIR low-pass/resample stage
fn high_pass_filter(sample: f64, capacitor: &mut f64) -> f64 {
    let filtered_sample = sample - *capacitor;
    *capacitor = sample - constants::HPF_CHARGE_FACTOR * filtered_sample;
    filtered_sample
}

impl AudioResampler {
    pub fn new() -> Self {
        Self { resampler: new_snes_resampler(), hpf_capacitor_l: 0.0, hpf_capacitor_r: 0.0 }
    }

    pub fn collect_sample(&mut self, sample_l: f64, sample_r: f64) {
        let sample_l = high_pass_filter(sample_l, &mut self.hpf_capacitor_l);
        let sample_r = high_pass_filter(sample_r, &mut self.hpf_capacitor_r);
        self.resampler.collect([sample_l, sample_r]);
    }

    pub fn output_samples<A: AudioOutput>(&mut self, audio_output: &mut A) -> Result<(), A::Err> {
        while let Some([sample_l, sample_r]) = self.resampler.output_buffer_pop_front() {
            audio_output.push_sample(sample_l, sample_r)?;
        }

        Ok(())
    }

    pub fn update_output_frequency(&mut self, output_frequency: u64) {
        self.resampler.update_output_frequency(output_frequency as f64);
    }
}

impl Default for AudioResampler {
    fn default() -> Self {
        Self::new()
    }
}
