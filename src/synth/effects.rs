//! The shared effects bus: master gain feeding a dry path, a stereo
//! convolution reverb and a feedback delay.
//!
//! All voices mix into one bus, so send changes apply to every sounding
//! voice at once.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use tracing::debug;

use super::patch::{DelaySend, ReverbSend};

/// Gain applied to the voice sum before the effects.
pub const MASTER_GAIN: f32 = 0.8;
/// Partition size of the convolution reverb; also its latency in frames.
pub const REVERB_BLOCK: usize = 512;
/// Longest delay time the delay line can hold, in seconds.
pub const MAX_DELAY_SECS: f32 = 2.0;

const IR_GAIN_CALIBRATION: f32 = 0.00125;
const IR_MIN_POWER: f32 = 0.000125;

/// A stereo decaying-noise impulse response `decay` seconds long.
///
/// Each sample is white noise shaped by `(1 - i/len)^decay`, then the pair
/// is scaled so long and short tails come out at a similar loudness.
pub fn reverb_impulse(sample_rate: f32, decay: f32, seed: u64) -> [Vec<f32>; 2] {
    let len = ((sample_rate * decay) as usize).max(1);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut channel = || -> Vec<f32> {
        (0..len)
            .map(|i| {
                let noise: f32 = rng.gen_range(-1.0..1.0);
                noise * (1.0 - i as f32 / len as f32).powf(decay)
            })
            .collect()
    };
    let mut ir = [channel(), channel()];

    let energy: f32 = ir.iter().flatten().map(|x| x * x).sum();
    let power = (energy / (2 * len) as f32).sqrt().max(IR_MIN_POWER);
    let scale = IR_GAIN_CALIBRATION / power;
    for x in ir.iter_mut().flatten() {
        *x *= scale;
    }
    ir
}

/// Uniformly partitioned overlap-save convolution with one mono input and
/// two impulse responses.
pub struct ConvolutionReverb {
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,
    /// Spectra of each IR partition, per output channel.
    partitions: [Vec<Vec<Complex<f32>>>; 2],
    /// Spectra of recent input frames, newest first.
    history: VecDeque<Vec<Complex<f32>>>,
    /// Previous input block followed by the block being filled.
    frame: Vec<f32>,
    fill: usize,
    output: [Vec<f32>; 2],
    time_buf: Vec<f32>,
    acc: Vec<Complex<f32>>,
    r2c_scratch: Vec<Complex<f32>>,
    c2r_scratch: Vec<Complex<f32>>,
}

impl ConvolutionReverb {
    pub fn new(ir: [Vec<f32>; 2]) -> Self {
        let fft_size = 2 * REVERB_BLOCK;
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);
        let bins = fft_size / 2 + 1;

        let mut reverb = Self {
            r2c_scratch: r2c.make_scratch_vec(),
            c2r_scratch: c2r.make_scratch_vec(),
            r2c,
            c2r,
            partitions: [Vec::new(), Vec::new()],
            history: VecDeque::new(),
            frame: vec![0.0; fft_size],
            fill: 0,
            output: [vec![0.0; REVERB_BLOCK], vec![0.0; REVERB_BLOCK]],
            time_buf: vec![0.0; fft_size],
            acc: vec![Complex::new(0.0, 0.0); bins],
        };
        reverb.set_impulse_response(ir);
        reverb
    }

    /// Replace the impulse response. The reverb tail restarts from silence.
    pub fn set_impulse_response(&mut self, ir: [Vec<f32>; 2]) {
        let bins = REVERB_BLOCK + 1;
        let count = ir.iter().map(|c| c.len().div_ceil(REVERB_BLOCK)).max().unwrap_or(0).max(1);
        for (channel, samples) in ir.iter().enumerate() {
            let mut spectra = Vec::with_capacity(count);
            for k in 0..count {
                self.time_buf.fill(0.0);
                let start = (k * REVERB_BLOCK).min(samples.len());
                let end = ((k + 1) * REVERB_BLOCK).min(samples.len());
                self.time_buf[..end - start].copy_from_slice(&samples[start..end]);
                let mut spectrum = vec![Complex::new(0.0, 0.0); bins];
                if self
                    .r2c
                    .process_with_scratch(&mut self.time_buf, &mut spectrum, &mut self.r2c_scratch)
                    .is_err()
                {
                    spectrum.fill(Complex::new(0.0, 0.0));
                }
                spectra.push(spectrum);
            }
            self.partitions[channel] = spectra;
        }
        self.history = (0..count).map(|_| vec![Complex::new(0.0, 0.0); bins]).collect();
        self.frame.fill(0.0);
        self.fill = 0;
        for out in &mut self.output {
            out.fill(0.0);
        }
    }

    pub fn partition_count(&self) -> usize {
        self.history.len()
    }

    /// Feed one sample; returns the stereo output one block later.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let out = (self.output[0][self.fill], self.output[1][self.fill]);
        self.frame[REVERB_BLOCK + self.fill] = input;
        self.fill += 1;
        if self.fill == REVERB_BLOCK {
            self.run_block();
            self.fill = 0;
        }
        out
    }

    fn run_block(&mut self) {
        let Some(mut spectrum) = self.history.pop_back() else {
            return;
        };
        self.time_buf.copy_from_slice(&self.frame);
        if self
            .r2c
            .process_with_scratch(&mut self.time_buf, &mut spectrum, &mut self.r2c_scratch)
            .is_err()
        {
            spectrum.fill(Complex::new(0.0, 0.0));
        }
        self.history.push_front(spectrum);
        self.frame.copy_within(REVERB_BLOCK.., 0);

        let norm = 1.0 / (2 * REVERB_BLOCK) as f32;
        for channel in 0..2 {
            self.acc.fill(Complex::new(0.0, 0.0));
            for (x, h) in self.history.iter().zip(&self.partitions[channel]) {
                for ((a, x), h) in self.acc.iter_mut().zip(x).zip(h) {
                    *a += x * h;
                }
            }
            // DC and Nyquist bins of a real signal are real.
            if let Some(first) = self.acc.first_mut() {
                first.im = 0.0;
            }
            if let Some(last) = self.acc.last_mut() {
                last.im = 0.0;
            }
            let out = &mut self.output[channel];
            match self
                .c2r
                .process_with_scratch(&mut self.acc, &mut self.time_buf, &mut self.c2r_scratch)
            {
                Ok(()) => {
                    for (o, t) in out.iter_mut().zip(&self.time_buf[REVERB_BLOCK..]) {
                        *o = t * norm;
                    }
                }
                Err(_) => out.fill(0.0),
            }
        }
    }
}

/// A feedback delay line.
pub struct FeedbackDelay {
    buffer: Vec<f32>,
    write: usize,
    sample_rate: f32,
}

impl FeedbackDelay {
    pub fn new(sample_rate: f32) -> Self {
        let len = (MAX_DELAY_SECS * sample_rate).ceil() as usize + 1;
        Self {
            buffer: vec![0.0; len.max(2)],
            write: 0,
            sample_rate,
        }
    }

    /// Feed one sample; returns the delayed signal.
    #[inline]
    pub fn process(&mut self, input: f32, time: f32, feedback: f32) -> f32 {
        let len = self.buffer.len();
        let delay = ((time * self.sample_rate).round() as usize).clamp(1, len - 1);
        let read = (self.write + len - delay) % len;
        let delayed = self.buffer[read];
        self.buffer[self.write] = input + delayed * feedback;
        self.write = (self.write + 1) % len;
        delayed
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write = 0;
    }
}

/// Current send settings of the bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSends {
    pub reverb: ReverbSend,
    pub delay: DelaySend,
}

pub struct EffectsBus {
    sample_rate: f32,
    seed: u64,
    sends: EffectSends,
    reverb: ConvolutionReverb,
    delay: FeedbackDelay,
}

impl EffectsBus {
    pub fn new(sample_rate: f32, sends: EffectSends, seed: u64) -> Self {
        Self {
            sample_rate,
            seed,
            reverb: ConvolutionReverb::new(reverb_impulse(sample_rate, sends.reverb.decay, seed)),
            delay: FeedbackDelay::new(sample_rate),
            sends,
        }
    }

    pub fn sends(&self) -> EffectSends {
        self.sends
    }

    /// Apply new sends. A changed reverb decay regenerates the impulse.
    pub fn set_sends(&mut self, reverb: ReverbSend, delay: DelaySend) {
        if reverb.decay != self.sends.reverb.decay {
            debug!(decay = reverb.decay, "regenerating reverb impulse");
            self.reverb
                .set_impulse_response(reverb_impulse(self.sample_rate, reverb.decay, self.seed));
        }
        self.sends = EffectSends { reverb, delay };
    }

    /// Mix one frame of the voice sum into a stereo output frame.
    #[inline]
    pub fn process(&mut self, input: f32) -> [f32; 2] {
        let m = input * MASTER_GAIN;
        let (rl, rr) = self.reverb.process(m);
        let EffectSends { reverb, delay } = self.sends;
        let d = self.delay.process(m, delay.time, delay.feedback) * delay.wet;
        [m + rl * reverb.wet + d, m + rr * reverb.wet + d]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn sends() -> EffectSends {
        EffectSends {
            reverb: ReverbSend { wet: 0.0, decay: 0.1 },
            delay: DelaySend {
                time: 0.01,
                feedback: 0.5,
                wet: 0.0,
            },
        }
    }

    #[test]
    fn impulse_shape() {
        let ir = reverb_impulse(1000.0, 2.0, 7);
        assert_eq!(ir[0].len(), 2000);
        assert_ne!(ir[0], ir[1]);
        // The envelope decays to nothing at the tail.
        let head: f32 = ir[0][..200].iter().map(|x| x.abs()).sum();
        let tail: f32 = ir[0][1800..].iter().map(|x| x.abs()).sum();
        assert!(tail < head * 0.05, "head {head} tail {tail}");
        assert_eq!(reverb_impulse(1000.0, 2.0, 7), ir);
    }

    #[test]
    fn convolution_of_impulse_is_ir_one_block_late() {
        let ir = [
            (0..1300).map(|i| ((i * 37) % 101) as f32 / 101.0 - 0.5).collect::<Vec<f32>>(),
            (0..700).map(|i| if i % 3 == 0 { 0.25 } else { -0.1 }).collect::<Vec<f32>>(),
        ];
        let mut reverb = ConvolutionReverb::new(ir.clone());
        assert_eq!(reverb.partition_count(), 3);
        let total = REVERB_BLOCK + 1300 + 200;
        let out: Vec<(f32, f32)> = (0..total)
            .map(|n| reverb.process(if n == 0 { 1.0 } else { 0.0 }))
            .collect();
        for (n, &(l, r)) in out.iter().enumerate() {
            let idx = n as isize - REVERB_BLOCK as isize;
            let expect = |c: &Vec<f32>| if idx >= 0 { c.get(idx as usize).copied().unwrap_or(0.0) } else { 0.0 };
            assert_approx_eq!(l, expect(&ir[0]), 1e-4);
            assert_approx_eq!(r, expect(&ir[1]), 1e-4);
        }
    }

    #[test]
    fn convolution_is_linear_across_blocks() {
        let ir = [vec![0.5, 0.25], vec![1.0]];
        let mut reverb = ConvolutionReverb::new(ir);
        let input: Vec<f32> = (0..3 * REVERB_BLOCK).map(|i| (i as f32 * 0.1).sin()).collect();
        let out: Vec<(f32, f32)> = input.iter().map(|&x| reverb.process(x)).collect();
        for n in (REVERB_BLOCK + 1)..(3 * REVERB_BLOCK) {
            let src = n - REVERB_BLOCK;
            assert_approx_eq!(out[n].0, 0.5 * input[src] + 0.25 * input[src - 1], 1e-4);
            assert_approx_eq!(out[n].1, input[src], 1e-4);
        }
    }

    #[test]
    fn delay_repeats_with_feedback() {
        let mut delay = FeedbackDelay::new(100.0);
        let out: Vec<f32> = (0..25)
            .map(|n| delay.process(if n == 0 { 1.0 } else { 0.0 }, 0.1, 0.5))
            .collect();
        assert_eq!(out[10], 1.0);
        assert_eq!(out[20], 0.5);
        assert_eq!(out.iter().filter(|x| **x != 0.0).count(), 2);
    }

    #[test]
    fn delay_time_is_capped() {
        let mut delay = FeedbackDelay::new(10.0);
        delay.process(1.0, 50.0, 0.0);
        let out: Vec<f32> = (0..30).map(|_| delay.process(0.0, 50.0, 0.0)).collect();
        // Buffer holds two seconds: 21 frames.
        assert_eq!(out.iter().position(|x| *x == 1.0), Some(19));
    }

    #[test]
    fn dry_bus_is_master_gain() {
        let mut bus = EffectsBus::new(1000.0, sends(), 1);
        let out = bus.process(0.5);
        assert_approx_eq!(out[0], 0.4);
        assert_approx_eq!(out[1], 0.4);
    }

    #[test]
    fn decay_change_regenerates_impulse() {
        let mut bus = EffectsBus::new(1000.0, sends(), 1);
        assert_eq!(bus.reverb.partition_count(), 1);
        let s = sends();
        bus.set_sends(ReverbSend { wet: 0.5, decay: 3.0 }, s.delay);
        assert_eq!(bus.reverb.partition_count(), 6);
        assert_eq!(bus.sends().reverb.wet, 0.5);
    }
}
