//! Multi-channel WAV export of engine outputs.
//!
//! Channel layout: master, every ratio output in physical order, chain.
//! Samples are 32-bit float volts scaled by 1/10.

use std::io::{Seek, Write};
use std::path::Path;

use rc_engine::Outputs;
use rc_ir::MAX_RATIO_CHANNELS;

use crate::error::ControllerError;

fn spec(sample_rate: u32, ratio_channels: usize) -> hound::WavSpec {
    hound::WavSpec {
        channels: (ratio_channels + 2) as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    }
}

/// Write outputs to any seekable writer. `ratio_channels` beyond what an
/// engine can produce are dropped.
pub fn write_wav<W: Write + Seek>(
    w: W,
    outputs: &[Outputs],
    ratio_channels: usize,
    sample_rate: u32,
) -> Result<(), ControllerError> {
    let ratio_channels = ratio_channels.min(MAX_RATIO_CHANNELS);
    let mut writer = hound::WavWriter::new(w, spec(sample_rate, ratio_channels))?;
    for out in outputs {
        writer.write_sample(out.master.voltage / 10.0)?;
        for channel in &out.channels[..ratio_channels] {
            writer.write_sample(channel.voltage / 10.0)?;
        }
        writer.write_sample(out.chain / 10.0)?;
    }
    writer.finalize()?;
    Ok(())
}

pub fn write_wav_file(
    path: &Path,
    outputs: &[Outputs],
    ratio_channels: usize,
    sample_rate: u32,
) -> Result<(), ControllerError> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_wav(file, outputs, ratio_channels, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_engine::ChannelOutput;
    use std::io::Cursor;

    #[test]
    fn writes_one_channel_per_output() {
        let mut out = Outputs::default();
        out.master = ChannelOutput { voltage: 10.0, inverted: 0.0, brightness: 1.0 };
        out.channels[1].voltage = 5.0;
        out.chain = 10.42;

        let mut buf = Cursor::new(Vec::new());
        write_wav(&mut buf, &[out, Outputs::default()], 2, 48_000).unwrap();

        buf.set_position(0);
        let mut reader = hound::WavReader::new(buf).unwrap();
        assert_eq!(reader.spec().channels, 4);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 8);
        assert_eq!(samples[0], 1.0);
        assert_eq!(samples[1], 0.0);
        assert_eq!(samples[2], 0.5);
        assert!((samples[3] - 1.042).abs() < 1e-6);
    }

    #[test]
    fn extra_ratio_channels_are_dropped() {
        let mut buf = Cursor::new(Vec::new());
        write_wav(&mut buf, &[Outputs::default()], 12, 48_000).unwrap();

        buf.set_position(0);
        let reader = hound::WavReader::new(buf).unwrap();
        assert_eq!(reader.spec().channels as usize, MAX_RATIO_CHANNELS + 2);
    }
}
