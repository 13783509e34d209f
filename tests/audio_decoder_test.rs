use std::f32::consts::TAU;

use hark::application::ports::TranscriptionError;
use hark::infrastructure::audio::audio_decoder::decode_audio_to_pcm;

fn build_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let num_samples = samples.len() as u32;
    let byte_rate = sample_rate * channels as u32 * 2;
    let block_align = channels * 2;
    let data_size = num_samples * 2;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        wav.extend_from_slice(&s.to_le_bytes());
    }
    wav
}

fn sine_samples(sample_rate: u32, frequency: f32, count: usize) -> Vec<i16> {
    (0..count)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            ((TAU * frequency * t).sin() * 16_000.0) as i16
        })
        .collect()
}

fn write_temp_wav(bytes: &[u8]) -> tempfile::NamedTempFile {
    let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
    std::fs::write(file.path(), bytes).unwrap();
    file
}

#[test]
fn given_16khz_mono_wav_when_decoding_then_returns_all_samples() {
    let samples = sine_samples(16_000, 440.0, 16_000);
    let wav = build_wav(16_000, 1, &samples);
    let file = write_temp_wav(&wav);

    let pcm = decode_audio_to_pcm(file.path()).unwrap();

    assert_eq!(pcm.len(), 16_000);
    assert!(pcm.iter().any(|s| s.abs() > 0.1));
}

#[test]
fn given_44khz_wav_when_decoding_then_resamples_to_16khz() {
    let samples = sine_samples(44_100, 440.0, 44_100);
    let wav = build_wav(44_100, 1, &samples);
    let file = write_temp_wav(&wav);

    let pcm = decode_audio_to_pcm(file.path()).unwrap();

    // one second of input becomes roughly one second at 16kHz
    assert!(pcm.len() > 15_000 && pcm.len() <= 16_000);
}

#[test]
fn given_stereo_wav_when_decoding_then_downmixes_to_mono() {
    // interleaved L/R frames, 0.5s at 16kHz
    let frames = 8_000;
    let mono = sine_samples(16_000, 440.0, frames);
    let mut interleaved = Vec::with_capacity(frames * 2);
    for s in mono {
        interleaved.push(s);
        interleaved.push(s);
    }
    let wav = build_wav(16_000, 2, &interleaved);
    let file = write_temp_wav(&wav);

    let pcm = decode_audio_to_pcm(file.path()).unwrap();

    assert_eq!(pcm.len(), frames);
}

#[test]
fn given_garbage_bytes_when_decoding_then_returns_decoding_error() {
    let file = write_temp_wav(&[0xFFu8; 128]);

    let result = decode_audio_to_pcm(file.path());

    assert!(matches!(
        result,
        Err(TranscriptionError::DecodingFailed(_))
    ));
}

#[test]
fn given_empty_file_when_decoding_then_returns_decoding_error() {
    let file = write_temp_wav(&[]);

    let result = decode_audio_to_pcm(file.path());

    assert!(matches!(
        result,
        Err(TranscriptionError::DecodingFailed(_))
    ));
}

#[test]
fn given_missing_file_when_decoding_then_returns_decoding_error() {
    let path = std::path::Path::new("/nonexistent/upload.wav");

    let result = decode_audio_to_pcm(path);

    assert!(matches!(
        result,
        Err(TranscriptionError::DecodingFailed(_))
    ));
}
