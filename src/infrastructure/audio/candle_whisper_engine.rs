use std::path::Path;

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;
use tokio::sync::Mutex;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::{Transcript, language};

use super::audio_decoder::decode_audio_to_pcm;

const MAX_DECODE_TOKENS: usize = 224;

/// Local whisper inference on CPU via candle.
///
/// The decoder carries a KV cache, so a single inference may run at a time;
/// the model is behind a mutex and concurrent requests queue on it.
pub struct CandleWhisperEngine {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
    /// `(token_id, iso_code)` pairs; empty for English-only checkpoints.
    language_tokens: Vec<(u32, &'static str)>,
}

impl CandleWhisperEngine {
    pub fn new(model_id: &str) -> Result<Self, TranscriptionError> {
        let device = Device::Cpu;

        tracing::info!(
            device = ?device,
            model = model_id,
            "Initializing Candle Whisper transcription engine"
        );

        let api = Api::new().map_err(|e| TranscriptionError::ModelLoadFailed(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("config.json: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("tokenizer.json: {}", e)))?;
        let weights_path = repo.get("model.safetensors").map_err(|e| {
            TranscriptionError::ModelLoadFailed(format!("model.safetensors: {}", e))
        })?;

        let mel_repo = api.repo(Repo::new(
            "FL33TW00D-HF/whisper-base".to_string(),
            RepoType::Model,
        ));
        let mel_bytes_path = mel_repo
            .get("melfilters.bytes")
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("melfilters.bytes: {}", e)))?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("read config: {}", e)))?;
        let config: Config = serde_json::from_str(&config_contents)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("parse config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("tokenizer: {}", e)))?;

        let mel_bytes = std::fs::read(&mel_bytes_path)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("mel filters: {}", e)))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], m::DTYPE, &device)
                .map_err(|e| TranscriptionError::ModelLoadFailed(format!("weights: {}", e)))?
        };

        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("model: {}", e)))?;

        let language_tokens: Vec<(u32, &'static str)> = language::LANGUAGES
            .iter()
            .filter_map(|(code, _)| {
                tokenizer
                    .token_to_id(&format!("<|{}|>", code))
                    .map(|id| (id, *code))
            })
            .collect();

        tracing::info!(
            multilingual = !language_tokens.is_empty(),
            "Candle Whisper engine loaded successfully"
        );

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
            mel_filters,
            language_tokens,
        })
    }

    fn token_id(&self, token: &str) -> Result<u32, TranscriptionError> {
        self.tokenizer.token_to_id(token).ok_or_else(|| {
            TranscriptionError::TranscriptionFailed(format!("token not found: {}", token))
        })
    }

    /// Pick the language whose special token scores highest after `[sot]`.
    fn detect_language(
        &self,
        model: &mut m::model::Whisper,
        mel: &Tensor,
    ) -> Result<&'static str, TranscriptionError> {
        let sot_token = self.token_id(m::SOT_TOKEN)?;

        let audio_features = model
            .encoder
            .forward(mel, true)
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("encoder: {}", e)))?;

        let token_tensor = Tensor::new(&[sot_token], &self.device)
            .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?
            .unsqueeze(0)
            .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?;

        let decoder_output = model
            .decoder
            .forward(&token_tensor, &audio_features, true)
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("decoder: {}", e)))?;

        let logits = model
            .decoder
            .final_linear(
                &decoder_output
                    .squeeze(0)
                    .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?,
            )
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("linear: {}", e)))?;

        let scores = logits
            .get(0)
            .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?
            .to_vec1::<f32>()
            .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?;

        model.reset_kv_cache();

        let detected = self
            .language_tokens
            .iter()
            .filter(|(id, _)| (*id as usize) < scores.len())
            .max_by(|(a, _), (b, _)| scores[*a as usize].total_cmp(&scores[*b as usize]))
            .map(|(_, code)| *code)
            .unwrap_or("en");

        tracing::debug!(language = detected, "Detected spoken language");

        Ok(detected)
    }

    fn decode_segment(
        &self,
        model: &mut m::model::Whisper,
        mel: &Tensor,
        language_token: Option<u32>,
    ) -> Result<String, TranscriptionError> {
        let sot_token = self.token_id(m::SOT_TOKEN)?;
        let transcribe_token = self.token_id(m::TRANSCRIBE_TOKEN)?;
        let no_timestamps_token = self.token_id(m::NO_TIMESTAMPS_TOKEN)?;
        let eot_token = self.token_id(m::EOT_TOKEN)?;

        let audio_features = model
            .encoder
            .forward(mel, true)
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("encoder: {}", e)))?;

        let mut tokens = vec![sot_token];
        if let Some(lang) = language_token {
            tokens.push(lang);
        }
        tokens.push(transcribe_token);
        tokens.push(no_timestamps_token);
        let prompt_len = tokens.len();

        let mut decoded_text = String::new();

        for _ in 0..MAX_DECODE_TOKENS {
            let token_tensor = Tensor::new(tokens.as_slice(), &self.device)
                .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?
                .unsqueeze(0)
                .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?;

            let decoder_output = model
                .decoder
                .forward(&token_tensor, &audio_features, tokens.len() == prompt_len)
                .map_err(|e| TranscriptionError::TranscriptionFailed(format!("decoder: {}", e)))?;

            let logits = model
                .decoder
                .final_linear(
                    &decoder_output
                        .squeeze(0)
                        .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?,
                )
                .map_err(|e| TranscriptionError::TranscriptionFailed(format!("linear: {}", e)))?;

            let seq_len = logits
                .dim(0)
                .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?;
            let last_logits = logits
                .get(seq_len - 1)
                .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?;

            let next_token = last_logits
                .argmax(0)
                .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?
                .to_scalar::<u32>()
                .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?;

            if next_token == eot_token {
                break;
            }

            tokens.push(next_token);

            if let Some(piece) = self.tokenizer.id_to_token(next_token) {
                let piece = piece.replace('Ġ', " ").replace('▁', " ");
                decoded_text.push_str(&piece);
            }
        }

        model.reset_kv_cache();

        Ok(decoded_text.trim().to_string())
    }
}

#[async_trait]
impl TranscriptionEngine for CandleWhisperEngine {
    async fn transcribe(&self, path: &Path) -> Result<Transcript, TranscriptionError> {
        let pcm = decode_audio_to_pcm(path)?;

        let chunk_samples = m::N_SAMPLES;
        let mut mel_tensors = Vec::new();

        for chunk in pcm.chunks(chunk_samples) {
            let samples = if chunk.len() < chunk_samples {
                let mut padded = chunk.to_vec();
                padded.resize(chunk_samples, 0.0);
                padded
            } else {
                chunk.to_vec()
            };

            let mel_data = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
            let n_mel = self.config.num_mel_bins;
            let n_frames = mel_data.len() / n_mel;

            let mel_tensor = Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
                .map_err(|e| {
                    TranscriptionError::TranscriptionFailed(format!("mel tensor: {}", e))
                })?;

            mel_tensors.push(mel_tensor);
        }

        let mut model = self.model.lock().await;

        let detected_language = match mel_tensors.first() {
            Some(mel) if !self.language_tokens.is_empty() => self.detect_language(&mut model, mel)?,
            _ => "en",
        };
        let language_token = self
            .language_tokens
            .iter()
            .find(|(_, code)| *code == detected_language)
            .map(|(id, _)| *id);

        let mut segments: Vec<String> = Vec::new();

        for (i, mel_tensor) in mel_tensors.iter().enumerate() {
            tracing::debug!(segment = i, "Transcribing audio segment");
            let text = self.decode_segment(&mut model, mel_tensor, language_token)?;
            if !text.is_empty() {
                segments.push(text);
            }
        }

        let transcript = Transcript::new(segments.join(" "), detected_language);

        tracing::info!(
            segments = segments.len(),
            chars = transcript.text.len(),
            language = %transcript.language,
            "Audio transcription completed"
        );

        Ok(transcript)
    }
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, TranscriptionError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(TranscriptionError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    let filters: Vec<f32> = bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(filters)
}
