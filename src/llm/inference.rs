//! Offline summaries with a Llama-family chat model on Candle

use crate::config::Config;
use crate::error::{RankerError, Result, SummaryError};
use crate::llm::model_manager::LlmModelManager;
use crate::llm::prompts::{render_chat_prompt, PromptParams, SummaryKind, ASSISTANT_MARKER};
use crate::llm::Summarizer;
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::llama;
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokenizers::Tokenizer;

/// Get the best available device for inference (GPU if available, CPU fallback)
pub fn get_best_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA GPU for local inference");
            return device;
        }
    }

    if cfg!(target_os = "macos") {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU for local inference");
                return device;
            }
            Err(e) => warn!("Metal GPU initialization failed: {}", e),
        }
    }

    info!("No GPU available, using CPU for local inference");
    Device::Cpu
}

/// Honour `RESUME_RANKER_DEVICE` (cpu, cuda, metal) before auto-detecting.
pub fn get_device_with_override() -> Result<Device> {
    if let Ok(preference) = std::env::var("RESUME_RANKER_DEVICE") {
        match preference.to_lowercase().as_str() {
            "cpu" => return Ok(Device::Cpu),
            "cuda" => {
                return Device::new_cuda(0)
                    .map_err(|e| RankerError::ModelError(format!("Failed to initialize CUDA: {}", e)))
            }
            "metal" => {
                return Device::new_metal(0)
                    .map_err(|e| RankerError::ModelError(format!("Failed to initialize Metal: {}", e)))
            }
            other => warn!("Unknown device '{}', falling back to auto-detection", other),
        }
    }
    Ok(get_best_device())
}

/// A loaded chat model. Each generation gets its own KV cache, so one engine
/// can serve concurrent requests.
pub struct LocalEngine {
    model: llama::Llama,
    config: llama::Config,
    tokenizer: Tokenizer,
    device: Device,
    eos_token: Option<u32>,
}

impl LocalEngine {
    pub fn load(model_path: &Path) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading chat model from: {}", model_path.display());
        let device = get_device_with_override()?;

        let tokenizer = Tokenizer::from_file(model_path.join("tokenizer.json"))
            .map_err(|e| RankerError::ModelLoading(format!("Failed to load tokenizer: {}", e)))?;

        let config_content = std::fs::read_to_string(model_path.join("config.json"))?;
        let llama_config: llama::LlamaConfig = serde_json::from_str(&config_content)?;
        let config = llama_config.into_config(false);

        let weights = model_path.join("model.safetensors");
        // SAFETY: the weights file is not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)? };
        let model = llama::Llama::load(vb, &config)?;

        let eos_token = tokenizer.token_to_id("</s>");
        info!("Chat model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            config,
            tokenizer,
            device,
            eos_token,
        })
    }

    /// Greedy decoding of at most `max_new_tokens` tokens after `prompt`.
    pub fn generate(&self, prompt: &str, max_new_tokens: usize) -> std::result::Result<String, SummaryError> {
        let start_time = Instant::now();
        let mut cache = llama::Cache::new(true, DType::F32, &self.config, &self.device)?;

        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| SummaryError::Inference(format!("Failed to tokenize input: {}", e)))?;
        let prompt_tokens = encoding.get_ids().to_vec();
        if prompt_tokens.is_empty() {
            return Err(SummaryError::Inference("prompt produced no tokens".to_string()));
        }

        let mut generated = Vec::with_capacity(max_new_tokens);
        let mut input = Tensor::new(prompt_tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        let mut position = 0;

        for _ in 0..max_new_tokens {
            let seq_len = input.dim(1)?;
            let logits = self.model.forward(&input, position, &mut cache)?;
            position += seq_len;

            let next_token = logits.squeeze(0)?.argmax(D::Minus1)?.to_scalar::<u32>()?;
            if Some(next_token) == self.eos_token {
                break;
            }
            generated.push(next_token);
            input = Tensor::new(&[next_token], &self.device)?.unsqueeze(0)?;
        }

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| SummaryError::Inference(format!("Failed to decode output: {}", e)))?;

        debug!(
            "Generated {} tokens from a {}-token prompt in {:.2?}",
            generated.len(),
            prompt_tokens.len(),
            start_time.elapsed()
        );
        Ok(text)
    }
}

pub struct LocalSummarizer {
    engine: Arc<LocalEngine>,
    model_id: String,
    max_input_chars: usize,
    max_new_tokens: usize,
}

impl LocalSummarizer {
    pub fn new(engine: Arc<LocalEngine>, model_id: &str, config: &Config) -> Self {
        Self {
            engine,
            model_id: model_id.to_string(),
            max_input_chars: config.summary.max_input_chars,
            max_new_tokens: config.summary.max_new_tokens,
        }
    }

    /// Download the configured chat model if needed and load it.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let model_id = config.models.llm_model.clone();
        let mut manager = LlmModelManager::new(config.models_dir()).await?;
        let model_path = manager.ensure_model_available(&model_id).await?;

        let engine = tokio::task::spawn_blocking(move || LocalEngine::load(&model_path))
            .await
            .map_err(|e| RankerError::ModelLoading(format!("Model loading task failed: {}", e)))??;

        Ok(Self::new(Arc::new(engine), &model_id, config))
    }
}

#[async_trait]
impl Summarizer for LocalSummarizer {
    async fn summarize(&self, kind: SummaryKind, params: &PromptParams) -> std::result::Result<String, SummaryError> {
        let prompt = render_chat_prompt(kind, &params.clone().truncated(self.max_input_chars));
        let engine = Arc::clone(&self.engine);
        let max_new_tokens = self.max_new_tokens;

        let output = tokio::task::spawn_blocking(move || engine.generate(&prompt, max_new_tokens))
            .await
            .map_err(|e| SummaryError::Inference(format!("generation task failed: {}", e)))??;

        let summary = finish_summary(&output);
        if summary.is_empty() {
            return Err(SummaryError::EmptyResponse);
        }
        Ok(summary)
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}

/// Keep only the assistant's answer and make sure it ends with a full stop.
pub fn finish_summary(output: &str) -> String {
    let answer = match output.rfind(ASSISTANT_MARKER) {
        Some(idx) => &output[idx + ASSISTANT_MARKER.len()..],
        None => output,
    };
    let mut summary = answer.trim().to_string();
    if !summary.is_empty() && !summary.ends_with('.') {
        summary.push('.');
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_summary_appends_full_stop() {
        assert_eq!(finish_summary("  Strong SQL background "), "Strong SQL background.");
        assert_eq!(finish_summary("Good fit."), "Good fit.");
        assert_eq!(finish_summary("   "), "");
    }

    #[test]
    fn test_finish_summary_drops_echoed_prompt() {
        let output = "<|user|>\nResume: ...\n</s>\n<|assistant|>\nThe candidate fits well";
        assert_eq!(finish_summary(output), "The candidate fits well.");
    }

    #[test]
    fn test_cpu_override() {
        std::env::set_var("RESUME_RANKER_DEVICE", "cpu");
        assert!(matches!(get_device_with_override().unwrap(), Device::Cpu));
        std::env::remove_var("RESUME_RANKER_DEVICE");
    }
}
