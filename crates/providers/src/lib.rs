//! Chat-completion provider implementations for Aula.
//!
//! All providers implement the `aula_core::Provider` trait. Aula talks to a
//! single OpenAI-compatible endpoint (OpenAI, DeepSeek, OpenRouter, Ollama,
//! vLLM, ...), configured through `aula_config::ProviderSettings`.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
