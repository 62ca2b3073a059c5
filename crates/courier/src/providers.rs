pub mod base;
pub mod configs;
pub mod errors;
pub mod factory;
pub mod huggingface;
pub mod ollama;
pub mod openai;
pub mod utils;

#[cfg(test)]
pub mod mock;
