//! Service configuration from environment variables

use std::env;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Directory attachment uploads are written to
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SERVER_ADDR`: bind address (default: "0.0.0.0:5000")
    /// - `UPLOAD_DIR`: upload directory (default: "uploads")
    pub fn from_env() -> Self {
        let bind_address =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        Self {
            bind_address,
            upload_dir,
        }
    }
}

/// Chatbot upstream configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,
    /// API key; without one the upstream call is skipped entirely
    pub api_key: Option<String>,
    /// Model name sent with each request
    pub model: String,
}

impl ChatConfig {
    /// Create a new ChatConfig from environment variables
    ///
    /// # Environment Variables
    /// - `CHAT_API_URL`: chat completions endpoint
    /// - `GROQ_API_KEY`: upstream API key
    /// - `CHAT_MODEL`: model name
    pub fn from_env() -> Self {
        let endpoint = env::var("CHAT_API_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1/chat/completions".to_string());
        let api_key = env::var("GROQ_API_KEY").ok().filter(|key| !key.is_empty());
        let model =
            env::var("CHAT_MODEL").unwrap_or_else(|_| "llama-3.1-8b-instant".to_string());

        Self {
            endpoint,
            api_key,
            model,
        }
    }
}
