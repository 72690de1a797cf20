/// Default provider endpoint (OpenAI-compatible)
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Overall request timeout; long enough for slow streamed tool calls
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3_000_000;

/// Configuration for LlmClient loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct LlmClientConfig {
    pub base_url: String, // e.g., https://api.deepseek.com
    pub api_key: Option<String>,
    pub model: String, // e.g., deepseek-chat
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_ms: u64,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: env_string("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: env_string("OPENAI_API_KEY"),
            model: env_string("OPENAI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: env_parsed("MODEL_MAX_TOKENS").unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: env_parsed("MODEL_TEMPERATURE").unwrap_or(DEFAULT_TEMPERATURE),
            request_timeout_ms: env_parsed("REQUEST_TIMEOUT_MS")
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl LlmClientConfig {
    /// Same as `Default`; reads the environment at call time
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse::<T>().ok())
}
