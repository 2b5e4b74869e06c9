//! Endpoint settings for chat-completions compatible hosts.

use secrecy::SecretString;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GITHUB_MODELS_BASE_URL: &str = "https://models.github.ai/inference";

/// Where and as whom an [`super::OpenAiCompatibleProvider`] connects.
pub struct OpenAiCompatConfig {
    /// Reported by `LlmProvider::name` and in span attributes.
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    /// Used when a request leaves its model blank.
    pub model: String,
}

impl OpenAiCompatConfig {
    /// api.openai.com with an `OPENAI_API_KEY`-style key.
    pub fn openai(api_key: SecretString, model: &str) -> Self {
        Self::preset("openai", OPENAI_BASE_URL, api_key, model)
    }

    /// GitHub Models inference endpoint; the key is a GitHub token.
    pub fn github_models(api_key: SecretString, model: &str) -> Self {
        Self::preset("github_models", GITHUB_MODELS_BASE_URL, api_key, model)
    }

    fn preset(name: &str, base_url: &str, api_key: SecretString, model: &str) -> Self {
        Self {
            provider_name: name.to_string(),
            base_url: base_url.to_string(),
            api_key,
            model: model.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_point_at_hosted_endpoints() {
        let openai = OpenAiCompatConfig::openai(SecretString::from("sk".to_string()), "gpt-4o-mini");
        assert_eq!(openai.provider_name, "openai");
        assert_eq!(openai.base_url, OPENAI_BASE_URL);

        let github = OpenAiCompatConfig::github_models(
            SecretString::from("ghp".to_string()),
            "openai/gpt-4o-mini",
        );
        assert_eq!(github.provider_name, "github_models");
        assert_eq!(github.base_url, "https://models.github.ai/inference");
        assert_eq!(github.model, "openai/gpt-4o-mini");
    }
}
