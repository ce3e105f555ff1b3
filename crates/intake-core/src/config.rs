use std::collections::HashMap;

use anyhow::Result;

/// Which hosted model to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Anthropic when an API key is present, otherwise none.
    Auto,
    Anthropic,
    Ollama,
    /// Rule-based analysis only.
    None,
}

impl BackendKind {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Self::Anthropic,
            "ollama" => Self::Ollama,
            "none" | "off" | "fallback" => Self::None,
            _ => Self::Auto,
        }
    }
}

/// Full application configuration.
/// Process environment wins over a `.env` file in the working directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub firm_name: String,

    // Language model
    pub llm_backend: BackendKind,
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub llm_timeout_s: u64,
    pub llm_max_tokens: u32,

    // Web
    pub web_bind: String,
    pub web_port: u16,

    /// Number of recent log lines kept for `/api/logs`.
    pub log_ring_size: usize,
}

/// Parse `KEY=value` lines, skipping blanks and `#` comments.
pub fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            let v = v.trim().trim_matches('"');
            map.insert(k.trim().to_string(), v.to_string());
        }
    }
    map
}

fn read_dotenv() -> HashMap<String, String> {
    match std::fs::read_to_string(".env") {
        Ok(contents) => parse_dotenv(&contents),
        Err(_) => HashMap::new(),
    }
}

struct Source<'a> {
    env: &'a dyn Fn(&str) -> Option<String>,
    dotenv: &'a HashMap<String, String>,
}

impl Source<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.env)(key).or_else(|| self.dotenv.get(key).cloned())
    }

    fn get_str(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn get_parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let dotenv = read_dotenv();
        Ok(Self::from_sources(&|key: &str| std::env::var(key).ok(), &dotenv))
    }

    /// Build from an explicit environment lookup and parsed `.env` map.
    pub fn from_sources(
        env: &dyn Fn(&str) -> Option<String>,
        dotenv: &HashMap<String, String>,
    ) -> Self {
        let src = Source { env, dotenv };
        Config {
            firm_name: src.get_str("FIRM_NAME", "the firm"),
            llm_backend: BackendKind::parse(&src.get_str("LLM_BACKEND", "auto")),
            anthropic_api_key: src.get_str("ANTHROPIC_API_KEY", ""),
            anthropic_base_url: src.get_str("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            model: src.get_str("MODEL", "claude-sonnet-4-6"),
            ollama_url: src.get_str("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: src.get_str("OLLAMA_MODEL", "llama3.1"),
            llm_timeout_s: src.get_parsed("LLM_TIMEOUT_S", 30),
            llm_max_tokens: src.get_parsed("LLM_MAX_TOKENS", 2048),
            web_bind: src.get_str("WEB_BIND", "127.0.0.1"),
            web_port: src.get_parsed("WEB_PORT", 3131),
            log_ring_size: src.get_parsed("LOG_RING_SIZE", 500),
        }
    }

    /// The backend that will actually be used once `Auto` is resolved.
    pub fn effective_backend(&self) -> BackendKind {
        match self.llm_backend {
            BackendKind::Auto if !self.anthropic_api_key.is_empty() => BackendKind::Anthropic,
            BackendKind::Auto => BackendKind::None,
            BackendKind::Anthropic if self.anthropic_api_key.is_empty() => BackendKind::None,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_any_source() {
        let c = Config::from_sources(&no_env, &HashMap::new());
        assert_eq!(c.web_port, 3131);
        assert_eq!(c.llm_timeout_s, 30);
        assert_eq!(c.llm_backend, BackendKind::Auto);
        assert_eq!(c.effective_backend(), BackendKind::None);
    }

    #[test]
    fn env_overrides_dotenv() {
        let dotenv = parse_dotenv("WEB_PORT=8080\nMODEL=from-file\n");
        let env = |k: &str| (k == "MODEL").then(|| "from-env".to_string());
        let c = Config::from_sources(&env, &dotenv);
        assert_eq!(c.web_port, 8080);
        assert_eq!(c.model, "from-env");
    }

    #[test]
    fn dotenv_skips_comments_and_strips_quotes() {
        let map = parse_dotenv("# comment\n\nANTHROPIC_API_KEY=\"sk-test\"\nBROKEN LINE\n");
        assert_eq!(map.get("ANTHROPIC_API_KEY").map(String::as_str), Some("sk-test"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn auto_backend_picks_anthropic_when_key_present() {
        let dotenv = parse_dotenv("ANTHROPIC_API_KEY=sk-test");
        let c = Config::from_sources(&no_env, &dotenv);
        assert_eq!(c.effective_backend(), BackendKind::Anthropic);
    }

    #[test]
    fn anthropic_without_key_degrades_to_none() {
        let dotenv = parse_dotenv("LLM_BACKEND=anthropic");
        let c = Config::from_sources(&no_env, &dotenv);
        assert_eq!(c.effective_backend(), BackendKind::None);

        let dotenv = parse_dotenv("LLM_BACKEND=ollama");
        let c = Config::from_sources(&no_env, &dotenv);
        assert_eq!(c.effective_backend(), BackendKind::Ollama);
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let dotenv = parse_dotenv("WEB_PORT=not-a-port\nLLM_TIMEOUT_S=-5");
        let c = Config::from_sources(&no_env, &dotenv);
        assert_eq!(c.web_port, 3131);
        assert_eq!(c.llm_timeout_s, 30);
    }
}
