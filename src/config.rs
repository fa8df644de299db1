use std::env;

use anyhow::{anyhow, Result};

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_KEY";

/// Remote-datastore settings. Credentials come from the environment so they
/// never live in the binary or the repository.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let supabase_url = env::var(SUPABASE_URL_ENV)
            .map_err(|_| anyhow!("{} environment variable required", SUPABASE_URL_ENV))?;
        let supabase_key = env::var(SUPABASE_KEY_ENV)
            .map_err(|_| anyhow!("{} environment variable required", SUPABASE_KEY_ENV))?;

        Ok(Self {
            supabase_url,
            supabase_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_reads_both_variables() {
        env::set_var(SUPABASE_URL_ENV, "https://example.supabase.co");
        env::set_var(SUPABASE_KEY_ENV, "anon-key");

        let config = Config::from_env().unwrap();
        assert_eq!(config.supabase_url, "https://example.supabase.co");
        assert_eq!(config.supabase_key, "anon-key");

        env::remove_var(SUPABASE_URL_ENV);
        env::remove_var(SUPABASE_KEY_ENV);
    }
}
