use anyhow::Result;

const DEFAULT_ADMIN_TOKEN: &str = "frank";
const DEFAULT_ORIGINS: &str = "http://localhost:5173";

/// Runtime settings read from the environment at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub admin_token: String,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let admin_token =
            std::env::var("ADMIN_TOKEN").unwrap_or_else(|_| DEFAULT_ADMIN_TOKEN.into());
        let cors_allowed_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.into()),
        );
        Ok(Self {
            admin_token,
            cors_allowed_origins,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_list_is_trimmed_and_filtered() {
        let origins = parse_origins(" http://a.test ,, http://b.test");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
        assert!(parse_origins("  ,").is_empty());
    }
}
