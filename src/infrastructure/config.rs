use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::for_profile(None)
    }

    /// Like [`Config::from_env`], with `profile` taking precedence over `PROFILE`
    pub fn for_profile(profile: Option<String>) -> Self {
        let profile = profile
            .or_else(|| env::var("PROFILE").ok())
            .unwrap_or_else(|| "default".to_string());

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://biblioteca.db?mode=rwc".to_string()
            } else {
                format!("sqlite://biblioteca_{}.db?mode=rwc", profile)
            }
        });

        Self {
            database_url,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            profile,
            seed_demo: env::var("SEED_DEMO").is_ok(),
        }
    }
}
