use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,

    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,

    pub google: OAuthProviderConfig,
    pub github: OAuthProviderConfig,
    pub linkedin: OAuthProviderConfig,
}

#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl OAuthProviderConfig {
    fn from_env(prefix: &str) -> Self {
        Self {
            client_id: env::var(format!("{prefix}_CLIENT_ID")).unwrap_or_default(),
            client_secret: env::var(format!("{prefix}_CLIENT_SECRET")).unwrap_or_default(),
            redirect_uri: env::var(format!("{prefix}_REDIRECT_URI")).unwrap_or_default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "7200".into())
                .parse()
                .expect("JWT_ACCESS_TTL_SECS must be a number"),

            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_else(|_| String::new()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".into()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),

            google: OAuthProviderConfig::from_env("GOOGLE"),
            github: OAuthProviderConfig::from_env("GITHUB"),
            linkedin: OAuthProviderConfig::from_env("LINKEDIN"),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
