#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Postgres connection string. Only optional when serving from the in-memory store.
    pub database_url: Option<String>,
    /// HMAC secret used to sign bearer tokens.
    pub jwt_secret: String,
    /// Extra browser origin allowed by CORS, in addition to localhost.
    /// Set via LOANTRACKER_CORS_ORIGIN.
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    let jwt_secret = lookup("JWT_SECRET")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("JWT_SECRET is not set; refusing to start"))?;

    let port = match lookup("LOANTRACKER_PORT").or_else(|| lookup("PORT")) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid port: {}", raw))?,
        None => 3001,
    };

    Ok(Config {
        port,
        database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
        jwt_secret,
        cors_origin: lookup("LOANTRACKER_CORS_ORIGIN").filter(|s| !s.is_empty()),
    })
}
