use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub refresh_token_hash_secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()?,
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,
            refresh_token_hash_secret: required("REFRESH_TOKEN_HASH_SECRET")?,
            access_token_ttl_seconds: parse_lifetime(&required("ACCESS_TOKEN_EXPIRES_IN")?)?,
            refresh_token_ttl_seconds: parse_lifetime(&required("REFRESH_TOKEN_EXPIRES_IN")?)?,
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing required env var: {}", key))
}

/// Parses a token lifetime: plain seconds (`900`) or a number with a
/// `s`, `m`, `h` or `d` suffix (`15m`, `1d`).
pub fn parse_lifetime(raw: &str) -> anyhow::Result<u64> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], c),
        _ => (raw, 's'),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid lifetime: {raw}"))?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => anyhow::bail!("Unknown lifetime unit in {raw}"),
    };
    if value == 0 {
        anyhow::bail!("Lifetime must be positive: {raw}");
    }
    let seconds = value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Lifetime too large: {raw}"))?;
    // Claims carry `exp` as a signed timestamp.
    i64::try_from(seconds).map_err(|_| anyhow::anyhow!("Lifetime too large: {raw}"))?;
    Ok(seconds)
}
