use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed one-way digest for refresh tokens at rest.
///
/// HMAC-SHA256 over the raw token, hex encoded. The same token and key always
/// give the same digest, which is what lets a presented token be matched
/// against the stored session list by equality.
#[derive(Clone)]
pub struct TokenVault {
    mac: HmacSha256,
}

impl TokenVault {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| anyhow::anyhow!("invalid refresh hash secret"))?;
        Ok(Self { mac })
    }

    pub fn hash(&self, raw_token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(raw_token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
