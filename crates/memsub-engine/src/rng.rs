use rand::RngCore;

pub trait TokenRng: Send + Sync {
    /// A fresh random 128-bit bearer token, hex-encoded.
    fn random_token(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTokenRng;

impl TokenRng for SystemTokenRng {
    fn random_token(&self) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

pub fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
