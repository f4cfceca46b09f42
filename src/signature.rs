use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

// Checks an `X-Hub-Signature-256: sha256=<hex>` value against the raw body
pub fn verify_signature(body: &[u8], header_value: &str, app_secret: &str) -> bool {
    let Some(hex_digest) = header_value.trim().strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    mac_over(body, app_secret).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

// Header value the platform would send for `body`
pub fn sign(body: &[u8], app_secret: &str) -> Option<String> {
    let mac = mac_over(body, app_secret)?;
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

fn mac_over(body: &[u8], app_secret: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes()).ok()?;
    mac.update(body);
    Some(mac)
}
