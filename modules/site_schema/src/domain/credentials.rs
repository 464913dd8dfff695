//! Credential masking
//!
//! Secret columns `AuthToken` and `ApiToken` on `WhatsAppConfigs`, and
//! `SmtpPassword` and `ApiKey` on `EmailProviderSettings`, are paired with a
//! `...Mask` column that is safe to show in an admin UI. `WebhookSecret` is
//! stored without a mask. The mask is derived here so every writer stores
//! the same format.

const MASK: &str = "****";

/// Number of trailing characters left visible
const VISIBLE_SUFFIX: usize = 4;

/// Shortest secret whose suffix is revealed
const MIN_REVEAL_LEN: usize = 8;

/// Mask a secret for display.
///
/// Secrets longer than eight characters keep their last four; anything
/// shorter is fully hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= MIN_REVEAL_LEN {
        return MASK.to_string();
    }
    let suffix: String = chars[chars.len() - VISIBLE_SUFFIX..].iter().collect();
    format!("{}{}", MASK, suffix)
}

/// Secret plus its display mask, ready to be stored side by side
#[derive(Clone, PartialEq, Eq)]
pub struct MaskedSecret {
    pub value: String,
    pub mask: String,
}

impl MaskedSecret {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let mask = mask_secret(&value);
        Self { value, mask }
    }
}

impl std::fmt::Debug for MaskedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskedSecret").field("mask", &self.mask).finish()
    }
}
