use ethers::types::{Address, Signature};
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Wallet signature checks for personal-sign (EIP-191) messages.
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Recovers the address that signed `message`.
    pub fn recover_signer(message: &str, signature: &str) -> Result<Address> {
        if message.is_empty() || signature.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Message or signature cannot be empty".into(),
            ));
        }

        let signature = Signature::from_str(signature.trim())
            .map_err(|e| AppError::AuthError(format!("Verification failed: {}", e)))?;

        signature
            .recover(message)
            .map_err(|e| AppError::AuthError(format!("Verification failed: {}", e)))
    }

    /// Succeeds only when `message` was signed by `address`.
    pub fn verify_signature(address: &Address, message: &str, signature: &str) -> Result<()> {
        let recovered = Self::recover_signer(message, signature)?;
        if recovered != *address {
            tracing::debug!(
                "Signature recovered {:?}, expected {:?}",
                recovered,
                address
            );
            return Err(AppError::SignatureMismatch);
        }
        Ok(())
    }
}
