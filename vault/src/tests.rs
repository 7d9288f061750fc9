//! Derivation property tests
//!
//! Covers the guarantees callers rely on:
//! - Determinism: the same signature always yields the same keys
//! - Independence: spend and view keys share nothing observable
//! - Domain separation: other tags and other wallets yield other keys
//! - Verification: signatures from a foreign wallet are rejected

#[cfg(test)]
mod derivation_tests {
    use async_trait::async_trait;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::{Keypair, Signer};

    use crate::crypto::{
        derive_key_pair, derive_labeled_seed, derive_master_seed, derive_viewing_keys,
        generate_viewing_keys, hash_with_label, verify_wallet_signature, KeyRole,
    };
    use crate::domain::DomainMessage;
    use crate::error::VaultError;
    use crate::signer::{KeypairSigner, MessageSigner, SigningError};

    /// Signs with one keypair while claiming another's public key
    struct ImpostorSigner {
        claimed: Pubkey,
        actual: Keypair,
    }

    #[async_trait]
    impl MessageSigner for ImpostorSigner {
        fn pubkey(&self) -> Pubkey {
            self.claimed
        }

        async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
            Ok(self.actual.sign_message(message).as_ref().to_vec())
        }
    }

    // ==================== Determinism ====================

    #[test]
    fn test_same_signature_same_keys() {
        let domain = DomainMessage::current();
        let signature = [42u8; 64];

        let first = derive_viewing_keys(&signature, &domain).unwrap();
        let second = derive_viewing_keys(&signature, &domain).unwrap();

        assert_eq!(first.public_keys(), second.public_keys());
        assert_eq!(first.spend().export_secret(), second.spend().export_secret());
        assert_eq!(first.view().export_secret(), second.view().export_secret());
    }

    #[tokio::test]
    async fn test_wallet_reproduces_keys_across_sessions() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();
        let domain = DomainMessage::current();

        let first = generate_viewing_keys(Some(&KeypairSigner::new(keypair)), &domain, true)
            .await
            .unwrap();
        let restored = KeypairSigner::new(Keypair::from_bytes(&bytes).unwrap());
        let second = generate_viewing_keys(Some(&restored), &domain, true).await.unwrap();

        assert_eq!(first, second);
    }

    // ==================== Independence ====================

    #[test]
    fn test_spend_and_view_are_independent() {
        let keys = derive_viewing_keys(&[9u8; 64], &DomainMessage::current()).unwrap();

        assert_ne!(keys.spend_pubkey(), keys.view_pubkey());
        assert_ne!(keys.spend().export_secret(), keys.view().export_secret());
    }

    #[test]
    fn test_swapping_labels_swaps_keys() {
        let master = derive_master_seed(&[11u8; 64], DomainMessage::current().as_bytes()).unwrap();

        let spend = derive_key_pair(&derive_labeled_seed(&master, KeyRole::Spend)).unwrap();
        let view = derive_key_pair(&derive_labeled_seed(&master, KeyRole::View)).unwrap();

        // Labels alone separate the two roles
        let as_spend = derive_key_pair(&hash_with_label(&master, b"spend")).unwrap();
        let as_view = derive_key_pair(&hash_with_label(&master, b"view")).unwrap();
        assert_eq!(spend.public_key(), as_spend.public_key());
        assert_eq!(view.public_key(), as_view.public_key());

        let unlabeled = derive_key_pair(&hash_with_label(&master, b"")).unwrap();
        assert_ne!(unlabeled.public_key(), spend.public_key());
        assert_ne!(unlabeled.public_key(), view.public_key());
    }

    #[test]
    fn test_changing_spend_label_leaves_view_untouched() {
        let master = derive_master_seed(&[17u8; 64], DomainMessage::current().as_bytes()).unwrap();
        let spend = derive_key_pair(&hash_with_label(&master, b"spend")).unwrap();
        let view = derive_key_pair(&hash_with_label(&master, b"view")).unwrap();

        let spend2 = derive_key_pair(&hash_with_label(&master, b"spend2")).unwrap();
        let view_after = derive_key_pair(&derive_labeled_seed(&master, KeyRole::View)).unwrap();

        assert_ne!(spend2.public_key(), spend.public_key());
        assert_ne!(spend2.public_key(), view.public_key());
        assert_eq!(view_after.public_key(), view.public_key());
        assert_eq!(view_after.export_secret(), view.export_secret());

        // Swapped labels land on the other role's key
        let swapped_spend = derive_key_pair(&hash_with_label(&master, KeyRole::View.label())).unwrap();
        let swapped_view = derive_key_pair(&hash_with_label(&master, KeyRole::Spend.label())).unwrap();
        assert_eq!(swapped_spend.public_key(), view.public_key());
        assert_eq!(swapped_view.public_key(), spend.public_key());
        assert_ne!(swapped_spend.public_key(), spend.public_key());
    }

    #[test]
    fn test_master_seed_is_not_a_key() {
        let domain = DomainMessage::current();
        let signature = [13u8; 64];
        let master = derive_master_seed(&signature, domain.as_bytes()).unwrap();
        let direct = derive_key_pair(&master).unwrap();
        let keys = derive_viewing_keys(&signature, &domain).unwrap();

        assert_ne!(direct.public_key(), keys.spend_pubkey());
        assert_ne!(direct.public_key(), keys.view_pubkey());
    }

    // ==================== Domain Separation ====================

    #[test]
    fn test_domain_tag_changes_keys() {
        let signature = [21u8; 64];
        let v1 = derive_viewing_keys(&signature, &DomainMessage::for_tag("WaveSwap:ViewingKeys:v1"))
            .unwrap();
        let v2 = derive_viewing_keys(&signature, &DomainMessage::for_tag("WaveSwap:ViewingKeys:v2"))
            .unwrap();

        assert_ne!(v1.spend_pubkey(), v2.spend_pubkey());
        assert_ne!(v1.view_pubkey(), v2.view_pubkey());
    }

    #[test]
    fn test_single_bit_flip_changes_keys() {
        let domain = DomainMessage::current();
        let signature = [0x55u8; 64];
        let mut flipped = signature;
        flipped[63] ^= 0x01;

        let a = derive_viewing_keys(&signature, &domain).unwrap();
        let b = derive_viewing_keys(&flipped, &domain).unwrap();
        assert_ne!(a.spend_pubkey(), b.spend_pubkey());
        assert_ne!(a.view_pubkey(), b.view_pubkey());
    }

    #[tokio::test]
    async fn test_different_wallets_different_keys() {
        let domain = DomainMessage::current();
        let alice = KeypairSigner::new(Keypair::new());
        let bob = KeypairSigner::new(Keypair::new());

        let alice_keys = generate_viewing_keys(Some(&alice), &domain, true).await.unwrap();
        let bob_keys = generate_viewing_keys(Some(&bob), &domain, true).await.unwrap();

        assert_ne!(alice_keys.spend_pubkey(), bob_keys.spend_pubkey());
        assert_ne!(alice_keys.view_pubkey(), bob_keys.view_pubkey());
    }

    // ==================== Signature Verification ====================

    #[test]
    fn test_verify_accepts_own_signature() {
        let keypair = Keypair::new();
        let message = DomainMessage::current();
        let signature = keypair.sign_message(message.as_bytes());

        verify_wallet_signature(&keypair.pubkey(), message.as_bytes(), signature.as_ref()).unwrap();
    }

    #[test]
    fn test_verify_rejects_other_message() {
        let keypair = Keypair::new();
        let signature = keypair.sign_message(DomainMessage::current().as_bytes());
        let other = DomainMessage::for_tag("WaveSwap:ViewingKeys:v2");

        assert_eq!(
            verify_wallet_signature(&keypair.pubkey(), other.as_bytes(), signature.as_ref()),
            Err(VaultError::SignatureMismatch)
        );
    }

    #[tokio::test]
    async fn test_impostor_signature_rejected() {
        let signer = ImpostorSigner {
            claimed: Keypair::new().pubkey(),
            actual: Keypair::new(),
        };

        let result = generate_viewing_keys(Some(&signer), &DomainMessage::current(), true).await;
        assert_eq!(result.unwrap_err(), VaultError::SignatureMismatch);
    }

    #[tokio::test]
    async fn test_verification_can_be_disabled() {
        let signer = ImpostorSigner {
            claimed: Keypair::new().pubkey(),
            actual: Keypair::new(),
        };

        let result = generate_viewing_keys(Some(&signer), &DomainMessage::current(), false).await;
        assert!(result.is_ok());
    }

    // ==================== Error Handling ====================

    #[tokio::test]
    async fn test_missing_signer() {
        let result = generate_viewing_keys(None, &DomainMessage::current(), true).await;
        assert!(matches!(result, Err(VaultError::SignerUnavailable(_))));
    }

    #[test]
    fn test_signature_length_errors() {
        let domain = DomainMessage::current();
        for len in [0usize, 32, 63, 65, 128] {
            let signature = vec![1u8; len];
            assert_eq!(
                derive_viewing_keys(&signature, &domain).unwrap_err(),
                VaultError::InvalidSignatureLength { expected: 64, actual: len }
            );
        }
    }

    #[test]
    fn test_verify_length_checked_first() {
        let keypair = Keypair::new();
        assert_eq!(
            verify_wallet_signature(&keypair.pubkey(), b"msg", &[0u8; 10]),
            Err(VaultError::InvalidSignatureLength { expected: 64, actual: 10 })
        );
    }
}
