//! Viewing-key derivation test vectors
//!
//! Fixed inputs with known-good outputs for every step of the chain:
//! master seed, labeled seeds, reduced scalars, public keys and vault addresses.
//! Any change to the message bytes, labels, hash order or PDA seeds breaks these.

#[cfg(test)]
#[allow(clippy::op_ref)]
mod derivation_test_vectors {
    use std::str::FromStr;

    use curve25519_dalek::{constants::ED25519_BASEPOINT_POINT, scalar::Scalar};
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signer::{keypair::keypair_from_seed, Signer};

    use crate::crypto::{
        derive_key_pair, derive_labeled_seed, derive_master_seed, derive_viewing_keys,
        generate_viewing_keys, KeyRole,
    };
    use crate::domain::DomainMessage;
    use crate::registry::{derive_global_registry, derive_registry_address, VAULT_PROGRAM_ID};
    use crate::signer::{KeypairSigner, MessageSigner};

    const PROTO_TAG: &str = "Proto:ViewingKeys:v1";

    fn h(s: &str) -> [u8; 32] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    /// Signature bytes 0x00..0x3f
    fn counting_signature() -> [u8; 64] {
        let mut sig = [0u8; 64];
        for (i, byte) in sig.iter_mut().enumerate() {
            *byte = i as u8;
        }
        sig
    }

    /// Test Vector 1: master seed over a counting signature
    #[test]
    fn test_vector_1_master_seed() {
        let domain = DomainMessage::for_tag(PROTO_TAG);
        let master = derive_master_seed(&counting_signature(), domain.as_bytes()).unwrap();

        assert_eq!(
            *master.as_bytes(),
            h("33b132f621e72fe7ae0ad27d059393578fe6c1fb5edb1fd47eb4497661c0f1e8")
        );
    }

    /// Test Vector 2: labeled seeds
    #[test]
    fn test_vector_2_labeled_seeds() {
        let domain = DomainMessage::for_tag(PROTO_TAG);
        let master = derive_master_seed(&counting_signature(), domain.as_bytes()).unwrap();

        assert_eq!(
            *derive_labeled_seed(&master, KeyRole::Spend).as_bytes(),
            h("b926fcd650700d37bb66c16a491f3efcc55f86f25aab9ee1d56a2141b78b1121")
        );
        assert_eq!(
            *derive_labeled_seed(&master, KeyRole::View).as_bytes(),
            h("8bce26c0ec788483091099ad2819739e07216383b535dfc33edd664aae55609d")
        );
    }

    /// Test Vector 3: scalars are the labeled seeds reduced mod ℓ
    #[test]
    fn test_vector_3_reduced_scalars() {
        let keys = derive_viewing_keys(&counting_signature(), &DomainMessage::for_tag(PROTO_TAG))
            .unwrap();

        assert_eq!(
            keys.spend().export_secret(),
            h("df7e101d1caae8860e2dd2248c2b80d2c55f86f25aab9ee1d56a2141b78b1101")
        );
        assert_eq!(
            keys.view().export_secret(),
            h("365b827bfffcde6a808ce4f254509ce206216383b535dfc33edd664aae55600d")
        );
    }

    /// Test Vector 4: public keys, S = s·G in compressed Edwards form
    #[test]
    fn test_vector_4_public_keys() {
        let keys = derive_viewing_keys(&counting_signature(), &DomainMessage::for_tag(PROTO_TAG))
            .unwrap();

        assert_eq!(
            keys.spend_pubkey(),
            h("2c2aa9c673718cbaa9563a4c53725c91b3d1dd21f32f7e65559ea17231682f28")
        );
        assert_eq!(
            keys.view_pubkey(),
            h("7f3430d4f9a8ee87dbc1475aa0a1c4f47790fa5a8a860d011aa190ebf2af3eb9")
        );

        let g = ED25519_BASEPOINT_POINT;
        let spend = Scalar::from_bytes_mod_order(keys.spend().export_secret());
        assert_eq!((&spend * &g).compress().to_bytes(), keys.spend_pubkey());
    }

    /// Test Vector 5: a labeled seed fed directly to the keypair step
    #[test]
    fn test_vector_5_key_pair_from_seed() {
        let seed = crate::crypto::Seed::from_bytes(h(
            "b926fcd650700d37bb66c16a491f3efcc55f86f25aab9ee1d56a2141b78b1121",
        ));
        let pair = derive_key_pair(&seed).unwrap();
        assert_eq!(
            pair.public_key(),
            h("2c2aa9c673718cbaa9563a4c53725c91b3d1dd21f32f7e65559ea17231682f28")
        );
    }

    /// Test Vector 6: bumping the tag version rotates the master seed
    #[test]
    fn test_vector_6_version_bump() {
        let v2 = DomainMessage::for_tag("Proto:ViewingKeys:v2");
        let master = derive_master_seed(&counting_signature(), v2.as_bytes()).unwrap();
        assert_eq!(
            *master.as_bytes(),
            h("cdfa6437a2a7cf5dc2a6d917646e05d3016b47f6422845c6136b8347e90f6dbf")
        );
    }

    /// Test Vector 7: program id
    #[test]
    fn test_vector_7_program_id() {
        assert_eq!(
            VAULT_PROGRAM_ID.to_bytes(),
            h("03d9e3a6bab03eed97e90360e674f4b75871a39ce47a2d9538870223402d4dbb")
        );
    }

    /// Test Vector 8: full pipeline from a wallet seed of [7; 32]
    #[tokio::test]
    async fn test_vector_8_wallet_pipeline() {
        let signer = KeypairSigner::new(keypair_from_seed(&[7u8; 32]).unwrap());
        assert_eq!(
            signer.pubkey().to_string(),
            "GmaDrppBC7P5ARKV8g3djiwP89vz1jLK23V2GBjuAEGB"
        );

        let domain = DomainMessage::current();
        let signature = signer.sign_message(domain.as_bytes()).await.unwrap();
        assert_eq!(
            hex::encode(&signature),
            "6140f78794ab234cb0f6b28066a551a0d1d8cba7c8129fd1336488ae4c8631f3\
             f4fde4be13d13830671eb610845df6b51a8afbd8a7d15220ba3a013b890ef303"
        );

        let master = derive_master_seed(&signature, domain.as_bytes()).unwrap();
        assert_eq!(
            *master.as_bytes(),
            h("27fe089b5aea2656b14b9515f9767c0ef95c7ea8c7505e2aa29536ce45b09382")
        );

        let keys = generate_viewing_keys(Some(&signer), &domain, true).await.unwrap();
        assert_eq!(
            keys.spend_pubkey(),
            h("e179f0f10f7e994dbb8878f64ce3a798280e82415d1358adc9e043c304cc32df")
        );
        assert_eq!(
            keys.view_pubkey(),
            h("3d58222ac2fac30370b016e5809dcddb5d65f2ca3bc48d61b93a200d24c8149b")
        );
    }

    /// Test Vector 9: vault and registry addresses for the same wallet
    #[test]
    fn test_vector_9_vault_addresses() {
        let owner = keypair_from_seed(&[7u8; 32]).unwrap().pubkey();

        let (vault, bump) = derive_registry_address(&owner, &VAULT_PROGRAM_ID);
        assert_eq!(
            vault,
            Pubkey::from_str("CMp9NmMaWVhCyLJKM3VY1VudQQ8bUDF6aAvWAPtGFeW").unwrap()
        );
        assert_eq!(bump, 254);

        let (registry, registry_bump) = derive_global_registry(&VAULT_PROGRAM_ID);
        assert_eq!(
            registry,
            Pubkey::from_str("HkkFYdnQXSTT755k2waRw52Lh4ff2CVZ3Ax24XGmg9Ve").unwrap()
        );
        assert_eq!(registry_bump, 255);
    }
}
