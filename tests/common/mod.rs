//! Shared builders for the integration suites: deterministic wallets,
//! signing, and transfer construction.

#![allow(dead_code)]

use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use utxo_ledger::{Transaction, TxInput, TxOutput, Value};

/// A deterministic signing identity.
pub struct Wallet {
    pub key: SecretKey,
    pub address: PublicKey,
}

/// Wallet derived from a fixed one-byte seed (1..=254).
pub fn wallet(seed: u8) -> Wallet {
    let secp = Secp256k1::new();
    let key = SecretKey::from_slice(&[seed; 32]).expect("seed yields a valid key");
    let address = PublicKey::from_secret_key(&secp, &key);
    Wallet { key, address }
}

/// Sign input `index` of `tx` with `key`.
pub fn sign_input(tx: &mut Transaction, index: usize, key: &SecretKey) {
    let secp = Secp256k1::new();
    let digest: [u8; 32] = Sha256::digest(tx.raw_data_to_sign(index)).into();
    let message = Message::from_digest_slice(&digest).expect("digest is 32 bytes");
    let signature = secp.sign_ecdsa(&message, key).serialize_der().to_vec();
    tx.sign_input(index, signature);
}

/// A transaction spending `sources` into `outputs`, with every input
/// signed by the matching wallet. Each source is (producing transaction,
/// output index, owning wallet).
pub fn transfer(
    sources: &[(&Transaction, u32, &Wallet)],
    outputs: &[(Value, &Wallet)],
) -> Transaction {
    let inputs = sources
        .iter()
        .map(|(tx, index, _)| TxInput::new(tx.hash(), *index))
        .collect();
    let outs = outputs
        .iter()
        .map(|(value, to)| TxOutput {
            value: *value,
            address: to.address,
        })
        .collect();
    let mut tx = Transaction::new(inputs, outs);
    for (index, (_, _, from)) in sources.iter().enumerate() {
        sign_input(&mut tx, index, &from.key);
    }
    tx
}
