//! Core ledger types: transactions, blocks and their content hashes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::utxo::UtxoRef;

/// 256-bit content hash.
pub type Hash = [u8; 32];

/// Monetary amount in base units.
pub type Value = i64;

/// Payee address: a secp256k1 public key.
pub type Address = secp256k1::PublicKey;

/// Transaction input: a claim on one unspent output, plus the signature
/// authorizing the spend.
///
/// The signature is opaque DER bytes and stays empty until
/// [`Transaction::sign_input`] attaches it; it never participates in the
/// transaction's content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_tx_hash: Hash,
    pub output_index: u32,
    pub signature: Vec<u8>,
}

impl TxInput {
    /// An unsigned input claiming output `output_index` of the transaction
    /// hashed as `prev_tx_hash`.
    pub fn new(prev_tx_hash: Hash, output_index: u32) -> Self {
        Self {
            prev_tx_hash,
            output_index,
            signature: Vec::new(),
        }
    }

    /// The unspent output this input claims.
    pub fn claimed_utxo(&self) -> UtxoRef {
        UtxoRef::new(self.prev_tx_hash, self.output_index)
    }
}

/// Transaction output: an amount payable to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Value,
    pub address: Address,
}

/// A transfer of value from claimed unspent outputs to new outputs.
///
/// The hash is content-addressed: it covers every input sans signature and
/// every output, so signing after construction does not change identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    hash: Hash,
}

impl Transaction {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let hash = content_hash(&inputs, &outputs);
        Self {
            inputs,
            outputs,
            hash,
        }
    }

    /// A coinbase: no inputs, exactly one output paying `value` to
    /// `address`. Its output becomes spendable only in descendants of the
    /// block that carries it.
    pub fn coinbase(value: Value, address: Address) -> Self {
        Self::new(Vec::new(), vec![TxOutput { value, address }])
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Canonical bytes an input signature commits to: every input sans
    /// signature, every output, and the signing input's position.
    pub fn raw_data_to_sign(&self, index: usize) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(index as u32).to_le_bytes());
        for input in &self.inputs {
            data.extend_from_slice(&input.prev_tx_hash);
            data.extend_from_slice(&input.output_index.to_le_bytes());
        }
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_le_bytes());
            data.extend_from_slice(&output.address.serialize());
        }
        data
    }

    /// Attach a signature to input `index`.
    ///
    /// Panics if `index` is out of range; signing is an author-side
    /// operation, not something reachable from untrusted input.
    pub fn sign_input(&mut self, index: usize, signature: Vec<u8>) {
        self.inputs[index].signature = signature;
    }
}

/// A block: parent link, coinbase, transaction list and content hash.
///
/// The coinbase is built internally from `(reward, miner)`, so the
/// no-inputs-exactly-one-output shape holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    prev_hash: Option<Hash>,
    coinbase: Transaction,
    transactions: Vec<Transaction>,
    hash: Hash,
}

impl Block {
    pub fn new(
        prev_hash: Option<Hash>,
        reward: Value,
        miner: Address,
        transactions: Vec<Transaction>,
    ) -> Self {
        let coinbase = Transaction::coinbase(reward, miner);
        let hash = block_hash(prev_hash, &coinbase, &transactions);
        Self {
            prev_hash,
            coinbase,
            transactions,
            hash,
        }
    }

    /// The root block: no parent, no transactions.
    pub fn genesis(reward: Value, miner: Address) -> Self {
        Self::new(None, reward, miner, Vec::new())
    }

    pub fn prev_hash(&self) -> Option<Hash> {
        self.prev_hash
    }

    pub fn coinbase(&self) -> &Transaction {
        &self.coinbase
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }
}

fn content_hash(inputs: &[TxInput], outputs: &[TxOutput]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input.prev_tx_hash);
        hasher.update(input.output_index.to_le_bytes());
    }
    for output in outputs {
        hasher.update(output.value.to_le_bytes());
        hasher.update(output.address.serialize());
    }
    hasher.finalize().into()
}

fn block_hash(prev_hash: Option<Hash>, coinbase: &Transaction, transactions: &[Transaction]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.unwrap_or([0u8; 32]));
    hasher.update(coinbase.hash());
    for tx in transactions {
        hasher.update(tx.hash());
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Secp256k1, SecretKey};

    fn address(seed: u8) -> Address {
        let secp = Secp256k1::new();
        let key = SecretKey::from_slice(&[seed; 32]).unwrap();
        Address::from_secret_key(&secp, &key)
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = Transaction::new(vec![TxInput::new([1; 32], 0)], vec![TxOutput {
            value: 10,
            address: address(1),
        }]);
        let b = Transaction::new(vec![TxInput::new([1; 32], 0)], vec![TxOutput {
            value: 10,
            address: address(1),
        }]);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_ignores_signatures() {
        let mut tx = Transaction::new(vec![TxInput::new([1; 32], 0)], vec![TxOutput {
            value: 10,
            address: address(1),
        }]);
        let before = tx.hash();
        tx.sign_input(0, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(tx.hash(), before);
    }

    #[test]
    fn test_hash_covers_outputs() {
        let a = Transaction::new(vec![], vec![TxOutput {
            value: 10,
            address: address(1),
        }]);
        let b = Transaction::new(vec![], vec![TxOutput {
            value: 11,
            address: address(1),
        }]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_raw_data_commits_to_input_position() {
        let tx = Transaction::new(
            vec![TxInput::new([1; 32], 0), TxInput::new([2; 32], 1)],
            vec![TxOutput {
                value: 10,
                address: address(1),
            }],
        );
        assert_ne!(tx.raw_data_to_sign(0), tx.raw_data_to_sign(1));
    }

    #[test]
    fn test_coinbase_shape() {
        let coinbase = Transaction::coinbase(25, address(2));
        assert!(coinbase.inputs().is_empty());
        assert_eq!(coinbase.outputs().len(), 1);
        assert_eq!(coinbase.outputs()[0].value, 25);
    }

    #[test]
    fn test_genesis_has_no_parent() {
        let genesis = Block::genesis(25, address(3));
        assert!(genesis.prev_hash().is_none());
        assert!(genesis.transactions().is_empty());
    }

    #[test]
    fn test_block_hash_covers_parent_link() {
        let miner = address(4);
        let a = Block::new(Some([1; 32]), 25, miner, Vec::new());
        let b = Block::new(Some([2; 32]), 25, miner, Vec::new());
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_claimed_utxo_matches_input_fields() {
        let input = TxInput::new([7; 32], 3);
        let utxo = input.claimed_utxo();
        assert_eq!(utxo.tx_hash, [7; 32]);
        assert_eq!(utxo.output_index, 3);
    }
}
