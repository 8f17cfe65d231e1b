//! Unspent-output bookkeeping: references into past transactions and the
//! pool of outputs spendable on one branch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Hash, TxOutput};

/// Reference to a single unspent transaction output: the hash of the
/// producing transaction and the output's index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtxoRef {
    pub tx_hash: Hash,
    pub output_index: u32,
}

impl UtxoRef {
    pub fn new(tx_hash: Hash, output_index: u32) -> Self {
        Self {
            tx_hash,
            output_index,
        }
    }
}

/// The set of outputs spendable on one branch of the block tree.
///
/// Cloning is the fork point: each branch owns its copy and branches never
/// observe each other's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoPool {
    utxos: HashMap<UtxoRef, TxOutput>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, utxo: &UtxoRef) -> bool {
        self.utxos.contains_key(utxo)
    }

    /// The output behind `utxo`, if still unspent.
    pub fn output(&self, utxo: &UtxoRef) -> Option<&TxOutput> {
        self.utxos.get(utxo)
    }

    pub fn add(&mut self, utxo: UtxoRef, output: TxOutput) {
        self.utxos.insert(utxo, output);
    }

    pub fn remove(&mut self, utxo: &UtxoRef) -> Option<TxOutput> {
        self.utxos.remove(utxo)
    }

    /// Unspent outputs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&UtxoRef, &TxOutput)> {
        self.utxos.iter()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}
