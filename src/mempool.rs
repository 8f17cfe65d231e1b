//! Pending-transaction pool.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Hash, Transaction};

/// Pass-through set of transactions waiting for inclusion in a block.
///
/// The pool performs no validation; admission control happens when a block
/// is validated against its branch. Transactions orphaned by a fork switch
/// stay out until the caller resubmits them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPool {
    txs: HashMap<Hash, Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.txs.insert(tx.hash(), tx);
    }

    pub fn remove_transaction(&mut self, hash: &Hash) -> Option<Transaction> {
        self.txs.remove(hash)
    }

    pub fn transaction(&self, hash: &Hash) -> Option<&Transaction> {
        self.txs.get(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.txs.contains_key(hash)
    }

    /// Pending transactions in arbitrary order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.txs.values()
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;
    use secp256k1::{Secp256k1, SecretKey};

    fn pending(value: i64) -> Transaction {
        let secp = Secp256k1::new();
        let key = SecretKey::from_slice(&[8; 32]).unwrap();
        Transaction::coinbase(value, Address::from_secret_key(&secp, &key))
    }

    #[test]
    fn test_add_then_lookup() {
        let mut pool = TransactionPool::new();
        let tx = pending(10);
        let hash = tx.hash();
        pool.add_transaction(tx);

        assert!(pool.contains(&hash));
        assert_eq!(pool.transaction(&hash).unwrap().hash(), hash);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_is_terminal() {
        let mut pool = TransactionPool::new();
        let tx = pending(10);
        let hash = tx.hash();
        pool.add_transaction(tx);

        assert!(pool.remove_transaction(&hash).is_some());
        assert!(pool.remove_transaction(&hash).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_duplicate_add_keeps_one() {
        let mut pool = TransactionPool::new();
        pool.add_transaction(pending(10));
        pool.add_transaction(pending(10));

        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_iteration_sees_all_pending() {
        let mut pool = TransactionPool::new();
        pool.add_transaction(pending(10));
        pool.add_transaction(pending(20));

        let values: Vec<i64> = pool
            .transactions()
            .map(|tx| tx.outputs()[0].value)
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values.contains(&10) && values.contains(&20));
    }
}
