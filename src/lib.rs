//! # utxo-ledger
//!
//! Consensus core of a simplified UTXO ledger: an epoch transaction
//! handler and a fork-aware block tree.
//!
//! ## Architecture
//!
//! - [`TxHandler`] validates candidate transactions against an
//!   unspent-output pool and selects a maximal mutually-consistent subset
//!   from an unordered batch, resolving intra-batch dependencies and
//!   double-spend conflicts before committing the result.
//! - [`BlockTree`] maintains the append-only tree of blocks rooted at
//!   genesis, keeps one pool snapshot per live branch, evicts blocks that
//!   fall [`CUT_OFF_AGE`] below the tallest leaf, and answers canonical
//!   tip queries.
//! - [`TransactionPool`] is the pending set blocks draw from; admitted
//!   blocks drain their transactions out of it.
//!
//! The core is single-writer and fully synchronous. It takes no locks and
//! never blocks; callers needing concurrency wrap it themselves. All
//! rejections are value-level (`false` or omission from an accepted set);
//! the `try_`/`check_` entry points report the reason.
//!
//! ## Usage
//!
//! ```rust
//! use secp256k1::{PublicKey, Secp256k1, SecretKey};
//! use utxo_ledger::{Block, BlockTree};
//!
//! let secp = Secp256k1::new();
//! let founder = PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[1u8; 32]).unwrap());
//! let miner = PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[2u8; 32]).unwrap());
//!
//! let genesis = Block::genesis(25, founder);
//! let mut tree = BlockTree::new(genesis.clone());
//!
//! let next = Block::new(Some(genesis.hash()), 25, miner, Vec::new());
//! assert!(tree.add_block(&next));
//! assert_eq!(tree.max_height(), 2);
//! assert_eq!(tree.max_height_block().hash(), next.hash());
//! ```

pub mod constants;
pub mod crypto;
pub mod error;
pub mod handler;
pub mod mempool;
pub mod tree;
pub mod types;
pub mod utxo;

pub use constants::{CUT_OFF_AGE, GENESIS_HEIGHT};
pub use error::{BlockError, TxError};
pub use handler::TxHandler;
pub use mempool::TransactionPool;
pub use tree::BlockTree;
pub use types::{Address, Block, Hash, Transaction, TxInput, TxOutput, Value};
pub use utxo::{UtxoPool, UtxoRef};
