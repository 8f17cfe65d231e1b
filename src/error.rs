//! Rejection reasons for transactions and blocks.
//!
//! Every rejection surfaces to callers as a value: `false` from a validity
//! check, omission from an accepted set. These types carry the reason so it
//! can be logged or inspected through the `Result`-returning entry points.

use thiserror::Error;

use crate::types::Value;

/// Why a transaction failed validation against an unspent-output pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("input {index} claims an output missing from the pool")]
    MissingInput { index: usize },

    #[error("input {index} carries an invalid signature")]
    InvalidSignature { index: usize },

    #[error("input {index} claims an output already claimed by this transaction")]
    DuplicateClaim { index: usize },

    #[error("output {index} has negative value {value}")]
    NegativeOutput { index: usize, value: Value },

    #[error("outputs total {output_total} exceeds inputs total {input_total}")]
    ValueShortfall { input_total: Value, output_total: Value },
}

/// Why a block was refused admission to the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("a second genesis block cannot be admitted")]
    SecondGenesis,

    #[error("block is already present in the tree")]
    Duplicate,

    #[error("parent block is unknown or has been pruned")]
    UnknownParent,

    #[error("block contains transactions that are not simultaneously valid")]
    RejectedTransactions,
}
