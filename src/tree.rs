//! Fork-aware block tree: retained blocks, per-leaf unspent-output
//! snapshots and canonical tip selection.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::constants::{CUT_OFF_AGE, GENESIS_HEIGHT};
use crate::error::BlockError;
use crate::handler::TxHandler;
use crate::mempool::TransactionPool;
use crate::types::{Block, Hash, Transaction};
use crate::utxo::{UtxoPool, UtxoRef};

/// A retained block together with the pool snapshot reflecting its
/// transactions applied and its coinbase output inserted. The snapshot is
/// owned exclusively and never aliased between nodes.
struct BlockNode {
    block: Block,
    utxos: UtxoPool,
    height: u64,
}

/// A branch tip. `last_updated` is a process-local monotonic stamp; every
/// leaf creation or extension consumes a fresh one.
struct Leaf {
    tip: Hash,
    height: u64,
    last_updated: u64,
}

/// Append-only tree of blocks rooted at genesis.
///
/// Only blocks within [`CUT_OFF_AGE`] of the tallest leaf are retained.
/// Each live branch carries its own materialized pool; the canonical tip
/// is the tallest leaf, ties broken toward the most recently updated one.
/// The tree also owns the pending-transaction pool, draining it as blocks
/// are admitted.
pub struct BlockTree {
    nodes: HashMap<Hash, BlockNode>,
    leaves: Vec<Leaf>,
    mempool: TransactionPool,
    clock: u64,
}

impl BlockTree {
    /// Build a tree containing only `genesis`, assumed valid, at height 1.
    /// The genesis snapshot holds exactly its coinbase output.
    pub fn new(genesis: Block) -> Self {
        let mut utxos = UtxoPool::new();
        insert_coinbase(&mut utxos, &genesis);
        let leaf = Leaf {
            tip: genesis.hash(),
            height: GENESIS_HEIGHT,
            last_updated: 0,
        };
        let mut nodes = HashMap::new();
        nodes.insert(
            genesis.hash(),
            BlockNode {
                block: genesis,
                utxos,
                height: GENESIS_HEIGHT,
            },
        );
        Self {
            nodes,
            leaves: vec![leaf],
            mempool: TransactionPool::new(),
            clock: 0,
        }
    }

    /// The canonical tip block.
    pub fn max_height_block(&self) -> &Block {
        let leaf = self.max_leaf();
        &self.node(&leaf.tip).block
    }

    /// Height of the canonical tip.
    pub fn max_height(&self) -> u64 {
        self.max_leaf().height
    }

    /// A copy of the canonical tip's unspent-output snapshot, suitable for
    /// assembling the next block.
    pub fn max_height_utxo_pool(&self) -> UtxoPool {
        let leaf = self.max_leaf();
        self.node(&leaf.tip).utxos.clone()
    }

    /// Admit `block` if its whole transaction list validates on its
    /// parent's branch. Returns `false` on rejection; rejection is
    /// non-fatal and mutates nothing.
    pub fn add_block(&mut self, block: &Block) -> bool {
        match self.try_add_block(block) {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "block rejected");
                false
            }
        }
    }

    /// [`Self::add_block`], reporting why a block was refused.
    pub fn try_add_block(&mut self, block: &Block) -> Result<(), BlockError> {
        let prev_hash = block.prev_hash().ok_or(BlockError::SecondGenesis)?;
        if self.nodes.contains_key(&block.hash()) {
            return Err(BlockError::Duplicate);
        }
        // A pruned ancestor is simply absent, so this check also enforces
        // the cut-off boundary.
        let (parent_pool, parent_height) = {
            let parent = self
                .nodes
                .get(&prev_hash)
                .ok_or(BlockError::UnknownParent)?;
            (parent.utxos.clone(), parent.height)
        };

        let mut handler = TxHandler::new(parent_pool);
        let accepted = handler.handle_txs(block.transactions());
        if accepted.len() != block.transactions().len() {
            return Err(BlockError::RejectedTransactions);
        }

        let mut utxos = handler.into_pool();
        insert_coinbase(&mut utxos, block);
        let height = parent_height + 1;
        self.nodes.insert(
            block.hash(),
            BlockNode {
                block: block.clone(),
                utxos,
                height,
            },
        );
        self.update_leaves(prev_hash, block.hash(), height);
        self.prune();
        for tx in block.transactions() {
            self.mempool.remove_transaction(&tx.hash());
        }
        debug!(height, "block admitted");
        Ok(())
    }

    /// Add a pending transaction. No validation happens here; the pool is
    /// a pass-through.
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.mempool.add_transaction(tx);
    }

    /// The pool of transactions waiting to be mined on the canonical tip.
    pub fn transaction_pool(&self) -> &TransactionPool {
        &self.mempool
    }

    fn max_leaf(&self) -> &Leaf {
        self.leaves
            .first()
            .expect("the tree always keeps at least one leaf")
    }

    fn node(&self, hash: &Hash) -> &BlockNode {
        self.nodes
            .get(hash)
            .expect("a leaf always refers to a retained block")
    }

    /// Move the parent's leaf onto the new tip, or open a fork leaf.
    /// Either way the touched leaf takes a fresh stamp, then the list is
    /// re-sorted: height descending, stamp descending on ties.
    fn update_leaves(&mut self, prev_hash: Hash, tip: Hash, height: u64) {
        self.clock += 1;
        let stamp = self.clock;
        match self.leaves.iter_mut().find(|leaf| leaf.tip == prev_hash) {
            Some(leaf) => {
                leaf.tip = tip;
                leaf.height = height;
                leaf.last_updated = stamp;
            }
            None => self.leaves.push(Leaf {
                tip,
                height,
                last_updated: stamp,
            }),
        }
        self.leaves.sort_by(|a, b| {
            b.height
                .cmp(&a.height)
                .then(b.last_updated.cmp(&a.last_updated))
        });
    }

    /// Evict nodes that fell more than [`CUT_OFF_AGE`] below the tallest
    /// leaf, and leaves whose tip went with them.
    fn prune(&mut self) {
        let max_height = self.max_leaf().height;
        let before = self.nodes.len();
        self.nodes
            .retain(|_, node| node.height + CUT_OFF_AGE >= max_height);
        if self.nodes.len() < before {
            trace!(
                evicted = before - self.nodes.len(),
                max_height,
                "pruned stale blocks"
            );
        }
        let nodes = &self.nodes;
        self.leaves.retain(|leaf| nodes.contains_key(&leaf.tip));
    }
}

/// Make the block's coinbase output spendable: it enters the snapshot as
/// the block is admitted, consumable only by descendants.
fn insert_coinbase(pool: &mut UtxoPool, block: &Block) {
    let coinbase = block.coinbase();
    pool.add(
        UtxoRef::new(coinbase.hash(), 0),
        coinbase.outputs()[0].clone(),
    );
}
