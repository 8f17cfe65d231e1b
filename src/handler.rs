//! Epoch transaction handling: validate candidates against an
//! unspent-output pool and select a maximal mutually-consistent subset.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::crypto::verify_signature;
use crate::error::TxError;
use crate::types::{Hash, Transaction, Value};
use crate::utxo::{UtxoPool, UtxoRef};

/// Candidate bookkeeping for one batch: the transaction plus the hashes of
/// batch members that consume its outputs directly.
struct TxRecord {
    tx: Transaction,
    dependents: HashSet<Hash>,
}

/// Validates transactions and applies epochs of them to an unspent-output
/// pool.
///
/// A handler owns the pool for one branch. The block tree seeds a fresh
/// handler with a copy of the parent snapshot for every candidate block, so
/// a rejected block never touches live state; used standalone, the handler
/// carries the canonical pool across successive epochs.
pub struct TxHandler {
    pool: UtxoPool,
}

impl TxHandler {
    /// Create a handler over `pool`.
    pub fn new(pool: UtxoPool) -> Self {
        Self { pool }
    }

    /// The pool as of the last committed epoch.
    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    /// Consume the handler, yielding its pool.
    pub fn into_pool(self) -> UtxoPool {
        self.pool
    }

    /// Check `tx` against the live pool, reporting the first failure.
    ///
    /// A transaction is valid iff every input claims an output present in
    /// the pool, every signature verifies under the claimed output's payee
    /// over [`Transaction::raw_data_to_sign`], no output is claimed twice,
    /// no output value is negative, and claimed value covers paid value.
    pub fn check_tx(&self, tx: &Transaction) -> Result<(), TxError> {
        check_against(tx, &self.pool)
    }

    /// Whether `tx` is valid against the live pool.
    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        self.check_tx(tx).is_ok()
    }

    /// Select a maximal mutually-consistent subset of `candidates` and
    /// commit it to the pool.
    ///
    /// Candidates may consume each other's outputs; a candidate whose
    /// producer is dropped is dropped with it, and no unspent output ends
    /// up consumed by more than one accepted transaction. Never fails:
    /// rejected candidates are silently omitted from the returned list,
    /// whose order is unspecified.
    pub fn handle_txs(&mut self, candidates: &[Transaction]) -> Vec<Transaction> {
        let mut records = index_candidates(candidates);

        self.remove_self_inconsistent(&mut records);
        resolve_double_spends(&mut records);
        self.commit(&records);

        debug!(
            submitted = candidates.len(),
            accepted = records.len(),
            "epoch handled"
        );
        records.into_values().map(|record| record.tx).collect()
    }

    /// Drop every candidate that fails validation against the hypothetical
    /// pool (the live pool plus every candidate's outputs), together with
    /// its transitive dependents: once a producer is gone, no accepted
    /// subset can contain its consumers.
    fn remove_self_inconsistent(&self, records: &mut HashMap<Hash, TxRecord>) {
        let mut hypothetical = self.pool.clone();
        for record in records.values() {
            add_outputs(&mut hypothetical, &record.tx);
        }

        let invalid: Vec<Hash> = records
            .values()
            .filter_map(|record| match check_against(&record.tx, &hypothetical) {
                Ok(()) => None,
                Err(err) => {
                    trace!(%err, "candidate dropped");
                    Some(record.tx.hash())
                }
            })
            .collect();
        for hash in invalid {
            remove_with_dependents(hash, records);
        }
    }

    /// Commit survivors: insert every accepted output, then consume every
    /// claimed one. Insertion first tolerates intra-batch consumption.
    fn commit(&mut self, records: &HashMap<Hash, TxRecord>) {
        for record in records.values() {
            add_outputs(&mut self.pool, &record.tx);
        }
        for record in records.values() {
            for input in record.tx.inputs() {
                self.pool.remove(&input.claimed_utxo());
            }
        }
    }
}

/// Map each candidate hash to its record, wiring up direct dependents:
/// `c` depends on `p` iff an input of `c` names `p`'s hash and `p` is in
/// the batch. Candidates claiming outputs produced outside the batch
/// depend on nothing here; they rely solely on the live pool.
fn index_candidates(candidates: &[Transaction]) -> HashMap<Hash, TxRecord> {
    let mut records: HashMap<Hash, TxRecord> = candidates
        .iter()
        .map(|tx| {
            (
                tx.hash(),
                TxRecord {
                    tx: tx.clone(),
                    dependents: HashSet::new(),
                },
            )
        })
        .collect();

    let edges: Vec<(Hash, Hash)> = records
        .values()
        .flat_map(|record| {
            let dependent = record.tx.hash();
            record
                .tx
                .inputs()
                .iter()
                .map(move |input| (input.prev_tx_hash, dependent))
        })
        .collect();
    for (producer, dependent) in edges {
        if let Some(record) = records.get_mut(&producer) {
            record.dependents.insert(dependent);
        }
    }
    records
}

/// Resolve groups of surviving candidates that spend the same output, so
/// no output is consumed by more than one accepted transaction. Group
/// processing order and the tiebreak victim are implementation-defined.
fn resolve_double_spends(records: &mut HashMap<Hash, TxRecord>) {
    let spenders = spender_map(records);
    for (_, mut group) in spenders {
        if group.len() < 2 {
            continue;
        }
        drop_conflicting_dependents(&mut group, records);
        while group.len() > 1 {
            let victim = *group.iter().next().expect("group is non-empty");
            group.remove(&victim);
            remove_with_dependents(victim, records);
            // A victim's dependents may sit in this group too.
            group.retain(|hash| records.contains_key(hash));
        }
    }
}

/// A group member that transitively depends on another member is
/// contradictory: it consumes a descendant of the contested output and the
/// contested output itself. Drop it with its dependents, then re-sync the
/// group against the survivors.
fn drop_conflicting_dependents(group: &mut HashSet<Hash>, records: &mut HashMap<Hash, TxRecord>) {
    let members: Vec<Hash> = group.iter().copied().collect();
    for member in members {
        for dependent in transitive_dependents(member, records) {
            if group.contains(&dependent) {
                remove_with_dependents(dependent, records);
            }
        }
    }
    group.retain(|hash| records.contains_key(hash));
}

/// Transitive dependents of `root` among live candidates, excluding
/// `root` itself.
fn transitive_dependents(root: Hash, records: &HashMap<Hash, TxRecord>) -> HashSet<Hash> {
    let mut collected = HashSet::new();
    let mut worklist: Vec<Hash> = match records.get(&root) {
        Some(record) => record.dependents.iter().copied().collect(),
        None => return collected,
    };
    while let Some(hash) = worklist.pop() {
        let Some(record) = records.get(&hash) else {
            continue;
        };
        if !collected.insert(hash) {
            continue;
        }
        worklist.extend(record.dependents.iter().copied());
    }
    collected
}

/// Remove `hash` and everything that transitively depends on it. Each
/// entry is removed before its dependents are visited, so re-removing an
/// already-removed hash is a no-op and cycles cannot loop.
fn remove_with_dependents(hash: Hash, records: &mut HashMap<Hash, TxRecord>) {
    let mut worklist = vec![hash];
    while let Some(next) = worklist.pop() {
        if let Some(record) = records.remove(&next) {
            worklist.extend(record.dependents);
        }
    }
}

/// Map each claimed output to the set of candidates claiming it.
fn spender_map(records: &HashMap<Hash, TxRecord>) -> HashMap<UtxoRef, HashSet<Hash>> {
    let mut spenders: HashMap<UtxoRef, HashSet<Hash>> = HashMap::new();
    for record in records.values() {
        for input in record.tx.inputs() {
            spenders
                .entry(input.claimed_utxo())
                .or_default()
                .insert(record.tx.hash());
        }
    }
    spenders
}

/// Insert every output of `tx` into `pool`, keyed by the transaction hash
/// and output position.
fn add_outputs(pool: &mut UtxoPool, tx: &Transaction) {
    for (index, output) in tx.outputs().iter().enumerate() {
        pool.add(UtxoRef::new(tx.hash(), index as u32), output.clone());
    }
}

fn check_against(tx: &Transaction, pool: &UtxoPool) -> Result<(), TxError> {
    let mut claimed = HashSet::new();
    for (index, input) in tx.inputs().iter().enumerate() {
        let utxo = input.claimed_utxo();
        if !pool.contains(&utxo) {
            return Err(TxError::MissingInput { index });
        }
        if !claimed.insert(utxo) {
            return Err(TxError::DuplicateClaim { index });
        }
    }
    for (index, input) in tx.inputs().iter().enumerate() {
        let address = pool
            .output(&input.claimed_utxo())
            .map(|output| &output.address);
        if !verify_signature(address, &tx.raw_data_to_sign(index), &input.signature) {
            return Err(TxError::InvalidSignature { index });
        }
    }
    for (index, output) in tx.outputs().iter().enumerate() {
        if output.value < 0 {
            return Err(TxError::NegativeOutput {
                index,
                value: output.value,
            });
        }
    }
    let input_total = total_input_value(tx, pool);
    let output_total: Value = tx.outputs().iter().map(|output| output.value).sum();
    if input_total < output_total {
        return Err(TxError::ValueShortfall {
            input_total,
            output_total,
        });
    }
    Ok(())
}

fn total_input_value(tx: &Transaction, pool: &UtxoPool) -> Value {
    tx.inputs()
        .iter()
        .filter_map(|input| pool.output(&input.claimed_utxo()))
        .map(|output| output.value)
        .sum()
}
