//! Block-parallel execution of source contributions.
//!
//! Sources are cut into weight-balanced blocks homogeneous in tectonic
//! region type; every block folds its sources into a private accumulator
//! and the reduced blocks are merged with [`agg_dicts`]. The merge is a
//! product in no-exceedance space, so the result does not depend on the
//! number of blocks or the order in which they finish.

use super::probability_map::ProbabilityMap;
use crate::domain::{ComputeResult, HazardError};
use rayon::prelude::*;
use tracing::{debug, info};

/// Items of one key whose weights add up to at most the block budget
/// (a single heavier item gets a block of its own).
#[derive(Debug, Clone, PartialEq)]
pub struct Block<T> {
    key: String,
    weight: f64,
    items: Vec<T>,
}

impl<T> Block<T> {
    fn new(key: String) -> Self {
        Self {
            key,
            weight: 0.0,
            items: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Splits `items` into about `hint` blocks of similar weight.
///
/// Items are grouped by `key` (stable within a key) and a block is closed
/// when the next item would push it past `ceil(total_weight / hint)`.
/// Items of zero weight are dropped; a `hint` of zero gives one block per
/// key.
pub fn split_in_blocks<T>(
    items: Vec<T>,
    hint: usize,
    weight: impl Fn(&T) -> f64,
    key: impl Fn(&T) -> String,
) -> ComputeResult<Vec<Block<T>>> {
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let item_weight = weight(&item);
        if !(item_weight >= 0.0) {
            return Err(HazardError::internal(
                "SYS.BLOCK_WEIGHT",
                format!("item of key '{}' got a negative weight {item_weight}", key(&item)),
            ));
        }
        keyed.push((key(&item), item_weight, item));
    }
    keyed.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));

    let total_weight: f64 = keyed.iter().map(|(_, item_weight, _)| item_weight).sum();
    if total_weight == 0.0 {
        return Ok(Vec::new());
    }
    let max_weight = if hint == 0 {
        f64::INFINITY
    } else {
        (total_weight / hint as f64).ceil()
    };

    let mut blocks = Vec::new();
    let mut current: Option<Block<T>> = None;
    for (item_key, item_weight, item) in keyed {
        if item_weight == 0.0 {
            continue;
        }
        let block = match current.take() {
            Some(block)
                if block.key == item_key && block.weight + item_weight <= max_weight =>
            {
                block
            }
            Some(block) => {
                blocks.push(block);
                Block::new(item_key)
            }
            None => Block::new(item_key),
        };
        let block = current.insert(block);
        block.weight += item_weight;
        block.items.push(item);
    }
    blocks.extend(current);
    Ok(blocks)
}

/// Lifecycle of one block computation. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Init,
    Accumulating,
    Reduced,
    Merged,
}

/// Accumulator owned by a single block until it is reduced.
#[derive(Debug)]
pub struct BlockAccumulator {
    state: TaskState,
    pmap: ProbabilityMap,
}

impl BlockAccumulator {
    pub fn new(acc0: ProbabilityMap) -> Self {
        Self {
            state: TaskState::Init,
            pmap: acc0,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn fold(&mut self, contribution: &ProbabilityMap) -> ComputeResult<()> {
        self.pmap.combine_in_place(contribution)?;
        self.state = TaskState::Accumulating;
        Ok(())
    }

    pub fn reduce(self) -> ReducedBlock {
        ReducedBlock {
            state: TaskState::Reduced,
            pmap: self.pmap,
        }
    }
}

/// The complete result of one block, or of several merged blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedBlock {
    state: TaskState,
    pmap: ProbabilityMap,
}

impl ReducedBlock {
    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn pmap(&self) -> &ProbabilityMap {
        &self.pmap
    }

    pub fn into_pmap(self) -> ProbabilityMap {
        self.pmap
    }
}

/// Merges the result of a block into an accumulator.
pub fn agg_dicts(mut acc: ReducedBlock, partial: ReducedBlock) -> ComputeResult<ReducedBlock> {
    acc.pmap.combine_in_place(&partial.pmap)?;
    acc.state = TaskState::Merged;
    Ok(acc)
}

/// Runs every block on the rayon pool and merges the results.
///
/// `compute` returns the contribution of one item, or `None` when the item
/// contributes nothing. The first error aborts the run.
pub fn run_blocks<T, F>(
    blocks: &[Block<T>],
    acc0: &ProbabilityMap,
    compute: F,
) -> ComputeResult<ProbabilityMap>
where
    T: Sync,
    F: Fn(&T) -> ComputeResult<Option<ProbabilityMap>> + Sync,
{
    info!(
        num_blocks = blocks.len(),
        num_items = blocks.iter().map(Block::len).sum::<usize>(),
        "running blocks"
    );
    let merged = blocks
        .par_iter()
        .enumerate()
        .map(|(index, block)| -> ComputeResult<ReducedBlock> {
            let mut task = BlockAccumulator::new(acc0.clone());
            for item in block.items() {
                if let Some(contribution) = compute(item)? {
                    task.fold(&contribution)?;
                }
            }
            debug!(
                block = index,
                trt = block.key(),
                weight = block.weight(),
                num_items = block.len(),
                "block reduced"
            );
            Ok(task.reduce())
        })
        .try_reduce(
            || ReducedBlock {
                state: TaskState::Reduced,
                pmap: acc0.clone(),
            },
            agg_dicts,
        )?;
    Ok(merged.into_pmap())
}
