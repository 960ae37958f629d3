//! Bounded breadth-first traversal handlers.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::model::{CollectResult, Direction, NodeId, TraverseResult};
use crate::safety::{self, MAX_DEPTH};
use crate::sql::ident;

use super::VirtualGraph;

/// Options shared by the traversal handlers.
#[derive(Debug, Clone)]
pub struct TraverseOptions {
    /// Which edge orientation(s) to follow.
    pub direction: Direction,
    /// Hop budget; clamped to the engine's depth limit.
    pub max_depth: u32,
    /// Nodes the traversal must never enter.
    pub excluded_nodes: Vec<NodeId>,
    /// Skips the pre-flight size estimate. For tests and trusted
    /// callers.
    pub skip_estimation: bool,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Outbound,
            max_depth: MAX_DEPTH,
            excluded_nodes: Vec::new(),
            skip_estimation: false,
        }
    }
}

impl VirtualGraph<'_> {
    /// Bounded BFS from a single start node.
    ///
    /// Visits every node reachable within the depth budget, returning
    /// hydrated rows, the shortest-hop path to each visited node, the
    /// tree edges walked, and accounting metadata. A mid-hop node
    /// budget breach stops admission and reports
    /// `terminated_at = safety_limit` with the partial result.
    pub fn traverse(&self, start: NodeId, opts: &TraverseOptions) -> Result<TraverseResult> {
        self.traverse_multi(&[start], opts)
    }

    /// Bounded BFS seeded with several start nodes at hop zero.
    pub fn traverse_multi(
        &self,
        starts: &[NodeId],
        opts: &TraverseOptions,
    ) -> Result<TraverseResult> {
        let max_depth = self.limits().clamp_depth(opts.max_depth);
        self.preflight(starts, opts.direction, max_depth, opts.skip_estimation)?;

        let excluded: HashSet<NodeId> = opts.excluded_nodes.iter().copied().collect();
        let expansion = self.expand(starts, opts.direction, max_depth, &excluded, None)?;

        let nodes = self.hydrate(&expansion.order, None)?;
        let paths: HashMap<NodeId, Vec<NodeId>> = nodes
            .iter()
            .map(|node| (node.id, Self::reconstruct_path(&expansion.visited, node.id)))
            .collect();

        Ok(TraverseResult {
            nodes,
            paths,
            edges: expansion.edges,
            depth_reached: expansion.depth_reached,
            nodes_visited: expansion.visited.len(),
            terminated_at: expansion.terminated_at,
        })
    }

    /// Traverses, then keeps only nodes satisfying `target_condition`.
    ///
    /// The condition is a trusted SQL predicate over the node table's
    /// columns (a config-time contract, not a user string); it is
    /// guarded against statement splitting and compiled into the
    /// hydration query's `WHERE` clause.
    pub fn traverse_collecting(
        &self,
        start: NodeId,
        target_condition: &str,
        opts: &TraverseOptions,
    ) -> Result<CollectResult> {
        let condition = ident::validate_predicate(target_condition)?;
        let max_depth = self.limits().clamp_depth(opts.max_depth);
        self.preflight(&[start], opts.direction, max_depth, opts.skip_estimation)?;

        let excluded: HashSet<NodeId> = opts.excluded_nodes.iter().copied().collect();
        let expansion = self.expand(&[start], opts.direction, max_depth, &excluded, None)?;

        let matching_nodes = self.hydrate(&expansion.order, Some(condition))?;
        let matching_paths: HashMap<NodeId, Vec<NodeId>> = matching_nodes
            .iter()
            .map(|node| (node.id, Self::reconstruct_path(&expansion.visited, node.id)))
            .collect();
        debug!(
            matched = matching_nodes.len(),
            traversed = expansion.visited.len(),
            "collecting traversal done"
        );

        Ok(CollectResult {
            matching_nodes,
            matching_paths,
            total_traversed: expansion.visited.len(),
            depth_reached: expansion.depth_reached,
        })
    }

    /// Pre-flight size estimate: refuses to start a traversal whose
    /// conservative reachable-set bound meets the node budget.
    fn preflight(
        &self,
        starts: &[NodeId],
        direction: Direction,
        max_depth: u32,
        skip: bool,
    ) -> Result<()> {
        if skip || max_depth == 0 {
            return Ok(());
        }
        let mut estimated: u64 = 0;
        for &start in starts {
            let est = safety::estimate_reachable_nodes(
                self.conn,
                self.schema(),
                start,
                max_depth,
                direction,
                self.limits(),
            )?;
            estimated = estimated.saturating_add(est);
        }
        let limit = self.limits().max_nodes as u64;
        if estimated >= limit {
            return Err(GraphError::SubgraphTooLarge { estimated, limit });
        }
        Ok(())
    }
}
