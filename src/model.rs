//! Data models for virtual graph queries.
//!
//! This module defines the records exchanged with callers: node rows
//! hydrated from the store, edge references, and the result structures
//! returned by the traversal, pathfinding, aggregation, and network
//! handlers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifier of a node row in the caller's node table.
///
/// The engine requires an integer primary key; the column that holds it
/// is named by the schema binding.
pub type NodeId = i64;

/// Which side of an edge the traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Follow edges from their `from` column to their `to` column.
    Outbound,
    /// Follow edges backwards, entering the `from` side.
    Inbound,
    /// Follow edges in both orientations.
    Both,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Outbound
    }
}

/// Why a handler stopped expanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The requested target node entered the visited map.
    TargetReached,
    /// The hop budget ran out with work remaining.
    DepthExhausted,
    /// The frontier drained before the hop budget ran out.
    FrontierEmpty,
    /// The node budget was hit mid-hop; the result is partial.
    SafetyLimit,
}

/// Aggregation operation applied along and across paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    /// Sum edge values along a path; sum across paths.
    Sum,
    /// Multiply edge values along a path; sum across paths. This is
    /// the diamond-aware rule used for bill-of-materials explosion.
    Multiply,
    /// Maximum edge value along a path; maximum across paths.
    Max,
    /// Minimum edge value along a path; minimum across paths.
    Min,
    /// Path length; minimum across paths (shortest-path length).
    Count,
}

impl AggregateOp {
    /// Stable lowercase name, as reported in results.
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Multiply => "multiply",
            AggregateOp::Max => "max",
            AggregateOp::Min => "min",
            AggregateOp::Count => "count",
        }
    }
}

/// A node row hydrated from the caller's node table.
///
/// `fields` holds every column of the row keyed by column name; the
/// primary key is additionally lifted into `id`. Binary columns are
/// base64-encoded strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    /// Value of the primary-key column.
    pub id: NodeId,
    /// All columns of the row, including the primary key.
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl NodeRow {
    /// Returns a column value by name, if present.
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.fields.get(column)
    }
}

/// A directed edge as traversed, with its weight when one was read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Node the traversal stepped from.
    pub from: NodeId,
    /// Node the traversal entered.
    pub to: NodeId,
    /// Weight column value, when the schema names a weight column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Result of a bounded breadth-first traversal.
#[derive(Debug, Clone, Serialize)]
pub struct TraverseResult {
    /// Hydrated rows for every visited node.
    pub nodes: Vec<NodeRow>,
    /// Shortest-hop path from the start to each visited node.
    pub paths: HashMap<NodeId, Vec<NodeId>>,
    /// Tree edges through which nodes were first reached.
    pub edges: Vec<EdgeRef>,
    /// Deepest hop at which a node entered the visited map.
    pub depth_reached: u32,
    /// Number of distinct nodes visited, start included.
    pub nodes_visited: usize,
    /// Why the expansion stopped.
    pub terminated_at: Termination,
}

/// Result of a traversal that collects nodes matching a predicate.
#[derive(Debug, Clone, Serialize)]
pub struct CollectResult {
    /// Visited rows that satisfied the target condition.
    pub matching_nodes: Vec<NodeRow>,
    /// Path from the start to each matching node.
    pub matching_paths: HashMap<NodeId, Vec<NodeId>>,
    /// Total nodes visited during the expansion.
    pub total_traversed: usize,
    /// Deepest hop reached.
    pub depth_reached: u32,
}

/// Result of a single-pair shortest-path query.
#[derive(Debug, Clone, Serialize)]
pub struct ShortestPathResult {
    /// Node ids along the path, start first; `None` when no path
    /// exists.
    pub path: Option<Vec<NodeId>>,
    /// Hydrated rows for the path nodes, in path order.
    pub path_nodes: Vec<NodeRow>,
    /// Hop count (unweighted) or cumulative weight (weighted).
    pub distance: Option<f64>,
    /// Edges along the path, in order.
    pub edges: Vec<EdgeRef>,
    /// Distinct nodes examined while searching.
    pub nodes_explored: usize,
    /// Echo of the exclusion set applied.
    pub excluded_nodes: Vec<NodeId>,
    /// In-band no-path report; `None` on success.
    pub error: Option<String>,
}

/// Result of an all-shortest-paths enumeration.
#[derive(Debug, Clone, Serialize)]
pub struct AllShortestPathsResult {
    /// Every shortest path found, capped at the requested maximum.
    /// All paths have identical hop length.
    pub paths: Vec<Vec<NodeId>>,
    /// The shared hop length of the paths.
    pub distance: Option<f64>,
    /// Number of paths returned.
    pub path_count: usize,
    /// Distinct nodes examined while enumerating.
    pub nodes_explored: usize,
    /// Echo of the exclusion set applied.
    pub excluded_nodes: Vec<NodeId>,
    /// In-band no-path report; `None` on success.
    pub error: Option<String>,
}

/// Result of a multi-path aggregation from a start node.
#[derive(Debug, Clone, Serialize)]
pub struct PathAggregateResult {
    /// Hydrated rows for every reachable node, each carrying an
    /// `aggregated_value` field.
    pub nodes: Vec<NodeRow>,
    /// Aggregated value per reachable node.
    pub aggregated_values: HashMap<NodeId, f64>,
    /// The operation that was applied.
    pub operation: AggregateOp,
    /// The edge column the values came from.
    pub value_column: String,
    /// Effective (clamped) depth bound used.
    pub max_depth: u32,
    /// Number of distinct reachable nodes, start excluded.
    pub nodes_visited: usize,
}

/// One entry of a degree-centrality ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CentralityScore {
    /// The ranked node.
    pub node: NodeId,
    /// Its degree in the requested direction.
    pub degree: u64,
}

/// Result of a whole-graph connected-components analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentsResult {
    /// Components ordered largest first, members ascending.
    pub components: Vec<Vec<NodeId>>,
    /// Number of components found.
    pub component_count: usize,
    /// Total nodes assigned to components.
    pub nodes_seen: usize,
}
