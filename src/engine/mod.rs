//! The graph handler engine.
//!
//! [`VirtualGraph`] binds a live connection to a validated schema and
//! a set of safety budgets, and exposes the query handlers: bounded
//! traversal, pathfinding, path aggregation, and network analysis.
//! Handlers never materialize more than the current frontier and the
//! visited map in memory; set work is pushed to the store as batched
//! parameterized queries.

mod aggregate;
mod network;
mod pathfind;
mod traverse;

pub use aggregate::AggregateOptions;
pub use pathfind::{AllPathsOptions, PathfindOptions};
pub use traverse::TraverseOptions;

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::model::{Direction, EdgeRef, NodeId, NodeRow, Termination};
use crate::safety::{check_limits, SafetyLimits};
use crate::schema::GraphSchema;
use crate::sql::builder::{self, Leg};
use crate::sql::ident;
use crate::store;

/// Query engine over one relational connection and one schema binding.
///
/// The connection is exclusively owned by each handler call for its
/// duration; the engine issues read-only statements and never opens
/// transactions. Callers wanting snapshot isolation pass a connection
/// already inside a read-only transaction.
pub struct VirtualGraph<'conn> {
    conn: &'conn Connection,
    schema: GraphSchema,
    limits: SafetyLimits,
}

/// Per-node bookkeeping in the visited map.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Visit {
    pub hop: u32,
    pub parent: Option<NodeId>,
    pub weight: Option<f64>,
}

/// Outcome of one client-side frontier expansion.
pub(crate) struct Expansion {
    pub visited: HashMap<NodeId, Visit>,
    /// Visit order; keeps results deterministic given store ordering.
    pub order: Vec<NodeId>,
    pub edges: Vec<EdgeRef>,
    pub depth_reached: u32,
    pub terminated_at: Termination,
}

impl<'conn> VirtualGraph<'conn> {
    /// Binds a connection and schema with the default safety budgets.
    ///
    /// Fails with `InvalidIdentifier` if any schema string misses the
    /// allow-list; nothing is sent to the store before that check.
    pub fn new(conn: &'conn Connection, schema: GraphSchema) -> Result<Self> {
        Self::with_limits(conn, schema, SafetyLimits::default())
    }

    /// Binds a connection and schema with caller-chosen budgets.
    pub fn with_limits(
        conn: &'conn Connection,
        schema: GraphSchema,
        limits: SafetyLimits,
    ) -> Result<Self> {
        schema.validate()?;
        Ok(Self {
            conn,
            schema,
            limits,
        })
    }

    /// The schema binding this engine operates on.
    pub fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    /// The safety budgets in force.
    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Fetches all edges touching the frontier, chunked below the bind
    /// limit. Returns `(parent, entered, weight)` triples in traversal
    /// orientation.
    pub(crate) fn fetch_frontier_edges(
        &self,
        frontier: &[NodeId],
        direction: Direction,
    ) -> Result<Vec<(NodeId, NodeId, Option<f64>)>> {
        let has_weight = self.schema.weight_col.is_some();
        let mut out = Vec::new();
        for chunk in frontier.chunks(store::BIND_CHUNK) {
            let params: Vec<rusqlite::types::Value> =
                chunk.iter().map(|&id| id.into()).collect();
            for &leg in Leg::for_direction(direction) {
                let sql = builder::edge_batch(&self.schema, leg, chunk.len());
                let rows = store::query_rows(
                    self.conn,
                    self.limits.statement_timeout,
                    &sql,
                    &params,
                    |row| {
                        let from: NodeId = row.get(0)?;
                        let to: NodeId = row.get(1)?;
                        let weight = if has_weight {
                            row.get::<_, Option<f64>>(2)?
                        } else {
                            None
                        };
                        Ok((from, to, weight))
                    },
                )?;
                for (from, to, weight) in rows {
                    // Report the edge in the orientation it was walked.
                    let (parent, entered) = match leg {
                        Leg::Forward => (from, to),
                        Leg::Reverse => (to, from),
                    };
                    out.push((parent, entered, weight));
                }
            }
        }
        Ok(out)
    }

    /// Bounded breadth-first expansion: the shared engine behind
    /// traversal, unweighted pathfinding, and component walks.
    ///
    /// Only the current frontier and the visited map live in memory;
    /// each hop is one round of batched edge fetches. When multiple
    /// edges reach an unvisited node in the same hop the first edge in
    /// store order wins.
    pub(crate) fn expand(
        &self,
        starts: &[NodeId],
        direction: Direction,
        max_depth: u32,
        excluded: &HashSet<NodeId>,
        target: Option<NodeId>,
    ) -> Result<Expansion> {
        if starts.is_empty() {
            return Err(GraphError::InvalidArgument(
                "at least one start node is required".to_string(),
            ));
        }
        let max_depth = self.limits.clamp_depth(max_depth);

        let mut visited: HashMap<NodeId, Visit> = HashMap::new();
        let mut order: Vec<NodeId> = Vec::new();
        let mut edges: Vec<EdgeRef> = Vec::new();
        for &start in starts {
            if excluded.contains(&start) {
                continue;
            }
            if visited
                .insert(
                    start,
                    Visit {
                        hop: 0,
                        parent: None,
                        weight: None,
                    },
                )
                .is_none()
            {
                order.push(start);
            }
        }

        let mut terminated_at = Termination::DepthExhausted;
        let mut depth_reached = 0u32;
        let mut frontier: Vec<NodeId> = order.clone();

        if let Some(t) = target {
            if visited.contains_key(&t) {
                return Ok(Expansion {
                    visited,
                    order,
                    edges,
                    depth_reached,
                    terminated_at: Termination::TargetReached,
                });
            }
        }

        'hops: for depth in 1..=max_depth {
            if frontier.is_empty() {
                terminated_at = Termination::FrontierEmpty;
                break;
            }
            let batch = self.fetch_frontier_edges(&frontier, direction)?;
            debug!(depth, frontier = frontier.len(), edges = batch.len(), "hop");

            let mut next: Vec<NodeId> = Vec::new();
            for (parent, entered, weight) in batch {
                if excluded.contains(&entered) || visited.contains_key(&entered) {
                    continue;
                }
                // Admitting the node must keep the expansion within
                // budget; on breach the partial result is returned
                // flagged rather than raised.
                if check_limits(visited.len() + 1, depth, &self.limits).is_err() {
                    warn!(
                        limit = self.limits.max_nodes,
                        depth, "node budget hit mid-hop"
                    );
                    terminated_at = Termination::SafetyLimit;
                    break 'hops;
                }
                visited.insert(
                    entered,
                    Visit {
                        hop: depth,
                        parent: Some(parent),
                        weight,
                    },
                );
                order.push(entered);
                edges.push(EdgeRef {
                    from: parent,
                    to: entered,
                    weight,
                });
                depth_reached = depth;
                next.push(entered);
                if target == Some(entered) {
                    terminated_at = Termination::TargetReached;
                    break 'hops;
                }
            }
            frontier = next;
        }

        if terminated_at == Termination::DepthExhausted && frontier.is_empty() {
            terminated_at = Termination::FrontierEmpty;
        }

        Ok(Expansion {
            visited,
            order,
            edges,
            depth_reached,
            terminated_at,
        })
    }

    /// Hydrates node rows for the given ids, applying the soft-delete
    /// filter and the optional trusted predicate, then orders the rows
    /// client-side by `order_by` (or primary key) so chunking can never
    /// perturb the result order.
    pub(crate) fn hydrate(
        &self,
        ids: &[NodeId],
        predicate: Option<&str>,
    ) -> Result<Vec<NodeRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let pk_col = &self.schema.node_pk_col;
        let timeout = self.limits.statement_timeout;
        let mut rows: Vec<NodeRow> = Vec::new();
        for chunk in ids.chunks(store::BIND_CHUNK) {
            let sql = builder::hydrate(&self.schema, chunk.len(), predicate);
            let params: Vec<rusqlite::types::Value> =
                chunk.iter().map(|&id| id.into()).collect();

            let _deadline = store::DeadlineGuard::install(self.conn, timeout);
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| store::map_store_err(e, timeout))?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect();
            let pk_index = columns.iter().position(|name| name == pk_col).ok_or_else(|| {
                GraphError::InvalidArgument(format!(
                    "primary key column {pk_col:?} missing from node rows"
                ))
            })?;

            let mut fetched = stmt
                .query(rusqlite::params_from_iter(params.iter()))
                .map_err(|e| store::map_store_err(e, timeout))?;
            loop {
                match fetched.next() {
                    Ok(Some(row)) => {
                        let id: NodeId = row
                            .get(pk_index)
                            .map_err(|e| store::map_store_err(e, timeout))?;
                        let mut fields = serde_json::Map::new();
                        for (idx, name) in columns.iter().enumerate() {
                            let value = row
                                .get_ref(idx)
                                .map_err(|e| store::map_store_err(e, timeout))?;
                            fields.insert(name.clone(), store::value_to_json(value));
                        }
                        rows.push(NodeRow { id, fields });
                    }
                    Ok(None) => break,
                    Err(e) => return Err(store::map_store_err(e, timeout)),
                }
            }
        }

        match &self.schema.order_by {
            Some(expr) => {
                let order = ident::parse_order_by(expr)?;
                rows.sort_by(|a, b| {
                    let null = serde_json::Value::Null;
                    let av = a.get(&order.column).unwrap_or(&null);
                    let bv = b.get(&order.column).unwrap_or(&null);
                    let cmp = store::compare_json(av, bv).then_with(|| a.id.cmp(&b.id));
                    if order.descending {
                        cmp.reverse()
                    } else {
                        cmp
                    }
                });
            }
            None => rows.sort_by_key(|row| row.id),
        }
        Ok(rows)
    }

    /// Hydrates rows and returns them in the order of `ids`, dropping
    /// ids filtered out by soft delete.
    pub(crate) fn hydrate_in_order(&self, ids: &[NodeId]) -> Result<Vec<NodeRow>> {
        let rows = self.hydrate(ids, None)?;
        let mut by_id: HashMap<NodeId, NodeRow> =
            rows.into_iter().map(|row| (row.id, row)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Walks parent pointers back to the start, returning the path in
    /// start-first order.
    pub(crate) fn reconstruct_path(
        visited: &HashMap<NodeId, Visit>,
        node: NodeId,
    ) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut cursor = node;
        while let Some(visit) = visited.get(&cursor) {
            match visit.parent {
                Some(parent) => {
                    path.push(parent);
                    cursor = parent;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}
