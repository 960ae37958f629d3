//! Safety budgets and the pre-flight subgraph-size estimator.

use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::model::Direction;
use crate::schema::GraphSchema;
use crate::sql::builder::{self, Leg};
use crate::store;

/// Maximum BFS hop count. Requests beyond this are clamped downward.
pub const MAX_DEPTH: u32 = 50;

/// Maximum distinct nodes admitted to a visited map per handler call.
pub const MAX_NODES: usize = 10_000;

/// Default per-query statement deadline.
pub const STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Nodes sampled when estimating average degree.
const ESTIMATOR_SAMPLE: usize = 100;

/// The budgets bounding any single handler call.
#[derive(Debug, Clone)]
pub struct SafetyLimits {
    /// Hop budget; requested depths clamp down to this.
    pub max_depth: u32,
    /// Visited-map budget.
    pub max_nodes: usize,
    /// Per-query statement deadline.
    pub statement_timeout: Duration,
    /// Fan-out multiplier applied to `max_nodes` when capping the row
    /// count of recursive path enumerations.
    pub aggregate_fanout: usize,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: MAX_NODES,
            statement_timeout: STATEMENT_TIMEOUT,
            aggregate_fanout: 10,
        }
    }
}

impl SafetyLimits {
    /// Clamps a requested depth to the budget, silently.
    pub fn clamp_depth(&self, requested: u32) -> u32 {
        requested.min(self.max_depth)
    }

    /// Row cap for recursive path enumerations.
    pub fn path_row_cap(&self) -> usize {
        self.max_nodes.saturating_mul(self.aggregate_fanout)
    }
}

/// Verifies a visited count and depth against the budgets.
pub fn check_limits(visited: usize, depth: u32, limits: &SafetyLimits) -> Result<()> {
    if visited > limits.max_nodes {
        return Err(GraphError::SafetyLimitExceeded(format!(
            "visited {visited} nodes, limit {}",
            limits.max_nodes
        )));
    }
    if depth > limits.max_depth {
        return Err(GraphError::SafetyLimitExceeded(format!(
            "reached depth {depth}, limit {}",
            limits.max_depth
        )));
    }
    Ok(())
}

fn leg_degree(
    conn: &Connection,
    schema: &GraphSchema,
    leg: Leg,
    start: i64,
    timeout: Duration,
) -> Result<(f64, f64)> {
    let start_sql = builder::start_degree(schema, leg);
    let start_deg = store::query_rows(conn, timeout, &start_sql, &[start.into()], |row| {
        row.get::<_, i64>(0)
    })?
    .into_iter()
    .next()
    .unwrap_or(0);

    let avg_sql = builder::avg_degree_sample(schema, leg);
    let avg = store::query_rows(
        conn,
        timeout,
        &avg_sql,
        &[(ESTIMATOR_SAMPLE as i64).into()],
        |row| row.get::<_, Option<f64>>(0),
    )?
    .into_iter()
    .next()
    .flatten()
    .unwrap_or(0.0);

    Ok((start_deg as f64, avg))
}

/// Conservative upper bound on the nodes reachable from `start` within
/// `max_depth` hops.
///
/// Samples average degree over a random node set, takes the start
/// node's own degree for the first hop, and multiplies forward. The
/// result is clamped to the live row count of the node table, which is
/// itself an upper bound on any reachable set; estimates at or above
/// the node budget mean the traversal should not be attempted.
pub fn estimate_reachable_nodes(
    conn: &Connection,
    schema: &GraphSchema,
    start: i64,
    max_depth: u32,
    direction: Direction,
    limits: &SafetyLimits,
) -> Result<u64> {
    let timeout = limits.statement_timeout;
    let mut start_deg = 0.0;
    let mut avg = 0.0;
    for &leg in Leg::for_direction(direction) {
        let (d0, a) = leg_degree(conn, schema, leg, start, timeout)?;
        start_deg += d0;
        avg += a;
    }

    let budget = limits.max_nodes as f64;
    let mut total = 1.0 + start_deg;
    let mut frontier = start_deg;
    for _ in 2..=max_depth {
        if total >= budget || frontier <= 0.0 {
            break;
        }
        frontier *= avg;
        total += frontier;
    }

    let count_sql = builder::node_count(schema);
    let live_nodes = store::query_rows(conn, timeout, &count_sql, &[], |row| {
        row.get::<_, i64>(0)
    })?
    .into_iter()
    .next()
    .unwrap_or(0)
    .max(0) as f64;

    let estimate = total.min(live_nodes).min(budget).max(0.0) as u64;
    debug!(
        start,
        max_depth, start_deg, avg, estimate, "pre-flight reachability estimate"
    );
    Ok(estimate)
}
