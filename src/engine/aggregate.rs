//! Multi-path value aggregation (bill-of-materials explosion).

use std::collections::HashMap;

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::model::{AggregateOp, NodeId, PathAggregateResult};
use crate::safety::MAX_DEPTH;
use crate::sql::{builder, ident};
use crate::store;

use super::VirtualGraph;

/// Options for `path_aggregate`.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Numeric edge column the values come from.
    pub value_col: String,
    /// How values combine along and across paths.
    pub operation: AggregateOp,
    /// Hop budget; clamped to the engine's depth limit.
    pub max_depth: u32,
}

impl AggregateOptions {
    /// Aggregation over `value_col` with the default depth budget.
    pub fn new(value_col: impl Into<String>, operation: AggregateOp) -> Self {
        Self {
            value_col: value_col.into(),
            operation,
            max_depth: MAX_DEPTH,
        }
    }

    /// Overrides the depth budget.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl VirtualGraph<'_> {
    /// Computes, for every node reachable from `start` within the depth
    /// budget, the chosen operation applied across **all** paths from
    /// the start, not just the first one found.
    ///
    /// Two paths meeting at the same node (the diamond pattern) each
    /// contribute: the walk keys partial rows on the full path prefix
    /// and collapses by terminal node only afterwards, so a component
    /// reached via two sub-assemblies needing 3 and 4 units reports 7.
    pub fn path_aggregate(
        &self,
        start: NodeId,
        opts: &AggregateOptions,
    ) -> Result<PathAggregateResult> {
        ident::validate_identifier(&opts.value_col)?;
        let max_depth = self.limits().clamp_depth(opts.max_depth);
        if max_depth == 0 {
            return Ok(PathAggregateResult {
                nodes: Vec::new(),
                aggregated_values: HashMap::new(),
                operation: opts.operation,
                value_column: opts.value_col.clone(),
                max_depth,
                nodes_visited: 0,
            });
        }

        let cap = self.limits().path_row_cap();
        let sql = builder::aggregate_walk(self.schema(), &opts.value_col, opts.operation);
        // The walk's LIMIT counts the seed row, which the outer SELECT
        // filters out; allow for it so a truncated walk is still
        // detectable as more than `cap` visible rows.
        let params: Vec<rusqlite::types::Value> = vec![
            start.into(),
            start.into(),
            i64::from(max_depth).into(),
            (cap as i64 + 2).into(),
        ];
        let rows = store::query_rows(
            self.conn,
            self.limits().statement_timeout,
            &sql,
            &params,
            |row| Ok((row.get::<_, NodeId>(0)?, row.get::<_, Option<f64>>(1)?)),
        )?;
        if rows.len() > cap {
            return Err(GraphError::SafetyLimitExceeded(format!(
                "aggregation walk produced more than {cap} path rows"
            )));
        }
        debug!(rows = rows.len(), op = opts.operation.as_str(), "aggregation walk complete");

        // Collapse by terminal node with the cross-path combiner. Rows
        // whose accumulator is NULL (a NULL edge value on the path) are
        // dropped, matching SQL aggregate semantics.
        let mut aggregated: HashMap<NodeId, f64> = HashMap::new();
        for (node, acc) in rows {
            let Some(acc) = acc else { continue };
            aggregated
                .entry(node)
                .and_modify(|current| {
                    *current = match opts.operation {
                        AggregateOp::Sum | AggregateOp::Multiply => *current + acc,
                        AggregateOp::Max => current.max(acc),
                        AggregateOp::Min | AggregateOp::Count => current.min(acc),
                    }
                })
                .or_insert(acc);
        }

        let ids: Vec<NodeId> = {
            let mut ids: Vec<NodeId> = aggregated.keys().copied().collect();
            ids.sort_unstable();
            ids
        };
        let mut nodes = self.hydrate(&ids, None)?;
        for node in &mut nodes {
            if let Some(&value) = aggregated.get(&node.id) {
                if let Some(number) = serde_json::Number::from_f64(value) {
                    node.fields
                        .insert("aggregated_value".to_string(), serde_json::Value::Number(number));
                }
            }
        }

        Ok(PathAggregateResult {
            nodes,
            nodes_visited: aggregated.len(),
            aggregated_values: aggregated,
            operation: opts.operation,
            value_column: opts.value_col.clone(),
            max_depth,
        })
    }
}
