//! Shortest-path handlers: unweighted client-side BFS and a weighted
//! recursive-CTE walk, plus the all-shortest-paths enumerator.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::model::{AllShortestPathsResult, Direction, EdgeRef, NodeId, ShortestPathResult};
use crate::safety::MAX_DEPTH;
use crate::sql::builder;
use crate::store;

use super::VirtualGraph;

/// Options for `shortest_path`.
#[derive(Debug, Clone)]
pub struct PathfindOptions {
    /// Which edge orientation(s) to follow.
    pub direction: Direction,
    /// Hop budget; clamped to the engine's depth limit.
    pub max_depth: u32,
    /// Nodes no path may pass through.
    pub excluded_nodes: Vec<NodeId>,
}

impl Default for PathfindOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Outbound,
            max_depth: MAX_DEPTH,
            excluded_nodes: Vec::new(),
        }
    }
}

/// Options for `all_shortest_paths`.
#[derive(Debug, Clone)]
pub struct AllPathsOptions {
    /// Which edge orientation(s) to follow.
    pub direction: Direction,
    /// Hop budget; clamped to the engine's depth limit.
    pub max_depth: u32,
    /// Nodes no path may pass through.
    pub excluded_nodes: Vec<NodeId>,
    /// Cap on the number of paths returned.
    pub max_paths: usize,
}

impl Default for AllPathsOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Outbound,
            max_depth: MAX_DEPTH,
            excluded_nodes: Vec::new(),
            max_paths: 100,
        }
    }
}

fn parse_path(text: &str) -> Vec<NodeId> {
    text.split(',')
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

impl VirtualGraph<'_> {
    /// Finds one shortest path from `start` to `end`.
    ///
    /// Without a weight column the answer comes from the client-side
    /// BFS (hop count); with one, a bounded recursive walk enumerates
    /// simple paths by cumulative weight. A partial answer would be
    /// misleading, so budget breaches raise instead of returning.
    /// "No path" is not an error: it is reported through the result's
    /// `error` field with `path = None`.
    pub fn shortest_path(
        &self,
        start: NodeId,
        end: NodeId,
        opts: &PathfindOptions,
    ) -> Result<ShortestPathResult> {
        if start == end {
            let path_nodes = self.hydrate_in_order(&[start])?;
            return Ok(ShortestPathResult {
                path: Some(vec![start]),
                path_nodes,
                distance: Some(0.0),
                edges: Vec::new(),
                nodes_explored: 1,
                excluded_nodes: opts.excluded_nodes.clone(),
                error: None,
            });
        }
        match self.schema().weight_col.clone() {
            Some(weight_col) => self.shortest_path_weighted(start, end, &weight_col, opts),
            None => self.shortest_path_unweighted(start, end, opts),
        }
    }

    fn no_path(
        &self,
        start: NodeId,
        end: NodeId,
        nodes_explored: usize,
        opts: &PathfindOptions,
    ) -> ShortestPathResult {
        ShortestPathResult {
            path: None,
            path_nodes: Vec::new(),
            distance: None,
            edges: Vec::new(),
            nodes_explored,
            excluded_nodes: opts.excluded_nodes.clone(),
            error: Some(format!("no path from {start} to {end}")),
        }
    }

    fn shortest_path_unweighted(
        &self,
        start: NodeId,
        end: NodeId,
        opts: &PathfindOptions,
    ) -> Result<ShortestPathResult> {
        let excluded: HashSet<NodeId> = opts.excluded_nodes.iter().copied().collect();
        let expansion = self.expand(
            &[start],
            opts.direction,
            opts.max_depth,
            &excluded,
            Some(end),
        )?;
        if !expansion.visited.contains_key(&end) {
            return Ok(self.no_path(start, end, expansion.visited.len(), opts));
        }

        let path = Self::reconstruct_path(&expansion.visited, end);
        let edges: Vec<EdgeRef> = path
            .windows(2)
            .map(|pair| EdgeRef {
                from: pair[0],
                to: pair[1],
                weight: expansion.visited.get(&pair[1]).and_then(|v| v.weight),
            })
            .collect();
        let path_nodes = self.hydrate_in_order(&path)?;
        let distance = (path.len() - 1) as f64;
        Ok(ShortestPathResult {
            path: Some(path),
            path_nodes,
            distance: Some(distance),
            edges,
            nodes_explored: expansion.visited.len(),
            excluded_nodes: opts.excluded_nodes.clone(),
            error: None,
        })
    }

    fn shortest_path_weighted(
        &self,
        start: NodeId,
        end: NodeId,
        weight_col: &str,
        opts: &PathfindOptions,
    ) -> Result<ShortestPathResult> {
        let depth = self.limits().clamp_depth(opts.max_depth);
        let cap = self.limits().path_row_cap();
        let sql = builder::weighted_walk(
            self.schema(),
            weight_col,
            opts.direction,
            opts.excluded_nodes.len(),
        );
        let mut params: Vec<rusqlite::types::Value> =
            vec![start.into(), start.into(), i64::from(depth).into()];
        params.extend(opts.excluded_nodes.iter().map(|&id| {
            let v: rusqlite::types::Value = id.into();
            v
        }));
        params.push((cap as i64 + 1).into());

        let rows = store::query_rows(
            self.conn,
            self.limits().statement_timeout,
            &sql,
            &params,
            |row| {
                Ok((
                    row.get::<_, NodeId>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?;
        if rows.len() > cap {
            return Err(GraphError::SafetyLimitExceeded(format!(
                "weighted walk produced more than {cap} path rows"
            )));
        }
        let nodes_explored = rows.iter().map(|r| r.0).collect::<HashSet<_>>().len();
        debug!(rows = rows.len(), nodes_explored, "weighted walk complete");

        let best = rows
            .iter()
            .filter(|r| r.0 == end)
            .filter_map(|r| r.1.map(|cum| (cum, r.2.as_str())))
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.1.len().cmp(&b.1.len()))
                    .then_with(|| a.1.cmp(b.1))
            });
        let (distance, path_text) = match best {
            Some(found) => found,
            None => return Ok(self.no_path(start, end, nodes_explored, opts)),
        };

        let path = parse_path(path_text);
        let mut edges = Vec::with_capacity(path.len().saturating_sub(1));
        for pair in path.windows(2) {
            let weight = self.edge_weight(pair[0], pair[1], weight_col, opts.direction)?;
            edges.push(EdgeRef {
                from: pair[0],
                to: pair[1],
                weight,
            });
        }
        let path_nodes = self.hydrate_in_order(&path)?;
        Ok(ShortestPathResult {
            path: Some(path),
            path_nodes,
            distance: Some(distance),
            edges,
            nodes_explored,
            excluded_nodes: opts.excluded_nodes.clone(),
            error: None,
        })
    }

    fn edge_weight(
        &self,
        from: NodeId,
        to: NodeId,
        weight_col: &str,
        direction: Direction,
    ) -> Result<Option<f64>> {
        let sql = builder::edge_weight_lookup(self.schema(), weight_col, direction);
        let params: Vec<rusqlite::types::Value> = vec![from.into(), to.into()];
        Ok(store::query_rows(
            self.conn,
            self.limits().statement_timeout,
            &sql,
            &params,
            |row| row.get::<_, Option<f64>>(0),
        )?
        .into_iter()
        .next()
        .flatten())
    }

    /// Enumerates every shortest path from `start` to `end`, capped at
    /// `max_paths`.
    ///
    /// Phase one computes the shortest hop distance `D`; phase two
    /// lists all simple paths of exactly `D` hops through a bounded
    /// recursive walk. Every returned path has identical length.
    pub fn all_shortest_paths(
        &self,
        start: NodeId,
        end: NodeId,
        opts: &AllPathsOptions,
    ) -> Result<AllShortestPathsResult> {
        if start == end {
            return Ok(AllShortestPathsResult {
                paths: vec![vec![start]],
                distance: Some(0.0),
                path_count: 1,
                nodes_explored: 1,
                excluded_nodes: opts.excluded_nodes.clone(),
                error: None,
            });
        }

        let excluded: HashSet<NodeId> = opts.excluded_nodes.iter().copied().collect();
        let expansion = self.expand(
            &[start],
            opts.direction,
            opts.max_depth,
            &excluded,
            Some(end),
        )?;
        let hops = match expansion.visited.get(&end) {
            Some(visit) => visit.hop,
            None => {
                return Ok(AllShortestPathsResult {
                    paths: Vec::new(),
                    distance: None,
                    path_count: 0,
                    nodes_explored: expansion.visited.len(),
                    excluded_nodes: opts.excluded_nodes.clone(),
                    error: Some(format!("no path from {start} to {end}")),
                })
            }
        };

        let cap = self.limits().path_row_cap();
        let sql = builder::exact_length_walk(
            self.schema(),
            opts.direction,
            opts.excluded_nodes.len(),
        );
        let mut params: Vec<rusqlite::types::Value> =
            vec![start.into(), start.into(), i64::from(hops).into()];
        params.extend(opts.excluded_nodes.iter().map(|&id| {
            let v: rusqlite::types::Value = id.into();
            v
        }));
        params.push((cap as i64 + 1).into());

        let rows = store::query_rows(
            self.conn,
            self.limits().statement_timeout,
            &sql,
            &params,
            |row| {
                Ok((
                    row.get::<_, NodeId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;
        if rows.len() > cap {
            return Err(GraphError::SafetyLimitExceeded(format!(
                "path enumeration produced more than {cap} rows"
            )));
        }
        let nodes_explored = rows.iter().map(|r| r.0).collect::<HashSet<_>>().len();

        let mut paths: Vec<Vec<NodeId>> = rows
            .iter()
            .filter(|(node, _, depth)| *node == end && *depth == i64::from(hops))
            .map(|(_, text, _)| parse_path(text))
            .collect();
        paths.sort();
        paths.dedup();
        paths.truncate(opts.max_paths);

        Ok(AllShortestPathsResult {
            path_count: paths.len(),
            distance: Some(f64::from(hops)),
            paths,
            nodes_explored,
            excluded_nodes: opts.excluded_nodes.clone(),
            error: None,
        })
    }
}
