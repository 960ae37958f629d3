//! Network-analysis handlers over a budget-bounded graph snapshot.

use std::collections::HashMap;

use crate::error::{GraphError, Result};
use crate::model::{CentralityScore, ComponentsResult, Direction, NodeId};
use crate::sql::builder;
use crate::store;

use super::VirtualGraph;

/// Disjoint-set forest over node indexes.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

impl VirtualGraph<'_> {
    /// Ranks nodes by degree in the requested direction, highest
    /// first, ties broken by ascending node id. Soft-deleted nodes are
    /// left out of the ranking when the schema declares the column.
    pub fn degree_centrality(
        &self,
        direction: Direction,
        top_k: usize,
    ) -> Result<Vec<CentralityScore>> {
        let sql = builder::degree_group(self.schema(), direction);
        let params: Vec<rusqlite::types::Value> = vec![(top_k as i64).into()];
        store::query_rows(
            self.conn,
            self.limits().statement_timeout,
            &sql,
            &params,
            |row| {
                Ok(CentralityScore {
                    node: row.get(0)?,
                    degree: row.get::<_, i64>(1)?.max(0) as u64,
                })
            },
        )
    }

    /// Partitions the live graph into weakly connected components.
    ///
    /// The node and edge sets are fetched under the safety budgets;
    /// a graph larger than the node budget (or an edge set beyond the
    /// path row cap) raises `SafetyLimitExceeded` rather than loading
    /// unbounded state. Components come back largest first with
    /// members ascending; nodes without edges form singleton
    /// components.
    pub fn connected_components(&self) -> Result<ComponentsResult> {
        let timeout = self.limits().statement_timeout;
        let count_sql = builder::node_count(self.schema());
        let live = store::query_rows(self.conn, timeout, &count_sql, &[], |row| {
            row.get::<_, i64>(0)
        })?
        .into_iter()
        .next()
        .unwrap_or(0);
        if live > self.limits().max_nodes as i64 {
            return Err(GraphError::SafetyLimitExceeded(format!(
                "graph has {live} live nodes, limit {}",
                self.limits().max_nodes
            )));
        }

        let ids_sql = builder::all_node_ids(self.schema());
        let ids = store::query_rows(self.conn, timeout, &ids_sql, &[], |row| {
            row.get::<_, NodeId>(0)
        })?;
        let index_of: HashMap<NodeId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let cap = self.limits().path_row_cap();
        let edges_sql = builder::all_edges(self.schema());
        let edge_params: Vec<rusqlite::types::Value> = vec![(cap as i64 + 1).into()];
        let edges = store::query_rows(self.conn, timeout, &edges_sql, &edge_params, |row| {
            Ok((row.get::<_, NodeId>(0)?, row.get::<_, NodeId>(1)?))
        })?;
        if edges.len() > cap {
            return Err(GraphError::SafetyLimitExceeded(format!(
                "graph has more than {cap} live edges"
            )));
        }

        let mut forest = UnionFind::new(ids.len());
        for (from, to) in edges {
            if let (Some(&a), Some(&b)) = (index_of.get(&from), index_of.get(&to)) {
                forest.union(a, b);
            }
        }

        let mut grouped: HashMap<usize, Vec<NodeId>> = HashMap::new();
        for (index, &id) in ids.iter().enumerate() {
            let root = forest.find(index);
            grouped.entry(root).or_default().push(id);
        }
        let mut components: Vec<Vec<NodeId>> = grouped.into_values().collect();
        for members in &mut components {
            members.sort_unstable();
        }
        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

        Ok(ComponentsResult {
            component_count: components.len(),
            nodes_seen: ids.len(),
            components,
        })
    }
}
