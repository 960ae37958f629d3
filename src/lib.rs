//! # VGraph - Virtual Graph Queries over Relational Storage
//!
//! VGraph executes graph-style queries - traversal, pathfinding,
//! weighted path aggregation, and network analysis - directly against
//! a relational database whose schema is described by caller-supplied
//! identifier strings. No graph is materialized beyond the current
//! frontier and visited set; set work is pushed to the store as
//! batched, parameterized SQL.
//!
//! ## Quick Start
//!
//! ```rust
//! use rusqlite::Connection;
//! use vgraph::{GraphSchema, TraverseOptions, VirtualGraph};
//!
//! # fn main() -> vgraph::Result<()> {
//! let conn = Connection::open_in_memory()?;
//! conn.execute_batch(
//!     "CREATE TABLE parts (id INTEGER PRIMARY KEY, name TEXT);
//!      CREATE TABLE bom (parent_id INTEGER, child_id INTEGER, quantity REAL);
//!      INSERT INTO parts (id, name) VALUES (1, 'chassis'), (2, 'bracket');
//!      INSERT INTO bom VALUES (1, 2, 4.0);",
//! )?;
//!
//! let schema = GraphSchema::new("parts", "bom", "parent_id", "child_id");
//! let graph = VirtualGraph::new(&conn, schema)?;
//! let result = graph.traverse(1, &TraverseOptions::default())?;
//! assert_eq!(result.nodes_visited, 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Schema-agnostic**: every query is built from handler arguments;
//!   no table or column name is hard-coded
//! - **Safety budgets**: depth and node-count limits, per-query
//!   statement deadlines, and a pre-flight subgraph-size estimate
//! - **Diamond-aware aggregation**: bill-of-materials explosion that
//!   combines values across *all* paths, not just the first one found
//! - **Read-only**: the engine never writes, never opens transactions
//!
//! ## Architecture
//!
//! - **SQL Builder**: identifier allow-list validation and query text
//!   assembly; the only SQL concatenation point in the crate
//! - **Safety Layer**: budgets, limit checks, pre-flight estimation
//! - **Frontier Engine**: bounded client-side BFS with batched edge
//!   fetches
//! - **Pathfinder / Aggregator**: bounded recursive CTEs driven
//!   through the safety layer

pub mod datagen;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod ontology;
pub mod safety;
pub mod schema;
pub mod sql;

mod store;

// Re-export the main public API.
pub use crate::engine::{
    AggregateOptions, AllPathsOptions, PathfindOptions, TraverseOptions, VirtualGraph,
};
pub use crate::error::{GraphError, Result};
pub use crate::model::{
    AggregateOp, AllShortestPathsResult, CentralityScore, CollectResult, ComponentsResult,
    Direction, EdgeRef, NodeId, NodeRow, PathAggregateResult, ShortestPathResult, Termination,
    TraverseResult,
};
pub use crate::ontology::Ontology;
pub use crate::safety::{SafetyLimits, MAX_DEPTH, MAX_NODES, STATEMENT_TIMEOUT};
pub use crate::schema::GraphSchema;
