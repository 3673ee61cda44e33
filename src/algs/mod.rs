//! Built-in vertex programs and map-reduce jobs.

pub mod count;
pub mod group_count;
pub mod pagerank;

pub use count::CountMapReduce;
pub use group_count::GroupCountMapReduce;
pub use pagerank::{PAGE_RANK, PageRankBuilder, PageRankMapReduce, PageRankVertexProgram};
