//! Procedural grid-city road layouts: generation, the road graph
//! distilled from them, and vehicle route planning across that graph.

pub mod block;
pub mod borders;
pub mod error;
pub mod graph;
pub mod layout;
pub mod path;

pub use block::{Block, Direction};
pub use borders::BorderPoints;
pub use error::CityMapError;
pub use graph::{Edge, RoadGraph, VertexId};
pub use layout::CityLayout;
pub use path::{plan, Path};
