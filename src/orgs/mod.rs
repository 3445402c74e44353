mod build;
mod load;
mod model;
mod parse;

pub use build::{GraphData, build};
pub use load::{DEFAULT_INDEX_URL, IndexLocation, LoadOptions, load_org_index};
pub use model::{OrgIndex, Scope, SourceFilter};

#[cfg(test)]
pub(crate) use build::GraphEdge;
#[cfg(test)]
pub(crate) use model::{Organization, Source};
#[cfg(test)]
pub(crate) use parse::parse_org_index;
