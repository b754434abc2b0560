pub mod filter;
pub mod memory_store;
pub mod parser;
pub mod query;
pub mod session;
pub mod store;

#[cfg(feature = "neo4j")]
pub mod neo4j_storage;

pub use filter::*;
pub use memory_store::*;
pub use parser::{
    node_document, parse_record, parse_record_reserving, parse_records, Document, IDENTITY_KEY,
    SHADOWED_FIELDS_KEY, SHADOWED_PROPERTIES_KEY,
};
pub use query::{dependency_ids, GraphQuery, QueryParam, QueryShape};
pub use session::*;
pub use store::*;

#[cfg(feature = "neo4j")]
pub use neo4j_storage::*;
