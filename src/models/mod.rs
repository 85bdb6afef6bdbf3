mod chunk;
mod context;
mod document;
mod query;
mod response;

pub use chunk::*;
pub use context::*;
pub use document::*;
pub use query::*;
pub use response::*;
