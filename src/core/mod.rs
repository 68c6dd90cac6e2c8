pub mod envelope;
pub mod gateway;
pub mod options;
pub mod pagination;
pub mod proxy;
pub mod query;
pub mod symbols;
pub mod url_builder;

pub use gateway::{GatewayError, GatewayService, IncomingRequest};
pub use options::CallOptions;
pub use query::QueryParams;
pub use symbols::{EnumerationFamily, SymbolResolver};
