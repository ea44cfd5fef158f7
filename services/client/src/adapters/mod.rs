pub mod analysis;
pub mod http;
pub mod insights;
pub mod memory;
pub mod store;

pub use analysis::HttpAnalysisService;
pub use http::build_http_client;
pub use insights::HttpInsightsService;
pub use memory::{MemoryAnalysisService, MemoryDocumentStore, MemoryInsightsService};
pub use store::HttpDocumentStore;
