pub mod analysis;
pub mod config;
pub mod error;
pub mod jan;
pub mod model;

pub use analysis::{AccordionAnalysis, AiAnalysis, FlatAnalysis, LegacyAnalysis};
pub use config::FinderConfig;
pub use error::{ConfigError, ErrorKind};
pub use model::{InventoryDetail, Product, SearchMode, SearchQuery, SearchResult};
