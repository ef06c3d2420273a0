pub mod app;
pub mod inventory;
pub mod page;
pub mod render;
pub mod scanner;
pub mod search;

pub use app::App;
pub use inventory::{InventoryFetcher, InventoryOutcome};
pub use page::{Modal, Page, SharedPage};
pub use render::{RenderError, Renderer};
pub use scanner::{
    BarcodeDecoder, DecoderConfig, DeviceError, FacingMode, ScannerSession, ScannerState,
    Symbology, ToggleOutcome,
};
pub use search::{SearchOrchestrator, SearchOutcome};
