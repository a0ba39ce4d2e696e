//! Guided Tour Library
//!
//! Multi-step guided tours over a lightweight page model, with seen-state
//! persisted through a storage adapter that falls back to local storage.

pub mod app;
pub mod cli;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod overlay;
pub mod page;
pub mod scheduler;
pub mod step;
pub mod storage;
pub mod theme;
pub mod tour;
pub mod types;

// Re-export main types for convenience
pub use config_file::TourDefinition;
pub use engine::{EngineConfig, StepStatus, StepTour, TourEngine, TourEvent};
pub use error::{StorageError, TourError};
pub use highlight::{ElementHighlighter, HighlightStyle};
pub use page::{ClickEvent, ElementId, Page};
pub use scheduler::Scheduler;
pub use step::{AttachTo, Button, NavLabels, StepConfig, StepSpec};
pub use storage::{
    BackendMode, FileStorage, LocalBackend, MemoryStorage, MemoryUserData, StorageAdapter,
    StoredValue, UnsupportedUserData, UserDataBackend,
};
pub use tour::{GuidedTour, TourEnv, TourOptions, TourState};
pub use types::{ButtonStyle, EngineAction, Placement, StepPosition};
