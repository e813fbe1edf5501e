#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use catalog::{
    CatalogLoader, CatalogProvider, HttpCatalogProvider, InMemoryCatalogProvider,
    JsonFileCatalogProvider,
};
pub use config::ExamConfig;
pub use error::{ConfigError, FetchError, LoadError, SessionError};

pub use sessions::{
    DiscardResults, ExamSession, Phase, QuestionView, ResultsSink, SessionController,
    SessionHandle, SessionRuntime, SessionSnapshot, SessionState, Transition,
};
