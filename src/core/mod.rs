pub mod dispatcher;
pub mod etl;
pub mod expander;
pub mod export;
pub mod formatter;
pub mod ingest;
pub mod reducer;
pub mod resolver;

pub use crate::domain::model::{InputRow, OutputRecord, ResolutionReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RegistryLookup, Storage};
pub use crate::utils::error::Result;
