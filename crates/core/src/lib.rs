pub mod config;
pub mod converter;
pub mod cue;
pub mod dispatcher;
pub mod metadata;
pub mod paths;
pub mod pool;
pub mod process;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{AudioConverter, ConversionJob, Converter, ConverterError, ImageConverter};
pub use cue::{load_cue_sheet, CueError, CueSheet, Timestamp, Track};
pub use dispatcher::{DispatchError, Dispatcher, JobFailure, Mode, RunSummary};
pub use metadata::Metadata;
pub use pool::{PoolError, PoolStatus, WorkerPool};
pub use process::{ProcessError, ProcessPipeline, Stage};
