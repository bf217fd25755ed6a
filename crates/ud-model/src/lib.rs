//! Data model for the dataset transpiler.
//!
//! - [`document`]: the output dataset document (specification, context, values)
//! - [`mapping`]: mapping configuration loaded once per conversion run
//! - [`function`]: value-function tokens parsed into a closed enum
//! - [`record`]: raw and resolved records flowing through the engine
//! - [`run`]: extraction/run configuration (TOML)

pub mod document;
pub mod error;
pub mod function;
pub mod mapping;
pub mod record;
pub mod run;

pub use document::{
    Context, Coordinates, DatasetBody, DatasetDocument, Identifier, Producer, Properties,
    PropertyDefinition, Specification, SubProperties, Values,
};
pub use error::{ModelError, Result};
pub use function::{ArithmeticOp, ValueFunction};
pub use mapping::{Configurations, MappingRule, PeriodConfig, PropertyConfig, load_property_config};
pub use record::{Period, PeriodKey, PropertyValue, RawRecord, ResolvedRecord, renumber};
pub use run::{RunConfig, load_run_config};
