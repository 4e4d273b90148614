pub mod attributes;
pub mod builder;
mod escape;
mod flush;
mod instance;
pub mod options;
pub(crate) mod store;
pub mod validation;

pub use attributes::{Attributes, Changes};
pub use builder::ModelBuilder;
pub use instance::Model;
pub use options::{ErrorCallback, Options, SuccessCallback};
pub use validation::Validator;
