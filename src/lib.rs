//! Architect presenter: configuration-driven presentation of records into
//! filtered, paginated, ordered and association-hydrated API responses.

pub mod config;
pub mod error;
pub mod handlers;
pub mod inflect;
pub mod memory;
pub mod presenter;
pub mod record;
pub mod registry;
pub mod response;
pub mod routes;
pub mod scope;
pub mod service;
pub mod state;
pub mod value;

pub use config::{ConfigValue, Configuration, InheritableAppendList, PresentingSettings};
pub use error::{AppError, ConfigError, ScopeError};
pub use memory::{MemoryScope, MemoryStore};
pub use presenter::{
    ApiFilter, ApiOrder, AssociationOptions, DeclaredPresenter, FieldDescriptor, FieldOptions, FieldType,
    FilterOptions, Presented, Presenter, PresenterDefinition, Slot,
};
pub use record::{Record, RecordRef, Reflection, Related};
pub use registry::{global, install_global, PresenterRegistry};
pub use response::PresentedResponse;
pub use routes::{common_routes, common_routes_with_ready, presenting_routes};
pub use scope::{BoxScope, Condition, Direction, Operator, Scope, ScopeSource};
pub use service::{validate, PresentParams, PresenterCollection, PresentingOptions};
pub use state::PresentingState;
pub use value::{FieldValue, Struct};
