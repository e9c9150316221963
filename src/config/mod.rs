pub mod append_list;
pub mod settings;
pub mod store;

pub use append_list::*;
pub use settings::*;
pub use store::*;
