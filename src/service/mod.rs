//! MasterService: catalog-driven CRUD using the safe SQL builder.

mod crud;
mod validation;
pub use crud::{list_criteria, normalize_body, MasterService, DEFAULT_LIMIT, MAX_LIMIT};
pub use validation::RequestValidator;
