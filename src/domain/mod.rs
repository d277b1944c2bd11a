//! Core domain: entities, value objects, state machines and tier math.
//!
//! Nothing in this module performs I/O; use cases compose it with the
//! ports in `crate::ports`.

pub mod entities;
pub mod errors;
pub mod page_state;
pub mod tiering;
pub mod value_objects;

pub use entities::*;
pub use errors::{DomainError, DomainResult};
pub use page_state::PageStatus;
pub use value_objects::{
    Category, Country, Currency, Language, PaymentMethod, PaymentMethods, ProductCount,
    RankingCriteria, ScanId, Url,
};
