//! Business logic between handlers and the backend.
//!
//! Services are generic over the backend traits so the flows can be tested
//! without HTTP.

pub mod auth;
pub mod inventory;
