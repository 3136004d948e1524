//! Core types for Stockroom.
//!
//! Records coming from the hosted backend or from HTML forms are parsed into
//! these types at the boundary; the rest of the code never sees loose JSON.

pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod role;
pub mod session;

pub use email::{Email, EmailError};
pub use id::{ProductId, ProfileId};
pub use price::{Price, PriceError};
pub use product::{Product, ProductInput};
pub use role::{Role, RoleError};
pub use session::{AccessToken, Profile, UserSession};
