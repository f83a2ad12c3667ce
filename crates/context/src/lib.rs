//! Request scoped context shared between the HTTP layers and the handlers.

mod claims;

pub use claims::Claims;
