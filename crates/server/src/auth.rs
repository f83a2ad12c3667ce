mod claims;
mod gate;
mod layer;

pub(crate) use layer::*;
