pub mod prelude;

pub mod identities;
