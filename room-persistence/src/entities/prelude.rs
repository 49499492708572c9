pub use super::identities::Entity as Identities;
