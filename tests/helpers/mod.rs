pub mod builders;

pub use builders::{bundled_schema, GroupBuilder, UserBuilder};
