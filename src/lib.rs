pub mod ast;
pub mod engine;
pub mod error;
pub mod field;
pub mod parser;
pub mod record;
pub mod store;
pub mod value;

pub use ast::{Assignment, Command, CompareOp, Condition, SortDirection, SortKey};
pub use engine::Engine;
pub use error::{ParseError, ValueError};
pub use field::Field;
pub use record::Record;
pub use store::Store;
pub use value::{Status, Time, Value};
