/// Database Module
///
/// The database layer is split into three concerns:
/// - **Connection Management** (`connection.rs`): opening, creating and closing databases
/// - **Batch Execution** (`batch.rs`): splitting scripts and running them statement by statement
/// - **Query Execution** (`query.rs`): read queries and value formatting
///
/// All operations return the crate-wide `SeedError`.
pub mod batch;
pub mod connection;
pub mod query;

pub use batch::*;
pub use connection::*;
pub use query::*;
