pub mod error;
pub mod schema;
pub mod session;
pub mod sqlite;
pub mod traits;

pub use error::StorageError;
pub use session::{RefactoringSession, SESSION_VERSION, read_session, write_session};
pub use sqlite::{SqliteHistoryStore, SqliteStoreProvider};
pub use traits::*;
