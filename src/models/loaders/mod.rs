pub mod roster_loader;
pub mod session_loader;

pub use roster_loader::{load_roster, students_from_rows, ImportReport};
pub use session_loader::{load_session, save_session, try_lock_session, SessionLock};
