pub mod answer;
pub mod loaders;
pub mod scan;
pub mod student;

pub use answer::{Answer, Bucket, Direction};
pub use loaders::{
    load_roster, load_session, save_session, try_lock_session, ImportReport, SessionLock,
};
pub use scan::{DetectedCard, RejectedCard, ScanBatch, ScanEntry};
pub use student::{Student, StudentWithResult};
