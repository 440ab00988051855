pub mod error;
pub mod session;
pub mod task;

pub use error::TrackerError;
pub use session::{ActiveSession, Session};
pub use task::{validate_task_name, Task, MAX_TASK_NAME_LEN};
