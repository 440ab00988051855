pub mod csv;
pub mod files;
pub mod sessions;
pub mod settings;
pub mod state;
pub mod tasks;

pub use files::{
    append_to_file, atomic_write, backups_dir, ensure_data_dir, get_data_dir, init_local_data_dir,
    logs_dir, read_file, report_file, sessions_file, settings_file, state_file, tasks_file,
};
pub use sessions::{SessionFilter, SessionLog, SessionQuery, SESSIONS_HEADER};
pub use settings::{load_settings, save_settings, Settings};
pub use state::{load_state, save_state, TrackerState};
pub use tasks::{TaskStore, TASKS_HEADER};
