pub mod config;
pub mod load;
pub mod process;
pub mod status;

pub use load::{run_logs, run_songs};
pub use process::run_process;
pub use status::show_status;
