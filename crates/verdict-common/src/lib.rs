use thiserror::Error;

mod macros;
pub mod monitoring;

pub use tracing;

#[derive(Error, Debug)]
pub enum Error {
    #[error("monitoring error {0}")]
    Monitoring(String),
}

#[macro_export]
macro_rules! log_if_error {
    ($e: expr) => {
        match $e {
            Ok(v) => Ok(v),
            Err(e) => {
                $crate::tracing::error!("{}", e);
                Err(e)
            },
        }
    };
}
