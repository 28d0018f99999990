//! Error types exposed by this crate.

mod controller_error;
mod membership_error;
mod network_error;
mod storage_error;

pub use self::controller_error::ControllerError;
pub use self::membership_error::ConfigurationError;
pub use self::membership_error::JoinError;
pub use self::membership_error::LeaveError;
pub use self::network_error::NetworkError;
pub use self::storage_error::LogError;
pub use self::storage_error::StorageError;
