//! Cluster members and the configuration snapshots that list them.

mod candidates;
mod configuration;
mod endpoint;
mod member;
mod members;


pub use self::candidates::Candidates;
pub use self::configuration::Configuration;
pub use self::endpoint::Endpoint;
pub use self::endpoint::EndpointParseError;
pub use self::member::Member;
pub use self::members::Members;
