pub mod macros;
pub mod structs;
mod structs_tests;

pub use structs::Direction;
pub use structs::ElevatorStatistics;
pub use structs::Request;
pub use structs::RequestError;
