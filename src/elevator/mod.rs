pub mod car;

pub use car::ElevatorCar;
pub use car::ElevatorHandle;
