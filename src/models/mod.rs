pub mod balance;
pub mod driver;
pub mod event;
pub mod location;
pub mod offer;
pub mod order;
pub mod pool;
pub mod rating;
pub mod reference;
pub mod user;
