pub mod event;
pub mod showtime;
pub mod user;

pub use event::*;
pub use showtime::*;
pub use user::*;
