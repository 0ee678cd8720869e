pub mod card;
pub mod validation;

pub use card::*;
pub use validation::*;
