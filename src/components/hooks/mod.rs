pub mod use_cases;
pub mod use_office;

pub use use_cases::*;
pub use use_office::*;
