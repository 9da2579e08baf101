pub mod error;
pub mod film;
pub mod todo;

pub use error::*;
pub use film::*;
pub use todo::*;
