pub mod audit;
pub mod calls;
pub mod domain;
pub mod outcome;
pub mod request;
pub mod validation;
pub mod verdict;

pub use audit::*;
pub use calls::*;
pub use domain::*;
pub use outcome::*;
pub use request::*;
pub use validation::*;
pub use verdict::*;
