mod subject;
mod token;
mod user;

pub use subject::*;
pub use token::*;
pub use user::*;
