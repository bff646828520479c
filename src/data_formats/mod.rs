mod age;
mod request;
mod response;

pub use age::age_since;
pub use request::*;
pub use response::*;
