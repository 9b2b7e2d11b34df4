pub mod check;
pub mod locate;
pub mod marker;
pub mod mount;
pub mod resolve;
pub mod schema;
pub mod select;
