pub mod records;
pub mod users;
