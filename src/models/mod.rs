pub mod decision;
pub mod reputation;
pub mod request;
