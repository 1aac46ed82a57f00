pub mod bot_signatures;
pub mod classifier;
pub mod ip_resolver;
pub mod policy;
pub mod reputation;
