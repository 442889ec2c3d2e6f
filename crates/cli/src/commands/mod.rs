pub mod chat;
pub mod onboard;
pub mod pack;
pub mod pricing;
pub mod serve;
