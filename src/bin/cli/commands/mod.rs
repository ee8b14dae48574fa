pub mod forecast;
pub mod init;
pub mod lessons;
pub mod mistakes;
pub mod plan;
pub mod reviews;
pub mod search;
pub mod show;
