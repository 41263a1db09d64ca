pub mod init;
pub mod feed;
pub mod reconcile;
pub mod legacy;
