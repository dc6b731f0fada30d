pub mod bench;
pub mod load;
pub mod show;
