pub mod approval;
pub mod group;
pub mod identity;
