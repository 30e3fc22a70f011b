pub mod capability;
pub mod decision;
pub mod deployment;
