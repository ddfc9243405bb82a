pub mod action;
pub mod item;
pub mod remarks;
