pub mod clean;
pub mod completions;
pub mod extract;
pub mod hash;
pub mod load;
pub mod name;
pub mod platform;
