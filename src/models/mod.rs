pub mod cart;
pub mod delivery;
pub mod policy;
pub mod warehouse;
