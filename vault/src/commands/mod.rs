pub mod address;
pub mod info;
pub mod keygen;
pub mod message;
pub mod vault;
