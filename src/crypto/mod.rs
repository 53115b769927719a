pub mod ct;
pub mod hkdf;
pub mod keys;
pub mod prf;
pub mod suite;
pub mod verify_data;
