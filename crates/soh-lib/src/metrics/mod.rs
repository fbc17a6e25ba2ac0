pub mod quality;
pub mod soh;
