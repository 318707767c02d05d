//! Service handles shared by front ends

mod archery;

pub use archery::ArcheryService;
