pub mod npm;

pub use npm::NpmRegistry;
