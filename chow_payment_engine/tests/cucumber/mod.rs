mod steps;
mod world;

pub use world::ChowWorld;
