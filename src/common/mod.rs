pub mod defaults;
pub mod errors;

pub mod ids;

pub use ids::SeqId;
