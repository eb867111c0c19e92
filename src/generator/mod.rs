pub mod generator;
pub mod relay;
pub mod source;

pub use generator::*;
pub use relay::*;
pub use source::*;
