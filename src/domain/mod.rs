pub mod battery;
pub mod forecast;
pub mod prices;
pub mod schedule;
pub mod validate;

pub use battery::*;
pub use forecast::*;
pub use prices::*;
pub use schedule::*;
pub use validate::*;
