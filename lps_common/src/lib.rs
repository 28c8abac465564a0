//! Types shared between the loyalty engine and the loyalty server.
//!
//! * [`Points`] is the fixed-point amount used for accruals, withdrawals and balances.
//! * [`luhn`] validates order numbers.
//! * [`Secret`] keeps passwords out of log output.
pub mod luhn;
pub mod op;
mod points;
mod secret;

pub use points::{Points, PointsConversionError, POINTS_SCALE};
pub use secret::Secret;
