//! Rule-based field extractors for utility bills.

pub mod account;
pub mod address;
pub mod consumption;
pub mod dates;
pub mod patterns;

pub use account::AccountIdExtractor;
pub use address::AddressExtractor;
pub use consumption::{EnergyWindowExtractor, VariableChargeExtractor};
pub use dates::{extract_dates, ReadingDateExtractor};
pub use patterns::*;
