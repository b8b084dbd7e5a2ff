//! Error handling foundation for the Agent Factory crates.
//!
//! Only the `Result` alias lives here. Each crate owns its domain error enums
//! and layers context onto a `rootcause::Report` as errors cross crate
//! boundaries.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_alias_carries_ok_values() {
        let ok: Result<&str> = Ok("graph");
        assert_eq!(ok.expect("should be ok"), "graph");
    }
}
