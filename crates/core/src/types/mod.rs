//! Domain types for adrelay
//!
//! - `platform`: platform identifiers
//! - `operation`: operations and operation requests
//! - `parameters`: request parameters and budgets
//! - `results`: normalized adapter results

mod operation;
mod parameters;
mod platform;
mod results;

pub use operation::{Operation, OperationRequest};
pub use parameters::{Budget, BudgetPeriod, Parameters};
pub use platform::Platform;
pub use results::{
    ActionResult, AdResult, AdsetResult, CampaignResult, DeliveryStatus, StatusResult,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _ = OperationRequest::new("meta", Operation::GetStatus, Parameters::new());
        let _ = Budget::daily(10.0);
        let _ = BudgetPeriod::Lifetime;
        let _ = DeliveryStatus::Unknown;
        let _ = Platform::ALL;
    }
}
