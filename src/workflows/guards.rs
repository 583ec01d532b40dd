// Built-in transition guards for lease applications

use super::context::WorkflowContext;

pub const HAS_REQUIRED_DATA: &str = "has_required_data";
pub const IS_AMOUNT_VALID: &str = "is_amount_valid";
pub const IS_USER_AUTHORIZED: &str = "is_user_authorized";

/// Largest lease amount that can be approved without escalation
pub const MAX_APPROVABLE_AMOUNT: f64 = 100_000.0;

const AUTHORIZED_ROLES: &[&str] = &["admin", "manager"];

/// Applicant and amount must both be present
pub fn has_required_data(context: &WorkflowContext) -> bool {
    ["user_id", "amount"]
        .iter()
        .all(|key| context.contains_key(key))
}

/// Amount must be positive and within the approval limit.
/// A missing or non-numeric amount counts as zero.
pub fn is_amount_valid(context: &WorkflowContext) -> bool {
    let amount = context.get_f64("amount").unwrap_or(0.0);
    amount > 0.0 && amount <= MAX_APPROVABLE_AMOUNT
}

pub fn is_user_authorized(context: &WorkflowContext) -> bool {
    context
        .get_str("user_role")
        .is_some_and(|role| AUTHORIZED_ROLES.contains(&role))
}
