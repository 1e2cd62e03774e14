pub mod identity;

pub use identity::{
    run_identity_checks, summarize_checks, AuditSubject, CategorySummary, CheckCategory,
    IdentityCheckResult, IdentitySummary,
};
