//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `CategoryId` where a `BudgetPeriodId` is expected.
//! All identities are database-assigned `BIGSERIAL` values.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wraps a raw database identity.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the inner database identity.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

typed_id!(WorkspaceId, "Unique identifier for a workspace (tenant).");
typed_id!(BudgetAccountId, "Unique identifier for a budget account.");
typed_id!(BudgetPeriodId, "Unique identifier for a budget period.");
typed_id!(CategoryId, "Unique identifier for a category.");
typed_id!(TransactionId, "Unique identifier for a transaction.");
typed_id!(
    CurrencyExchangeId,
    "Unique identifier for a currency exchange."
);
typed_id!(
    PlannedTransactionId,
    "Unique identifier for a planned transaction."
);
typed_id!(PeriodBalanceId, "Unique identifier for a period balance row.");
