//! Identifier types for the dispatch domain.
//!
//! Every persisted record is keyed by a database-assigned `BIGINT`. The
//! wrappers below keep task, sub-task, report, and directory identifiers from
//! being mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database identifier.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database identifier.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a customer work order.
    TaskId
);
numeric_id!(
    /// Identifier of one stage of field work within a task.
    SubTaskId
);
numeric_id!(
    /// Identifier of an immutable sub-task report.
    SubTaskReportId
);
numeric_id!(
    /// Identifier of an audit-trail row.
    SubTaskHistoryItemId
);
numeric_id!(
    /// Identifier of the customer a task was raised for.
    CustomerId
);
numeric_id!(
    /// Identifier of a partner organization.
    OrganizationId
);
numeric_id!(
    /// Identifier of a role in the user directory.
    RoleId
);
numeric_id!(
    /// Identifier of a user in the identity directory.
    ///
    /// The value `0` denotes the system actor.
    UserId
);

impl UserId {
    /// The system actor used for automatic transitions.
    pub const SYSTEM: Self = Self(0);

    /// Returns `true` when this is the system actor.
    #[must_use]
    pub const fn is_system(self) -> bool {
        self.0 == 0
    }
}
