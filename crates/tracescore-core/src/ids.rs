//! Typed identifiers for nodes, skeletons and predicted segments.
//!
//! All three are thin `u64` newtypes. Keeping them distinct stops a segment
//! label from being passed where a skeleton id is expected, which is the
//! easiest mistake to make when wiring a node→segment lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

id_newtype!(
    /// Identity of a single skeleton node (a traced sample point).
    NodeId,
    "node"
);

id_newtype!(
    /// Identity of a ground-truth skeleton. Many nodes share one skeleton id.
    SkeletonId,
    "skeleton"
);

id_newtype!(
    /// Label of a predicted segment, as sampled from the segmentation.
    SegmentId,
    "segment"
);
