//! Quantity arithmetic for cart lines.
//!
//! | Operation      | Existing | Request | Result                    |
//! |----------------|----------|---------|---------------------------|
//! | merge (add)    | `e`      | `q > 0` | `min(e + q, cap)`         |
//! | set            | any      | `q <= 0`| line removed              |
//! | set            | any      | `q > 0` | `min(q, cap)`             |

use std::num::NonZeroU32;

/// Default upper bound on a single line's quantity.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// Upper bound on a line's quantity. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantityCap(NonZeroU32);

impl Default for QuantityCap {
    fn default() -> Self {
        Self::new(MAX_LINE_QUANTITY)
    }
}

impl QuantityCap {
    /// A cap of zero is raised to one.
    pub fn new(cap: u32) -> Self {
        Self(NonZeroU32::new(cap).unwrap_or(NonZeroU32::MIN))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Accumulate `added` onto `existing`, saturating at the cap.
    pub fn merge(self, existing: u32, added: NonZeroU32) -> u32 {
        existing.saturating_add(added.get()).min(self.get())
    }

    /// Interpret a replacement quantity.
    pub fn set(self, requested: i64) -> SetOutcome {
        if requested <= 0 {
            return SetOutcome::Remove;
        }
        let clamped = u32::try_from(requested)
            .unwrap_or(u32::MAX)
            .min(self.get());
        SetOutcome::Replace(clamped)
    }
}

/// What a replacement quantity means for the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOutcome {
    Remove,
    Replace(u32),
}
