//! Reset taxonomy (`SPEC_FULL.md` §4.3).

use hwsim_types::Sdata;

/// The four reset behaviors a [`crate::node::NodeKind::Reset`] node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ResetKind {
    /// Checked at the register's clock edge; when asserted (signal = 1), the reset value wins.
    #[strum(serialize = "sync_active_high")]
    SyncActiveHigh,
    /// Checked at the register's clock edge; when asserted (signal = 0), the reset value wins.
    #[strum(serialize = "sync_active_low")]
    SyncActiveLow,
    /// Forces the register's current value immediately, independent of the clock.
    #[strum(serialize = "async_active_high")]
    AsyncActiveHigh,
    /// Forces the register's current value immediately, independent of the clock.
    #[strum(serialize = "async_active_low")]
    AsyncActiveLow,
}

impl ResetKind {
    /// True for the two `async_*` variants.
    pub const fn is_async(self) -> bool {
        matches!(self, Self::AsyncActiveHigh | Self::AsyncActiveLow)
    }

    /// True for the two `*_active_high` variants.
    const fn is_active_high(self) -> bool {
        matches!(self, Self::SyncActiveHigh | Self::AsyncActiveHigh)
    }

    /// Whether this reset is currently asserted, given the reset signal's sampled value.
    pub fn is_asserted(self, signal: &Sdata) -> bool {
        let high = signal.is_one();
        if self.is_active_high() {
            high
        } else {
            !high
        }
    }
}
