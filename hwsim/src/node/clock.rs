//! Clock polarity and clock-domain edge detection (`SPEC_FULL.md` §4.3).

use hwsim_types::Sdata;

/// Which transition of a clock signal a register reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ClockPolarity {
    /// Registers tick on the 0 -> 1 transition.
    #[strum(serialize = "posedge")]
    Posedge,
    /// Registers tick on the 1 -> 0 transition.
    #[strum(serialize = "negedge")]
    Negedge,
}

impl ClockPolarity {
    /// True if the transition from `prev` to `current` is this polarity's active edge.
    pub fn edge_fires(self, prev: &Sdata, current: &Sdata) -> bool {
        match self {
            Self::Posedge => prev.is_zero() && current.is_one(),
            Self::Negedge => prev.is_one() && current.is_zero(),
        }
    }
}
