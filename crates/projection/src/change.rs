//! Change states shared by the reachability and matchability oracles.

/// How a node's membership in a set changed over a batch.
///
/// The four states are the permutations of "was in the set at the start of the
/// batch" and "is in the set now".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeState {
    /// Neither before nor after.
    StayedOut,
    /// Only after.
    Entered,
    /// Both before and after.
    StayedIn,
    /// Only before.
    Exited,
}

impl ChangeState {
    /// Builds the state from the two endpoint memberships.
    #[inline]
    pub fn from_endpoints(was: bool, is: bool) -> Self {
        match (was, is) {
            (false, false) => ChangeState::StayedOut,
            (false, true) => ChangeState::Entered,
            (true, true) => ChangeState::StayedIn,
            (true, false) => ChangeState::Exited,
        }
    }

    /// Returns true for `Entered` and `Exited`.
    #[inline]
    pub fn is_transition(self) -> bool {
        matches!(self, ChangeState::Entered | ChangeState::Exited)
    }

    /// Returns true if the node was in the set at the start of the batch.
    #[inline]
    pub fn was_in(self) -> bool {
        matches!(self, ChangeState::StayedIn | ChangeState::Exited)
    }

    /// Returns true if the node is in the set now.
    #[inline]
    pub fn is_in(self) -> bool {
        matches!(self, ChangeState::StayedIn | ChangeState::Entered)
    }

    /// Folds one more per-pattern state into an accumulated one.
    ///
    /// `StayedIn` absorbs everything. Opposite transitions meet at `StayedIn`:
    /// a node matching one pattern before and another after matched the pattern
    /// set at both endpoints. Otherwise the latest transition wins.
    #[inline]
    pub fn combine(self, next: ChangeState) -> ChangeState {
        match (self, next) {
            (ChangeState::StayedIn, _) | (_, ChangeState::StayedIn) => ChangeState::StayedIn,
            (ChangeState::Exited, ChangeState::Entered)
            | (ChangeState::Entered, ChangeState::Exited) => ChangeState::StayedIn,
            (acc, ChangeState::StayedOut) => acc,
            (_, transition) => transition,
        }
    }

    /// Folds an ordered sequence of per-pattern states, starting at `StayedOut`.
    pub fn fold<I>(states: I) -> ChangeState
    where
        I: IntoIterator<Item = ChangeState>,
    {
        let mut acc = ChangeState::StayedOut;
        for state in states {
            acc = acc.combine(state);
            if acc == ChangeState::StayedIn {
                break;
            }
        }
        acc
    }
}

/// How a node that stayed inside the observed region moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Movement {
    /// Same parent, same relative position.
    Stable,
    /// Different parent than at the start of the batch.
    Reparented,
    /// Same parent, different position among the siblings that stayed.
    Reordered,
}
