// crates/stakewell-core/src/revision.rs
//
// Schema revisions for persisted component state.
//
// Each stateful component stores the revision its state was last
// initialized at. `initialize` walks the state forward one revision at a
// time through `migrate_from`, and refuses to run twice for the same
// revision. Loading state written by a newer build is rejected outright.

use crate::error::StakewellError;
use crate::Result;

/// State that carries an explicit schema revision.
pub trait Revisioned {
    /// Revision this build writes.
    const REVISION: u32;

    /// Revision the state was last initialized at (0 = never).
    fn revision(&self) -> u32;

    fn set_revision(&mut self, revision: u32);

    /// Upgrade the state from `from` to `from + 1`.
    fn migrate_from(&mut self, from: u32) -> Result<()>;
}

/// Bring `state` to `S::REVISION`, applying each pending migration once.
///
/// # Errors
/// `AlreadyInitialized` if the state is already at the current revision,
/// `UnsupportedRevision` if it was written by a newer build.
pub fn initialize<S: Revisioned>(state: &mut S) -> Result<()> {
    let current = state.revision();
    if current > S::REVISION {
        return Err(StakewellError::UnsupportedRevision {
            found: current,
            supported: S::REVISION,
        });
    }
    if current == S::REVISION {
        return Err(StakewellError::AlreadyInitialized { revision: current });
    }

    for from in current..S::REVISION {
        state.migrate_from(from)?;
        state.set_revision(from + 1);
        tracing::debug!("Migrated state from revision {} to {}", from, from + 1);
    }
    Ok(())
}
