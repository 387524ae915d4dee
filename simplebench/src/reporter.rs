//! Reporter contract
//!
//! Reporters turn finished result sets into whatever output they own. They
//! receive shared references only; nothing they do can change a result.

use simplebench_core::{CaseFailure, ResultSet};

/// Consumer of finished cases
pub trait Reporter {
    /// Name used in log messages
    fn name(&self) -> &str;

    /// Handle a case that measured every variation
    fn report(&mut self, results: &ResultSet) -> anyhow::Result<()>;

    /// Handle a case that aborted; ignored by default
    fn report_failure(&mut self, _failure: &CaseFailure) -> anyhow::Result<()> {
        Ok(())
    }
}
