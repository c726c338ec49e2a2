//! Per-proxy material resources with explicit disposal.
//!
//! Every [`Material`] is registered in a [`MaterialLedger`] shared with the
//! scene graph, so a rebuild that forgets to release its predecessors shows up
//! as a growing live count.

use std::cell::Cell;
use std::rc::Rc;

use crate::spectral::StarColor;

/// Counts live materials.
///
/// Cheap to clone; all clones observe the same count.
#[derive(Clone, Debug, Default)]
pub struct MaterialLedger {
    live: Rc<Cell<usize>>,
    total_created: Rc<Cell<u64>>,
}

impl MaterialLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materials created and not yet disposed.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Number of materials ever created through this ledger.
    pub fn total_created(&self) -> u64 {
        self.total_created.get()
    }

    fn acquire(&self) {
        self.live.set(self.live.get() + 1);
        self.total_created.set(self.total_created.get() + 1);
    }

    fn release(&self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// Unlit surface color of a star proxy.
#[derive(Debug)]
pub struct Material {
    color: StarColor,
    ledger: MaterialLedger,
    disposed: bool,
}

impl Material {
    /// Create a material and register it with `ledger`.
    pub fn new(color: StarColor, ledger: &MaterialLedger) -> Self {
        ledger.acquire();
        Self {
            color,
            ledger: ledger.clone(),
            disposed: false,
        }
    }

    /// Base color.
    pub fn color(&self) -> StarColor {
        self.color
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release the material. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.ledger.release();
    }
}

impl Drop for Material {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_dispose_balance() {
        let ledger = MaterialLedger::new();
        let mut a = Material::new(StarColor(0xff0000), &ledger);
        let b = Material::new(StarColor(0x00ff00), &ledger);
        assert_eq!(ledger.live(), 2);

        a.dispose();
        assert!(a.is_disposed());
        assert_eq!(ledger.live(), 1);

        drop(b);
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.total_created(), 2);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let ledger = MaterialLedger::new();
        let mut m = Material::new(StarColor(0xffffff), &ledger);
        let _other = Material::new(StarColor(0xffffff), &ledger);
        m.dispose();
        m.dispose();
        drop(m);
        assert_eq!(ledger.live(), 1);
    }
}
