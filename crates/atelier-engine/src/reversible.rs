//! Undo/redo over ordered groups
//!
//! Composite requests and sessions both replay their members in reverse for
//! undo and in order for redo. When a member fails part way, the members
//! already replayed are put back so the group is left where it started, and
//! the member's error is returned.

use atelier_core::{Document, Result};

/// Something the history stack can step backwards and forwards
pub trait Reversible {
    /// Restore the state from before the commit
    ///
    /// # Errors
    ///
    /// `UndoTargetMissing` when an entity the restore depends on is gone.
    fn undo(&mut self, doc: &mut Document) -> Result<()>;

    /// Re-apply the state captured at commit time
    ///
    /// # Errors
    ///
    /// `UndoTargetMissing` when an entity the replay depends on is gone.
    fn redo(&mut self, doc: &mut Document) -> Result<()>;
}

/// Undo `items` last-to-first
pub(crate) fn undo_in_reverse<T: Reversible>(items: &mut [T], doc: &mut Document) -> Result<()> {
    for i in (0..items.len()).rev() {
        if let Err(e) = items[i].undo(doc) {
            for item in items[i + 1..].iter_mut() {
                if let Err(compensation) = item.redo(doc) {
                    tracing::debug!(error = %compensation, "compensating redo failed");
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Redo `items` first-to-last
pub(crate) fn redo_in_order<T: Reversible>(items: &mut [T], doc: &mut Document) -> Result<()> {
    for i in 0..items.len() {
        if let Err(e) = items[i].redo(doc) {
            for item in items[..i].iter_mut().rev() {
                if let Err(compensation) = item.undo(doc) {
                    tracing::debug!(error = %compensation, "compensating undo failed");
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::AtelierError;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Probe {
        name: &'static str,
        fail_undo: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Reversible for Probe {
        fn undo(&mut self, _doc: &mut Document) -> Result<()> {
            if self.fail_undo {
                return Err(AtelierError::UndoTargetMissing {
                    entity_id: self.name.to_string(),
                    description: "probe".to_string(),
                });
            }
            self.log.borrow_mut().push(format!("undo {}", self.name));
            Ok(())
        }

        fn redo(&mut self, _doc: &mut Document) -> Result<()> {
            self.log.borrow_mut().push(format!("redo {}", self.name));
            Ok(())
        }
    }

    fn probes(log: &Rc<RefCell<Vec<String>>>, failing: Option<&str>) -> Vec<Probe> {
        ["r1", "r2", "r3"]
            .into_iter()
            .map(|name| Probe {
                name,
                fail_undo: failing == Some(name),
                log: log.clone(),
            })
            .collect()
    }

    #[test]
    fn test_undo_reverse_redo_forward() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut items = probes(&log, None);
        let mut doc = Document::new();

        undo_in_reverse(&mut items, &mut doc).unwrap();
        redo_in_order(&mut items, &mut doc).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["undo r3", "undo r2", "undo r1", "redo r1", "redo r2", "redo r3"]
        );
    }

    #[test]
    fn test_failed_undo_compensates() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut items = probes(&log, Some("r2"));
        let mut doc = Document::new();

        let result = undo_in_reverse(&mut items, &mut doc);

        assert!(matches!(result, Err(AtelierError::UndoTargetMissing { .. })));
        assert_eq!(*log.borrow(), vec!["undo r3", "redo r3"]);
    }
}
