//! Browser-like event delivery for the headless document.

use crate::dialog::Dialog;
use crate::dom::{Click, Disposition, KeyPress, Listener};

use super::{HeadlessDom, NodeId};

/// Native events the headless document can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    Click(Click<NodeId>),
    Keydown(KeyPress<NodeId>),
    /// Something changed at or below this node.
    Mutation(NodeId),
}

impl DomEvent {
    pub fn click(target: NodeId) -> Self {
        DomEvent::Click(Click::on(target))
    }

    pub fn key(key: &str, target: NodeId) -> Self {
        DomEvent::Keydown(KeyPress::new(key, target))
    }

    pub fn shift_key(key: &str, target: NodeId) -> Self {
        DomEvent::Keydown(KeyPress::new(key, target).with_shift())
    }
}

/// Element a listener is registered on; `None` for the document.
fn registered_on(listener: &Listener<NodeId>) -> Option<NodeId> {
    match listener {
        Listener::TriggerClick | Listener::DismissClick => None,
        Listener::DialogKeydown(node)
        | Listener::ClosingClick(node)
        | Listener::TriggerKeydown(node)
        | Listener::Mutations(node) => Some(*node),
    }
}

impl HeadlessDom {
    /// Deliver `event` to `dialogs`.
    ///
    /// Document capture listeners run first, then listeners on the target and
    /// its ancestors, innermost first, until one stops propagation.  The set
    /// of listeners is fixed when dispatch starts: a listener added by a
    /// handler does not see this event, one removed by a handler no longer
    /// runs.
    pub fn dispatch(
        &self,
        dialogs: &mut [&mut Dialog<HeadlessDom>],
        event: &DomEvent,
    ) -> Disposition {
        let snapshot: Vec<(usize, Listener<NodeId>)> = dialogs
            .iter()
            .enumerate()
            .flat_map(|(index, dialog)| {
                dialog
                    .listeners()
                    .iter()
                    .cloned()
                    .map(move |listener| (index, listener))
            })
            .collect();

        let still_attached =
            |dialog: &Dialog<HeadlessDom>, listener: &Listener<NodeId>| dialog.listeners().contains(listener);

        match event {
            DomEvent::Click(click) => {
                for (index, listener) in &snapshot {
                    let dialog = &mut *dialogs[*index];
                    if !still_attached(dialog, listener) {
                        continue;
                    }
                    match listener {
                        Listener::TriggerClick => dialog.on_trigger_click(click),
                        Listener::DismissClick => dialog.on_dismiss_click(click),
                        _ => {}
                    }
                }

                self.bubble(dialogs, &snapshot, click.target, |dialog, listener| {
                    if let Listener::ClosingClick(_) = listener {
                        dialog.on_closing_click();
                    }
                    Disposition::default()
                })
            }
            DomEvent::Keydown(key) => {
                self.bubble(dialogs, &snapshot, key.target, |dialog, listener| match listener {
                    Listener::DialogKeydown(_) => dialog.on_dialog_keydown(key),
                    Listener::TriggerKeydown(_) => {
                        dialog.on_trigger_keydown(key);
                        Disposition::default()
                    }
                    _ => Disposition::default(),
                })
            }
            DomEvent::Mutation(target) => {
                for (index, listener) in &snapshot {
                    if let Listener::Mutations(root) = listener {
                        if self.tree.borrow().contains(*root, *target) {
                            dialogs[*index].refresh_focusable_elements();
                        }
                    }
                }
                Disposition::default()
            }
        }
    }

    fn bubble(
        &self,
        dialogs: &mut [&mut Dialog<HeadlessDom>],
        snapshot: &[(usize, Listener<NodeId>)],
        target: NodeId,
        mut handle: impl FnMut(&mut Dialog<HeadlessDom>, &Listener<NodeId>) -> Disposition,
    ) -> Disposition {
        let mut total = Disposition::default();
        let mut cursor = Some(target);

        while let Some(node) = cursor {
            let mut here = Disposition::default();
            for (index, listener) in snapshot {
                if registered_on(listener) != Some(node) {
                    continue;
                }
                let dialog = &mut *dialogs[*index];
                if !dialog.listeners().contains(listener) {
                    continue;
                }
                if matches!(listener, Listener::Mutations(_)) {
                    continue;
                }
                here = here.merge(handle(dialog, listener));
            }

            total = total.merge(here);
            if here.stop_propagation {
                break;
            }
            cursor = self.tree.borrow().parent(node);
        }

        total
    }
}
