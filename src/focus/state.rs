//! Focus slot transitions.
//!
//! Pure, synchronous state machine behind [`AudioFocus`](super::AudioFocus). Every
//! operation returns the notifications to deliver (in delivery order) and the
//! shift to broadcast; nothing here performs I/O.

use std::collections::HashMap;

use super::request::{FocusRequest, FocusResult, FocusShiftKey};
use crate::apps::AppEvent;

/// A callback owed to an app, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Notification {
    pub app_id: String,
    pub event: AppEvent,
}

impl Notification {
    fn gain(req: &FocusRequest) -> Self {
        Self {
            app_id: req.app_id.clone(),
            event: AppEvent::FocusGain { id: req.id },
        }
    }

    fn loss(req: &FocusRequest, transient: bool, may_duck: bool) -> Self {
        Self {
            app_id: req.app_id.clone(),
            event: AppEvent::FocusLoss {
                id: req.id,
                transient,
                may_duck,
            },
        }
    }
}

/// `[new holder, previous holder]`.
pub(super) type Shift = (Option<FocusRequest>, Option<FocusRequest>);

#[derive(Debug)]
pub(super) struct Outcome {
    pub result: FocusResult,
    pub notifications: Vec<Notification>,
    pub shifts: Vec<Shift>,
}

impl Outcome {
    fn silent(result: FocusResult) -> Self {
        Self {
            result,
            notifications: Vec::new(),
            shifts: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct FocusState {
    pub transient: Option<FocusRequest>,
    pub lasting: Option<FocusRequest>,
    pub shift_counts: HashMap<FocusShiftKey, u64>,
}

impl FocusState {
    /// Transient holder if present, else lasting holder.
    pub fn current(&self) -> Option<&FocusRequest> {
        self.transient.as_ref().or(self.lasting.as_ref())
    }

    fn held(&self, app_id: &str, id: i32) -> Option<&FocusRequest> {
        [self.transient.as_ref(), self.lasting.as_ref()]
            .into_iter()
            .flatten()
            .find(|r| r.is(app_id, id))
    }

    fn count(&mut self, req: &FocusRequest) {
        *self.shift_counts.entry(req.shift_key()).or_insert(0) += 1;
    }

    pub fn request(&mut self, req: FocusRequest) -> Outcome {
        if let Some(held) = self.held(&req.app_id, req.id) {
            let result = if *held == req {
                FocusResult::Granted
            } else {
                FocusResult::RequestNotMatch
            };
            return Outcome::silent(result);
        }

        if let Some(holder) = self.current() {
            if holder.exclusive && holder.app_id != req.app_id {
                return Outcome::silent(FocusResult::Failed);
            }
        }

        let (notifications, previous) = if req.transient {
            self.shift_transient(&req)
        } else {
            self.shift_lasting(&req)
        };
        self.count(&req);

        Outcome {
            result: FocusResult::Granted,
            notifications,
            shifts: vec![(Some(req), previous)],
        }
    }

    fn shift_transient(&mut self, req: &FocusRequest) -> (Vec<Notification>, Option<FocusRequest>) {
        let mut notes = Vec::new();
        let previous = if let Some(old) = self.transient.take() {
            notes.push(Notification::loss(&old, false, false));
            Some(old)
        } else if let Some(lasting) = &self.lasting {
            notes.push(Notification::loss(lasting, true, req.may_duck));
            Some(lasting.clone())
        } else {
            None
        };
        notes.push(Notification::gain(req));
        self.transient = Some(req.clone());
        (notes, previous)
    }

    fn shift_lasting(&mut self, req: &FocusRequest) -> (Vec<Notification>, Option<FocusRequest>) {
        let mut notes = Vec::new();

        let evicted_transient = if self
            .transient
            .as_ref()
            .is_some_and(|t| t.app_id == req.app_id)
        {
            self.transient.take()
        } else {
            None
        };
        if let Some(t) = &evicted_transient {
            notes.push(Notification::loss(t, false, false));
        }

        let old_lasting = self.lasting.take();
        if let Some(old) = &old_lasting {
            notes.push(Notification::loss(old, false, false));
        }

        match &self.transient {
            // Parked behind another app's interruption until it is abandoned.
            Some(t) => notes.push(Notification::loss(req, true, t.may_duck)),
            None => notes.push(Notification::gain(req)),
        }
        self.lasting = Some(req.clone());
        (notes, old_lasting.or(evicted_transient))
    }

    /// Removes `(app_id, id)`; `None` when no slot matches.
    pub fn abandon(&mut self, app_id: &str, id: i32) -> Option<Outcome> {
        let removed = take_if(&mut self.transient, |t| t.is(app_id, id))
            .or_else(|| take_if(&mut self.lasting, |l| l.is(app_id, id)))?;
        Some(self.after_removal(removed))
    }

    /// Removes every slot held by `app_id`, regardless of request id.
    pub fn remove_app(&mut self, app_id: &str) -> Outcome {
        let transient = take_if(&mut self.transient, |r| r.app_id == app_id);
        let lasting = take_if(&mut self.lasting, |r| r.app_id == app_id);

        let mut out = Outcome::silent(FocusResult::Granted);
        if let Some(t) = transient {
            if let Some(l) = &self.lasting {
                out.notifications.push(Notification::gain(l));
            }
            self.count(&t);
            out.shifts.push((self.current().cloned(), Some(t)));
        }
        if let Some(l) = lasting {
            self.count(&l);
            out.shifts.push((self.current().cloned(), Some(l)));
        }
        out
    }

    fn after_removal(&mut self, removed: FocusRequest) -> Outcome {
        let mut notifications = Vec::new();
        if removed.transient {
            if let Some(lasting) = &self.lasting {
                notifications.push(Notification::gain(lasting));
            }
        }
        self.count(&removed);
        Outcome {
            result: FocusResult::Granted,
            notifications,
            shifts: vec![(self.current().cloned(), Some(removed))],
        }
    }

    /// Clears both slots; holders are told they lost focus.
    pub fn clear(&mut self) -> Outcome {
        let previous = self.current().cloned();
        let mut notifications = Vec::new();
        for req in [self.transient.take(), self.lasting.take()].into_iter().flatten() {
            notifications.push(Notification::loss(&req, false, false));
            self.count(&req);
        }
        Outcome {
            result: FocusResult::Granted,
            notifications,
            shifts: vec![(None, previous)],
        }
    }
}

fn take_if(slot: &mut Option<FocusRequest>, pred: impl Fn(&FocusRequest) -> bool) -> Option<FocusRequest> {
    if slot.as_ref().is_some_and(pred) {
        slot.take()
    } else {
        None
    }
}
