use futures::FutureExt;
use futures::future::BoxFuture;

use super::actions::ActionKind;
use super::controller::{FormController, FormError, FormResult, FormState, write_lock};
use super::validation::FieldSelection;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SavePhase {
    #[default]
    Idle,
    Normalizing,
    Validating,
    Saved,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SaveTicket(pub u64);

/// Phase of the most recent save attempt. Older attempts that are still in
/// flight run to completion but no longer move the phase.
#[derive(Debug, Default)]
pub(super) struct SaveTracker {
    phase: SavePhase,
    latest: SaveTicket,
}

pub trait SaveStrategy: Send + Sync + 'static {
    fn save(&self, form: FormController) -> BoxFuture<'static, FormResult<FormState>>;
}

impl<F> SaveStrategy for F
where
    F: Fn(FormController) -> BoxFuture<'static, FormResult<FormState>> + Send + Sync + 'static,
{
    fn save(&self, form: FormController) -> BoxFuture<'static, FormResult<FormState>> {
        (self)(form)
    }
}

/// Normalize, validate everything, then dispatch `saved`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSave;

impl SaveStrategy for StandardSave {
    fn save(&self, form: FormController) -> BoxFuture<'static, FormResult<FormState>> {
        async move { form.standard_save().await }.boxed()
    }
}

impl FormController {
    pub fn save_phase(&self) -> SavePhase {
        super::controller::read_lock(&self.save_tracker).phase
    }

    /// Saves through the configured [`SaveStrategy`].
    ///
    /// A failed attempt leaves state as normalized; nothing is rolled back.
    pub async fn save(&self) -> FormResult<FormState> {
        self.saving.save(self.clone()).await
    }

    pub async fn save_with<C>(&self, callback: C) -> FormResult<FormState>
    where
        C: FnOnce(&FormResult<FormState>),
    {
        let result = self.save().await;
        callback(&result);
        result
    }

    /// The stock pipeline, also callable from a host [`SaveStrategy`] that
    /// wraps it.
    pub async fn standard_save(&self) -> FormResult<FormState> {
        let ticket = self.begin_save();
        tracing::debug!(namespace = %self.namespace, ticket = ticket.0, "save started");

        if let Err(error) = self.normalize() {
            self.finish_save(ticket, SavePhase::Failed)?;
            return Err(error);
        }
        self.advance_save(ticket, SavePhase::Validating)?;

        let request = self.validation_request(FieldSelection::All);
        let snapshot = request.state.clone();
        match self.validation.validate(request).await {
            Ok(_) => {
                self.advance_save(ticket, SavePhase::Saved)?;
                self.dispatch.emit(ActionKind::Saved, snapshot.to_value());
                self.advance_save(ticket, SavePhase::Idle)?;
                tracing::debug!(namespace = %self.namespace, ticket = ticket.0, "save succeeded");
                Ok(snapshot)
            }
            Err(error) => {
                self.finish_save(ticket, SavePhase::Failed)?;
                tracing::debug!(namespace = %self.namespace, ticket = ticket.0, %error, "save failed");
                Err(error)
            }
        }
    }

    fn begin_save(&self) -> SaveTicket {
        let mut tracker = write_lock(&self.save_tracker);
        tracker.latest = SaveTicket(tracker.latest.0 + 1);
        tracker.phase = SavePhase::Normalizing;
        tracker.latest
    }

    fn advance_save(&self, ticket: SaveTicket, next: SavePhase) -> FormResult<()> {
        let mut tracker = write_lock(&self.save_tracker);
        if tracker.latest != ticket {
            return Ok(());
        }
        transition_save_phase(&mut tracker, next)
    }

    fn finish_save(&self, ticket: SaveTicket, outcome: SavePhase) -> FormResult<()> {
        self.advance_save(ticket, outcome)?;
        self.advance_save(ticket, SavePhase::Idle)
    }
}

fn transition_save_phase(tracker: &mut SaveTracker, next: SavePhase) -> FormResult<()> {
    let current = tracker.phase;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SavePhase::Idle, SavePhase::Normalizing)
            | (SavePhase::Normalizing, SavePhase::Validating)
            | (SavePhase::Normalizing, SavePhase::Failed)
            | (SavePhase::Validating, SavePhase::Saved)
            | (SavePhase::Validating, SavePhase::Failed)
            | (_, SavePhase::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidPhaseTransition {
            from: current,
            to: next,
        });
    }
    tracker.phase = next;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_table_rejects_skipping_validation() {
        let mut tracker = SaveTracker::default();
        transition_save_phase(&mut tracker, SavePhase::Normalizing).expect("start");
        let error = transition_save_phase(&mut tracker, SavePhase::Saved)
            .expect_err("saved requires validating");
        assert!(matches!(
            error,
            FormError::InvalidPhaseTransition {
                from: SavePhase::Normalizing,
                to: SavePhase::Saved,
            }
        ));
    }

    #[test]
    fn any_phase_may_return_to_idle() {
        let mut tracker = SaveTracker::default();
        for phase in [
            SavePhase::Normalizing,
            SavePhase::Validating,
            SavePhase::Failed,
            SavePhase::Idle,
        ] {
            transition_save_phase(&mut tracker, phase).expect("valid transition");
        }
        assert_eq!(tracker.phase, SavePhase::Idle);
    }
}
