//! Change bus adapter for a screen.
//!
//! Every delivery goes through the echo guard first. Foreign changes run
//! through the reconciliation reducer, then the dirty collections are
//! redrawn.

use crate::ports::{AlertPresenter, MutationGateway, RenderSurface};
use crate::service::Screen;
use cf_01_reconciliation::apply_change;
use shared_bus::{ChangeEnvelope, ChangeSubscriber, Delivery, EchoVerdict, SubscriberError};
use tracing::debug;

impl<G, A, R> ChangeSubscriber for Screen<G, A, R>
where
    G: MutationGateway + 'static,
    A: AlertPresenter + 'static,
    R: RenderSurface + 'static,
{
    fn label(&self) -> &str {
        &self.config.name
    }

    fn on_change(&self, envelope: &ChangeEnvelope) -> Result<Delivery, SubscriberError> {
        let report = {
            let mut state = self.state.lock();

            if state.guard.check(envelope) == EchoVerdict::Echo {
                debug!(
                    screen = %self.config.name,
                    origin = %envelope.origin_id,
                    kind = envelope.event.kind(),
                    "Skipping own change"
                );
                return Ok(Delivery::Echo);
            }

            apply_change(&mut state.cache, &envelope.event)
                .map_err(|e| SubscriberError::Reconcile(e.to_string()))?
        };

        if report.is_noop() {
            return Ok(Delivery::Ignored);
        }

        if let Some(id) = &report.refetch {
            debug!(screen = %self.config.name, entity = %id, "Queued detail refetch");
        }
        self.flush();
        Ok(Delivery::Applied)
    }
}
