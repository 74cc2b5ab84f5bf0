//! Sign, reserve and issue a built transaction.
//!
//! `Draft → Built → Signed → Issued`, with `Failed` reachable from `Built`
//! (signing) and `Signed` (reservation or submission). Inputs are reserved
//! against the snapshot they were selected from just before the network
//! call; a failed submission releases them again.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trio_transactions::SignedTx;

use crate::custody::KeyCustody;
use crate::error::WalletError;
use crate::events::{EventBus, WalletEvent};
use crate::issuer::{issue, Endpoints, IssuedId};
use crate::signer::sign;
use crate::transaction_builder::BuiltTx;
use crate::utxo_tracker::UtxoTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxState {
    Draft,
    Built,
    Signed,
    Issued,
    Failed,
}

impl TxState {
    pub fn can_transition_to(self, next: TxState) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Built)
                | (Self::Built, Self::Signed)
                | (Self::Built, Self::Failed)
                | (Self::Signed, Self::Issued)
                | (Self::Signed, Self::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Issued | Self::Failed)
    }
}

/// The outcome of one trip through the pipeline.
#[derive(Debug)]
pub struct Submission {
    pub history: Vec<TxState>,
    pub signed: Option<SignedTx>,
    pub issued: Option<IssuedId>,
    pub error: Option<WalletError>,
}

impl Submission {
    fn built() -> Self {
        Self {
            history: vec![TxState::Draft, TxState::Built],
            signed: None,
            issued: None,
            error: None,
        }
    }

    pub fn state(&self) -> TxState {
        self.history.last().copied().unwrap_or(TxState::Draft)
    }

    fn advance(&mut self, next: TxState) {
        let current = self.state();
        if current.can_transition_to(next) {
            self.history.push(next);
        } else {
            self.fail(WalletError::InvalidState(format!(
                "illegal transition {current:?} -> {next:?}"
            )));
        }
    }

    fn fail(&mut self, error: WalletError) {
        warn!(state = ?self.state(), %error, "transaction failed");
        if self.state() != TxState::Failed {
            self.history.push(TxState::Failed);
        }
        self.error.get_or_insert(error);
    }

    pub fn into_result(self) -> Result<IssuedId, WalletError> {
        match (self.issued, self.error) {
            (_, Some(error)) => Err(error),
            (Some(id), None) => Ok(id),
            (None, None) => Err(WalletError::InvalidState(format!(
                "pipeline stopped in state {:?}",
                self.history.last()
            ))),
        }
    }
}

/// Everything the pipeline reads or updates besides the transaction.
pub struct PipelineContext<'a, C: KeyCustody + ?Sized> {
    pub custody: &'a C,
    pub tracker: &'a UtxoTracker,
    pub endpoints: Endpoints<'a>,
    pub events: &'a EventBus,
}

pub async fn submit<C: KeyCustody + ?Sized>(built: &BuiltTx, ctx: &PipelineContext<'_, C>) -> Submission {
    let mut submission = Submission::built();

    let signed = match sign(built, ctx.custody) {
        Ok(signed) => signed,
        Err(e) => {
            submission.fail(e);
            return submission;
        }
    };
    submission.signed = Some(signed.clone());
    submission.advance(TxState::Signed);

    let consumed = built.consumed_utxos();
    if let Some(stamp) = built.stamp {
        if let Err(e) = ctx.tracker.reserve(stamp, &consumed) {
            submission.fail(e);
            return submission;
        }
    }

    match issue(&signed, &ctx.endpoints).await {
        Ok(id) => {
            submission.issued = Some(id);
            submission.advance(TxState::Issued);
            ctx.events.emit(&WalletEvent::TransactionIssued {
                family: signed.family(),
                id,
            });
        }
        Err(e) => {
            if let Some(stamp) = built.stamp {
                ctx.tracker.release(stamp, &consumed);
                debug!(chain = %stamp.chain, inputs = consumed.len(), "reservation released");
            }
            submission.fail(e);
        }
    }
    submission
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_graph() {
        use TxState::*;
        assert!(Draft.can_transition_to(Built));
        assert!(Built.can_transition_to(Signed));
        assert!(Built.can_transition_to(Failed));
        assert!(Signed.can_transition_to(Issued));
        assert!(Signed.can_transition_to(Failed));

        assert!(!Draft.can_transition_to(Signed));
        assert!(!Draft.can_transition_to(Failed));
        assert!(!Built.can_transition_to(Issued));
        assert!(!Issued.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Built));
        assert!(Issued.is_terminal() && Failed.is_terminal());
        assert!(!Signed.is_terminal());
    }

    #[test]
    fn failure_is_recorded_once() {
        let mut s = Submission::built();
        s.fail(WalletError::SigningFailure("first".into()));
        s.fail(WalletError::SigningFailure("second".into()));
        assert_eq!(s.history, vec![TxState::Draft, TxState::Built, TxState::Failed]);
        assert!(matches!(
            s.into_result(),
            Err(WalletError::SigningFailure(msg)) if msg == "first"
        ));
    }

    #[test]
    fn illegal_advance_fails() {
        let mut s = Submission::built();
        s.advance(TxState::Issued);
        assert_eq!(s.state(), TxState::Failed);
        assert!(matches!(s.into_result(), Err(WalletError::InvalidState(_))));
    }
}
