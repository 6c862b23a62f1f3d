//! Async driver connecting the controller to its collaborators.

use std::sync::Arc;

use futures_util::future::{FutureExt, LocalBoxFuture};
use futures_util::stream::{FuturesUnordered, LocalBoxStream, StreamExt};

use crate::controller::{
    IngestionController, PendingWork, Settlement, SettlementOutcome, SubmitBlocked, SubmitOutcome,
};
use crate::crs::{CrsLookup, resolve_crs};
use crate::decode::{ShapefileDecoder, decode_bundle};
use crate::session::IngestionSession;
use crate::submission::FeatureSubmitter;

/// Runs decode, CRS lookup, and submission for an [`IngestionController`].
///
/// # Examples
///
/// ```
/// use shapegate_core::test_support::{StubCrsLookup, StubDecoder, StubSubmitter};
/// use shapegate_core::{CrsDescriptor, IngestionController, IngestionPipeline, Phase, RawFile};
///
/// let pipeline = IngestionPipeline::new(
///     StubDecoder::default(),
///     StubCrsLookup::resolving(CrsDescriptor::from_srid(4326)),
///     StubSubmitter::accepting(1),
/// );
/// let mut controller = IngestionController::new();
/// let work = controller
///     .select_files(&[RawFile::new("site.zip", vec![0x50, 0x4b])])
///     .expect("a lone archive is always accepted");
/// futures_util::FutureExt::now_or_never(pipeline.settle_into(&mut controller, work));
/// assert_eq!(controller.phase(), Phase::Ready);
/// ```
#[derive(Debug)]
pub struct IngestionPipeline<D, L, S> {
    decoder: D,
    lookup: L,
    submitter: S,
}

impl<D, L, S> IngestionPipeline<D, L, S>
where
    D: ShapefileDecoder,
    L: CrsLookup,
    S: FeatureSubmitter,
{
    /// Assemble a pipeline from its collaborators.
    pub const fn new(decoder: D, lookup: L, submitter: S) -> Self {
        Self {
            decoder,
            lookup,
            submitter,
        }
    }

    /// The decode routine.
    pub const fn decoder(&self) -> &D {
        &self.decoder
    }

    /// The CRS lookup service.
    pub const fn lookup(&self) -> &L {
        &self.lookup
    }

    /// The submission service.
    pub const fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Start decode and CRS lookup for `work` concurrently.
    ///
    /// The stream yields each settlement as it completes and ends after
    /// both. Neither step waits for the other.
    pub fn settle(&self, work: &PendingWork) -> LocalBoxStream<'_, Settlement> {
        let generation = work.generation;
        let decode_bundle_ref = Arc::clone(&work.bundle);
        let lookup_bundle_ref = Arc::clone(&work.bundle);
        let decode = async move {
            Settlement::Decoded {
                generation,
                result: decode_bundle(&self.decoder, &decode_bundle_ref),
            }
        };
        let lookup = async move {
            Settlement::Crs {
                generation,
                resolution: resolve_crs(&self.lookup, &lookup_bundle_ref).await,
            }
        };
        let pending: FuturesUnordered<LocalBoxFuture<'_, Settlement>> =
            [decode.boxed_local(), lookup.boxed_local()].into_iter().collect();
        pending.boxed_local()
    }

    /// Settle `work` and apply every result to `controller`.
    ///
    /// Returns how many settlements were applied; stale ones are dropped by
    /// the controller.
    pub async fn settle_into(
        &self,
        controller: &mut IngestionController,
        work: PendingWork,
    ) -> usize {
        let mut settlements = self.settle(&work);
        let mut applied = 0;
        while let Some(settlement) = settlements.next().await {
            if controller.apply(settlement) == SettlementOutcome::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Submit the current selection and record the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitBlocked`] when the controller refuses to start; no
    /// request is sent in that case.
    pub async fn submit(
        &self,
        controller: &mut IngestionController,
        session: &mut IngestionSession,
    ) -> Result<SubmitOutcome, SubmitBlocked> {
        let pending = controller.begin_submit(session)?;
        let result = self.submitter.submit(&pending.payload).await;
        Ok(controller.finish_submit(session, pending.ticket, result))
    }
}
