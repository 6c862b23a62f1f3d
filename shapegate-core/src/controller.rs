//! State machine coordinating one ingestion form.
//!
//! The controller never performs I/O. [`IngestionController::select_files`]
//! hands back [`PendingWork`] for a driver (see
//! [`IngestionPipeline`](crate::IngestionPipeline)) to decode and look up
//! concurrently. The driver feeds each result back as a [`Settlement`] tagged
//! with the generation it was started for. Settlements for any generation
//! other than the current one are discarded, so a slow result for an earlier
//! selection can never overwrite a newer one.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use thiserror::Error;

use crate::bundle::{RawFile, ShapefileBundle};
use crate::compatibility::{CompatibilityVerdict, EvaluationContext, Notice, evaluate, notices};
use crate::crs::CrsResolution;
use crate::decode::DecodeError;
use crate::features::DecodedFeatureSet;
use crate::file_set::{FileSetError, resolve_file_set};
use crate::session::IngestionSession;
use crate::submission::{SubmissionError, SubmissionPayload, SubmissionReceipt, build_payload};

/// Lifecycle phase of the ingestion form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing selected.
    Idle,
    /// The last selection was rejected; the file-set error is shown.
    Rejected,
    /// A bundle is selected; decode or CRS lookup is still outstanding.
    FilesSelected,
    /// Decode and CRS lookup have both settled.
    Ready,
    /// A submission is in flight.
    Submitting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Rejected => "rejected",
            Self::FilesSelected => "files selected",
            Self::Ready => "ready",
            Self::Submitting => "submitting",
        };
        f.write_str(name)
    }
}

/// Identifies one file selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }

    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Decode and CRS lookup to run for a fresh selection.
#[derive(Debug, Clone)]
pub struct PendingWork {
    /// Generation the results must be tagged with.
    pub generation: Generation,
    /// The resolved bundle.
    pub bundle: Arc<ShapefileBundle>,
}

/// Result of one asynchronous step, tagged with its generation.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Geometry decode finished.
    Decoded {
        /// Selection the decode was started for.
        generation: Generation,
        /// Decode outcome.
        result: Result<DecodedFeatureSet, DecodeError>,
    },
    /// CRS lookup finished.
    Crs {
        /// Selection the lookup was started for.
        generation: Generation,
        /// Lookup outcome.
        resolution: CrsResolution,
    },
}

impl Settlement {
    /// Generation the settlement belongs to.
    pub const fn generation(&self) -> Generation {
        match self {
            Self::Decoded { generation, .. } | Self::Crs { generation, .. } => *generation,
        }
    }
}

/// What [`IngestionController::apply`] did with a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The settlement updated the current selection.
    Applied,
    /// The settlement belonged to a superseded selection and was dropped.
    Stale,
}

/// Marks one submission started by [`IngestionController::begin_submit`].
///
/// The controller holds at most one outstanding ticket. It survives
/// reselection and cancel, so a late result is matched to the request that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionTicket {
    generation: Generation,
}

impl SubmissionTicket {
    /// Selection the submission was built from.
    pub const fn generation(self) -> Generation {
        self.generation
    }
}

/// A started submission: the payload to send and the ticket to return with
/// its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    /// Ticket passed back to [`IngestionController::finish_submit`].
    pub ticket: SubmissionTicket,
    /// Request body.
    pub payload: SubmissionPayload,
}

/// Reasons [`IngestionController::begin_submit`] refuses to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitBlocked {
    /// The form is not in the `Ready` phase.
    #[error("cannot submit while {phase}")]
    NotReady {
        /// Phase at the time of the attempt.
        phase: Phase,
    },
    /// An earlier submission has not returned yet.
    #[error("a previous submission is still in flight")]
    InFlight,
    /// No target collection has been chosen.
    #[error("no target collection selected")]
    NoCollection,
    /// The feature name is blank.
    #[error("a feature name is required")]
    MissingName,
    /// Decoding failed, so there is nothing to submit.
    #[error("Failed to parse shapefile")]
    DecodeFailed,
    /// A blocking compatibility verdict holds.
    #[error("the shapefile is not compatible with the selected collection")]
    Incompatible(CompatibilityVerdict),
}

/// What [`IngestionController::finish_submit`] did with a submission result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The feature was created and the form reset.
    Submitted(SubmissionReceipt),
    /// The submission failed; the message is shown and selections kept.
    Failed(String),
    /// The result does not belong to the outstanding submission, or the
    /// selection it was built from has since been replaced.
    Stale,
}

#[derive(Debug)]
struct Selection {
    bundle: Arc<ShapefileBundle>,
    decoded: Option<Result<DecodedFeatureSet, DecodeError>>,
    crs: CrsResolution,
}

impl Selection {
    fn new(bundle: Arc<ShapefileBundle>) -> Self {
        Self {
            bundle,
            decoded: None,
            crs: CrsResolution::Pending,
        }
    }

    const fn is_settled(&self) -> bool {
        self.decoded.is_some() && self.crs.is_settled()
    }
}

/// Coordinates file selection, settlements, verdicts, and submission.
///
/// # Examples
///
/// ```
/// use shapegate_core::{IngestionController, Phase, RawFile};
///
/// let mut controller = IngestionController::new();
/// let err = controller
///     .select_files(&[RawFile::new("a.shp", Vec::new()), RawFile::new("b.dbf", Vec::new())])
///     .expect_err("stems differ");
/// assert_eq!(err.to_string(), "Filenames do not match");
/// assert_eq!(controller.phase(), Phase::Rejected);
/// ```
#[derive(Debug)]
pub struct IngestionController {
    phase: Phase,
    generation: Generation,
    selection: Option<Selection>,
    file_error: Option<FileSetError>,
    submit_error: Option<String>,
    in_flight: Option<SubmissionTicket>,
}

impl Default for IngestionController {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestionController {
    /// Create an idle controller.
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            generation: Generation(0),
            selection: None,
            file_error: None,
            submit_error: None,
            in_flight: None,
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Generation of the current selection.
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// The selected bundle, if any.
    pub fn bundle(&self) -> Option<&ShapefileBundle> {
        self.selection.as_ref().map(|selection| selection.bundle.as_ref())
    }

    /// Decoded features, once decoding succeeded.
    pub fn decoded(&self) -> Option<&DecodedFeatureSet> {
        match self.selection.as_ref()?.decoded.as_ref()? {
            Ok(decoded) => Some(decoded),
            Err(_) => None,
        }
    }

    /// Decode failure for the current selection.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self.selection.as_ref()?.decoded.as_ref()? {
            Ok(_) => None,
            Err(err) => Some(err),
        }
    }

    /// CRS lookup state for the current selection.
    pub fn crs(&self) -> &CrsResolution {
        const PENDING: &CrsResolution = &CrsResolution::Pending;
        self.selection
            .as_ref()
            .map_or(PENDING, |selection| &selection.crs)
    }

    /// File-set error from the last selection.
    pub const fn file_error(&self) -> Option<&FileSetError> {
        self.file_error.as_ref()
    }

    /// Ticket of the submission still awaiting its result.
    pub const fn in_flight(&self) -> Option<SubmissionTicket> {
        self.in_flight
    }

    /// Message from the last failed submission.
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Replace the current selection with `files`.
    ///
    /// Prior results are discarded in every phase and the generation is
    /// advanced, so outstanding work for earlier selections becomes stale.
    ///
    /// # Errors
    ///
    /// Returns the [`FileSetError`] when `files` do not form a bundle; the
    /// controller then enters [`Phase::Rejected`] and no work is started.
    pub fn select_files(&mut self, files: &[RawFile]) -> Result<PendingWork, FileSetError> {
        self.generation = self.generation.next();
        self.selection = None;
        self.submit_error = None;
        self.file_error = None;
        match resolve_file_set(files) {
            Ok(bundle) => {
                let bundle = Arc::new(bundle);
                self.selection = Some(Selection::new(Arc::clone(&bundle)));
                self.phase = Phase::FilesSelected;
                debug!(
                    "selected bundle {:?} as generation {}",
                    bundle.name(),
                    self.generation.get()
                );
                Ok(PendingWork {
                    generation: self.generation,
                    bundle,
                })
            }
            Err(err) => {
                self.phase = Phase::Rejected;
                self.file_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Record a decode or CRS result.
    pub fn apply(&mut self, settlement: Settlement) -> SettlementOutcome {
        let generation = settlement.generation();
        let Some(selection) = self
            .selection
            .as_mut()
            .filter(|_| generation == self.generation)
        else {
            debug!(
                "discarding settlement for generation {} (current {})",
                generation.get(),
                self.generation.get()
            );
            return SettlementOutcome::Stale;
        };
        match settlement {
            Settlement::Decoded { result, .. } => selection.decoded = Some(result),
            Settlement::Crs { resolution, .. } => selection.crs = resolution,
        }
        if self.phase == Phase::FilesSelected && selection.is_settled() {
            self.phase = Phase::Ready;
        }
        SettlementOutcome::Applied
    }

    /// Verdicts for the current selection and `session`.
    ///
    /// Available once decoding succeeded and a collection is selected; the
    /// CRS lookup may still be pending. Recomputed on every call.
    pub fn verdict(&self, session: &IngestionSession) -> Option<CompatibilityVerdict> {
        let selection = self.selection.as_ref()?;
        let decoded = self.decoded()?;
        let collection = session.collection()?;
        Some(evaluate(
            decoded,
            collection,
            &selection.crs,
            session.project_crs(),
        ))
    }

    /// User-facing notices for the current verdict.
    pub fn notices(&self, session: &IngestionSession) -> Vec<Notice> {
        let (Some(selection), Some(decoded), Some(collection)) =
            (self.selection.as_ref(), self.decoded(), session.collection())
        else {
            return Vec::new();
        };
        let context = EvaluationContext {
            decoded,
            collection,
            source_crs: &selection.crs,
            project_crs: session.project_crs(),
        };
        notices(&evaluate(decoded, collection, &selection.crs, session.project_crs()), &context)
    }

    /// Whether the submit action is available.
    pub fn submit_enabled(&self, session: &IngestionSession) -> bool {
        self.check_submit(session).is_ok()
    }

    /// Why the submit action is unavailable, if it is.
    pub fn submit_blocker(&self, session: &IngestionSession) -> Option<SubmitBlocked> {
        self.check_submit(session).err()
    }

    fn check_submit<'a>(
        &'a self,
        session: &'a IngestionSession,
    ) -> Result<&'a ShapefileBundle, SubmitBlocked> {
        if self.in_flight.is_some() {
            return Err(SubmitBlocked::InFlight);
        }
        let selection = match (&self.selection, self.phase) {
            (Some(selection), Phase::Ready) => selection,
            (_, phase) => return Err(SubmitBlocked::NotReady { phase }),
        };
        if session.collection().is_none() {
            return Err(SubmitBlocked::NoCollection);
        }
        if !session.has_feature_name() {
            return Err(SubmitBlocked::MissingName);
        }
        let verdict = self.verdict(session).ok_or(SubmitBlocked::DecodeFailed)?;
        if verdict.blocks_submission() {
            return Err(SubmitBlocked::Incompatible(verdict));
        }
        Ok(selection.bundle.as_ref())
    }

    /// Start a submission and build its payload.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitBlocked`] unless no submission is in flight, the
    /// controller is [`Phase::Ready`], a collection and non-blank name are
    /// set, and no blocking verdict holds.
    pub fn begin_submit(
        &mut self,
        session: &IngestionSession,
    ) -> Result<PendingSubmission, SubmitBlocked> {
        let bundle = self.check_submit(session)?;
        let collection = session.collection().ok_or(SubmitBlocked::NoCollection)?;
        let payload = build_payload(
            bundle,
            collection,
            session.feature_name(),
            session.turbine_parameters(),
        );
        let ticket = SubmissionTicket {
            generation: self.generation,
        };
        self.submit_error = None;
        self.phase = Phase::Submitting;
        self.in_flight = Some(ticket);
        Ok(PendingSubmission { ticket, payload })
    }

    /// Record the outcome of the submission identified by `ticket`.
    ///
    /// Success discards the selection and resets the form; failure returns to
    /// [`Phase::Ready`] with the message kept for display. A result for any
    /// ticket other than the outstanding one changes nothing. A result for
    /// the outstanding ticket whose selection was replaced meanwhile clears
    /// the ticket but leaves the new selection untouched.
    pub fn finish_submit(
        &mut self,
        session: &mut IngestionSession,
        ticket: SubmissionTicket,
        result: Result<SubmissionReceipt, SubmissionError>,
    ) -> SubmitOutcome {
        if self.in_flight != Some(ticket) {
            debug!(
                "ignoring result for submission of generation {}",
                ticket.generation.get()
            );
            return SubmitOutcome::Stale;
        }
        self.in_flight = None;
        if ticket.generation != self.generation {
            match &result {
                Ok(receipt) => info!(
                    "superseded selection of generation {} was submitted as feature {}",
                    ticket.generation.get(),
                    receipt.id
                ),
                Err(err) => debug!(
                    "submission for superseded generation {} failed: {err}",
                    ticket.generation.get()
                ),
            }
            return SubmitOutcome::Stale;
        }
        match result {
            Ok(receipt) => {
                info!("submitted shapefile as feature {}", receipt.id);
                self.reset();
                session.reset_form();
                SubmitOutcome::Submitted(receipt)
            }
            Err(err) => {
                let message = err.display_message();
                debug!("submission failed: {err}");
                self.phase = Phase::Ready;
                self.submit_error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Abandon the form, discarding every selection.
    pub fn cancel(&mut self, session: &mut IngestionSession) {
        self.reset();
        session.reset_form();
    }

    fn reset(&mut self) {
        self.generation = self.generation.next();
        self.phase = Phase::Idle;
        self.selection = None;
        self.file_error = None;
        self.submit_error = None;
    }
}
