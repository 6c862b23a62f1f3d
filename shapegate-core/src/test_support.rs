//! In-memory collaborators used by unit and behaviour tests.
//!
//! The stubs record the requests they receive so tests can assert on how the
//! pipeline called them. [`DeferredCrsLookup`] holds every request open until
//! the test releases it, which lets tests interleave settlements.

use std::cell::{Cell, RefCell};
use std::future::poll_fn;
use std::task::{Poll, Waker};

use async_trait::async_trait;
use geo::Geometry;

use crate::crs::{CrsDescriptor, CrsLookup, CrsLookupError};
use crate::decode::{DecoderFailure, ShapefileDecoder};
use crate::features::{ArchiveDecode, Attributes, DecodedRecord, FeatureCollection};
use crate::submission::{
    FeatureSubmitter, SubmissionError, SubmissionPayload, SubmissionReceipt,
};

/// Decoder returning canned shapes, rows, or archive layers.
#[derive(Debug, Default)]
pub struct StubDecoder {
    shapes: Vec<Option<Geometry<f64>>>,
    rows: Vec<Attributes>,
    archive: Option<ArchiveDecode>,
    failure: Option<String>,
    last_prj: RefCell<Option<String>>,
}

impl StubDecoder {
    /// Answer component decodes with `shapes` and `rows`.
    pub fn with_components(shapes: Vec<Option<Geometry<f64>>>, rows: Vec<Attributes>) -> Self {
        Self {
            shapes,
            rows,
            ..Self::default()
        }
    }

    /// Answer archive decodes with `archive`.
    pub fn with_archive(archive: ArchiveDecode) -> Self {
        Self {
            archive: Some(archive),
            ..Self::default()
        }
    }

    /// Answer both bundle forms with `records`.
    pub fn with_records(records: Vec<DecodedRecord>) -> Self {
        let (shapes, rows) = records
            .iter()
            .map(|record| (record.geometry.clone(), record.attributes.clone()))
            .unzip();
        Self {
            shapes,
            rows,
            archive: Some(ArchiveDecode::Single(FeatureCollection {
                name: None,
                records,
            })),
            ..Self::default()
        }
    }

    /// Answer both bundle forms with one record per geometry and no attributes.
    pub fn with_geometries<I>(geometries: I) -> Self
    where
        I: IntoIterator<Item = Geometry<f64>>,
    {
        Self::with_records(
            geometries
                .into_iter()
                .map(|geometry| DecodedRecord {
                    geometry: Some(geometry),
                    attributes: Attributes::new(),
                })
                .collect(),
        )
    }

    /// Fail every decode with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Projection text passed to the most recent shape decode.
    pub fn last_prj(&self) -> Option<String> {
        self.last_prj.borrow().clone()
    }

    fn check(&self) -> Result<(), DecoderFailure> {
        match &self.failure {
            Some(message) => Err(DecoderFailure::new(message.clone())),
            None => Ok(()),
        }
    }
}

impl ShapefileDecoder for StubDecoder {
    fn decode_archive(&self, _archive: &[u8]) -> Result<ArchiveDecode, DecoderFailure> {
        self.check()?;
        self.archive
            .clone()
            .ok_or_else(|| DecoderFailure::new("no archive layers configured"))
    }

    fn decode_shapes(
        &self,
        _shp: &[u8],
        prj: Option<&str>,
    ) -> Result<Vec<Option<Geometry<f64>>>, DecoderFailure> {
        *self.last_prj.borrow_mut() = prj.map(str::to_owned);
        self.check()?;
        Ok(self.shapes.clone())
    }

    fn decode_attributes(&self, _dbf: &[u8]) -> Result<Vec<Attributes>, DecoderFailure> {
        self.check()?;
        Ok(self.rows.clone())
    }
}

/// CRS lookup returning the same answer to every request.
#[derive(Debug)]
pub struct StubCrsLookup {
    outcome: Result<CrsDescriptor, CrsLookupError>,
    prj_requests: RefCell<Vec<String>>,
    archive_requests: Cell<usize>,
}

impl StubCrsLookup {
    /// Resolve every request to `descriptor`.
    pub fn resolving(descriptor: CrsDescriptor) -> Self {
        Self::answering(Ok(descriptor))
    }

    /// Fail every request with `error`.
    pub fn failing(error: CrsLookupError) -> Self {
        Self::answering(Err(error))
    }

    fn answering(outcome: Result<CrsDescriptor, CrsLookupError>) -> Self {
        Self {
            outcome,
            prj_requests: RefCell::new(Vec::new()),
            archive_requests: Cell::new(0),
        }
    }

    /// Projection texts received, in request order.
    pub fn prj_requests(&self) -> Vec<String> {
        self.prj_requests.borrow().clone()
    }

    /// Number of archive requests received.
    pub fn archive_requests(&self) -> usize {
        self.archive_requests.get()
    }
}

#[async_trait(?Send)]
impl CrsLookup for StubCrsLookup {
    async fn crs_from_prj(&self, prj: &str) -> Result<CrsDescriptor, CrsLookupError> {
        self.prj_requests.borrow_mut().push(prj.to_owned());
        self.outcome.clone()
    }

    async fn crs_from_archive(&self, _archive: &[u8]) -> Result<CrsDescriptor, CrsLookupError> {
        self.archive_requests.set(self.archive_requests.get() + 1);
        self.outcome.clone()
    }
}

#[derive(Debug, Default)]
struct DeferredSlot {
    outcome: Option<Result<CrsDescriptor, CrsLookupError>>,
    waker: Option<Waker>,
}

/// CRS lookup whose requests stay pending until released.
///
/// Requests are numbered from zero in the order they are first polled.
#[derive(Debug, Default)]
pub struct DeferredCrsLookup {
    slots: RefCell<Vec<DeferredSlot>>,
    requests: Cell<usize>,
}

impl DeferredCrsLookup {
    /// Create a lookup with no outstanding requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests received so far.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }

    /// Complete request `index` with `outcome`.
    ///
    /// Releasing a request before it arrives queues the outcome for it.
    pub fn release(&self, index: usize, outcome: Result<CrsDescriptor, CrsLookupError>) {
        let waker = {
            let mut slots = self.slots.borrow_mut();
            if slots.len() <= index {
                slots.resize_with(index + 1, DeferredSlot::default);
            }
            slots.get_mut(index).and_then(|slot| {
                slot.outcome = Some(outcome);
                slot.waker.take()
            })
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Resolve request `index` to `descriptor`.
    pub fn resolve(&self, index: usize, descriptor: CrsDescriptor) {
        self.release(index, Ok(descriptor));
    }

    async fn wait(&self) -> Result<CrsDescriptor, CrsLookupError> {
        let index = self.requests.get();
        self.requests.set(index + 1);
        {
            let mut slots = self.slots.borrow_mut();
            if slots.len() <= index {
                slots.resize_with(index + 1, DeferredSlot::default);
            }
        }
        poll_fn(|cx| {
            let mut slots = self.slots.borrow_mut();
            let Some(slot) = slots.get_mut(index) else {
                return Poll::Pending;
            };
            match slot.outcome.take() {
                Some(outcome) => Poll::Ready(outcome),
                None => {
                    slot.waker = Some(cx.waker().clone());
                    Poll::Pending
                }
            }
        })
        .await
    }
}

#[async_trait(?Send)]
impl CrsLookup for DeferredCrsLookup {
    async fn crs_from_prj(&self, _prj: &str) -> Result<CrsDescriptor, CrsLookupError> {
        self.wait().await
    }

    async fn crs_from_archive(&self, _archive: &[u8]) -> Result<CrsDescriptor, CrsLookupError> {
        self.wait().await
    }
}

/// Submitter returning the same answer to every payload.
#[derive(Debug)]
pub struct StubSubmitter {
    outcome: Result<SubmissionReceipt, SubmissionError>,
    submitted: RefCell<Vec<SubmissionPayload>>,
}

impl StubSubmitter {
    /// Accept every payload, creating feature `id`.
    pub fn accepting(id: i64) -> Self {
        Self::answering(Ok(SubmissionReceipt { id }))
    }

    /// Reject every payload with `error`.
    pub fn failing(error: SubmissionError) -> Self {
        Self::answering(Err(error))
    }

    fn answering(outcome: Result<SubmissionReceipt, SubmissionError>) -> Self {
        Self {
            outcome,
            submitted: RefCell::new(Vec::new()),
        }
    }

    /// Payloads received, in submission order.
    pub fn submissions(&self) -> Vec<SubmissionPayload> {
        self.submitted.borrow().clone()
    }
}

#[async_trait(?Send)]
impl FeatureSubmitter for StubSubmitter {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.submitted.borrow_mut().push(payload.clone());
        self.outcome.clone()
    }
}

/// Drive `future` to completion on a current-thread runtime.
#[cfg(test)]
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(future)
}
