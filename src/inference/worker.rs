// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background inference.
//!
//! The predictor lives on its own thread so the UI never blocks on the
//! model. Every request carries a generation number; the UI only applies
//! the response matching the most recently issued generation, so a slow
//! result can never overwrite a fresher mask.

use super::mask::MaskOverlay;
use super::predictor::MaskPredictor;
use super::tensors::ModelInputs;
use crate::error::AppError;
use crate::io::embedding::Embedding;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;

/// Issues monotonic request generations and recognises the latest one.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Make every outstanding request stale.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn accepts(&self, generation: u64) -> bool {
        generation == self.latest
    }
}

/// One decoder run.
pub struct InferenceRequest {
    pub generation: u64,
    pub embedding: Arc<Embedding>,
    pub inputs: ModelInputs,
}

/// Result of one decoder run.
#[derive(Debug)]
pub struct InferenceResponse {
    pub generation: u64,
    pub result: Result<MaskOverlay, AppError>,
}

/// Handle to the inference thread.
pub struct InferenceWorker {
    requests: Sender<InferenceRequest>,
    responses: Receiver<InferenceResponse>,
}

impl InferenceWorker {
    /// Move `predictor` onto a new thread and start serving requests.
    pub fn spawn(mut predictor: Box<dyn MaskPredictor>) -> Self {
        let (request_tx, request_rx) = channel::<InferenceRequest>();
        let (response_tx, response_rx) = channel();

        std::thread::spawn(move || {
            while let Ok(request) = request_rx.recv() {
                let request = latest_pending(request, &request_rx);
                log::debug!(
                    "Running request {} with {} prompt points",
                    request.generation,
                    request.inputs.point_count()
                );
                let result = run_guarded(&mut *predictor, &request);

                if let Err(ref e) = result {
                    log::warn!("Inference for request {} failed: {}", request.generation, e);
                }

                let response = InferenceResponse {
                    generation: request.generation,
                    result,
                };
                if response_tx.send(response).is_err() {
                    break;
                }
            }
            log::debug!("Inference worker stopped");
        });

        Self {
            requests: request_tx,
            responses: response_rx,
        }
    }

    pub fn submit(&self, request: InferenceRequest) -> Result<(), AppError> {
        self.requests
            .send(request)
            .map_err(|_| AppError::Inference("inference worker is not running".to_string()))
    }

    /// Next finished response, if any.
    pub fn try_recv(&self) -> Option<InferenceResponse> {
        match self.responses.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// Run one request; a panicking predictor is reported as an inference error.
fn run_guarded(predictor: &mut dyn MaskPredictor, request: &InferenceRequest) -> Result<MaskOverlay, AppError> {
    panic::catch_unwind(AssertUnwindSafe(|| predictor.predict(&request.embedding, &request.inputs)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(AppError::Inference(format!("predictor panicked: {}", message)))
        })
        .and_then(|output| MaskOverlay::try_from(&output))
}

/// Skip queued requests that a newer one already supersedes.
fn latest_pending(mut request: InferenceRequest, queue: &Receiver<InferenceRequest>) -> InferenceRequest {
    while let Ok(newer) = queue.try_recv() {
        log::debug!("Skipping superseded request {}", request.generation);
        request = newer;
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::mask::MaskOutput;
    use crate::inference::tensors::build_model_inputs;
    use crate::models::prompt::{PointPrompt, PromptSet};
    use crate::util::geometry::ModelScale;
    use ndarray::ArrayD;
    use std::time::{Duration, Instant};

    /// Marks the pixel under the first prompt point; fails on a negative x.
    struct FakePredictor;

    impl MaskPredictor for FakePredictor {
        fn predict(&mut self, _embedding: &Embedding, inputs: &ModelInputs) -> Result<MaskOutput, AppError> {
            let x = inputs.point_coords[[0, 0, 0]];
            if x < 0.0 {
                return Err(AppError::Inference("negative prompt".to_string()));
            }
            let mut data = vec![-1.0; 4];
            data[(x as usize).min(3)] = 1.0;
            MaskOutput::from_raw(&[1, 1, 2, 2], &data)
        }
    }

    /// Fails on the first call, in the way `failure` says, then behaves.
    struct FlakyPredictor {
        failure: Option<Failure>,
    }

    enum Failure {
        OversizedShape,
        Panic,
    }

    impl MaskPredictor for FlakyPredictor {
        fn predict(&mut self, embedding: &Embedding, inputs: &ModelInputs) -> Result<MaskOutput, AppError> {
            match self.failure.take() {
                Some(Failure::OversizedShape) => MaskOutput::from_raw(&[1, 1, i64::MAX, 4], &[0.0; 4]),
                Some(Failure::Panic) => panic!("decoder crashed"),
                None => FakePredictor.predict(embedding, inputs),
            }
        }
    }

    fn request(generation: u64, x: f32) -> InferenceRequest {
        let scale = ModelScale::from_dimensions(1024, 1024);
        let prompts = PromptSet::Points(vec![PointPrompt::positive(x, 0.0)]);
        InferenceRequest {
            generation,
            embedding: Arc::new(Embedding::new(ArrayD::zeros(vec![1, 4]))),
            inputs: build_model_inputs(&prompts, &scale).unwrap(),
        }
    }

    fn wait_for(worker: &InferenceWorker) -> InferenceResponse {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(response) = worker.try_recv() {
                return response;
            }
            assert!(Instant::now() < deadline, "worker did not respond");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_tracker_only_accepts_latest() {
        let mut tracker = RequestTracker::default();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(!tracker.accepts(first));
        assert!(tracker.accepts(second));

        tracker.invalidate();
        assert!(!tracker.accepts(second));
    }

    #[test]
    fn test_worker_returns_overlay() {
        let worker = InferenceWorker::spawn(Box::new(FakePredictor));
        worker.submit(request(1, 2.0)).unwrap();

        let response = wait_for(&worker);
        assert_eq!(response.generation, 1);
        let overlay = response.result.unwrap();
        assert_eq!((overlay.width(), overlay.height()), (2, 2));
        assert_eq!(overlay.coverage(), 0.25);
    }

    #[test]
    fn test_worker_survives_failures() {
        let worker = InferenceWorker::spawn(Box::new(FakePredictor));

        worker.submit(request(1, -5.0)).unwrap();
        let failed = wait_for(&worker);
        assert!(matches!(failed.result, Err(AppError::Inference(_))));

        worker.submit(request(2, 1.0)).unwrap();
        let recovered = wait_for(&worker);
        assert_eq!(recovered.generation, 2);
        assert!(recovered.result.is_ok());
    }

    #[test]
    fn test_worker_survives_oversized_output() {
        let worker = InferenceWorker::spawn(Box::new(FlakyPredictor {
            failure: Some(Failure::OversizedShape),
        }));

        worker.submit(request(1, 1.0)).unwrap();
        let failed = wait_for(&worker);
        assert!(matches!(failed.result, Err(AppError::MalformedOutput(_))));

        worker.submit(request(2, 1.0)).unwrap();
        let recovered = wait_for(&worker);
        assert_eq!(recovered.generation, 2);
        assert!(recovered.result.is_ok());
    }

    #[test]
    fn test_worker_survives_predictor_panic() {
        let worker = InferenceWorker::spawn(Box::new(FlakyPredictor {
            failure: Some(Failure::Panic),
        }));

        worker.submit(request(1, 1.0)).unwrap();
        match wait_for(&worker).result {
            Err(AppError::Inference(msg)) => assert!(msg.contains("decoder crashed")),
            other => panic!("expected inference error, got {:?}", other),
        }

        worker.submit(request(2, 1.0)).unwrap();
        assert!(wait_for(&worker).result.is_ok());
    }

    #[test]
    fn test_latest_pending_coalesces() {
        let (tx, rx) = channel();
        tx.send(request(2, 0.0)).unwrap();
        tx.send(request(3, 0.0)).unwrap();
        let latest = latest_pending(request(1, 0.0), &rx);
        assert_eq!(latest.generation, 3);
    }

    #[test]
    fn test_try_recv_empty() {
        let worker = InferenceWorker::spawn(Box::new(FakePredictor));
        assert!(worker.try_recv().is_none());
    }
}
