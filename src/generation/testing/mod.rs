use std::sync::{Arc, Mutex};

use super::{GenerationBackend, GenerationError, GenerationRequest, ResilientGenerator};
use crate::retry::testing::NoSleep;

type Responder = dyn Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync;

/// Backend answering from a closure and keeping every request it saw
pub(crate) struct FnBackend {
    responder: Box<Responder>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl std::fmt::Debug for FnBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnBackend").finish_non_exhaustive()
    }
}

impl FnBackend {
    pub(crate) fn new(
        responder: impl Fn(&GenerationRequest) -> Result<String, GenerationError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl GenerationBackend for FnBackend {
    fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().expect("lock").push(request.clone());
        (self.responder)(request)
    }
}

/// Generator over `backend` that retries without waiting
pub(crate) fn instant_generator(backend: Arc<FnBackend>) -> ResilientGenerator {
    ResilientGenerator::new(backend).with_sleeper(Arc::new(NoSleep))
}
