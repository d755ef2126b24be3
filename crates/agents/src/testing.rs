//! Scripted test doubles shared by agent and orchestrator tests.

use async_trait::async_trait;
use std::sync::Mutex;
use wayfarer_core::error::GeneratorError;
use wayfarer_core::generator::{GenerationRequest, GenerationResponse, Generator};

/// A mock generator that returns a sequence of scripted outcomes.
///
/// Each call to `generate` returns the next outcome in the queue. Panics if
/// more calls are made than outcomes provided — a test scripting bug.
pub struct SequentialMockGenerator {
    responses: Mutex<Vec<Result<String, GeneratorError>>>,
    call_count: Mutex<usize>,
    embedding: Mutex<Option<Vec<f32>>>,
    last_user: Mutex<Option<String>>,
}

impl SequentialMockGenerator {
    pub fn new(responses: Vec<Result<String, GeneratorError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            embedding: Mutex::new(None),
            last_user: Mutex::new(None),
        }
    }

    /// A generator that returns one text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// A generator whose every call fails with the given error.
    pub fn always_failing(error: GeneratorError) -> Self {
        Self::new(Vec::new()).with_failure(error)
    }

    fn with_failure(self, error: GeneratorError) -> Self {
        // A large enough script that tests never run out.
        let mut responses = self.responses.lock().unwrap();
        for _ in 0..16 {
            responses.push(Err(error.clone()));
        }
        drop(responses);
        self
    }

    /// Script the embedding returned for every input.
    pub fn with_embedding(self, embedding: Vec<f32>) -> Self {
        *self.embedding.lock().unwrap() = Some(embedding);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// The user content of the most recent `generate` call.
    pub fn last_user(&self) -> Option<String> {
        self.last_user.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for SequentialMockGenerator {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GeneratorError> {
        *self.last_user.lock().unwrap() = Some(request.user);
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "SequentialMockGenerator: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        let outcome = responses[*count].clone();
        *count += 1;
        outcome.map(|content| GenerationResponse { content, model: "mock-model".into() })
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, GeneratorError> {
        match self.embedding.lock().unwrap().clone() {
            Some(embedding) => Ok(vec![embedding; inputs.len()]),
            None => Err(GeneratorError::NotConfigured(
                "mock has no scripted embedding".to_string(),
            )),
        }
    }
}
