//! Background execution of asynchronous generation jobs.

use crate::models::Job;
use crate::services::job_store::JobStore;
use crate::services::providers::TextProvider;
use futures::FutureExt;
use metrics::counter;
use service_core::observability::contain_panics;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Accepts prompts as jobs and runs each one on its own tokio task.
///
/// The task's only side effect is the single terminal write to the store.
/// Its panics are contained: they fail the job instead of the process.
#[derive(Clone)]
pub struct JobRunner {
    store: JobStore,
    provider: Arc<dyn TextProvider>,
}

impl JobRunner {
    pub fn new(store: JobStore, provider: Arc<dyn TextProvider>) -> Self {
        Self { store, provider }
    }

    /// Record a pending job and start generating in the background.
    ///
    /// The pending record is stored before the task is spawned, so the id is
    /// resolvable as soon as this returns. Must be called within a tokio
    /// runtime.
    pub fn submit(&self, prompt: String) -> Job {
        let job = Job::pending(prompt);
        self.store.put(job.clone());
        counter!("ask_jobs_total", "status" => job.status().as_str()).increment(1);

        tracing::info!(
            job_id = %job.id,
            prompt_len = job.prompt.len(),
            "Async job accepted"
        );

        tokio::spawn(contain_panics(run_job(
            self.store.clone(),
            self.provider.clone(),
            job.clone(),
        )));

        job
    }
}

async fn run_job(store: JobStore, provider: Arc<dyn TextProvider>, job: Job) {
    tracing::info!(job_id = %job.id, "Async job started");

    let outcome = AssertUnwindSafe(provider.generate(&job.prompt))
        .catch_unwind()
        .await;

    let finished = match outcome {
        Ok(Ok(generation)) => {
            tracing::info!(
                job_id = %job.id,
                text_len = generation.text.len(),
                "Async job done"
            );
            job.complete(generation)
        }
        Ok(Err(e)) => {
            tracing::error!(job_id = %job.id, error = %e, "Async job failed");
            job.fail(e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(job_id = %job.id, panic = %message, "Async job panicked");
            job.fail(format!("Job aborted unexpectedly: {}", message))
        }
    };

    counter!("ask_jobs_total", "status" => finished.status().as_str()).increment(1);
    store.put(finished);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use crate::services::providers::mock::MockTextProvider;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Reports whether it was called inside a panic-contained scope.
    struct ScopeReporter;

    #[async_trait::async_trait]
    impl TextProvider for ScopeReporter {
        async fn generate(
            &self,
            _prompt: &str,
        ) -> Result<crate::models::Generation, crate::services::providers::ProviderError> {
            let text = if service_core::observability::panics_are_contained() {
                "contained"
            } else {
                "uncontained"
            };
            Ok(crate::models::Generation {
                text: text.to_string(),
                raw: serde_json::Value::Null,
            })
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    async fn wait_for_terminal(store: &JobStore, id: &str) -> Job {
        for _ in 0..100 {
            if let Some(job) = store.get(id) {
                if job.status().is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never finished");
    }

    #[tokio::test]
    async fn pending_is_visible_before_the_provider_returns() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(MockTextProvider::replying("hi there").gated(gate.clone()));
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), provider.clone());

        let job = runner.submit("hello".to_string());

        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(store.get(&job.id).unwrap().status(), JobStatus::Pending);

        gate.notify_one();
        let finished = wait_for_terminal(&store, &job.id).await;

        assert_eq!(finished.status(), JobStatus::Done);
        assert_eq!(finished.result().unwrap().text, "hi there");
        assert_eq!(finished.prompt, "hello");
        assert_eq!(finished.created_at, job.created_at);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn provider_error_is_recorded_on_the_job() {
        let store = JobStore::new();
        let runner = JobRunner::new(
            store.clone(),
            Arc::new(MockTextProvider::failing("Gemini API Error: 503 - overloaded")),
        );

        let job = runner.submit("hello".to_string());
        let finished = wait_for_terminal(&store, &job.id).await;

        assert_eq!(finished.status(), JobStatus::Failed);
        assert_eq!(finished.error(), Some("Gemini API Error: 503 - overloaded"));
        assert!(finished.result().is_none());
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_the_job() {
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), Arc::new(MockTextProvider::unconfigured()));

        let job = runner.submit("hello".to_string());
        let finished = wait_for_terminal(&store, &job.id).await;

        assert_eq!(finished.status(), JobStatus::Failed);
        assert_eq!(finished.error(), Some("Mock text provider not configured"));
    }

    #[tokio::test]
    async fn panicking_provider_fails_the_job_without_taking_down_others() {
        let store = JobStore::new();
        let broken = JobRunner::new(store.clone(), Arc::new(MockTextProvider::panicking()));
        let healthy = JobRunner::new(store.clone(), Arc::new(MockTextProvider::replying("ok")));

        let doomed = broken.submit("a".to_string());
        let fine = healthy.submit("b".to_string());

        let doomed = wait_for_terminal(&store, &doomed.id).await;
        let fine = wait_for_terminal(&store, &fine.id).await;

        assert_eq!(doomed.status(), JobStatus::Failed);
        assert!(doomed.error().unwrap().contains("mock provider panicked"));
        assert_eq!(fine.status(), JobStatus::Done);
    }

    #[tokio::test]
    async fn job_task_runs_with_panics_contained() {
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), Arc::new(ScopeReporter));

        let job = runner.submit("p".to_string());
        let finished = wait_for_terminal(&store, &job.id).await;

        assert_eq!(finished.status(), JobStatus::Done);
        assert_eq!(finished.result().unwrap().text, "contained");
    }

    #[test]
    fn panic_message_handles_both_payload_kinds() {
        let a: Box<dyn Any + Send> = Box::new("static");
        let b: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let c: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(a.as_ref()), "static");
        assert_eq!(panic_message(b.as_ref()), "owned");
        assert_eq!(panic_message(c.as_ref()), "unknown panic");
    }
}
