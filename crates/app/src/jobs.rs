//! Background pipeline runs the page polls for progress.

use agent_host::ERROR_PREFIX;
use parking_lot::Mutex;
use serde::Serialize;
use shared::events::PipelineEvent;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::simple_md::render_markdown;

/// Finished jobs older than this are dropped on the next insert.
const FINISHED_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Done,
    Error,
}

#[derive(Debug, Clone)]
struct Job {
    status: JobStatus,
    percent: u8,
    message: String,
    output: Option<String>,
    finished_at: Option<Instant>,
}

/// What `GET /api/jobs/{id}` returns.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub status: JobStatus,
    pub percent: u8,
    pub message: String,
    pub output: Option<String>,
    pub output_html: Option<String>,
}

#[derive(Default)]
pub struct JobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut jobs = self.jobs.lock();
        jobs.retain(|_, job| {
            job.finished_at
                .map_or(true, |at| at.elapsed() < FINISHED_TTL)
        });
        jobs.insert(
            id,
            Job {
                status: JobStatus::Running,
                percent: 0,
                message: "Starting...".to_string(),
                output: None,
                finished_at: None,
            },
        );
        id
    }

    /// Fold a pipeline event into the job's progress.
    pub fn apply(&self, id: Uuid, event: &PipelineEvent) {
        let mut jobs = self.jobs.lock();
        let Some(job) = jobs.get_mut(&id) else {
            return;
        };
        match event {
            PipelineEvent::Started { .. } => {
                job.message = "Starting...".to_string();
            }
            PipelineEvent::Progress {
                percent, message, ..
            } => {
                job.percent = *percent;
                job.message = message.clone();
            }
            PipelineEvent::Completed { .. } => {
                job.percent = 100;
            }
            PipelineEvent::Failed { error, .. } => {
                job.message = error.clone();
            }
        }
    }

    /// Record the pipeline's final string.
    pub fn finish(&self, id: Uuid, output: String) {
        let mut jobs = self.jobs.lock();
        let Some(job) = jobs.get_mut(&id) else {
            return;
        };
        job.status = if output.starts_with("❌") {
            JobStatus::Error
        } else {
            JobStatus::Done
        };
        if job.status == JobStatus::Done {
            job.percent = 100;
        }
        job.output = Some(output);
        job.finished_at = Some(Instant::now());
    }

    pub fn view(&self, id: Uuid) -> Option<JobView> {
        let jobs = self.jobs.lock();
        let job = jobs.get(&id)?;
        Some(JobView {
            status: job.status,
            percent: job.percent,
            message: job.message.clone(),
            output_html: job.output.as_deref().map(render_markdown),
            output: job.output.clone(),
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.jobs.lock().len()
    }
}

/// Text stored when the pipeline task itself dies.
pub fn aborted_output(reason: &str) -> String {
    format!("{}{}", ERROR_PREFIX, reason)
}
