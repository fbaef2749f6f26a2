//! HTTP front end: the form page plus a small job API for progress polling.

use agent_host::NewsPipeline;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::jobs::{aborted_output, JobStore};
use crate::page::{render_page, DEFAULT_TOPIC, PLACEHOLDER_OUTPUT};

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Requests served concurrently; further connections wait in the accept queue.
const WORKER_THREADS: usize = 8;

type Reply = Response<Cursor<Vec<u8>>>;

struct AppContext {
    pipeline: Arc<NewsPipeline>,
    jobs: Arc<JobStore>,
    runtime: Handle,
    debug: bool,
}

pub struct NewsServer {
    server: Arc<Server>,
    ctx: Arc<AppContext>,
}

impl NewsServer {
    pub fn bind(
        addr: &str,
        pipeline: Arc<NewsPipeline>,
        runtime: Handle,
        debug: bool,
    ) -> Result<Self> {
        let server = Server::http(addr).map_err(|e| anyhow!("could not bind {}: {}", addr, e))?;
        Ok(Self {
            server: Arc::new(server),
            ctx: Arc::new(AppContext {
                pipeline,
                jobs: Arc::new(JobStore::new()),
                runtime,
                debug,
            }),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve forever from a fixed pool of worker threads, so a synchronous
    /// `/process` run does not stall job polling.
    pub fn run(&self) {
        let workers: Vec<_> = (0..WORKER_THREADS)
            .filter_map(|i| {
                let server = self.server.clone();
                let ctx = self.ctx.clone();
                let spawned = std::thread::Builder::new()
                    .name(format!("http-worker-{}", i))
                    .spawn(move || loop {
                        match server.recv() {
                            Ok(request) => ctx.handle(request),
                            Err(e) => {
                                tracing::warn!(error = %e, "http worker stopping");
                                break;
                            }
                        }
                    });
                match spawned {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        tracing::warn!(worker = i, error = %e, "failed to spawn http worker");
                        None
                    }
                }
            })
            .collect();

        for worker in workers {
            let _ = worker.join();
        }
    }
}

impl AppContext {
    fn handle(&self, mut request: Request) {
        let method = request.method().clone();
        let url = request.url().to_string();
        let response = self.route(&method, &url, &mut request);
        tracing::debug!(%method, url = %url, status = response.status_code().0, "request");
        if let Err(e) = request.respond(response) {
            tracing::warn!(url = %url, error = %e, "failed to write response");
        }
    }

    fn route(&self, method: &Method, url: &str, request: &mut Request) -> Reply {
        let path = url.split('?').next().unwrap_or("/");
        match (method, path) {
            (Method::Get, "/") => html(200, render_page(DEFAULT_TOPIC, PLACEHOLDER_OUTPUT)),
            (Method::Get, "/health") => text(200, "ok"),
            (Method::Post, "/process") => match self.read_topic(request) {
                Ok(topic) => self.process_now(&topic),
                Err(reply) => reply,
            },
            (Method::Post, "/api/jobs") => match self.read_topic(request) {
                Ok(topic) => {
                    let id = self.start_job(topic);
                    json(202, &serde_json::json!({ "job_id": id }))
                }
                Err(reply) => reply,
            },
            (Method::Get, p) if p.starts_with("/api/jobs/") => {
                let id = &p["/api/jobs/".len()..];
                match Uuid::parse_str(id).ok().and_then(|id| self.jobs.view(id)) {
                    Some(view) => json(200, &view),
                    None => json(404, &serde_json::json!({ "error": "unknown job" })),
                }
            }
            _ => text(404, "Not Found"),
        }
    }

    fn process_now(&self, topic: &str) -> Reply {
        let output = self.runtime.block_on(self.pipeline.process(topic));
        html(200, render_page(topic, &output))
    }

    fn start_job(&self, topic: String) -> Uuid {
        let id = self.jobs.create();
        let pipeline = self.pipeline.clone();
        let jobs = self.jobs.clone();
        tracing::info!(job_id = %id, topic = %topic, "job started");

        self.runtime.spawn(async move {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let run =
                tokio::spawn(async move { pipeline.process_with_events(&topic, tx).await });

            // Closes once the pipeline drops its sender.
            while let Some(event) = rx.recv().await {
                jobs.apply(id, &event);
            }

            let output = match run.await {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(job_id = %id, error = %e, "pipeline task aborted");
                    aborted_output(&e.to_string())
                }
            };
            jobs.finish(id, output);
            tracing::info!(job_id = %id, "job finished");
        });

        id
    }

    /// Topic from a form-encoded or JSON body. A missing topic reads as empty
    /// so the pipeline's own blank-topic message is shown. Bodies over
    /// `MAX_BODY_BYTES` are refused with 413.
    fn read_topic(&self, request: &mut Request) -> Result<String, Reply> {
        let is_json = request.headers().iter().any(|h| {
            h.field.equiv("Content-Type") && h.value.as_str().starts_with("application/json")
        });

        let mut body = Vec::new();
        request
            .as_reader()
            .take(MAX_BODY_BYTES + 1)
            .read_to_end(&mut body)
            .map_err(|e| self.error(400, "invalid request body", &anyhow::Error::from(e)))?;
        if body.len() as u64 > MAX_BODY_BYTES {
            tracing::warn!(limit = MAX_BODY_BYTES, "request body too large");
            return Err(text(413, "request body too large"));
        }

        let body = String::from_utf8(body)
            .map_err(|e| self.error(400, "invalid request body", &anyhow::Error::from(e)))?;
        parse_topic(&body, is_json).map_err(|e| self.error(400, "invalid request body", &e))
    }

    fn error(&self, status: u16, summary: &str, err: &anyhow::Error) -> Reply {
        tracing::warn!(status, error = %err, "{}", summary);
        if self.debug {
            text(status, &format!("{}: {:#}", summary, err))
        } else {
            text(status, summary)
        }
    }
}

fn parse_topic(body: &str, is_json: bool) -> Result<String> {
    if is_json {
        let value: serde_json::Value = serde_json::from_str(body)?;
        return Ok(value
            .get("topic")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string());
    }
    Ok(url::form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == "topic")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default())
}

fn reply(status: u16, body: Vec<u8>, content_type: &str) -> Reply {
    let response = Response::from_data(body).with_status_code(StatusCode(status));
    match Header::from_bytes("Content-Type", content_type) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn html(status: u16, body: String) -> Reply {
    reply(status, body.into_bytes(), "text/html; charset=utf-8")
}

fn text(status: u16, body: &str) -> Reply {
    reply(status, body.as_bytes().to_vec(), "text/plain; charset=utf-8")
}

fn json<T: Serialize>(status: u16, value: &T) -> Reply {
    match serde_json::to_vec(value) {
        Ok(body) => reply(status, body, "application/json"),
        Err(e) => text(500, &format!("serialization failed: {}", e)),
    }
}
