//! Collection runner
//!
//! Flattens a folder/request tree and executes it strictly in order, one
//! request at a time, so later requests see variables set by earlier ones.

use tokio::sync::watch;
use tracing::{debug, info};

use super::executor::RequestExecutor;
use crate::client::HttpClient;
use crate::models::{Collection, CollectionNode, RequestDefinition, RunReport, RunResult, RunStatus};
use crate::variables::VariableStore;

/// Folder path of requests that are not inside any folder
pub const ROOT_FOLDER: &str = "Root";

const FOLDER_SEPARATOR: &str = " / ";

/// A request together with the folder path it was found under
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRequest<'a> {
    pub request: &'a RequestDefinition,
    pub folder_path: String,
}

/// Depth-first flattening: a level's requests first, then its folders,
/// both in declaration order.
pub fn flatten(nodes: &[CollectionNode]) -> Vec<FlatRequest<'_>> {
    let mut out = Vec::new();
    walk(nodes, None, &mut out);
    out
}

fn walk<'a>(nodes: &'a [CollectionNode], path: Option<&str>, out: &mut Vec<FlatRequest<'a>>) {
    for node in nodes {
        if let CollectionNode::Request(request) = node {
            out.push(FlatRequest {
                request,
                folder_path: path.unwrap_or(ROOT_FOLDER).to_string(),
            });
        }
    }

    for node in nodes {
        if let CollectionNode::Folder(folder) = node {
            let child_path = match path {
                Some(parent) => format!("{}{}{}", parent, FOLDER_SEPARATOR, folder.name),
                None => folder.name.clone(),
            };
            walk(&folder.items, Some(&child_path), out);
        }
    }
}

/// Live progress of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProgress {
    pub status: RunStatus,
    /// Zero-based index of the request being executed
    pub current_index: usize,
    pub total: usize,
    pub current_request: Option<String>,
    pub passed: usize,
    pub failed: usize,
}

impl RunProgress {
    /// Requests finished so far
    pub fn completed(&self) -> usize {
        self.passed + self.failed
    }
}

/// Executes collections sequentially and publishes progress
pub struct CollectionRunner<C: HttpClient> {
    executor: RequestExecutor<C>,
    progress: watch::Sender<RunProgress>,
}

impl<C: HttpClient> CollectionRunner<C> {
    pub fn new(executor: RequestExecutor<C>) -> Self {
        let (progress, _) = watch::channel(RunProgress::default());
        Self { executor, progress }
    }

    pub fn executor(&self) -> &RequestExecutor<C> {
        &self.executor
    }

    /// Receive progress updates
    pub fn subscribe(&self) -> watch::Receiver<RunProgress> {
        self.progress.subscribe()
    }

    /// Current progress snapshot
    pub fn progress(&self) -> RunProgress {
        self.progress.borrow().clone()
    }

    pub async fn run_collection(&self, collection: &Collection, vars: &mut VariableStore) -> RunReport {
        self.run_nodes(&collection.name, &collection.items, vars).await
    }

    /// Run every request under `nodes`. Per-request failures never stop the run.
    pub async fn run_nodes(
        &self,
        name: &str,
        nodes: &[CollectionNode],
        vars: &mut VariableStore,
    ) -> RunReport {
        let flat = flatten(nodes);
        let mut report = RunReport::start(name, flat.len());
        info!(collection = %name, total = flat.len(), "starting collection run");

        self.progress.send_modify(|p| {
            *p = RunProgress {
                status: RunStatus::Running,
                total: flat.len(),
                ..RunProgress::default()
            };
        });

        for (index, item) in flat.iter().enumerate() {
            self.progress.send_modify(|p| {
                p.current_index = index;
                p.current_request = Some(item.request.name.clone());
            });
            debug!(index, request = %item.request.name, folder = %item.folder_path, "running request");

            let prepared = self.executor.prepare(item.request, vars);
            let result = self.executor.send(item.request, &prepared, vars).await;
            let run_result = RunResult::new(item.request, prepared.url(), item.folder_path.as_str(), result);
            let success = run_result.success;
            report.record(run_result);

            self.progress.send_modify(|p| {
                if success {
                    p.passed += 1;
                } else {
                    p.failed += 1;
                }
            });
        }

        report.finish();
        self.progress.send_modify(|p| {
            p.status = RunStatus::Completed;
            p.current_request = None;
        });
        info!(
            collection = %name,
            passed = report.passed_requests,
            failed = report.failed_requests,
            duration_ms = report.duration_ms(),
            "collection run completed"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::models::Folder;

    fn req(name: &str) -> RequestDefinition {
        RequestDefinition::new(name, HttpMethod::Get, format!("http://x/{}", name))
    }

    fn sample_tree() -> Vec<CollectionNode> {
        vec![
            Folder::new("Users")
                .with_item(req("list").into())
                .with_item(Folder::new("Admin").with_item(req("ban").into()).into())
                .with_item(req("create").into())
                .into(),
            req("ping").into(),
            Folder::new("Auth").with_item(req("login").into()).into(),
        ]
    }

    #[test]
    fn test_flatten_requests_before_folders() {
        let tree = sample_tree();
        let flat = flatten(&tree);
        let names: Vec<&str> = flat.iter().map(|f| f.request.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "list", "create", "ban", "login"]);
    }

    #[test]
    fn test_flatten_folder_paths() {
        let tree = sample_tree();
        let paths: Vec<String> = flatten(&tree).into_iter().map(|f| f.folder_path).collect();
        assert_eq!(paths, vec!["Root", "Users", "Users", "Users / Admin", "Auth"]);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let tree = sample_tree();
        assert_eq!(flatten(&tree), flatten(&tree));
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn test_progress_completed() {
        let progress = RunProgress {
            passed: 2,
            failed: 1,
            ..RunProgress::default()
        };
        assert_eq!(progress.completed(), 3);
        assert_eq!(progress.status, RunStatus::Idle);
    }
}
