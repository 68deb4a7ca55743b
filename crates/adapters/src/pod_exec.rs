// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes pod exec — streams a command's stdout out of a running pod.
//!
//! Uses `kube-rs` websocket exec. The remote stderr is accumulated into the
//! session's diagnostics, and the terminal exec status becomes the session's
//! completion so a dump that fails midway is never taken as complete.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams};
use kube::Client;
use restash_exec::{Diagnostics, PodExecParams, RemoteExec, RemoteExecError, RemoteSession};

/// [`RemoteExec`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubePodExec {
    client: Client,
}

impl KubePodExec {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient kubeconfig or in-cluster service account.
    pub async fn try_default() -> Result<Self, RemoteExecError> {
        let client = Client::try_default()
            .await
            .map_err(|e| RemoteExecError::Connect(format!("failed to create kube client: {e}")))?;
        Ok(Self::new(client))
    }

    /// Namespace used when the caller does not name one.
    pub fn default_namespace() -> String {
        std::env::var("RESTASH_K8S_NAMESPACE")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "default".to_string())
    }
}

/// Attach parameters for a stdout-only exec into `params.container`.
pub(crate) fn attach_params(params: &PodExecParams) -> AttachParams {
    let ap = AttachParams::default()
        .stdin(false)
        .stdout(true)
        .stderr(true)
        .tty(false);
    match &params.container {
        Some(container) => ap.container(container.clone()),
        None => ap,
    }
}

pub(crate) fn map_kube_error(params: &PodExecParams, err: kube::Error) -> RemoteExecError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 || resp.code == 400 => RemoteExecError::Target {
            namespace: params.namespace.clone(),
            pod: params.pod.clone(),
            message: resp.message,
        },
        other => RemoteExecError::Connect(other.to_string()),
    }
}

#[async_trait]
impl RemoteExec for KubePodExec {
    async fn exec(&self, params: &PodExecParams) -> Result<RemoteSession, RemoteExecError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &params.namespace);
        tracing::info!(
            namespace = %params.namespace,
            pod = %params.pod,
            container = ?params.container,
            command = ?params.command,
            "opening pod exec stream"
        );

        let mut attached = pods
            .exec(&params.pod, params.command.clone(), &attach_params(params))
            .await
            .map_err(|e| map_kube_error(params, e))?;

        let stdout = attached
            .stdout()
            .ok_or_else(|| RemoteExecError::Stream("exec session has no stdout".to_string()))?;

        let diagnostics = Diagnostics::default();
        let diagnostics_task = attached.stderr().map(|stderr| {
            let diag = diagnostics.clone();
            tokio::spawn(async move { diag.fill_from(stderr).await })
        });
        let status = attached.take_status();
        let pod = params.pod.clone();
        let completion = async move {
            let outcome = match status {
                Some(status) => status.await,
                None => None,
            };
            match outcome {
                Some(status) if status.status.as_deref() == Some("Failure") => {
                    let message = status
                        .message
                        .unwrap_or_else(|| "remote command failed".to_string());
                    tracing::warn!(%pod, %message, "pod exec command failed");
                    Err(message)
                }
                _ => Ok(()),
            }
        };

        let mut session = RemoteSession::new(stdout, diagnostics)
            .with_completion(completion)
            .with_guard(attached);
        if let Some(task) = diagnostics_task {
            session = session.with_diagnostics_task(task);
        }
        Ok(session)
    }
}

#[cfg(test)]
#[path = "pod_exec_tests.rs"]
mod tests;
