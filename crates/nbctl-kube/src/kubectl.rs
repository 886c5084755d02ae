//! kubectl CLI wrapper
//!
//! Every cluster interaction goes through the `kubectl` binary, so the
//! user's kubeconfig, contexts and auth plugins apply unchanged.

use crate::error::{KubeError, Result};
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// kubectl CLI wrapper
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: String,
    context: Option<String>,
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Kubectl {
    pub fn new(context: Option<String>) -> Self {
        Self {
            binary: "kubectl".to_string(),
            context,
        }
    }

    /// Use another executable, e.g. `oc`
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(context) = &self.context {
            cmd.arg("--context").arg(context);
        }
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    /// Run a kubectl command and return stdout
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        self.run_with_stdin(args, None).await
    }

    async fn run_with_stdin(&self, args: &[&str], input: Option<&str>) -> Result<String> {
        let mut cmd = self.command(args);
        if input.is_some() {
            cmd.stdin(Stdio::piped());
        }

        tracing::debug!("Running: {} {}", self.binary, args.join(" "));

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KubeError::KubectlNotFound,
            _ => KubeError::Io(e),
        })?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).await?;
            // closing stdin lets kubectl finish reading
            drop(stdin);
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KubeError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// `kubectl apply -f -` with the manifest on stdin
    pub async fn apply_manifest(&self, manifest: &str, server_side: bool) -> Result<String> {
        let mut args = vec!["apply", "-f", "-"];
        if server_side {
            args.extend(["--server-side", "--force-conflicts"]);
        }
        self.run_with_stdin(&args, Some(manifest)).await
    }

    pub async fn delete_manifest(&self, manifest: &str) -> Result<String> {
        self.run_with_stdin(&["delete", "-f", "-", "--ignore-not-found"], Some(manifest))
            .await
    }

    /// Apply a file, directory or URL
    pub async fn apply_path(&self, path: &str, server_side: bool) -> Result<String> {
        let mut args = vec!["apply", "-f", path];
        if server_side {
            args.extend(["--server-side", "--force-conflicts"]);
        }
        self.run(&args).await
    }

    pub async fn delete_path(&self, path: &str) -> Result<String> {
        self.run(&["delete", "-f", path, "--ignore-not-found"]).await
    }

    /// Everything defined under `path` as one JSON list
    pub async fn get_path_json(&self, path: &Path) -> Result<Value> {
        let path = path.to_string_lossy();
        let output = self.run(&["get", "-f", &path, "-o", "json"]).await?;
        Ok(serde_json::from_str(&output)?)
    }

    pub async fn get_path_table(&self, path: &Path) -> Result<String> {
        let path = path.to_string_lossy();
        self.run(&["get", "-f", &path]).await
    }

    /// `None` when the object does not exist
    pub async fn get_json(&self, kind: &str, name: &str, namespace: &str) -> Result<Option<Value>> {
        let output = self
            .run(&[
                "get",
                kind,
                name,
                "-n",
                namespace,
                "-o",
                "json",
                "--ignore-not-found",
            ])
            .await?;

        if output.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&output)?))
    }

    /// Human readable listing of every object of `kind`
    pub async fn get_table(&self, kind: &str, namespace: &str) -> Result<String> {
        self.run(&["get", kind, "-n", namespace]).await
    }

    pub async fn delete(&self, kind: &str, name: &str, namespace: &str) -> Result<String> {
        self.run(&["delete", kind, name, "-n", namespace, "--ignore-not-found"])
            .await
    }

    /// Delete named objects (`kind/name`); cluster-scoped ones take no namespace
    pub async fn delete_objects(&self, objects: &[String], namespace: Option<&str>) -> Result<String> {
        let mut args = vec!["delete"];
        if let Some(namespace) = namespace {
            args.extend(["-n", namespace]);
        }
        args.extend(objects.iter().map(String::as_str));
        args.push("--ignore-not-found");
        self.run(&args).await
    }

    pub async fn patch_merge(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        patch: &Value,
    ) -> Result<String> {
        let patch = patch.to_string();
        self.run(&[
            "patch", kind, name, "-n", namespace, "--type", "merge", "-p", &patch,
        ])
        .await
    }

    /// `gitVersion` of the API server
    pub async fn server_version(&self) -> Result<String> {
        let output = self.run(&["version", "-o", "json"]).await?;
        let version: Value = serde_json::from_str(&output)?;
        version
            .pointer("/serverVersion/gitVersion")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| KubeError::UnexpectedOutput("server version not reported".to_string()))
    }
}
