//! Stage behavior against a scripted stand-in for kubectl
#![cfg(unix)]

use nbctl_core::{ConfirmationGate, DeployContext, DeployFlags, Deployment, Stage};
use nbctl_kube::{Kubectl, ManifestTemplates, OperatorStage, SchemaStage, SystemStage};
use serial_test::serial;
use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Writes a `kubectl` that logs its arguments (and stdin) and prints
/// `stdout` for every call
///
/// Tests run serially: a script still open for writing in one thread makes
/// exec fail with ETXTBSY in another.
struct FakeKubectl {
    dir: TempDir,
}

impl FakeKubectl {
    fn new(stdout: &str) -> Self {
        Self::with_script(&format!(
            "#!/bin/sh\necho \"$@\" >> \"$(dirname \"$0\")/calls.log\"\ncase \"$*\" in *\"-f -\"*) cat >> \"$(dirname \"$0\")/stdin.log\";; esac\ncat <<'JSON'\n{stdout}\nJSON\n"
        ))
    }

    fn failing(stderr: &str) -> Self {
        Self::with_script(&format!("#!/bin/sh\necho '{stderr}' >&2\nexit 1\n"))
    }

    fn with_script(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubectl");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    fn kubectl(&self) -> Arc<Kubectl> {
        Arc::new(
            Kubectl::new(Some("test-cluster".to_string()))
                .with_binary(self.dir.path().join("kubectl").to_string_lossy().to_string()),
        )
    }

    fn calls(&self) -> Vec<String> {
        read_lines(&self.dir.path().join("calls.log"))
    }

    fn stdin(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("stdin.log")).unwrap_or_default()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn ctx() -> DeployContext {
    DeployContext::new("storage", "noobaa")
}

fn templates() -> Arc<ManifestTemplates> {
    Arc::new(ManifestTemplates::new().unwrap())
}

fn crd_dir() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("noobaa.yaml"), "kind: CustomResourceDefinition\n").unwrap();
    let path = dir.path().to_path_buf();
    (dir, path)
}

#[tokio::test]
#[serial]
async fn test_context_is_passed_on_every_call() {
    let fake = FakeKubectl::new("");
    let kubectl = fake.kubectl();
    kubectl.run(&["get", "pods"]).await.unwrap();

    assert_eq!(fake.calls(), vec!["--context test-cluster get pods"]);
}

#[tokio::test]
#[serial]
async fn test_command_failure_carries_stderr() {
    let fake = FakeKubectl::failing("error: no matches for kind NooBaa");
    let err = fake.kubectl().run(&["get", "noobaa"]).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "kubectl get failed: error: no matches for kind NooBaa"
    );
}

#[tokio::test]
#[serial]
async fn test_schema_ready_when_established() {
    let fake = FakeKubectl::new(
        r#"{"kind":"List","items":[{"kind":"CustomResourceDefinition","metadata":{"name":"noobaas.noobaa.io"},"status":{"conditions":[{"type":"Established","status":"True"}]}}]}"#,
    );
    let (_guard, dir) = crd_dir();
    let stage = SchemaStage::new(fake.kubectl(), &dir);

    assert!(stage.is_ready(&ctx()).await.unwrap());
    let calls = fake.calls();
    assert!(calls[0].contains(&format!("get -f {} -o json", dir.display())));
}

#[tokio::test]
#[serial]
async fn test_schema_upgrade_is_server_side() {
    let fake = FakeKubectl::new("customresourcedefinition.apiextensions.k8s.io/noobaas.noobaa.io serverside-applied");
    let (_guard, dir) = crd_dir();
    let stage = SchemaStage::new(fake.kubectl(), &dir);

    stage.apply(&ctx()).await.unwrap();
    stage.upgrade(&ctx()).await.unwrap();
    stage.delete(&ctx()).await.unwrap();

    let calls = fake.calls();
    let dir = dir.display();
    assert_eq!(calls[0], format!("--context test-cluster apply -f {dir}"));
    assert_eq!(
        calls[1],
        format!("--context test-cluster apply -f {dir} --server-side --force-conflicts")
    );
    assert_eq!(
        calls[2],
        format!("--context test-cluster delete -f {dir} --ignore-not-found")
    );
}

#[tokio::test]
#[serial]
async fn test_operator_apply_pipes_rendered_manifest() {
    let fake = FakeKubectl::new("deployment.apps/noobaa-operator created");
    let stage = OperatorStage::platform(fake.kubectl(), templates());

    stage.apply(&ctx()).await.unwrap();

    assert_eq!(fake.calls(), vec!["--context test-cluster apply -f -"]);
    let stdin = fake.stdin();
    assert!(stdin.starts_with("apiVersion: v1\nkind: Namespace\nmetadata:\n  name: storage"));
    assert!(stdin.contains("kind: Deployment"));
    assert!(stdin.contains("namespace: storage"));
}

#[tokio::test]
#[serial]
async fn test_operator_delete_keeps_namespace() {
    let fake = FakeKubectl::new("deployment.apps \"noobaa-operator\" deleted");
    let stage = OperatorStage::platform(fake.kubectl(), templates());

    stage.delete(&ctx()).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec!["--context test-cluster delete -f - --ignore-not-found"]
    );
    let stdin = fake.stdin();
    assert!(stdin.contains("kind: Deployment"));
    assert!(!stdin.contains("kind: Namespace"));
}

fn database_operator(kubectl: Arc<Kubectl>) -> OperatorStage {
    OperatorStage::database(
        kubectl,
        templates(),
        "https://example.com/cnpg-1.24.1.yaml",
        "cnpg-system",
        "cnpg-controller-manager",
    )
}

#[tokio::test]
#[serial]
async fn test_uninstall_keeps_database_operator_release() {
    let fake = FakeKubectl::new("");
    let stages: Vec<Arc<dyn Stage>> = vec![Arc::new(database_operator(fake.kubectl()))];
    let deployment = Deployment::new(stages);
    let mut gate = ConfirmationGate::new(Cursor::new(Vec::new()), Vec::new(), "sure? y/n");

    deployment.uninstall(&ctx(), &mut gate).await.unwrap();

    let calls = fake.calls();
    assert!(
        calls.iter().all(|c| !c.contains("example.com")),
        "release manifest must not be deleted: {calls:?}"
    );
    assert_eq!(
        calls,
        vec![
            "--context test-cluster delete mutatingwebhookconfiguration/cnpg-mutating-webhook-configuration validatingwebhookconfiguration/cnpg-validating-webhook-configuration --ignore-not-found",
            "--context test-cluster delete -n cnpg-system deployment/cnpg-controller-manager service/cnpg-webhook-service serviceaccount/cnpg-manager configmap/cnpg-default-monitoring --ignore-not-found",
            "--context test-cluster delete clusterrolebinding/cnpg-manager-rolebinding clusterrole/cnpg-manager --ignore-not-found",
        ]
    );
}

#[tokio::test]
#[serial]
async fn test_cleanup_deletes_database_operator_release() {
    let fake = FakeKubectl::new("");
    let stage = database_operator(fake.kubectl());
    let ctx = ctx().with_flags(DeployFlags {
        cleanup: true,
        ..Default::default()
    });

    stage.delete(&ctx).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec!["--context test-cluster delete -f https://example.com/cnpg-1.24.1.yaml --ignore-not-found"]
    );
}

#[tokio::test]
#[serial]
async fn test_cleanup_removes_namespace_after_definitions() {
    let fake = FakeKubectl::new("");
    let (_guard, dir) = crd_dir();
    let stage = SchemaStage::new(fake.kubectl(), &dir);
    let ctx = ctx().with_flags(DeployFlags {
        cleanup: true,
        ..Default::default()
    });

    stage.delete(&ctx).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            format!(
                "--context test-cluster delete -f {} --ignore-not-found",
                dir.display()
            ),
            "--context test-cluster delete namespace/storage --ignore-not-found".to_string(),
        ]
    );
}

#[tokio::test]
#[serial]
async fn test_database_operator_uses_release_url() {
    let fake = FakeKubectl::new(
        r#"{"metadata":{"name":"cnpg-controller-manager","namespace":"cnpg-system"},"spec":{"replicas":1},"status":{"readyReplicas":1}}"#,
    );
    let stage = OperatorStage::database(
        fake.kubectl(),
        templates(),
        "https://example.com/cnpg-1.24.1.yaml",
        "cnpg-system",
        "cnpg-controller-manager",
    );

    stage.apply(&ctx()).await.unwrap();
    assert!(stage.is_ready(&ctx()).await.unwrap());

    let calls = fake.calls();
    assert_eq!(
        calls[0],
        "--context test-cluster apply -f https://example.com/cnpg-1.24.1.yaml --server-side --force-conflicts"
    );
    assert_eq!(
        calls[1],
        "--context test-cluster get deployment cnpg-controller-manager -n cnpg-system -o json --ignore-not-found"
    );
}

#[tokio::test]
#[serial]
async fn test_missing_operator_is_not_ready() {
    let fake = FakeKubectl::new("");
    let stage = OperatorStage::platform(fake.kubectl(), templates());

    assert!(!stage.is_ready(&ctx()).await.unwrap());
    assert_eq!(
        stage.status(&ctx()).await.unwrap(),
        "  Deployment storage/noobaa-operator not found"
    );
}

#[tokio::test]
#[serial]
async fn test_system_delete_with_data_cleanup_patches_first() {
    let fake = FakeKubectl::new(r#"{"metadata":{"name":"noobaa"},"status":{"phase":"Ready"}}"#);
    let stage = SystemStage::new(fake.kubectl(), templates());
    let ctx = ctx().with_flags(DeployFlags {
        cleanup_data: true,
        ..Default::default()
    });

    stage.delete(&ctx).await.unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].contains("get noobaa noobaa -n storage -o json"));
    assert!(calls[1].contains("patch noobaa noobaa -n storage --type merge -p"));
    assert!(calls[1].contains("yes-really-destroy-all-data"));
    assert_eq!(
        calls[2],
        "--context test-cluster delete noobaa noobaa -n storage --ignore-not-found"
    );
}

#[tokio::test]
#[serial]
async fn test_system_delete_without_data_cleanup() {
    let fake = FakeKubectl::new("");
    let stage = SystemStage::new(fake.kubectl(), templates());

    stage.delete(&ctx()).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec!["--context test-cluster delete noobaa noobaa -n storage --ignore-not-found"]
    );
}

#[tokio::test]
#[serial]
async fn test_system_readiness_follows_phase() {
    let fake = FakeKubectl::new(r#"{"metadata":{"name":"noobaa"},"status":{"phase":"Configuring"}}"#);
    let stage = SystemStage::new(fake.kubectl(), templates());

    assert!(!stage.is_ready(&ctx()).await.unwrap());
    assert_eq!(
        stage.status(&ctx()).await.unwrap(),
        "  NooBaa noobaa: phase Configuring"
    );
}
