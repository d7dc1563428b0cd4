use async_trait::async_trait;
use package_size::ports::outbound::{ContainerId, ContainerSpec, LogStream, WaitOutcome};
use package_size::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Fixture key for a bare `npm install` against a written package.json.
pub const MANIFEST_INSTALL: &str = "package.json";

/// What a fake install leaves behind.
#[derive(Debug, Clone)]
pub struct InstallFixture {
    pub size_bytes: u64,
    /// Top-level packages written to the lockfile, besides the root entry
    pub locked: Vec<(String, String)>,
    pub write_lockfile: bool,
}

impl InstallFixture {
    /// An install of `size_bytes` with `subdependencies` anonymous packages.
    pub fn new(size_bytes: u64, subdependencies: usize) -> Self {
        Self {
            size_bytes,
            locked: (1..=subdependencies)
                .map(|i| (format!("dep-{}", i), format!("1.0.{}", i)))
                .collect(),
            write_lockfile: true,
        }
    }

    /// Adds a named top-level package to the lockfile.
    pub fn with_locked(mut self, name: &str, version: &str) -> Self {
        self.locked.push((name.to_string(), version.to_string()));
        self
    }

    pub fn without_lockfile(mut self) -> Self {
        self.write_lockfile = false;
        self
    }

    fn lockfile_json(&self) -> String {
        let mut packages = serde_json::Map::new();
        packages.insert("".to_string(), serde_json::json!({ "name": "app" }));
        for (name, version) in &self.locked {
            packages.insert(
                format!("node_modules/{}", name),
                serde_json::json!({ "version": version }),
            );
        }
        serde_json::json!({ "lockfileVersion": 3, "packages": packages }).to_string()
    }

    fn write_into(&self, dir: &Path) {
        let package_dir = dir.join("node_modules").join("fixture");
        fs::create_dir_all(&package_dir).unwrap();
        fs::write(
            package_dir.join("index.js"),
            vec![b'x'; self.size_bytes as usize],
        )
        .unwrap();
        if self.write_lockfile {
            fs::write(dir.join("package-lock.json"), self.lockfile_json()).unwrap();
        }
    }
}

struct Container {
    sandbox_dir: PathBuf,
    install_key: String,
}

/// Mock ContainerRuntime that fakes `npm install`
///
/// Waiting on a container writes the fixture registered for its install
/// argument (`name@version`, or [`MANIFEST_INSTALL`]) into the directory
/// mounted at `/app`. Unknown installs exit with status 1 and leave nothing.
#[derive(Default)]
pub struct MockContainerRuntime {
    fixtures: HashMap<String, InstallFixture>,
    containers: Mutex<HashMap<String, Container>>,
    next_id: AtomicUsize,
    install_delay: Option<Duration>,
    pub created: Mutex<Vec<ContainerSpec>>,
    pub removed: Mutex<Vec<String>>,
    pub pulled: Mutex<Vec<String>>,
    pub manifests: Mutex<Vec<String>>,
}

impl MockContainerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_install(mut self, key: &str, fixture: InstallFixture) -> Self {
        self.fixtures.insert(key.to_string(), fixture);
        self
    }

    pub fn with_install_delay(mut self, delay: Duration) -> Self {
        self.install_delay = Some(delay);
        self
    }

    /// Install arguments of every created container, in creation order
    pub fn installs(&self) -> Vec<String> {
        let created = self.created.lock().unwrap();
        created.iter().map(install_key).collect()
    }

    pub fn removed_count(&self) -> usize {
        self.removed.lock().unwrap().len()
    }
}

fn install_key(spec: &ContainerSpec) -> String {
    match spec.command.last() {
        Some(arg) if spec.command.len() > 4 => arg.clone(),
        _ => MANIFEST_INSTALL.to_string(),
    }
}

#[async_trait]
impl ContainerRuntime for MockContainerRuntime {
    async fn pull_image(&self, image: &str) -> Result<()> {
        self.pulled.lock().unwrap().push(image.to_string());
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let sandbox_dir = spec
            .mounts
            .iter()
            .find(|m| m.target == "/app")
            .map(|m| m.source.clone())
            .expect("sandbox mount");
        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst));

        self.containers.lock().unwrap().insert(
            id.clone(),
            Container {
                sandbox_dir,
                install_key: install_key(spec),
            },
        );
        self.created.lock().unwrap().push(spec.clone());
        Ok(ContainerId(id))
    }

    async fn start(&self, _id: &ContainerId) -> Result<()> {
        Ok(())
    }

    async fn stream_logs(&self, _id: &ContainerId) -> Result<LogStream> {
        Ok(Box::new(tokio::io::empty()))
    }

    async fn wait(&self, id: &ContainerId) -> Result<WaitOutcome> {
        if let Some(delay) = self.install_delay {
            tokio::time::sleep(delay).await;
        }

        let (sandbox_dir, key) = {
            let containers = self.containers.lock().unwrap();
            let container = &containers[&id.0];
            (container.sandbox_dir.clone(), container.install_key.clone())
        };

        if key == MANIFEST_INSTALL {
            let manifest = fs::read_to_string(sandbox_dir.join(MANIFEST_INSTALL)).unwrap();
            self.manifests.lock().unwrap().push(manifest);
        }

        let status_code = match self.fixtures.get(&key) {
            Some(fixture) => {
                fixture.write_into(&sandbox_dir);
                0
            }
            None => 1,
        };
        Ok(WaitOutcome {
            status_code,
            fault: None,
        })
    }

    async fn remove(&self, id: &ContainerId) -> Result<()> {
        self.removed.lock().unwrap().push(id.0.clone());
        Ok(())
    }
}
