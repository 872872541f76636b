// Shared fixture: a mock weight host plus a scratch root directory.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;
use tokio::runtime::Runtime;
use wavernn_hub::config::DEFAULT_WEIGHTS_FILE;
use wavernn_hub::weights::encode_safetensors;
use wavernn_hub::{HubConfig, ModelKind, WeightBundle};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct WeightHost {
    runtime: Runtime,
    server: MockServer,
    root: TempDir,
}

impl WeightHost {
    pub fn start() -> Self {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        Self {
            runtime,
            server,
            root: TempDir::new().unwrap(),
        }
    }

    pub fn config(&self) -> HubConfig {
        HubConfig::default()
            .with_base_url(format!("{}/pretrained", self.server.uri()))
            .with_root_dir(self.root.path())
    }

    /// The host's settings as a TOML document
    pub fn config_toml(&self) -> String {
        format!(
            "base_url = '{}/pretrained'\nroot_dir = '{}'\n",
            self.server.uri(),
            self.root.path().display()
        )
    }

    pub fn weights_path(&self, model: ModelKind) -> PathBuf {
        self.config().weights_path(model)
    }

    /// Answer every request for `model` with the encoded bundle
    pub fn serve_bundle(&self, model: ModelKind, bundle: &WeightBundle) {
        self.serve_bytes(model, encode_safetensors(bundle).unwrap(), None);
    }

    /// Answer the next `times` requests for `model` with `body`
    pub fn serve_bytes(&self, model: ModelKind, body: Vec<u8>, times: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path(weights_route(model)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body));
        let mock = match times {
            Some(n) => mock.up_to_n_times(n),
            None => mock,
        };
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn serve_status(&self, model: ModelKind, status: u16) {
        let mock = Mock::given(method("GET"))
            .and(path(weights_route(model)))
            .respond_with(ResponseTemplate::new(status));
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn request_count(&self) -> usize {
        self.runtime
            .block_on(self.server.received_requests())
            .map_or(0, |requests| requests.len())
    }
}

fn weights_route(model: ModelKind) -> String {
    format!("/pretrained/{}/{DEFAULT_WEIGHTS_FILE}", model.as_str())
}
