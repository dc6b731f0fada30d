//! Request backends.
//!
//! A [`Getter`] performs one blocking read and returns the response rendered
//! as text. Only the call itself is timed by the runner.

use std::path::Path;
use std::time::Duration;

use opseed_store::{DatastoreKind, Session};

use crate::config::RestconfConfig;
use crate::error::BenchError;
use crate::http::{SHARED_RUNTIME, http_client};

/// Media type for RESTCONF XML payloads
const YANG_DATA_XML: &str = "application/yang-data+xml";

/// One blocking read against a backend.
pub trait Getter {
    /// Label used in the summary line.
    fn label(&self) -> &str;

    /// Issue the request once.
    fn get(&mut self) -> Result<String, BenchError>;
}

/// `get_data` on a datastore session.
pub struct StoreGetter<S: Session> {
    session: S,
    xpath: String,
}

impl<S: Session> StoreGetter<S> {
    pub fn new(session: S, xpath: impl Into<String>) -> Self {
        Self {
            session,
            xpath: xpath.into(),
        }
    }

    /// Stop the underlying session.
    pub fn finish(self) -> Result<(), BenchError> {
        self.session.stop().map_err(BenchError::from)
    }
}

impl<S: Session> Getter for StoreGetter<S> {
    fn label(&self) -> &str {
        "store"
    }

    fn get(&mut self) -> Result<String, BenchError> {
        let tree = self.session.get_data(&self.xpath)?;
        Ok(tree.to_string())
    }
}

#[derive(Debug, Clone)]
enum Request {
    Get { url: String },
    Post { url: String, body: String },
}

/// HTTP read against a RESTCONF server.
pub struct RestconfGetter {
    request: Request,
    username: String,
    password: String,
    timeout: Duration,
}

impl RestconfGetter {
    /// Build the request once; the body of a raw request is read up front.
    pub fn new(config: &RestconfConfig, path: &str) -> Result<Self, BenchError> {
        let root = config.url.trim_end_matches('/');
        let request = match &config.raw_request {
            Some(file) => Request::Post {
                url: format!("{root}/operations"),
                body: read_body(file)?,
            },
            None => Request::Get {
                url: data_url(root, &config.datastore, path),
            },
        };
        Ok(Self {
            request,
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: config.timeout,
        })
    }

    /// Target URL of the prepared request.
    pub fn url(&self) -> &str {
        match &self.request {
            Request::Get { url } | Request::Post { url, .. } => url,
        }
    }
}

fn read_body(file: &Path) -> Result<String, BenchError> {
    std::fs::read_to_string(file).map_err(|source| BenchError::Io {
        path: file.to_path_buf(),
        source,
    })
}

/// `{root}/data{path}`, with an NMDA `ds/` prefix for non-running datastores.
fn data_url(root: &str, datastore: &str, path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let path = if path == "/" { "" } else { path.as_str() };
    match datastore.parse::<DatastoreKind>() {
        Ok(DatastoreKind::Running) | Err(_) => format!("{root}/data{path}"),
        Ok(kind) => format!("{root}/ds/ietf-datastores:{kind}{path}"),
    }
}

impl Getter for RestconfGetter {
    fn label(&self) -> &str {
        "restconf"
    }

    fn get(&mut self) -> Result<String, BenchError> {
        let client = http_client();
        let builder = match &self.request {
            Request::Get { url } => client.get(url),
            Request::Post { url, body } => client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, YANG_DATA_XML)
                .body(body.clone()),
        };
        let builder = builder
            .header(reqwest::header::ACCEPT, YANG_DATA_XML)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.timeout);

        SHARED_RUNTIME.handle().block_on(async {
            let response = builder
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| BenchError::from_reqwest(&e))?;
            response
                .text()
                .await
                .map_err(|e| BenchError::from_reqwest(&e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_for_running() {
        assert_eq!(
            data_url("http://h:8080/restconf", "running", "/interfaces"),
            "http://h:8080/restconf/data/interfaces"
        );
    }

    #[test]
    fn data_url_for_operational() {
        assert_eq!(
            data_url("http://h/restconf", "operational", "interfaces/interface"),
            "http://h/restconf/ds/ietf-datastores:operational/interfaces/interface"
        );
    }

    #[test]
    fn data_url_root_path() {
        assert_eq!(data_url("http://h", "running", "/"), "http://h/data");
    }

    #[test]
    fn raw_request_missing_file() {
        let config = RestconfConfig {
            raw_request: Some("/nonexistent/request.xml".into()),
            ..RestconfConfig::default()
        };
        let err = RestconfGetter::new(&config, "/").err().expect("should fail");
        assert!(matches!(err, BenchError::Io { .. }));
    }

    #[test]
    fn raw_request_posts_to_operations() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rpc.xml");
        std::fs::write(&file, "<get/>").unwrap();
        let config = RestconfConfig {
            url: "http://h/restconf/".into(),
            raw_request: Some(file),
            ..RestconfConfig::default()
        };
        let getter = RestconfGetter::new(&config, "/ignored").unwrap();
        assert_eq!(getter.url(), "http://h/restconf/operations");
    }
}
