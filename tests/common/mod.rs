//! Local HTTP fixture for integration tests
//!
//! Serves a small patents export, a text file, an HTML page and a couple of
//! failing routes from an axum router bound to an ephemeral port.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures::stream;
use std::io;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Google Patents style export: banner line, header, then records
pub const FEED_CSV: &str = "\
search URL:,https://patents.google.com/?assignee=Acme&before=priority:20150101
id,title,assignee,inventor/author,priority date,filing/creation date,publication date,grant date,result link
US-7650331-B1,System and method for widgets,Acme Corp,Jane Doe,2004-06-18,2004-06-18,2010-01-19,2010-01-19,https://patents.google.com/patent/US7650331B1/en
EP-1234567-A1,Widget assembly,Acme GmbH,Max Muster,2001-02-03,2002-02-03,2003-02-03,,https://patents.google.com/patent/EP1234567A1/en
US-2012123456-A1,\"Gadget, improved\",Acme Corp,Jane Doe,2011-05-01,2011-05-01,2012-05-17,,https://patents.google.com/patent/US20120123456A1/en
US-8000000,Truncated key,Acme Corp,,,,,,
US-20130000042-A1,Gizmo,Acme Corp,John Roe,2012-01-01,2012-01-01,2013-01-03,,https://patents.google.com/patent/US20130000042A1/en
WO-2014000001-A1,Sprocket,Acme Corp,,,,,,
US-9123456-B2,Flange,Acme Corp,Jane Doe,2013-03-03,2013-03-03,2015-09-15,2015-09-15,https://patents.google.com/patent/US9123456B2/en
";

/// US identifiers in FEED_CSV, in order
pub const FEED_US_IDS: [&str; 4] = ["7650331", "20120123456", "20130000042", "9123456"];

pub const HELLO_TXT: &str = "hello world";

pub const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

pub const LINKS_HTML: &str = r#"<!doctype html>
<html>
  <body>
    <a href="/feed.csv">Feed</a>
    <a href='hello.txt'>Hello</a>
    <a href="https://other.org/elsewhere">Elsewhere</a>
    <p><a class="nav" href="/docs/index.html">Docs</a></p>
  </body>
</html>
"#;

/// Bytes `/truncated` sends before its body fails
pub const TRUNCATED_PREFIX: &str = "US-7650331-B1,partial\nUS-91";

/// Running fixture server; aborted on drop
pub struct TestServer {
    base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("test listener address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router())
                .await
                .expect("test server failed");
        });

        TestServer {
            base_url: format!("http://{}", addr),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router() -> Router {
    Router::new()
        .route("/feed.csv", get(|| async { FEED_CSV }))
        .route("/moved.csv", get(|| async { Redirect::temporary("/feed.csv") }))
        .route("/hello.txt", get(|| async { HELLO_TXT }))
        .route("/links.html", get(|| async { Html(LINKS_HTML) }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/truncated", get(|| async { truncated_body() }))
}

/// 200 response whose body fails after the first chunk
fn truncated_body() -> Body {
    Body::from_stream(stream::iter(vec![
        Ok(Bytes::from_static(TRUNCATED_PREFIX.as_bytes())),
        Err(io::Error::new(io::ErrorKind::Other, "body cut off")),
    ]))
}

/// URL on a port nothing is listening on
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway listener address");
    drop(listener);
    format!("http://{}/feed.csv", addr)
}
