//! Local catalog site served by tiny_http for end-to-end tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Route -> queued responses. The last response of a route repeats; unknown routes answer 404.
#[derive(Default)]
pub struct Routes {
    map: HashMap<String, VecDeque<(u16, String)>>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, route: &str, html: impl Into<String>) -> Self {
        self.respond(route, 200, html)
    }

    pub fn respond(mut self, route: &str, status: u16, body: impl Into<String>) -> Self {
        self.map
            .entry(route.to_string())
            .or_default()
            .push_back((status, body.into()));
        self
    }

    fn next(&mut self, route: &str) -> (u16, String) {
        match self.map.get_mut(route) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or((404, String::new())),
            Some(queue) => queue.front().cloned().unwrap_or((404, String::new())),
            None => (404, "not found".to_string()),
        }
    }
}

pub struct Site {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Site {
    /// Every request path (with query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

pub fn spawn_site(mut routes: Routes) -> Site {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let base_url = format!("http://{}", server.server_addr());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }
        let request = match server.recv_timeout(Duration::from_millis(50)) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(_) => break,
        };
        let url = request.url().to_string();
        log.lock().expect("request log").push(url.clone());
        let (status, body) = routes.next(&url);
        let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
            .expect("static header");
        let _ = request.respond(
            tiny_http::Response::from_string(body)
                .with_status_code(status)
                .with_header(header),
        );
    });

    Site {
        base_url,
        requests,
        shutdown: shutdown_tx,
        handle: Some(handle),
    }
}

pub fn widget(level: &str, options: &[(&str, &str)]) -> String {
    let items: String = options
        .iter()
        .map(|(label, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, label))
        .collect();
    format!(
        r#"<html><body><aside><ul class="filter-list" data-level="{}">{}</ul></aside></body></html>"#,
        level, items
    )
}

pub fn entry(title: &str, author: &str, href: &str) -> String {
    format!(
        r#"<div class="book-result">
  <h3 class="book-title"><a href="{href}">{title}</a></h3>
  <p class="book-authors"><span class="author">{author}</span></p>
  <span class="book-format">EPUB</span>
  <span class="book-price">$9.99</span>
  <span class="book-rating" data-rating="4.5">4.5 stars</span>
</div>"#
    )
}

pub fn listing(entries: &[String], next: Option<&str>) -> String {
    let pagination = match next {
        Some(href) => format!(
            r#"<div class="pagination"><a class="next" href="{}">Next</a></div>"#,
            href
        ),
        None => String::new(),
    };
    format!(
        r#"<html><body><p class="result-count">{} results</p><main>{}</main>{}</body></html>"#,
        entries.len(),
        entries.concat(),
        pagination
    )
}
