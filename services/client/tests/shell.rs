use client_lib::adapters::HttpBackend;
use client_lib::presenter::TerminalPresenter;
use client_lib::shell::Shell;
use knowledge_hub_core::{ControllerOptions, SessionController, SessionPhase};
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

async fn mock_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate-key"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "filename": "notes.pdf",
            "summary": "# Notes\n- first point",
            "chunks": 12,
            "flashcards": [
                { "question": "Q1", "answer": "A1" },
                { "question": "Q2", "answer": "A2" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": ["a", "b"] })))
        .mount(&server)
        .await;
    server
}

fn shell_for(server: &MockServer) -> (Shell, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let presenter = Arc::new(TerminalPresenter::with_writer(buffer.clone()));
    let backend = Arc::new(HttpBackend::new(server.uri(), Duration::from_secs(5)).unwrap());
    let controller =
        SessionController::new(backend, presenter.clone(), ControllerOptions::default());
    (Shell::new(controller, presenter), buffer)
}

#[tokio::test]
async fn login_upload_and_search_through_the_shell() {
    let server = mock_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("notes.pdf");
    std::fs::write(&pdf, b"%PDF-1.4 fake").unwrap();

    let (mut shell, buffer) = shell_for(&server);
    let script = format!("login my-key\nupload {}\n", pdf.display());
    shell.run(script.as_bytes()).await.unwrap();

    let snapshot = shell.controller().snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::DocumentLoaded);
    let document = snapshot.document.unwrap();
    assert_eq!(document.chunk_count, 12);
    assert_eq!(document.flashcards.len(), 2);

    shell
        .run("search what is X\nsummary\nflip 2\n".as_bytes())
        .await
        .unwrap();

    let output = buffer.contents();
    assert!(output.contains("Logged in."));
    assert!(output.contains("'notes.pdf' is ready."));
    assert!(output.contains("a\n\nb"));
    assert!(output.contains("notes.pdf (12 chunks)"));
    assert!(output.contains("2. Q2\n   -> A2"));
}

#[tokio::test]
async fn upload_before_login_is_refused_without_network() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("notes.pdf");
    std::fs::write(&pdf, b"%PDF-1.4 fake").unwrap();

    let (mut shell, buffer) = shell_for(&server);
    shell
        .run(format!("upload {}\n", pdf.display()).as_bytes())
        .await
        .unwrap();

    assert!(buffer.contents().contains("! Please enter your API key first"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_pdf_upload_is_refused_without_network() {
    let server = mock_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, b"plain text").unwrap();

    let (mut shell, buffer) = shell_for(&server);
    shell
        .run(format!("login my-key\nupload {}\n", txt.display()).as_bytes())
        .await
        .unwrap();

    assert!(buffer.contents().contains("Only PDF files are supported"));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/upload"));
}

#[tokio::test]
async fn unknown_commands_and_quit() {
    let server = MockServer::start().await;
    let (mut shell, buffer) = shell_for(&server);

    shell
        .run("\nfrobnicate\nstatus\nquit\nlogin never-sent\n".as_bytes())
        .await
        .unwrap();

    let output = buffer.contents();
    assert!(output.contains("Unknown command 'frobnicate'"));
    assert!(output.contains("Session: not logged in"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
