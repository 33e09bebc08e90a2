use litfetch::config::Config;
use litfetch::errors::RowSourceError;
use litfetch::rows::DelimitedRows;
use litfetch::{CaughtError, Downloader, ErrorRecord, RowRecord};
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn row(title: &str, last: &str, first: &str, year: i64) -> RowRecord {
    RowRecord {
        work_title: title.to_string(),
        author_last_name: last.to_string(),
        author_first_name: first.to_string(),
        publication_year: year,
    }
}

fn hamlet() -> RowRecord {
    row("Hamlet", "Shakespeare", "William", 1603)
}

struct Workspace {
    dir: TempDir,
    config: Config,
}

impl Workspace {
    fn new(base_uri: String) -> Self {
        let dir = TempDir::new().unwrap();
        let config = Config {
            base_uri,
            output_dir: dir.path().join("out"),
            errors_path: dir.path().join("errors.json"),
            ..Config::default()
        };
        config.validate().unwrap();
        Self { dir, config }
    }

    fn downloader(&self) -> Downloader {
        Downloader::new(&self.config).unwrap()
    }

    fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.config.output_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn error_report(&self) -> Vec<ErrorRecord> {
        let json = std::fs::read_to_string(&self.config.errors_path).unwrap();
        serde_json::from_str(&json).unwrap()
    }
}

async fn archive_server() -> MockServer {
    MockServer::start().await
}

fn base_uri(server: &MockServer) -> String {
    format!("{}/lit/txt/", server.uri())
}

#[tokio::test]
async fn test_successful_row_is_saved_without_error_report() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/lit/txt/Shakespeare%20-%20Hamlet\.txt$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("To be..."))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    let summary = workspace.downloader().run(vec![Ok(hamlet())]).await;

    assert_eq!(summary.rows, 1);
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.failed, 0);
    assert!(summary.report.is_none());

    let saved = std::fs::read_to_string(workspace.config.output_dir.join("Shakespeare.txt")).unwrap();
    assert_eq!(saved, "To be...");
    assert!(!workspace.config.errors_path.exists());
}

#[tokio::test]
async fn test_not_found_is_recorded_and_nothing_saved() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    let summary = workspace.downloader().run(vec![Ok(hamlet())]).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.report, Some(workspace.config.errors_path.clone()));
    assert!(workspace.output_files().is_empty());

    let report = workspace.error_report();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].message, "HTTP response status code was not 200");
    assert_eq!(report[0].row_data.work_title, "Hamlet");
    assert!(matches!(
        report[0].caught_error,
        CaughtError::StatusFailure { status_code: 404, .. }
    ));
}

#[tokio::test]
async fn test_connection_refused_is_recorded_as_request_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let workspace = Workspace::new(format!("http://127.0.0.1:{}/lit/txt/", port));
    let summary = workspace.downloader().run(vec![Ok(hamlet())]).await;

    assert_eq!(summary.failed, 1);
    let report = workspace.error_report();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].message, "Error occurred during the HTTP request");
    match &report[0].caught_error {
        CaughtError::TransportFailure { detail } => assert!(!detail.is_empty()),
        other => panic!("expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mixed_rows_produce_one_file_and_one_error() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .and(path_regex(r"Hamlet\.txt$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("To be..."))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"Emma\.txt$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    let rows = vec![Ok(hamlet()), Ok(row("Emma", "Austen", "Jane", 1815))];
    let summary = workspace.downloader().run(rows).await;

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.saved + summary.failed, summary.rows);
    assert_eq!(workspace.output_files(), ["Shakespeare.txt"]);

    let report = workspace.error_report();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].row_data, row("Emma", "Austen", "Jane", 1815));
}

#[tokio::test]
async fn test_error_report_follows_processing_order() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .and(path_regex(r"Odyssey\.txt$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Sing to me"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    let rows = vec![
        Ok(row("Aeneid", "Virgil", "", 19)),
        Ok(row("Odyssey", "Homer", "", -700)),
        Ok(row("Inferno", "Dante", "", 1320)),
        Ok(row("Beowulf", "Unknown", "", 0)),
    ];
    let summary = workspace.downloader().run(rows).await;

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.failed, 3);

    let titles: Vec<String> = workspace
        .error_report()
        .into_iter()
        .map(|record| record.row_data.work_title)
        .collect();
    assert_eq!(titles, ["Aeneid", "Inferno", "Beowulf"]);
}

#[tokio::test]
async fn test_rerun_overwrites_with_identical_bytes() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("To be..."))
        .expect(2)
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    let downloader = workspace.downloader();
    downloader.run(vec![Ok(hamlet())]).await;
    downloader.run(vec![Ok(hamlet())]).await;

    assert_eq!(workspace.output_files(), ["Shakespeare.txt"]);
    let saved = std::fs::read(workspace.config.output_dir.join("Shakespeare.txt")).unwrap();
    assert_eq!(saved, b"To be...");
}

#[tokio::test]
async fn test_clean_run_leaves_previous_report_untouched() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("text"))
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    std::fs::write(&workspace.config.errors_path, "[]").unwrap();

    let summary = workspace.downloader().run(vec![Ok(hamlet())]).await;

    assert!(summary.report.is_none());
    assert_eq!(
        std::fs::read_to_string(&workspace.config.errors_path).unwrap(),
        "[]"
    );
}

#[tokio::test]
async fn test_unwritable_output_is_not_a_download_error() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("text"))
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    std::fs::remove_dir_all(&workspace.config.output_dir).unwrap();

    let summary = workspace.downloader().run(vec![Ok(hamlet())]).await;

    assert_eq!(summary.persist_failures, 1);
    assert_eq!(summary.failed, 0);
    assert!(!workspace.config.errors_path.exists());
}

#[tokio::test]
async fn test_csv_input_flows_through_the_pipeline() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .and(path_regex(r"Hamlet\.txt$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("To be..."))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    let input = workspace.dir.path().join("in.csv");
    std::fs::write(
        &input,
        "Work Title,Author Last Name,Author First Name,Publication Year\n\
         Hamlet,Shakespeare,William,1603\n\
         Odyssey,Homer,,unknown\n",
    )
    .unwrap();

    let rows = DelimitedRows::new(std::fs::File::open(&input).unwrap());
    let summary = workspace.downloader().run(rows).await;

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.saved, 1);

    let report = workspace.error_report();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].row_data.author_last_name, "Homer");
    assert_eq!(report[0].row_data.publication_year, 0);
}

#[tokio::test]
async fn test_unreadable_rows_are_counted_and_skipped() {
    let server = archive_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("text"))
        .expect(2)
        .mount(&server)
        .await;

    let workspace = Workspace::new(base_uri(&server));
    let rows = vec![
        Ok(hamlet()),
        Err(RowSourceError::SharedString("99".to_string())),
        Ok(row("Emma", "Austen", "Jane", 1815)),
    ];
    let summary = workspace.downloader().run(rows).await;

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.unreadable_rows, 1);
    assert_eq!(summary.saved, 2);
    assert_eq!(workspace.output_files(), ["Austen.txt", "Shakespeare.txt"]);
    assert!(!workspace.config.errors_path.exists());
}
