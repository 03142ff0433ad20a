//! End-to-end harvesting runs against an in-memory wiki
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use npc_harvest_lib::harvesting::{HarvestOrchestrator, NpcHarvestWorker, OrchestratorConfig};
use npc_harvest_lib::infrastructure::http_client::FetchError;
use npc_harvest_lib::infrastructure::image_store::ImageStore;
use npc_harvest_lib::infrastructure::infobox_parser::NpcInfoboxParser;
use npc_harvest_lib::infrastructure::npc_store::{CheckpointStore, JsonDatabaseStore, StoreError};
use npc_harvest_lib::infrastructure::wiki_source::WikiSource;
use npc_harvest_lib::{HarvestConfig, HarvestUseCase, NpcDatabase, NpcRecord};

const AELIN_THUMB: &str =
    "https://static.wikia.nocookie.net/regnum/images/a/ab/Aelin.jpg/revision/latest/scale-to-width-down/270?cb=20200101";
const AELIN_CANONICAL: &str = "https://static.wikia.nocookie.net/regnum/images/a/ab/Aelin.jpg/revision/latest";

fn infobox_page(name: &str, image_url: Option<&str>, sex: Option<&str>) -> String {
    let image_row = image_url
        .map(|url| format!(r#"<tr><td colspan="2"><a href="{url}"><img src="{url}" width="270"></a></td></tr>"#))
        .unwrap_or_default();
    let sex_row = sex
        .map(|sex| format!("<tr><td><b>Sex:</b></td><td> {sex} </td></tr>"))
        .unwrap_or_default();
    format!(
        r#"<html><body><div class="content">
        <table class="infobox"><tr><th colspan="2"> {name} </th></tr>{image_row}
        <tr><td>Realm:</td><td>Alsius</td></tr>{sex_row}</table>
        </div></body></html>"#
    )
}

#[derive(Default)]
struct FakeWiki {
    pages: HashMap<String, String>,
    panic_on: Option<String>,
    page_requests: AtomicUsize,
    image_requests: AtomicUsize,
}

impl FakeWiki {
    fn with_page(mut self, name: &str, html: String) -> Self {
        self.pages.insert(name.to_string(), html);
        self
    }
}

#[async_trait]
impl WikiSource for FakeWiki {
    async fn fetch_page(&self, npc_name: &str) -> Result<String, FetchError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        if self.panic_on.as_deref() == Some(npc_name) {
            panic!("malformed page for {npc_name}");
        }
        self.pages.get(npc_name).cloned().ok_or_else(|| FetchError::Status {
            status: 404,
            url: npc_name.to_string(),
        })
    }

    async fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        self.image_requests.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
    }
}

/// Keeps a copy of the database at every save
#[derive(Clone, Default)]
struct RecordingStore {
    snapshots: Arc<Mutex<Vec<NpcDatabase>>>,
}

impl RecordingStore {
    fn snapshot_sizes(&self) -> Vec<usize> {
        self.snapshots.lock().unwrap().iter().map(NpcDatabase::len).collect()
    }

    fn snapshot(&self, index: usize) -> NpcDatabase {
        self.snapshots.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl CheckpointStore for RecordingStore {
    async fn save(&self, database: &NpcDatabase) -> Result<(), StoreError> {
        self.snapshots.lock().unwrap().push(database.clone());
        Ok(())
    }
}

fn orchestrator<S: CheckpointStore>(
    wiki: Arc<FakeWiki>,
    images: &Path,
    store: S,
    max_concurrency: usize,
) -> HarvestOrchestrator<S> {
    let worker = NpcHarvestWorker::new(wiki, Arc::new(NpcInfoboxParser::new().unwrap()), ImageStore::new(images));
    HarvestOrchestrator::new(
        Arc::new(worker),
        store,
        OrchestratorConfig {
            max_concurrency,
            checkpoint_interval: 10,
        },
    )
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn write_config(root: &Path, catalog: &[&str]) -> HarvestConfig {
    let list = root.join("alsius_fandom_npcs.txt");
    let mut content = String::from("Name\tRealm\n");
    for name in catalog {
        content.push_str(&format!("{name}\tAlsius\n"));
    }
    std::fs::write(&list, content).unwrap();

    let mut config = HarvestConfig::default();
    config.paths.name_lists = vec![list];
    config.paths.database_file = root.join("data").join("npc_fandom_data.json");
    config.paths.images_dir = root.join("data").join("npc_images");
    config
}

#[tokio::test]
async fn aelin_succeeds_and_borin_fails() {
    let dir = tempfile::tempdir().unwrap();
    let wiki = Arc::new(
        FakeWiki::default()
            .with_page("Aelin", infobox_page("Aelin", Some(AELIN_THUMB), Some("Female")))
            .with_page("Borin", "<html><body><p>Borin is a blacksmith.</p></body></html>".to_string()),
    );
    let config = write_config(dir.path(), &["Aelin", "Borin"]);

    let report = HarvestUseCase::with_source(config.clone(), wiki.clone())
        .execute_with_cancellation(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed_names, vec!["Borin".to_string()]);

    let saved = JsonDatabaseStore::new(&config.paths.database_file).load().await.unwrap();
    let expected: NpcDatabase = [NpcRecord::new("Aelin").with_image_url(AELIN_CANONICAL).with_sex("Female")]
        .into_iter()
        .collect();
    assert_eq!(saved, expected);

    let images: Vec<_> = std::fs::read_dir(&config.paths.images_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(images, vec!["Aelin.jpg".to_string()]);
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let wiki = Arc::new(
        FakeWiki::default()
            .with_page("Aelin", infobox_page("Aelin", Some(AELIN_THUMB), Some("Female")))
            .with_page("Cara", infobox_page("Cara", Some(AELIN_THUMB), Some("Female"))),
    );
    let config = write_config(dir.path(), &["Aelin", "Borin", "Cara"]);
    let use_case = HarvestUseCase::with_source(config.clone(), wiki.clone());

    use_case.execute_with_cancellation(CancellationToken::new()).await.unwrap();
    let first = std::fs::read_to_string(&config.paths.database_file).unwrap();
    assert_eq!(wiki.image_requests.load(Ordering::SeqCst), 2);

    let report = use_case.execute_with_cancellation(CancellationToken::new()).await.unwrap();
    let second = std::fs::read_to_string(&config.paths.database_file).unwrap();

    assert_eq!(first, second);
    assert_eq!(report.already_complete, 2);
    assert_eq!(report.total, 1);
    assert_eq!(report.failed_names, vec!["Borin".to_string()]);
    assert_eq!(wiki.image_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn partial_record_is_harvested_again() {
    let dir = tempfile::tempdir().unwrap();
    let wiki = Arc::new(FakeWiki::default().with_page("Dren", infobox_page("Dren", None, None)));
    let config = write_config(dir.path(), &["Dren"]);
    let use_case = HarvestUseCase::with_source(config.clone(), wiki.clone());

    let first = use_case.execute_with_cancellation(CancellationToken::new()).await.unwrap();
    assert_eq!(first.succeeded, 1);

    let saved = JsonDatabaseStore::new(&config.paths.database_file).load().await.unwrap();
    assert_eq!(saved.get("Dren"), Some(&NpcRecord::new("Dren")));
    assert_eq!(saved.pending_names(&names(&["Dren"])), names(&["Dren"]));

    let second = use_case.execute_with_cancellation(CancellationToken::new()).await.unwrap();
    assert_eq!(second.total, 1);
    assert_eq!(wiki.page_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn nothing_pending_skips_the_save() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::default();
    let mut database: NpcDatabase = [NpcRecord::new("Aelin").with_sex("Female")].into_iter().collect();

    let report = orchestrator(Arc::new(FakeWiki::default()), dir.path(), store.clone(), 4)
        .run(&mut database, &names(&["Aelin"]))
        .await
        .unwrap();

    assert_eq!(report.total, 0);
    assert!(store.snapshot_sizes().is_empty());
}

#[tokio::test]
async fn checkpoints_every_ten_completions_plus_final() {
    let dir = tempfile::tempdir().unwrap();
    let catalog: Vec<String> = (0..25).map(|i| format!("Npc {i:02}")).collect();
    let wiki = catalog.iter().fold(FakeWiki::default(), |wiki, name| {
        let page = infobox_page(name, None, Some("Male"));
        wiki.with_page(name, page)
    });
    let store = RecordingStore::default();
    let mut database = NpcDatabase::new();

    let report = orchestrator(Arc::new(wiki), dir.path(), store.clone(), 3)
        .run(&mut database, &catalog)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 25);
    assert_eq!(report.checkpoints, 3);
    assert_eq!(store.snapshot_sizes(), vec![10, 20, 25]);
    assert_eq!(database.complete_count(), 25);
}

#[tokio::test]
async fn failures_advance_the_checkpoint_count() {
    let dir = tempfile::tempdir().unwrap();
    let catalog: Vec<String> = (0..12).map(|i| format!("Npc {i:02}")).collect();
    let missing = ["Npc 01", "Npc 03", "Npc 05", "Npc 07", "Npc 11"];
    let wiki = catalog
        .iter()
        .filter(|name| !missing.contains(&name.as_str()))
        .fold(FakeWiki::default(), |wiki, name| {
            let page = infobox_page(name, None, Some("Female"));
            wiki.with_page(name, page)
        });
    let store = RecordingStore::default();
    let mut database = NpcDatabase::new();

    // One worker on the single-threaded test runtime completes in catalog order.
    let report = orchestrator(Arc::new(wiki), dir.path(), store.clone(), 1)
        .run(&mut database, &catalog)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 7);
    assert_eq!(report.failed, 5);
    assert_eq!(report.checkpoints, 2);
    assert_eq!(store.snapshot_sizes(), vec![6, 7]);

    let checkpoint = store.snapshot(0);
    for name in ["Npc 00", "Npc 02", "Npc 04", "Npc 06", "Npc 08", "Npc 09"] {
        assert!(checkpoint.is_complete(name), "{name} missing from checkpoint");
    }
    assert!(!checkpoint.contains("Npc 10"));
    for name in missing {
        assert!(!checkpoint.contains(name));
    }

    // Resuming from the checkpoint only revisits what it lacks.
    assert_eq!(
        checkpoint.pending_names(&catalog),
        names(&["Npc 01", "Npc 03", "Npc 05", "Npc 07", "Npc 10", "Npc 11"])
    );
}

#[tokio::test]
async fn panicking_worker_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let mut wiki = FakeWiki::default()
        .with_page("Aelin", infobox_page("Aelin", None, Some("Female")))
        .with_page("Borin", infobox_page("Borin", None, Some("Male")));
    wiki.panic_on = Some("Cara".to_string());
    let store = RecordingStore::default();
    let mut database = NpcDatabase::new();

    let report = orchestrator(Arc::new(wiki), dir.path(), store.clone(), 2)
        .run(&mut database, &names(&["Aelin", "Borin", "Cara"]))
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed_names, vec!["Cara".to_string()]);
    assert!(database.is_complete("Aelin"));
    assert!(database.is_complete("Borin"));
    assert!(!database.contains("Cara"));
}

#[tokio::test]
async fn cancelled_run_still_saves() {
    let dir = tempfile::tempdir().unwrap();
    let wiki = Arc::new(FakeWiki::default().with_page("Aelin", infobox_page("Aelin", None, Some("Female"))));
    let store = RecordingStore::default();
    let mut database = NpcDatabase::new();

    let orchestrator = orchestrator(wiki.clone(), dir.path(), store.clone(), 2);
    orchestrator.cancellation_token().cancel();

    let report = orchestrator
        .run(&mut database, &names(&["Aelin", "Borin"]))
        .await
        .unwrap();

    assert_eq!(report.cancelled_names.len(), 2);
    assert_eq!(report.failed, 0);
    assert!(!report.is_clean());
    assert_eq!(wiki.page_requests.load(Ordering::SeqCst), 0);
    assert_eq!(store.snapshot_sizes(), vec![0]);
}

#[tokio::test]
async fn block_for_another_name_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let wiki = Arc::new(
        FakeWiki::default()
            .with_page("Aelin", infobox_page("Aelin the Elder", None, Some("Female")))
            .with_page("Borin", infobox_page("Borin", None, Some("Male"))),
    );
    let mut database = NpcDatabase::new();

    let report = orchestrator(wiki, dir.path(), RecordingStore::default(), 2)
        .run(&mut database, &names(&["Aelin", "Borin"]))
        .await
        .unwrap();

    assert_eq!(report.failed_names, vec!["Aelin".to_string()]);
    assert_eq!(database.get("Borin").map(|r| r.name.as_str()), Some("Borin"));
}
