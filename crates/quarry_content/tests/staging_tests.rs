//! Integration tests for quarry_content

use std::fs;
use std::path::{PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quarry_content::*;
use tempfile::TempDir;

/// Project layout with a `Content/Tex` folder and a drop folder outside it
struct Fixture {
    _dir: TempDir,
    content: PathBuf,
    tex: PathBuf,
    drops: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("Content");
        let tex = content.join("Tex");
        let drops = dir.path().join("drops");
        fs::create_dir_all(&tex).unwrap();
        fs::create_dir_all(&drops).unwrap();
        Self {
            _dir: dir,
            content,
            tex,
            drops,
        }
    }

    fn drop_file(&self, name: &str) -> PathBuf {
        let path = self.drops.join(name);
        fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    fn staging(&self) -> StagingArea {
        StagingArea::new(ProjectContext::new(&self.content).unwrap())
    }

    fn tex_folder(&self) -> String {
        self.tex.to_string_lossy().into_owned()
    }
}

/// Runner whose jobs never finish
struct StalledRunner;

#[async_trait]
impl ImportJobRunner for StalledRunner {
    async fn import(&self, _request: &ImportRequest) -> ImportResult<ImportedAsset> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ImportedAsset::default())
    }
}

fn file_names<'a>(proxies: impl Iterator<Item = &'a TextureProxy>) -> Vec<String> {
    proxies
        .map(|p| p.source().file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn group_names(proxy: &TextureProxy) -> Vec<String> {
    proxy
        .group()
        .sources()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_drop_dedups_and_import_clears() {
    let fx = Fixture::new();
    let a = fx.drop_file("a.png");
    let b = fx.drop_file("b.png");

    let mut staging = fx.staging();
    staging.add_files(&[a.clone(), b, a], &fx.tex_folder()).unwrap();

    assert_eq!(staging.textures().len(), 2);
    assert_eq!(file_names(staging.textures().proxies()), vec!["a.png", "b.png"]);
    assert_eq!(staging.file_count(), 2);

    let dispatcher = ImportDispatcher::new(Arc::new(StalledRunner), 1).unwrap();
    let batches = staging.import(&dispatcher);

    assert_eq!(batches.len(), 1);
    assert_eq!(staging.textures().len(), 0);
    assert_eq!(staging.file_count(), 0);

    // Queued events are sent before the call returns.
    assert_eq!(staging.importing().items().len(), 2);
    assert!(staging.importing().has_pending());
}

#[test]
fn test_add_files_is_idempotent() {
    let fx = Fixture::new();
    let paths = vec![
        fx.drop_file("a.png"),
        fx.drop_file("ship.fbx"),
        fx.drop_file("theme.ogg"),
        fx.drop_file("readme.md"),
    ];

    let mut staging = fx.staging();
    staging.add_files(&paths, &fx.tex_folder()).unwrap();
    let first = staging.file_count();
    staging.add_files(&paths, &fx.tex_folder()).unwrap();

    assert_eq!(first, 3);
    assert_eq!(staging.file_count(), first);
}

#[test]
fn test_destination_is_normalized() {
    let fx = Fixture::new();
    let a = fx.drop_file("a.png");
    let folder = format!("{}{}{}", fx.tex_folder(), MAIN_SEPARATOR, MAIN_SEPARATOR);

    let mut staging = fx.staging();
    staging.add_files(&[a], &folder).unwrap();

    let proxy = staging.textures().proxies().next().unwrap();
    let dest = proxy.destination_folder();
    assert!(dest.ends_with(MAIN_SEPARATOR));
    assert!(!dest[..dest.len() - 1].ends_with(MAIN_SEPARATOR));
    assert_eq!(normalize_destination(dest), dest);
    assert_eq!(staging.last_destination_folder(), Some(dest));
}

#[test]
fn test_invalid_destinations() {
    let fx = Fixture::new();
    let a = fx.drop_file("a.png");
    let mut staging = fx.staging();

    let outside = fx.drops.to_string_lossy().into_owned();
    let missing = fx.content.join("Nope").to_string_lossy().into_owned();
    let file = a.to_string_lossy().into_owned();

    for folder in ["", missing.as_str(), outside.as_str(), file.as_str()] {
        let result = staging.add_files(&[a.clone()], folder);
        assert!(
            matches!(result, Err(StagingError::InvalidDestination { .. })),
            "{:?} accepted",
            folder
        );
    }
    assert_eq!(staging.file_count(), 0);
    assert_eq!(staging.last_destination_folder(), None);
}

#[test]
fn test_change_destination_is_validated() {
    let fx = Fixture::new();
    let a = fx.drop_file("a.png");
    fs::create_dir_all(fx.content.join("Other")).unwrap();

    let mut staging = fx.staging();
    staging.add_files(&[a], &fx.tex_folder()).unwrap();
    let id = staging.textures().proxies().next().unwrap().id();

    let outside = fx.drops.to_string_lossy().into_owned();
    assert!(staging.change_destination(AssetKind::Texture, id, &outside).is_err());

    let other = fx.content.join("Other").to_string_lossy().into_owned();
    assert!(staging.change_destination(AssetKind::Texture, id, &other).unwrap());
    let dest = staging.textures().get(id).unwrap().destination_folder().to_string();
    assert_eq!(staging.content_subfolder(&dest), format!("{0}Other{0}", MAIN_SEPARATOR));

    // Wrong kind: nothing to change.
    assert!(!staging.change_destination(AssetKind::Audio, id, &other).unwrap());
}

#[test]
fn test_absorb_rejects_existing_group_owner() {
    let fx = Fixture::new();
    let paths = [
        fx.drop_file("base.png"),
        fx.drop_file("normal.png"),
        fx.drop_file("rough.png"),
        fx.drop_file("ao.png"),
    ];
    let mut staging = fx.staging();
    staging.add_files(&paths, &fx.tex_folder()).unwrap();

    let textures = staging.textures_mut();
    let ids: Vec<ProxyId> = textures.proxies().map(|p| p.id()).collect();

    // rough owns ao
    assert!(textures.move_to_target(ids[3], ids[2]));
    let base_before = group_names(textures.get(ids[0]).unwrap());
    let rough_before = group_names(textures.get(ids[2]).unwrap());

    assert!(!textures.move_to_target(ids[2], ids[0]));
    assert_eq!(group_names(textures.get(ids[0]).unwrap()), base_before);
    assert_eq!(group_names(textures.get(ids[2]).unwrap()), rough_before);
    assert!(textures.get(ids[2]).unwrap().is_staged());
}

#[test]
fn test_absorb_rejects_source_already_in_group() {
    let fx = Fixture::new();
    let base = fx.drop_file("base.png");
    let normal = fx.drop_file("normal.png");
    let mut staging = fx.staging();
    staging.add_files(&[base, normal.clone()], &fx.tex_folder()).unwrap();

    let ids: Vec<ProxyId> = staging.textures().proxies().map(|p| p.id()).collect();
    assert!(staging.textures_mut().move_to_target(ids[1], ids[0]));

    // Dropped again while absorbed: staged as a fresh proxy.
    staging.add_files(&[normal], &fx.tex_folder()).unwrap();
    let textures = staging.textures_mut();
    let again = textures.proxies().map(|p| p.id()).find(|&id| id != ids[0]).unwrap();
    assert_ne!(again, ids[1]);

    assert!(!textures.move_to_target(again, ids[0]));
    assert_eq!(textures.get(ids[0]).unwrap().group().len(), 2);
    assert!(textures.get(again).unwrap().is_staged());
    assert_eq!(textures.len(), 2);
}

#[test]
fn test_move_down_of_last_member_is_noop() {
    let fx = Fixture::new();
    let mut staging = fx.staging();
    staging
        .add_files(&[fx.drop_file("base.png"), fx.drop_file("normal.png")], &fx.tex_folder())
        .unwrap();

    let textures = staging.textures_mut();
    let ids: Vec<ProxyId> = textures.proxies().map(|p| p.id()).collect();
    assert!(textures.move_to_target(ids[1], ids[0]));

    textures.move_down(ids[0], &[ids[1]]);
    assert_eq!(group_names(textures.get(ids[0]).unwrap()), vec!["base.png", "normal.png"]);
}

#[test]
fn test_group_order_reaches_import_request() {
    let fx = Fixture::new();
    let names = ["base.png", "mip1.png", "mip2.png", "mip3.png"];
    let paths: Vec<PathBuf> = names.iter().map(|n| fx.drop_file(n)).collect();

    let mut staging = fx.staging();
    staging.add_files(&paths, &fx.tex_folder()).unwrap();

    let textures = staging.textures_mut();
    let ids: Vec<ProxyId> = textures.proxies().map(|p| p.id()).collect();
    for &member in &ids[1..] {
        assert!(textures.move_to_target(member, ids[0]));
    }
    textures.move_up(ids[0], &[ids[3]]);
    assert_eq!(textures.len(), 1);

    let runner = Arc::new(RawCopyRunner::new(true));
    let dispatcher = ImportDispatcher::new(runner, 1).unwrap();
    staging.import(&dispatcher);
    wait_for_batches(&mut staging, &dispatcher, 1);

    let manifest = fs::read_to_string(fx.tex.join("base.import.json")).unwrap();
    let request: ImportRequest = serde_json::from_str(&manifest).unwrap();
    let sources: Vec<String> = request
        .sources()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(sources, vec!["base.png", "mip1.png", "mip3.png", "mip2.png"]);

    for name in names {
        assert!(fx.tex.join(name).is_file(), "{} not copied", name);
    }
    assert!(!staging.importing().has_pending());
}

#[test]
fn test_kinds_dispatch_independently() {
    let fx = Fixture::new();
    let mut staging = fx.staging();
    staging
        .add_files(
            &[fx.drop_file("ship.fbx"), fx.drop_file("hit.wav"), fx.drop_file("a.png")],
            &fx.tex_folder(),
        )
        .unwrap();

    let dispatcher = ImportDispatcher::new(Arc::new(RawCopyRunner::new(false)), 2).unwrap();
    let batches = staging.import(&dispatcher);
    assert_eq!(batches.len(), 3);
    wait_for_batches(&mut staging, &dispatcher, 3);

    let importing = staging.importing_mut();
    importing.set_filter(Some(AssetKind::Audio));
    assert_eq!(importing.visible().count(), 1);
    assert!(importing
        .visible()
        .all(|item| item.status == ImportStatus::Succeeded));

    assert_eq!(importing.clear(None), 3);
    assert!(importing.items().is_empty());
}

#[test]
fn test_dropped_files_follow_last_destination() {
    let fx = Fixture::new();
    let mut staging = fx.staging();

    let early = staging.add_dropped_files(&[fx.drop_file("a.png")]);
    assert!(matches!(early, Err(StagingError::InvalidDestination { .. })));

    staging.add_files(&[fx.drop_file("b.png")], &fx.tex_folder()).unwrap();
    staging
        .add_dropped_files(&[fx.drop_file("c.png"), fx.drop_file("d.ogg")])
        .unwrap();

    assert_eq!(staging.textures().len(), 2);
    assert_eq!(staging.audio().len(), 1);
    let audio_dest = staging.audio().proxies().next().unwrap().destination_folder();
    assert_eq!(staging.content_subfolder(audio_dest), format!("{0}Tex{0}", MAIN_SEPARATOR));
}

fn wait_for_batches(staging: &mut StagingArea, dispatcher: &ImportDispatcher, count: usize) {
    let mut finished = 0;
    for _ in 0..500 {
        finished += staging
            .pump_import_events(dispatcher)
            .iter()
            .filter(|e| matches!(e, ImportEvent::BatchFinished { .. }))
            .count();
        if finished >= count {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("only {} of {} batches finished", finished, count);
}
