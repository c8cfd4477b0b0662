mod support;

use std::path::Path;
use std::time::Duration;

use snapdeck::{
    CaptureLayout, CaptureRegion, CaptureScheduler, CheckpointStore, Finish, Locale, OutputLayout,
    SchedulerTiming, SilhouetteConfig, SubjectId, VariantFlags, WorkItem,
};
use support::{ScriptedHost, temp_dir};

fn small_layout() -> CaptureLayout {
    let region = CaptureRegion {
        x: 0,
        y: 0,
        width: 6,
        height: 4,
    };
    CaptureLayout {
        card: region,
        card_hero: region,
        card_mercenary: region,
        card_back: region,
        pack: region,
        reference_width: 16,
        reference_height: 16,
    }
}

fn fast_timing(reclaim_every: u32) -> SchedulerTiming {
    SchedulerTiming {
        settle: Duration::ZERO,
        load_timeout: Duration::from_secs(1),
        reclaim_every,
    }
}

fn card_items(count: u32, locale: Locale) -> Vec<WorkItem> {
    (0..count)
        .map(|i| WorkItem {
            locale,
            subject: SubjectId::Card(format!("CARD_{i:03}")),
            flags: VariantFlags::still(Finish::Normal),
        })
        .collect()
}

fn scheduler(root: &Path, run_id: &str, checkpoint: bool, reclaim_every: u32) -> CaptureScheduler {
    CaptureScheduler::new(
        small_layout(),
        OutputLayout::new(root, vec![3]),
        CheckpointStore::new(root, run_id, checkpoint),
        fast_timing(reclaim_every),
        SilhouetteConfig::default(),
    )
}

fn still_host() -> ScriptedHost {
    let mut host = ScriptedHost::new((16, 16));
    host.still_color = Some([200, 100, 50]);
    host
}

#[test]
fn full_run_persists_outputs_and_cursor() {
    let root = temp_dir("full_run");
    let items = card_items(3, Locale::EnUs);
    let mut host = still_host();

    let summary = scheduler(&root, "run", true, 0)
        .run(&mut host, &items)
        .unwrap();

    assert_eq!(summary.captured, 3);
    assert_eq!(summary.skipped_error, 0);
    for item in &items {
        let base = root.join("full_cards_enUS").join(format!(
            "{}.png",
            item.subject.file_stem()
        ));
        assert!(base.exists(), "missing {}", base.display());
        assert!(
            root.join("full_cards_enUS/3")
                .join(format!("{}.png", item.subject.file_stem()))
                .exists()
        );
    }
    let store = CheckpointStore::new(&root, "run", true);
    assert_eq!(store.read_cursor().unwrap(), 3);
    assert_eq!(host.loads, 3);
    assert_eq!(host.destroys, 3);
    // The flat-white silhouette material is created once and cached.
    assert_eq!(host.material_creations, 1);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn persisted_still_carries_the_extracted_alpha() {
    let root = temp_dir("alpha");
    let items = card_items(1, Locale::EnUs);
    let mut host = still_host();

    scheduler(&root, "run", false, 0)
        .run(&mut host, &items)
        .unwrap();

    let png = image::open(root.join("full_cards_enUS/CARD_000.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(png.dimensions(), (6, 4));
    // Left half of the region is covered by the subject, right half is not.
    assert_eq!(png.get_pixel(0, 0).0, [200, 100, 50, 255]);
    assert_eq!(png.get_pixel(5, 3).0, [200, 100, 50, 0]);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn resume_processes_exactly_the_items_past_the_cursor() {
    let root = temp_dir("resume");
    let items = card_items(4, Locale::EnUs);

    let mut first_host = still_host();
    scheduler(&root, "run", true, 0)
        .run(&mut first_host, &items)
        .unwrap();
    assert_eq!(first_host.loads, 4);

    let first_outputs: Vec<Vec<u8>> = items
        .iter()
        .map(|i| {
            std::fs::read(
                root.join("full_cards_enUS")
                    .join(format!("{}.png", i.subject.file_stem())),
            )
            .unwrap()
        })
        .collect();

    // Truncate the cursor and re-run from scratch.
    let store = CheckpointStore::new(&root, "run", true);
    store.write_cursor(2).unwrap();

    let mut second_host = still_host();
    let summary = scheduler(&root, "run", true, 0)
        .run(&mut second_host, &items)
        .unwrap();

    assert_eq!(summary.skipped_resume, 2);
    assert_eq!(summary.captured, 2);
    assert_eq!(second_host.loads, 2);
    assert_eq!(store.read_cursor().unwrap(), 4);

    // Re-done items produced byte-identical outputs.
    for (item, expected) in items.iter().zip(&first_outputs) {
        let actual = std::fs::read(
            root.join("full_cards_enUS")
                .join(format!("{}.png", item.subject.file_stem())),
        )
        .unwrap();
        assert_eq!(&actual, expected);
    }

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn load_and_configure_failures_skip_the_item_but_advance_the_cursor() {
    let root = temp_dir("failures");
    let items = card_items(4, Locale::EnUs);

    let mut host = still_host();
    host.refuse_loads.insert("CARD_000".to_string());
    host.fail_loads.insert("CARD_001".to_string());
    host.fail_configure.insert("CARD_002".to_string());

    let summary = scheduler(&root, "run", true, 0)
        .run(&mut host, &items)
        .unwrap();

    assert_eq!(summary.captured, 1);
    assert_eq!(summary.skipped_error, 3);
    // Every item counts as handled: no infinite retry on a bad subject.
    let store = CheckpointStore::new(&root, "run", true);
    assert_eq!(store.read_cursor().unwrap(), 4);

    assert!(!root.join("full_cards_enUS/CARD_000.png").exists());
    assert!(!root.join("full_cards_enUS/CARD_002.png").exists());
    assert!(root.join("full_cards_enUS/CARD_003.png").exists());
    // The failed-configure instance was still handed back for destruction.
    assert_eq!(host.destroys, 2);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn reclamation_runs_after_each_completed_batch() {
    let root = temp_dir("reclaim");
    let items = card_items(5, Locale::EnUs);
    let mut host = still_host();

    scheduler(&root, "run", false, 2)
        .run(&mut host, &items)
        .unwrap();

    assert_eq!(host.reclaims, 2);
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn locale_groups_switch_the_host_locale_once_each() {
    let root = temp_dir("locales");
    let mut items = card_items(2, Locale::EnUs);
    items.extend(card_items(2, Locale::FrFr));
    let mut host = still_host();

    scheduler(&root, "run", false, 0)
        .run(&mut host, &items)
        .unwrap();

    assert_eq!(host.locale_switches, vec![Locale::EnUs, Locale::FrFr]);
    assert!(root.join("full_cards_frFR/CARD_000.png").exists());
    std::fs::remove_dir_all(&root).ok();
}
