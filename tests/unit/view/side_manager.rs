use std::collections::HashSet;
use std::time::Duration;

use super::*;
use crate::assets::fetch::MemoryImageFetcher;
use crate::assets::fonts::FontBook;
use crate::foundation::config::StudioConfig;
use crate::foundation::core::Rgba8;

fn surface() -> Surface {
    let mut s = Surface::new(
        &StudioConfig::default(),
        MemoryImageFetcher::new().into_shared(),
        FontBook::empty(),
    );
    s.initialize(960, 640);
    s
}

fn add(s: &mut Surface, text: &str) -> LayerKey {
    s.add_text(text, "Inter", Rgba8::WHITE).unwrap()
}

#[test]
fn switch_moves_layers_and_back() {
    let mut s = surface();
    let mut sides = SideManager::new();
    let a = add(&mut s, "a");
    let b = add(&mut s, "b");

    assert!(sides.switch_side(&mut s, Side::Back));
    assert_eq!(s.active_side(), Side::Back);
    assert!(s.objects().is_empty());
    assert_eq!(sides.cached(Side::Front), &[a, b]);

    let c = add(&mut s, "c");
    assert!(sides.switch_side(&mut s, Side::Front));
    assert_eq!(s.objects(), &[a, b]);
    assert!(sides.cached(Side::Front).is_empty());
    assert_eq!(sides.cached(Side::Back), &[c]);
    assert_eq!(s.layer(c).unwrap().side, Side::Back);
}

#[tokio::test]
async fn switching_to_active_side_is_a_noop() {
    let fetcher = MemoryImageFetcher::new()
        .with_image("front.png", vec![0; 4])
        .into_shared();
    let mut s = Surface::new(&StudioConfig::default(), fetcher.clone(), FontBook::empty());
    s.initialize(960, 640);
    s.set_backdrops(Some("front.png".to_owned()), None);
    s.request_background();
    s.settle_background(Duration::from_secs(2)).await;
    assert_eq!(fetcher.fetch_count(), 1);
    let mut sides = SideManager::new();
    add(&mut s, "a");

    let renders = s.render_requests();
    let generation = s.background_generation();
    let pending = s.background_pending();
    let fetches = fetcher.fetch_count();

    assert!(!sides.switch_side(&mut s, Side::Front));
    assert_eq!(s.render_requests(), renders);
    assert_eq!(s.objects().len(), 1);
    assert_eq!(s.background_generation(), generation);
    assert_eq!(s.background_pending(), pending);
    assert_eq!(fetcher.fetch_count(), fetches);
}

#[test]
fn arbitrary_switches_never_lose_or_duplicate() {
    let mut s = surface();
    let mut sides = SideManager::new();
    let mut expected = HashSet::new();
    let script = [
        Side::Back,
        Side::Back,
        Side::Front,
        Side::Back,
        Side::Front,
        Side::Front,
        Side::Back,
    ];
    for (i, side) in script.into_iter().enumerate() {
        let key = add(&mut s, &format!("layer {i}"));
        expected.insert(key);
        if i % 3 == 2 {
            assert!(s.delete_selection());
            expected.remove(&key);
        }
        sides.switch_side(&mut s, side);

        let keys = sides.all_keys(&s);
        let unique: HashSet<_> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len(), "duplicate key after switch {i}");
        assert_eq!(unique, expected);
        assert_eq!(keys.len(), s.arena_len());
    }
}

#[test]
fn layers_for_reads_live_and_cached_sides() {
    let mut s = surface();
    let mut sides = SideManager::new();
    let a = add(&mut s, "a");
    sides.switch_side(&mut s, Side::Back);
    let b = add(&mut s, "b");
    assert_eq!(sides.layers_for(&s, Side::Back), vec![b]);
    assert_eq!(sides.layers_for(&s, Side::Front), vec![a]);
}

#[test]
fn sync_snapshots_without_detaching() {
    let mut s = surface();
    let mut sides = SideManager::new();
    let a = add(&mut s, "a");
    sides.sync(&s);
    assert_eq!(sides.cached(Side::Front), &[a]);
    assert_eq!(s.objects(), &[a]);

    s.delete_selection();
    sides.prune(&s);
    assert!(sides.cached(Side::Front).is_empty());
}
