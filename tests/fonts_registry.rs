use std::sync::Arc;
use std::thread;

use cardcanvas::{FontEntry, FontRegistry, FontStyle, FontWeight};

fn face(family: &str, weight: FontWeight) -> FontEntry {
    FontEntry::new(family, vec![0u8; 4]).with_weight(weight)
}

#[test]
fn explicit_list_comes_first() {
    let reg = FontRegistry::new();
    reg.register(face("Cached", FontWeight::NORMAL));
    let merged = reg.merged_font_list(&[face("Explicit", FontWeight::BOLD)]);
    let families: Vec<_> = merged.iter().map(|f| f.family.as_str()).collect();
    assert_eq!(families, vec!["Explicit", "Cached"]);
}

#[test]
fn different_weight_is_not_shadowed() {
    let reg = FontRegistry::new();
    reg.register(face("Foo", FontWeight::BOLD));
    let merged = reg.merged_font_list(&[face("Foo", FontWeight::NORMAL)]);
    assert_eq!(merged.len(), 2);
}

#[test]
fn concurrent_registration_is_serialized() {
    let reg = Arc::new(FontRegistry::new());
    let handles: Vec<_> = (1..=9u16)
        .map(|i| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || {
                let weight = FontWeight::new(i * 100).unwrap();
                for _ in 0..50 {
                    reg.register(face("Inter", weight));
                    reg.register(face("Inter", weight).with_style(FontStyle::Italic));
                    let _ = reg.merged_font_list(&[]);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(reg.len(), 18);
}

#[test]
fn weights_deserialize_with_validation() {
    let ok: FontWeight = serde_json::from_str("600").unwrap();
    assert_eq!(ok.value(), 600);
    assert!(serde_json::from_str::<FontWeight>("650").is_err());
    let style: FontStyle = serde_json::from_str("\"italic\"").unwrap();
    assert_eq!(style, FontStyle::Italic);
}
