use std::env;
use std::sync::RwLock;

/// Region tag appended to every timestamp stamp. Process-wide; defaults
/// to "UTC". `CARDSTORE_REGION` overrides the default, and an explicit
/// `set_region_tag` call overrides both.
static REGION_TAG: RwLock<Option<String>> = RwLock::new(None);

pub fn set_region_tag<S: Into<String>>(tag: S) {
    let mut guard = REGION_TAG.write().unwrap();
    *guard = Some(tag.into());
}

pub fn region_tag() -> String {
    if let Some(tag) = REGION_TAG.read().unwrap().as_ref() {
        return tag.clone();
    }
    env::var("CARDSTORE_REGION").unwrap_or_else(|_| "UTC".to_string())
}
