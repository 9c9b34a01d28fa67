use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `KGMEM_QUIET=1` silences human-oriented banners
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("KGMEM_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
