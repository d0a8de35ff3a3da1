use ghostwalk::behavior::rng::{SeededRandom, SystemRandom};
use ghostwalk::sites::SitePool;

#[test]
fn parse_filters_blank_lines() {
    let pool = SitePool::parse("https://a.example\n\nhttps://b.example\n   \n").unwrap();
    assert_eq!(pool.len(), 2);
}

#[test]
fn trailing_newline_never_yields_an_empty_site() {
    // Regression: a site list ending in "\n" used to surface "" as a site.
    let pool = SitePool::parse("https://a.example\nhttps://b.example\n").unwrap();
    let mut rng = SystemRandom::new();
    for _ in 0..1_000 {
        let site = pool.choose(&mut rng);
        assert!(!site.is_empty());
        assert!(site == "https://a.example" || site == "https://b.example");
    }
}

#[test]
fn single_site_pool_always_selects_it() {
    let pool = SitePool::parse("https://only.example\n").unwrap();
    let mut rng = SeededRandom::new(5);
    for _ in 0..100 {
        assert_eq!(pool.choose(&mut rng), "https://only.example");
    }
}

#[test]
fn invalid_lines_are_skipped() {
    let pool = SitePool::parse("https://a.example\nnot a url at all\n").unwrap();
    assert_eq!(pool.len(), 1);
}

#[test]
fn empty_or_blank_lists_are_rejected() {
    assert!(SitePool::parse("").is_err());
    assert!(SitePool::parse("\n\n\n").is_err());
}

#[test]
fn load_reads_a_list_from_disk() {
    let path = std::env::temp_dir().join(format!("ghostwalk-sites-{}.txt", std::process::id()));
    std::fs::write(&path, "https://a.example\nhttps://b.example\n").unwrap();

    let pool = SitePool::load(&path).unwrap();
    assert_eq!(pool.len(), 2);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_fails_for_a_missing_file() {
    let path = std::env::temp_dir().join("ghostwalk-sites-definitely-missing.txt");
    assert!(SitePool::load(&path).is_err());
}
