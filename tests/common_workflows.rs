//! Integration tests for common squeeze workflows.
//!
//! These tests run whole compression passes against an in-memory host.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use squeeze::prelude::*;
use squeeze::{BoxError, CacheKey, InMemoryCache, Resolution};
use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// gzip through flate2, counting invocations
fn counting_gzip(calls: Arc<AtomicUsize>) -> AlgorithmSpec {
    AlgorithmSpec::blocking("counting-gzip", move |input: &[u8], _: &CompressionOptions| {
        calls.fetch_add(1, Ordering::SeqCst);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(input)?;
        encoder.finish()
    })
}

/// Compressible text of exactly `len` bytes
fn text(len: usize) -> String {
    "function squeeze() { return 42; }\n"
        .repeat(len / 34 + 1)
        .chars()
        .take(len)
        .collect()
}

/// Incompressible bytes
fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn site() -> InMemoryCompilation {
    InMemoryCompilation::new()
        .with_asset(Asset::new("index.html", text(4000)))
        .with_asset(Asset::new("js/main.js", text(10000)))
        .with_asset(Asset::new("css/site.css", text(2500)))
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());

    let build = || {
        CompressionPlugin::builder()
            .algorithm(counting_gzip(Arc::clone(&calls)))
            .cache(Arc::clone(&store))
            .build()
            .unwrap()
    };

    let first_site = site();
    let first = build().run(&first_site).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let second_site = site();
    let second = build().run(&second_site).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(second.compressions(), 0);
    assert_eq!(second.cache_hits(), 3);
    assert_eq!(first.emitted(), second.emitted());

    for name in first.emitted() {
        assert_eq!(
            first_site.get_asset(name).unwrap().content,
            second_site.get_asset(name).unwrap().content
        );
    }
}

#[tokio::test]
async fn test_watch_rebuild_reuses_session() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plugin = CompressionPlugin::builder()
        .algorithm(counting_gzip(Arc::clone(&calls)))
        .cache(CacheSetting::MemoryOnly)
        .build()
        .unwrap();

    let compilation = site();
    plugin.run(&compilation).await;

    // next pass: same buffers, relations cleared by the host
    let rebuilt = InMemoryCompilation::new();
    for name in ["index.html", "js/main.js", "css/site.css"] {
        let asset = compilation.get_asset(name).unwrap();
        rebuilt.insert(Asset::new(name, asset.content));
    }
    let report = plugin.run(&rebuilt).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.emitted().len(), 3);
    assert!(
        report
            .tasks()
            .iter()
            .all(|t| t.resolution == Some(Resolution::Session))
    );
}

#[tokio::test]
async fn test_disabled_cache_compresses_every_pass() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plugin = CompressionPlugin::builder()
        .algorithm(counting_gzip(Arc::clone(&calls)))
        .cache(false)
        .build()
        .unwrap();
    let main = Asset::new("js/main.js", text(10000));

    for pass in 1..=2 {
        let compilation = InMemoryCompilation::new().with_asset(main.clone());
        let report = plugin.run(&compilation).await;

        assert_eq!(report.emitted(), vec!["js/main.js.gz"]);
        assert_eq!(report.cache_hits(), 0);
        assert_eq!(report.tasks()[0].resolution, Some(Resolution::Compressed));
        assert_eq!(calls.load(Ordering::SeqCst), pass);
    }
}

// =============================================================================
// Gates
// =============================================================================

#[tokio::test]
async fn test_ratio_gate() {
    let plugin = CompressionPlugin::builder().cache(false).build().unwrap();
    let compilation = InMemoryCompilation::new()
        .with_asset(Asset::new("photo.bin", noise(4096)))
        .with_asset(Asset::new("app.js", text(4096)));

    let report = plugin.run(&compilation).await;

    assert_eq!(report.emitted(), vec!["app.js.gz"]);
    assert_eq!(report.skipped(), vec![("photo.bin", SkipReason::RatioRejected)]);
    assert!(!compilation.contains("photo.bin.gz"));
    assert!(!compilation.get_asset("photo.bin").unwrap().info.related.contains("gzipped"));
}

#[tokio::test]
async fn test_ratio_gate_holds_with_warm_cache() {
    let store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
    let build = || {
        CompressionPlugin::builder()
            .cache(Arc::clone(&store))
            .build()
            .unwrap()
    };

    build().run(&InMemoryCompilation::new().with_asset(Asset::new("photo.bin", noise(4096)))).await;

    let compilation = InMemoryCompilation::new().with_asset(Asset::new("photo.bin", noise(4096)));
    let report = build().run(&compilation).await;

    assert_eq!(report.cache_hits(), 1);
    assert!(report.emitted().is_empty());
    assert!(!compilation.contains("photo.bin.gz"));
}

#[tokio::test]
async fn test_threshold_gate() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plugin = CompressionPlugin::builder()
        .algorithm(counting_gzip(Arc::clone(&calls)))
        .threshold(3000)
        .cache(false)
        .build()
        .unwrap();

    let compilation = site();
    let report = plugin.run(&compilation).await;

    assert_eq!(report.emitted(), vec!["index.html.gz", "js/main.js.gz"]);
    assert!(!compilation.contains("css/site.css.gz"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Cache keys
// =============================================================================

#[test]
fn test_cache_key_sensitivity() {
    let resolve = |spec: AlgorithmSpec, options: CompressionOptions| {
        CompressionPlugin::builder()
            .algorithm(spec)
            .compression_options(options)
            .cache(false)
            .build()
            .unwrap()
    };

    let gzip = resolve("gzip".into(), CompressionOptions::new());
    let key = |plugin: &CompressionPlugin, content: &[u8]| {
        CacheKey::new("main.js", plugin.config().algorithm(), content)
    };
    let base = key(&gzip, b"let a = 1;");

    assert_eq!(base, key(&gzip, b"let a = 1;"));
    assert_ne!(base, key(&gzip, b"let a = 2;"));
    assert_ne!(
        base,
        key(&resolve("deflate".into(), CompressionOptions::new()), b"let a = 1;")
    );
    assert_ne!(
        base,
        key(
            &resolve("gzip".into(), CompressionOptions::new().with("level", 6)),
            b"let a = 1;"
        )
    );
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn test_failure_isolation() {
    let plugin = CompressionPlugin::builder()
        .algorithm(AlgorithmSpec::function(
            "fails-on-css",
            |input: Bytes, _: CompressionOptions| async move {
                if input.starts_with(b"body") {
                    return Err::<Vec<u8>, BoxError>("css backend crashed".into());
                }
                Ok(input[..input.len() / 2].to_vec())
            },
        ))
        .cache(false)
        .build()
        .unwrap();

    let compilation = InMemoryCompilation::new()
        .with_asset(Asset::new("a.js", text(1000)))
        .with_asset(Asset::new("b.js", text(2000)))
        .with_asset(Asset::new("c.js", text(3000)))
        .with_asset(Asset::new("site.css", "body { margin: 0 }".repeat(50)));

    let report = plugin.run(&compilation).await;

    assert_eq!(report.failed(), vec!["site.css"]);
    assert_eq!(report.emitted(), vec!["a.js.gz", "b.js.gz", "c.js.gz"]);
    assert_eq!(compilation.errors().len(), 1);
    assert!(compilation.errors()[0].contains("css backend crashed"));
    assert!(compilation.get_asset("site.css").unwrap().info.related.is_empty());
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_round_trip() {
    let original = text(10000);
    let plugin = CompressionPlugin::builder().cache(false).build().unwrap();
    let compilation = InMemoryCompilation::new().with_asset(Asset::new("main.js", original.clone()));

    let report = plugin.run(&compilation).await;
    assert_eq!(report.emitted(), vec!["main.js.gz"]);

    let compressed = compilation.get_asset("main.js.gz").unwrap();
    let restored = gunzip(&compressed.content);
    assert_eq!(restored.len(), 10000);
    assert_eq!(restored, original.as_bytes());
}

#[tokio::test]
async fn test_delete_original() {
    let plugin = CompressionPlugin::builder()
        .delete_original_assets(true)
        .cache(false)
        .build()
        .unwrap();
    let compilation = InMemoryCompilation::new().with_asset(Asset::new("a.js", text(5000)));

    plugin.run(&compilation).await;

    assert!(!compilation.contains("a.js"));
    assert!(compilation.get_asset("a.js.gz").unwrap().info.compressed);
}

#[tokio::test]
async fn test_relation() {
    let plugin = CompressionPlugin::builder().cache(false).build().unwrap();
    let mut info = AssetInfo::default().with_source_map("b.js.map");
    info.related.insert("license", "b.js.LICENSE.txt");
    let compilation =
        InMemoryCompilation::new().with_asset(Asset::new("b.js", text(5000)).with_info(info));

    plugin.run(&compilation).await;

    let original = compilation.get_asset("b.js").unwrap();
    assert_eq!(original.info.related.get("gzipped"), Some("b.js.gz"));
    assert_eq!(original.info.related.get("license"), Some("b.js.LICENSE.txt"));
    assert_eq!(original.info.related.source_map.as_deref(), Some("b.js.map"));
    assert!(compilation.get_asset("b.js.gz").unwrap().info.compressed);
}

#[cfg(feature = "brotli")]
#[tokio::test]
async fn test_gzip_and_brotli_side_by_side() {
    let gzip = CompressionPlugin::builder().cache(false).build().unwrap();
    let brotli = CompressionPlugin::builder()
        .algorithm("brotliCompress")
        .cache(false)
        .build()
        .unwrap();

    let compilation = site();
    gzip.process_assets(&compilation).await;
    brotli.process_assets(&compilation).await;

    let main = compilation.get_asset("js/main.js").unwrap();
    assert_eq!(main.info.related.get("gzipped"), Some("js/main.js.gz"));
    assert_eq!(main.info.related.get("brotliCompressed"), Some("js/main.js.br"));
    assert!(!compilation.contains("js/main.js.gz.br"));
    assert_eq!(compilation.len(), 9);
}
