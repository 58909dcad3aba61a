use gpubench::core::viewer::ViewerOutcome;
use gpubench::ViewerLauncher;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn artifacts(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, b"profile").unwrap();
            path
        })
        .collect()
}

/// Viewer that lingers, then leaves a marker next to its artifact.
fn slow_viewer(delay: &str) -> ViewerLauncher {
    ViewerLauncher::new(
        "sh",
        vec![
            "-c".to_string(),
            format!("sleep {}; touch \"$1.done\"", delay),
            "sh".to_string(),
        ],
    )
}

#[tokio::test]
async fn test_launcher_waits_for_every_viewer() {
    let dir = TempDir::new().unwrap();
    let paths = artifacts(&dir, &["candle_stable.prof", "candle_nightly.prof", "burn_stable.prof"]);

    let started = Instant::now();
    let reports = slow_viewer("0.3").launch_all(&paths).await;

    assert_eq!(reports.len(), 3);
    for (report, path) in reports.iter().zip(&paths) {
        assert_eq!(&report.artifact, path);
        assert!(report.succeeded(), "{:?}", report.outcome);
        assert!(path.with_extension("prof.done").exists());
    }
    // Viewers run side by side rather than one after another.
    assert!(started.elapsed() < Duration::from_millis(900));
}

#[tokio::test]
async fn test_failed_viewer_does_not_stop_the_others() {
    let dir = TempDir::new().unwrap();
    let mut paths = artifacts(&dir, &["a.prof", "b.prof"]);
    paths.insert(1, dir.path().join("missing.prof"));

    let reports = slow_viewer("0.1").launch_all(&paths).await;

    assert!(reports[0].succeeded());
    assert!(matches!(reports[1].outcome, ViewerOutcome::Failed(_)));
    assert!(reports[2].succeeded());
    assert!(dir.path().join("b.prof.done").exists());
}

#[tokio::test]
async fn test_non_zero_exit_is_reported() {
    let dir = TempDir::new().unwrap();
    let paths = artifacts(&dir, &["a.prof"]);

    let launcher = ViewerLauncher::new("sh", vec!["-c".to_string(), "exit 4".to_string()]);
    let reports = launcher.launch_all(&paths).await;

    assert!(!reports[0].succeeded());
    assert!(matches!(reports[0].outcome, ViewerOutcome::Exited(Some(4))));
}
