use std::path::{Path, PathBuf};

use rayon::prelude::*;

use bubblefield::collide::min_separation;
use bubblefield::rng::splitmix32;
use bubblefield::sample::{next_submission, sample_items};
use bubblefield::{LayoutStore, NewItem, Params, Point, Viewport, render};

fn main() -> bubblefield::Result<()> {
    bubblefield::logging::init_tracing();
    let args: Vec<String> = std::env::args().collect();

    // "-" lays out as an anonymous viewer
    let viewer: Option<String> = args.get(1).filter(|s| s.as_str() != "-").cloned();
    let count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(120);
    let out_dir: PathBuf = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));

    std::fs::create_dir_all(&out_dir)?;

    let params = Params::default();
    params.validate()?;
    let viewport = params.fallback_viewport;

    let mut store = LayoutStore::new(viewer.as_deref(), params.clone());
    tracing::info!(
        viewer = viewer.as_deref().unwrap_or("<anonymous>"),
        seed = store.seed(),
        count,
        "laying out sample confessions"
    );

    // 1. First load
    let mut items = sample_items(count, store.seed() as u64);
    let report = store.update(&items, Point::ZERO, viewport, NewItem::Tagged(None));
    log_report("first load", &report);
    save_view(&out_dir, "layout.png", &store, &items, Point::ZERO, viewport)?;

    // 2. Pan away, then submit: the new bubble must appear mid-screen
    let offset = Point::new(-900.0, 350.0);
    let submitted = next_submission(&items, 180, items.first().map_or(0, |i| i.created_at + 1));
    let new_id = submitted.id;
    items.insert(0, submitted);
    let report = store.update(&items, offset, viewport, NewItem::Tagged(Some(new_id)));
    log_report("after submit", &report);
    tracing::info!(
        id = new_id,
        position = ?store.position(new_id),
        expected = ?viewport.world_center(offset),
        "pinned submission"
    );
    save_view(&out_dir, "layout_after_submit.png", &store, &items, offset, viewport)?;

    // 3. Convergence sweep across viewers and set sizes
    convergence_sweep(&params, viewport);

    Ok(())
}

fn log_report(stage: &str, report: &bubblefield::UpdateReport) {
    tracing::info!(
        stage,
        placed = report.placed,
        pinned = ?report.pinned,
        passes = report.passes,
        converged = report.converged,
        pruned = report.pruned,
        "update"
    );
    for t in &report.timings {
        tracing::info!("  {:12} {:8.3} ms", t.name, t.ms);
    }
}

fn save_view(
    out_dir: &Path,
    name: &str,
    store: &LayoutStore,
    items: &[bubblefield::Item],
    offset: Point,
    viewport: Viewport,
) -> bubblefield::Result<()> {
    let visible = store.visible(items, offset, viewport);
    let (rgba, w, h) = render::render_layout(
        &visible,
        store.positions(),
        offset,
        viewport,
        store.params(),
        0.25,
    );
    let path = out_dir.join(name);
    image::save_buffer(&path, &rgba, w as u32, h as u32, image::ColorType::Rgba8)?;
    tracing::info!(visible = visible.len(), "saved {}", path.display());
    Ok(())
}

fn convergence_sweep(params: &Params, viewport: Viewport) {
    const TRIALS: u32 = 16;
    let min_distance = params.min_distance();

    for count in [10usize, 50, 100, 200] {
        let outcomes: Vec<(bool, f64)> = (0..TRIALS)
            .into_par_iter()
            .map(|trial| {
                let viewer = format!("trial-{:08x}", splitmix32(trial ^ count as u32));
                let mut store = LayoutStore::new(Some(viewer.as_str()), params.clone());
                let items = sample_items(count, store.seed() as u64);
                let report = store.update(&items, Point::ZERO, viewport, NewItem::Tagged(None));
                let sep = min_separation(store.positions()).unwrap_or(min_distance);
                (report.converged, sep / min_distance)
            })
            .collect();

        let converged = outcomes.iter().filter(|(c, _)| *c).count();
        let worst = outcomes.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
        tracing::info!(
            count,
            "convergence sweep: {converged}/{TRIALS} converged, worst separation {:.3} x min distance",
            worst
        );
    }
}
