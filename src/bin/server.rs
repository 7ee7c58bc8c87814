use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use bubblefield::config::validate_viewport;
use bubblefield::cull::ViewBounds;
use bubblefield::sample::sample_items;
use bubblefield::{
    Item, ItemId, LayoutStore, NewItem, Params, Point, Positions, UpdateReport, Viewport, render,
};

#[derive(Deserialize)]
struct LayoutRequest {
    viewer: Option<String>,
    /// Most-recent-first. Falls back to a synthetic set of `count` items.
    items: Option<Vec<Item>>,
    count: Option<usize>,
    sample_seed: Option<u64>,
    /// Positions returned by the previous call, to keep the layout stable.
    positions: Option<Positions>,
    offset: Option<Point>,
    viewport: Option<Viewport>,
    /// Id inserted by the write path since the last call.
    new_item: Option<ItemId>,
    /// Without `new_item`, guess the new item from the head of `items`.
    #[serde(default)]
    detect_new: bool,
    #[serde(default)]
    params: Params,
    preview_scale: Option<f64>,
}

#[derive(Serialize)]
struct LayoutResponse {
    seed: u32,
    positions: Positions,
    visible: Vec<ItemId>,
    bounds: ViewBounds,
    report: UpdateReport,
    timings: Vec<TimingEntry>,
    preview: Layer,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

type ApiError = (StatusCode, String);

// Request limits. The pairwise resolver is quadratic in the item count.
const MAX_ITEMS: usize = 5_000;
const MAX_PREVIEW_PIXELS: usize = 4_000_000;

fn encode_png(rgba: &[u8], w: usize, h: usize) -> bubblefield::Result<String> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder.write_image(rgba, w as u32, h as u32, image::ExtendedColorType::Rgba8)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn invalid(field: &'static str, reason: String) -> bubblefield::Error {
    bubblefield::Error::InvalidParams { field, reason }
}

/// Reject requests whose inputs would blow up the layout or the preview.
fn check_request(
    req: &LayoutRequest,
    offset: Point,
    viewport: Viewport,
    scale: f64,
) -> bubblefield::Result<()> {
    req.params.validate()?;
    validate_viewport(viewport)?;
    if !(offset.x.is_finite() && offset.y.is_finite()) {
        return Err(invalid("offset", "must be finite".into()));
    }

    let item_count = match &req.items {
        Some(items) => items.len(),
        None => req.count.unwrap_or(0),
    };
    if item_count > MAX_ITEMS {
        return Err(invalid(
            "items",
            format!("{item_count} exceeds the limit of {MAX_ITEMS}"),
        ));
    }
    if req.positions.as_ref().is_some_and(|p| p.len() > MAX_ITEMS) {
        return Err(invalid("positions", format!("more than {MAX_ITEMS} entries")));
    }

    let (w, h) = render::preview_size(offset, viewport, &req.params, scale);
    if w.saturating_mul(h) > MAX_PREVIEW_PIXELS {
        return Err(invalid(
            "preview_scale",
            format!("{w}x{h} preview exceeds {MAX_PREVIEW_PIXELS} pixels"),
        ));
    }
    Ok(())
}

fn run_layout(req: LayoutRequest) -> bubblefield::Result<LayoutResponse> {
    let viewport = req.viewport.unwrap_or(req.params.fallback_viewport);
    let offset = req.offset.unwrap_or(Point::ZERO);
    let scale = req.preview_scale.unwrap_or(0.2).clamp(0.01, 1.0);
    check_request(&req, offset, viewport, scale)?;
    let new_item = match (req.new_item, req.detect_new) {
        (Some(id), _) => NewItem::Tagged(Some(id)),
        (None, true) => NewItem::FirstUnplaced,
        (None, false) => NewItem::Tagged(None),
    };

    let mut store = LayoutStore::new(req.viewer.as_deref(), req.params)
        .with_positions(req.positions.unwrap_or_default());
    let items = match req.items {
        Some(items) => items,
        None => sample_items(
            req.count.unwrap_or(60),
            req.sample_seed.unwrap_or(store.seed() as u64),
        ),
    };

    let mut report = store.update(&items, offset, viewport, new_item);
    let visible: Vec<&Item> = store.visible(&items, offset, viewport);

    let (rgba, w, h) = render::render_layout(
        &visible,
        store.positions(),
        offset,
        viewport,
        store.params(),
        scale,
    );
    let preview = Layer {
        name: "viewport".into(),
        data_url: encode_png(&rgba, w, h)?,
    };

    let timings = std::mem::take(&mut report.timings)
        .into_iter()
        .map(|t| TimingEntry {
            name: t.name.to_string(),
            ms: t.ms,
        })
        .collect();

    Ok(LayoutResponse {
        seed: store.seed(),
        visible: visible.iter().map(|item| item.id).collect(),
        bounds: ViewBounds::new(offset, viewport, store.params().cull_buffer),
        positions: store.positions().clone(),
        report,
        timings,
        preview,
    })
}

async fn layout_handler(Json(req): Json<LayoutRequest>) -> Result<Json<LayoutResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || run_layout(req))
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    match response {
        Ok(body) => Ok(Json(body)),
        Err(err @ bubblefield::Error::InvalidParams { .. }) => {
            Err((StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(err) => {
            tracing::error!(error = %err, "layout request failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    bubblefield::logging::init_tracing();

    let app = Router::new()
        .route("/api/layout", post(layout_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("bubblefield server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
