use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use gallery_feed::config::{FeedConfig, ViewerConfig};
use gallery_feed::feed::{FeedController, HttpFeedClient, ServerStatus};
use gallery_feed::layout::GridLayout;
use gallery_feed::projection::{project, Query};
use gallery_feed::share::{perform_share, DirectoryTarget, ShareAction};
use gallery_feed::store::{FavoritesStore, KeyValueStore, MemoryStore, SettingsStore, SqliteStore};
use gallery_feed::viewer::Viewer;

/// Command line: `gallery-feed [SEARCH] [--pages N] [--download NAME]`.
#[derive(Debug, Default)]
struct Args {
    search: String,
    pages: u32,
    download: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        pages: 1,
        ..Args::default()
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--pages" => {
                let raw = iter.next().context("--pages needs a value")?;
                args.pages = raw.parse().with_context(|| format!("invalid page count {raw:?}"))?;
            }
            "--download" => args.download = Some(iter.next().context("--download needs a name")?),
            _ => args.search = arg,
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gallery_feed=info".parse()?),
        )
        .init();

    let args = parse_args()?;
    let config = FeedConfig::from_env();

    let backend: Arc<dyn KeyValueStore> = match SqliteStore::open_default() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "Settings database unavailable, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    let settings = SettingsStore::load(Arc::clone(&backend));
    let favorites = FavoritesStore::load(Arc::clone(&backend));

    let client = HttpFeedClient::new(&config).context("failed to create feed client")?;
    let controller = FeedController::new(client, config.clone());

    if controller.check_connection().await == ServerStatus::Offline {
        warn!(server = %config.base_url, "Server offline, nothing to show");
        return Ok(());
    }

    match controller.fetch_stats().await {
        Ok(stats) => info!(images = stats.images, thumbs = stats.thumbs, "Server stats"),
        Err(e) => debug!(error = %e, "Server stats unavailable"),
    }

    for _ in 1..args.pages {
        if !controller.has_more() {
            break;
        }
        controller.load_more().await;
    }

    let prefs = *settings.settings();
    let query = Query::new(args.search.clone(), prefs.sort, prefs.filter);
    let layout = GridLayout::new(1080.0, 1920.0, prefs.view_mode, prefs.columns);

    let download = controller.with_items(|items| {
        let shown = project(items, &query);
        let range = layout.visible_range(0.0, shown.len());
        info!(
            loaded = items.len(),
            shown = shown.len(),
            first_screen = range.visible.len(),
            favorites = favorites.len(),
            "Feed ready"
        );

        for item in &shown {
            let star = if favorites.is_favorite(&item.name) { "*" } else { " " };
            println!("{star} {}  {}", item.name, item.uri);
        }

        args.download
            .as_deref()
            .and_then(|name| shown.iter().find(|item| item.name == name))
            .map(|item| (*item).clone())
    });

    // Walk the viewer over the shown items so near-end prefetch kicks in.
    let mut viewer = Viewer::new(ViewerConfig::default(), controller.spawn_prefetcher());
    viewer.set_item_count(controller.len());
    if viewer.open(0) {
        let last = controller.len().saturating_sub(1);
        viewer.jump_to(last);
        debug!(index = ?viewer.index(), "Viewer walked to end");
        viewer.close();
    }

    if let Some(name) = &args.download {
        match download {
            Some(item) => {
                let dir = directories::UserDirs::new()
                    .and_then(|dirs| dirs.download_dir().map(|p| p.to_path_buf()))
                    .unwrap_or_else(|| std::env::temp_dir().join("gallery-feed"));
                let target = DirectoryTarget::new(dir, &config)?;
                let notice = perform_share(&target, ShareAction::Download, &item).await;
                println!("{}", notice.message);
            }
            None => warn!(name = %name, "No shown item with that name"),
        }
    }

    Ok(())
}
