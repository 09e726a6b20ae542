use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use directories::UserDirs;
use tracing::info;

use waterfall::assets::{AssetUrlResolver, FileUrlResolver};
use waterfall::cli::{self, USAGE};
use waterfall::controller::{ContainerMetrics, GalleryController, RenderState};
use waterfall::scanner::{DirectorySource, ScanConfig};
use waterfall::{bench, GalleryConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("waterfall=info".parse()?),
        )
        .init();

    let config = GalleryConfig::from_env()?;
    let args = cli::parse_args(std::env::args().skip(1), config)?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let root = match args.path.clone() {
        Some(path) => path,
        None => default_media_dir().context("No --path given and no pictures directory found")?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let source = Arc::new(DirectorySource::with_config(
        &root,
        ScanConfig {
            probe_dimensions: args.probe,
            ..ScanConfig::default()
        },
    ));
    let listing = runtime.block_on(source.fetch_async());

    if args.bench {
        let items = listing.with_context(|| format!("Failed to list {}", root.display()))?;
        let report = bench::simulate_scroll(items, args.config, args.width, args.viewport_height);
        bench::print_report(&report);
        return Ok(());
    }

    let metrics = ContainerMetrics {
        width: args.width,
        height: args.viewport_height,
    };
    let mut controller = GalleryController::with_measure(args.config, move || Some(metrics));
    controller.apply_listing(listing);
    controller.on_scroll(args.scroll_top, args.viewport_height);

    let resolver: Box<dyn AssetUrlResolver> = match args.cdn {
        Some(cdn) => Box::new(cdn),
        None => Box::new(FileUrlResolver::new(&root)),
    };

    match &*controller.snapshot() {
        RenderState::Loading => bail!("Container width {} is not usable", args.width),
        RenderState::Unavailable(message) => bail!("Gallery unavailable: {message}"),
        RenderState::Empty => println!("No media found in {}", root.display()),
        RenderState::Ready(subset) => {
            info!(
                items = subset.items.len(),
                total_height = subset.total_height(),
                range = ?subset.range,
                "Gallery ready"
            );
            for (index, item, pos) in subset.visible() {
                println!("{}", cli::describe_tile(index, item, pos, &resolver.resolve(item)));
            }
        }
    }

    Ok(())
}

fn default_media_dir() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    dirs.picture_dir()
        .map(|p| p.to_path_buf())
        .or_else(|| Some(dirs.home_dir().join("Pictures")))
}
